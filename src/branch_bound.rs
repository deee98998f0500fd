//! Branch-and-bound over visiting orders (the "optimal" tier).
//!
//! Depth-first search over prefixes. The incumbent is the greedy order
//! polished by local search. A prefix is pruned when an optimistic bound on
//! the fitness of any completion cannot beat the incumbent:
//!
//! - skips and clock overflow already incurred are permanent;
//! - a remaining place that cannot be visited even at its earliest possible
//!   arrival is skipped in every completion;
//! - travel through the remaining places costs at least the larger of two
//!   floors: the cheapest incoming leg per place, or a spanning tree over
//!   them plus the cheapest first leg (travel is charged even for skips);
//! - the number of further visits is capped by the time and fee budgets;
//! - rating, cost and accessibility take their best values over any set of
//!   that many visits.
//!
//! When the search finishes the result is optimal for the score function.
//! Hitting `max_nodes` returns the incumbent and reports it as unproven.

use tracing::debug;

use crate::context::PlanContext;
use crate::error::StrategyError;
use crate::greedy::GreedyConstruction;
use crate::local_search::local_search;
use crate::score::Features;
use crate::simulator::{SimState, node_of};
use crate::traits::{RouteStrategy, SearchOutcome, TravelMatrix};

const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Slack on the fee budget so rounding never prunes a feasible visit.
const FEE_SLACK: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBound;

struct Search<'c, 'a> {
    ctx: &'c PlanContext<'a>,
    meets_needs: Vec<bool>,
    fees: Vec<f64>,
    best_order: Vec<usize>,
    best_fitness: f64,
    nodes: u64,
    pruned: u64,
    max_nodes: u64,
    exhausted: bool,
}

impl BranchAndBound {
    pub fn solve(&self, ctx: &PlanContext<'_>) -> SearchOutcome {
        let n = ctx.len();
        let mut incumbent = GreedyConstruction.construct(ctx);
        let greedy_fitness = ctx.fitness(&incumbent);
        let incumbent_fitness = local_search(
            ctx,
            &mut incumbent,
            ctx.config.branch_bound.local_search_iterations,
        );
        debug!(greedy_fitness, incumbent_fitness, "incumbent ready");

        let needs = &ctx.settings.constraints.accessibility;
        let mut search = Search {
            ctx,
            meets_needs: ctx.places.iter().map(|p| p.meets(needs)).collect(),
            fees: (0..n).map(|p| ctx.simulator().fee(p)).collect(),
            best_order: incumbent,
            best_fitness: incumbent_fitness,
            nodes: 0,
            pruned: 0,
            max_nodes: ctx.config.branch_bound.max_nodes,
            exhausted: false,
        };

        let mut prefix = Vec::with_capacity(n);
        let mut remaining: Vec<usize> = (0..n).collect();
        let root = ctx.simulator().begin_untraced();
        search.descend(&root, &mut prefix, &mut remaining);

        debug!(
            nodes = search.nodes,
            pruned = search.pruned,
            best_fitness = search.best_fitness,
            exhausted = search.exhausted,
            "branch and bound finished"
        );

        SearchOutcome {
            order: search.best_order,
            proven_optimal: !search.exhausted,
        }
    }
}

impl Search<'_, '_> {
    fn descend(&mut self, state: &SimState, prefix: &mut Vec<usize>, remaining: &mut Vec<usize>) {
        if remaining.is_empty() {
            let fitness = self.ctx.score().fitness(state.summary());
            if fitness > self.best_fitness + IMPROVEMENT_EPSILON {
                self.best_fitness = fitness;
                self.best_order = prefix.clone();
            }
            return;
        }

        // Nearest first finds good incumbents early.
        let mut children = remaining.clone();
        children.sort_by_key(|&p| (self.ctx.matrix.minutes(state.node(), node_of(p)), p));

        for place in children {
            if self.nodes >= self.max_nodes {
                self.exhausted = true;
                return;
            }
            self.nodes += 1;

            let mut child = state.clone();
            self.ctx.simulator().advance(&mut child, place);
            let slot = remaining.iter().position(|&p| p == place);
            if let Some(slot) = slot {
                remaining.swap_remove(slot);
            }

            if self.upper_bound(&child, remaining) > self.best_fitness + IMPROVEMENT_EPSILON {
                prefix.push(place);
                self.descend(&child, prefix, remaining);
                prefix.pop();
            } else {
                self.pruned += 1;
            }

            remaining.push(place);
        }
    }

    /// Optimistic fitness of any completion of `state` with `remaining`.
    fn upper_bound(&self, state: &SimState, remaining: &[usize]) -> f64 {
        let ctx = self.ctx;
        let summary = state.summary();
        let here = state.node();
        let rest: Vec<usize> = remaining.iter().map(|&p| node_of(p)).collect();

        let floor = TravelFloor::through(ctx.matrix, here, &rest);
        let reach = earliest_offsets(ctx.matrix, here, &rest);

        let mut certain_skips = 0;
        let mut open = Vec::with_capacity(remaining.len());
        for (slot, &place) in remaining.iter().enumerate() {
            let arrival = state.clock().plus(reach[slot]);
            match ctx.simulator().visit_at(place, arrival, summary.cost) {
                Ok(_) => open.push(slot),
                Err(_) => certain_skips += 1,
            }
        }

        let places = ctx.places;
        let deadline = ctx.settings.deadline();

        // Each visit needs its own incoming leg and its visit time before the deadline.
        let mut time_needed: Vec<u32> = open
            .iter()
            .map(|&slot| {
                places[remaining[slot]]
                    .average_visit_duration
                    .saturating_add(floor.min_in_minutes[slot])
            })
            .collect();
        time_needed.sort_unstable();
        let mut fees: Vec<f64> = open.iter().map(|&slot| self.fees[remaining[slot]]).collect();
        fees.sort_by(f64::total_cmp);
        let mut durations: Vec<u32> = open
            .iter()
            .map(|&slot| places[remaining[slot]].average_visit_duration)
            .collect();
        durations.sort_unstable();
        let mut ratings: Vec<f64> = open.iter().map(|&slot| places[remaining[slot]].rating).collect();
        ratings.sort_by(|a, b| b.total_cmp(a));
        let accessible_open = open
            .iter()
            .filter(|&&slot| self.meets_needs[remaining[slot]])
            .count();

        let mut max_visits = 0;
        let mut clock = state.clock();
        let mut spent = summary.cost;
        for (needed, fee) in time_needed.iter().zip(&fees) {
            clock = clock.plus(*needed);
            spent += fee;
            let over_budget = ctx
                .settings
                .constraints
                .budget
                .is_some_and(|budget| spent > budget + FEE_SLACK);
            if clock > deadline || over_budget {
                break;
            }
            max_visits += 1;
        }

        let mut best = f64::NEG_INFINITY;
        let mut rating_sum = summary.rating_sum;
        let mut cost = summary.cost;
        let mut visit_minutes = summary.visit_minutes;
        for extra in 0..=max_visits {
            if extra > 0 {
                rating_sum += ratings[extra - 1];
                cost += fees[extra - 1];
                visit_minutes = visit_minutes.saturating_add(durations[extra - 1]);
            }
            let visited = summary.visited + extra;
            let (rating, accessibility) = if visited == 0 {
                (0.0, 0.0)
            } else {
                let accessible = summary.accessible_visited + extra.min(accessible_open);
                (
                    rating_sum / visited as f64,
                    accessible as f64 / visited as f64,
                )
            };
            let optimistic = Features {
                rating,
                distance_km: summary.distance_km + floor.km,
                minutes: f64::from(
                    summary
                        .travel_minutes
                        .saturating_add(floor.minutes)
                        .saturating_add(visit_minutes),
                ),
                cost,
                accessibility,
            };
            let end = state
                .clock()
                .plus(floor.minutes)
                .plus(visit_minutes - summary.visit_minutes);
            let skipped = summary.skipped + certain_skips + (open.len() - extra);
            let value = ctx
                .score()
                .fitness_with(&optimistic, skipped, end.since(deadline));
            best = best.max(value);
        }
        best
    }
}

/// Lower bounds on the travel of any path that starts at one node and passes
/// through every node of a set.
struct TravelFloor {
    km: f64,
    minutes: u32,
    /// Cheapest leg into each node of the set, from the start or another node.
    min_in_minutes: Vec<u32>,
}

impl TravelFloor {
    fn through(matrix: &TravelMatrix, here: usize, rest: &[usize]) -> Self {
        if rest.is_empty() {
            return Self {
                km: 0.0,
                minutes: 0,
                min_in_minutes: Vec::new(),
            };
        }

        let mut in_km = 0.0;
        let mut in_minutes = 0_u32;
        let mut min_in_minutes = Vec::with_capacity(rest.len());
        for &to in rest {
            let sources = std::iter::once(here).chain(rest.iter().copied().filter(|&n| n != to));
            let (km, minutes) = sources.fold((f64::INFINITY, u32::MAX), |(km, min), from| {
                (km.min(matrix.distance_km(from, to)), min.min(matrix.minutes(from, to)))
            });
            in_km += km;
            in_minutes = in_minutes.saturating_add(minutes);
            min_in_minutes.push(minutes);
        }

        let first_km = rest
            .iter()
            .map(|&to| matrix.distance_km(here, to))
            .fold(f64::INFINITY, f64::min);
        let first_minutes = rest.iter().map(|&to| matrix.minutes(here, to)).min().unwrap_or(0);
        let tree_km = first_km
            + spanning_tree(rest, |a, b| {
                matrix.distance_km(a, b).min(matrix.distance_km(b, a))
            });
        let tree_minutes = first_minutes.saturating_add(
            spanning_tree(rest, |a, b| {
                f64::from(matrix.minutes(a, b).min(matrix.minutes(b, a)))
            }) as u32,
        );

        Self {
            km: in_km.max(tree_km),
            minutes: in_minutes.max(tree_minutes),
            min_in_minutes,
        }
    }
}

/// Weight of a minimum spanning tree over `nodes` (Prim, dense).
fn spanning_tree(nodes: &[usize], weight: impl Fn(usize, usize) -> f64) -> f64 {
    let k = nodes.len();
    if k < 2 {
        return 0.0;
    }
    let mut in_tree = vec![false; k];
    let mut link: Vec<f64> = nodes.iter().map(|&n| weight(nodes[0], n)).collect();
    in_tree[0] = true;
    let mut total = 0.0;

    for _ in 1..k {
        let next = (0..k)
            .filter(|&i| !in_tree[i])
            .min_by(|&a, &b| link[a].total_cmp(&link[b]));
        let Some(next) = next else { break };
        in_tree[next] = true;
        total += link[next];
        for i in 0..k {
            if !in_tree[i] {
                link[i] = link[i].min(weight(nodes[next], nodes[i]));
            }
        }
    }
    total
}

/// Shortest travel minutes from `here` to each node of `rest`, allowing
/// stopovers at other nodes of `rest` (Dijkstra, dense).
fn earliest_offsets(matrix: &TravelMatrix, here: usize, rest: &[usize]) -> Vec<u32> {
    let k = rest.len();
    let mut dist: Vec<u32> = rest.iter().map(|&to| matrix.minutes(here, to)).collect();
    let mut settled = vec![false; k];

    for _ in 0..k {
        let next = (0..k).filter(|&i| !settled[i]).min_by_key(|&i| dist[i]);
        let Some(next) = next else { break };
        settled[next] = true;
        for i in 0..k {
            if !settled[i] {
                let via = dist[next].saturating_add(matrix.minutes(rest[next], rest[i]));
                dist[i] = dist[i].min(via);
            }
        }
    }
    dist
}

impl RouteStrategy for BranchAndBound {
    fn name(&self) -> &'static str {
        "branch-and-bound"
    }

    fn search(&self, ctx: &PlanContext<'_>) -> Result<SearchOutcome, StrategyError> {
        if ctx.is_empty() {
            return Err(StrategyError::NoCandidate {
                strategy: self.name(),
            });
        }
        Ok(self.solve(ctx))
    }
}
