//! Greedy next-best-place construction (the "fast" tier).
//!
//! At each step every unvisited place that can still be visited is scored
//! against the others; the best one is appended. Ties go to the shortest
//! travel time, then to the lower input index. Places that can no longer be
//! reached are appended at the end in nearest-first order so the result is
//! always a full permutation; the simulator marks them skipped.

use crate::context::PlanContext;
use crate::error::StrategyError;
use crate::score::Features;
use crate::simulator::{Probe, node_of};
use crate::traits::{RouteStrategy, SearchOutcome};

const TIE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyConstruction;

impl GreedyConstruction {
    /// Builds an ordering. Deterministic and infallible.
    pub fn construct(&self, ctx: &PlanContext<'_>) -> Vec<usize> {
        let simulator = ctx.simulator();
        let mut state = simulator.begin_untraced();
        let mut remaining: Vec<usize> = (0..ctx.len()).collect();
        let mut order = Vec::with_capacity(ctx.len());

        while !remaining.is_empty() {
            let reachable: Vec<Probe> = remaining
                .iter()
                .map(|&place| simulator.probe(&state, place))
                .filter(|probe| probe.outcome.is_visited())
                .collect();

            let Some(pick) = best_probe(ctx, &reachable) else {
                break;
            };

            simulator.advance(&mut state, pick);
            remaining.retain(|&p| p != pick);
            order.push(pick);
        }

        // Nothing left fits; chain the rest nearest-first.
        let mut node = state.node();
        loop {
            let nearest = remaining
                .iter()
                .enumerate()
                .min_by_key(|&(_, &place)| (ctx.matrix.minutes(node, node_of(place)), place))
                .map(|(slot, &place)| (slot, place));
            let Some((slot, next)) = nearest else {
                break;
            };
            remaining.remove(slot);
            order.push(next);
            node = node_of(next);
        }

        order
    }
}

fn best_probe(ctx: &PlanContext<'_>, reachable: &[Probe]) -> Option<usize> {
    let needs = &ctx.settings.constraints.accessibility;
    let pool: Vec<Features> = reachable
        .iter()
        .map(|probe| {
            let place = &ctx.places[probe.place];
            Features {
                rating: place.rating,
                distance_km: probe.travel_km,
                minutes: f64::from(probe.travel_minutes) + f64::from(probe.wait),
                cost: probe.fee,
                accessibility: if place.meets(needs) { 1.0 } else { 0.0 },
            }
        })
        .collect();
    let scores = ctx.score().step_scores(&pool);

    let mut best: Option<(usize, f64)> = None;
    for (i, score) in scores.into_iter().enumerate() {
        best = match best {
            None => Some((i, score)),
            Some((b, best_score)) => {
                let better = score > best_score + TIE_EPSILON
                    || ((score - best_score).abs() <= TIE_EPSILON
                        && (reachable[i].travel_minutes, reachable[i].place)
                            < (reachable[b].travel_minutes, reachable[b].place));
                if better { Some((i, score)) } else { Some((b, best_score)) }
            }
        };
    }
    best.map(|(i, _)| reachable[i].place)
}

impl RouteStrategy for GreedyConstruction {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn search(&self, ctx: &PlanContext<'_>) -> Result<SearchOutcome, StrategyError> {
        Ok(SearchOutcome::heuristic(self.construct(ctx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockTime;
    use crate::config::EngineConfig;
    use crate::model::{Place, PreferenceWeights, RouteSettings};
    use crate::traits::{TravelMatrix, is_permutation};

    /// Places on a line at 10 minute spacing, start at position 0.
    fn line(n: usize) -> TravelMatrix {
        let size = n + 1;
        let km = (0..size)
            .map(|i| (0..size).map(|j| i.abs_diff(j) as f64 * 5.0).collect())
            .collect();
        let minutes = (0..size)
            .map(|i| (0..size).map(|j| i.abs_diff(j) as u32 * 10).collect())
            .collect();
        TravelMatrix::new(km, minutes)
    }

    fn distance_only() -> PreferenceWeights {
        PreferenceWeights {
            rating_weight: 0.0,
            distance_weight: 1.0,
            time_weight: 0.0,
            cost_weight: 0.0,
            accessibility_weight: 0.0,
        }
    }

    #[test]
    fn test_nearest_first_when_distance_only() {
        let places: Vec<Place> = (0..4)
            .map(|i| Place::new(format!("p{i}"), "P", 0.0, 0.0).with_duration(30))
            .collect();
        let matrix = line(4);
        let settings = RouteSettings::new(ClockTime::hm(9, 0), 600).with_weights(distance_only());
        let config = EngineConfig::default();
        let ctx = PlanContext::new(&places, &settings, &matrix, &config);

        assert_eq!(GreedyConstruction.construct(&ctx), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_prefers_rating_when_rating_only() {
        let places = vec![
            Place::new("a", "A", 0.0, 0.0).with_rating(3.0),
            Place::new("b", "B", 0.0, 0.0).with_rating(4.9),
            Place::new("c", "C", 0.0, 0.0).with_rating(4.0),
        ];
        let matrix = line(3);
        let weights = PreferenceWeights {
            rating_weight: 1.0,
            distance_weight: 0.0,
            time_weight: 0.0,
            cost_weight: 0.0,
            accessibility_weight: 0.0,
        };
        let settings = RouteSettings::new(ClockTime::hm(9, 0), 600).with_weights(weights);
        let config = EngineConfig::default();
        let ctx = PlanContext::new(&places, &settings, &matrix, &config);

        let order = GreedyConstruction.construct(&ctx);
        assert_eq!(order[0], 1);
        assert_eq!(order[1], 2);
    }

    #[test]
    fn test_unreachable_places_still_in_order() {
        let places: Vec<Place> = (0..4)
            .map(|i| Place::new(format!("p{i}"), "P", 0.0, 0.0).with_duration(90))
            .collect();
        let matrix = line(4);
        let settings = RouteSettings::new(ClockTime::hm(9, 0), 120);
        let config = EngineConfig::default();
        let ctx = PlanContext::new(&places, &settings, &matrix, &config);

        let order = GreedyConstruction.construct(&ctx);
        assert!(is_permutation(&order, 4));
        let summary = ctx.simulator().summarize(&order);
        assert_eq!(summary.visited, 1);
        assert_eq!(summary.skipped, 3);
    }

    #[test]
    fn test_deterministic() {
        let places: Vec<Place> = (0..6)
            .map(|i| Place::new(format!("p{i}"), "P", 0.0, 0.0).with_rating(4.0))
            .collect();
        let matrix = line(6);
        let settings = RouteSettings::new(ClockTime::hm(9, 0), 300);
        let config = EngineConfig::default();
        let ctx = PlanContext::new(&places, &settings, &matrix, &config);

        let first = GreedyConstruction.construct(&ctx);
        let second = GreedyConstruction.construct(&ctx);
        assert_eq!(first, second);
    }
}
