//! Genetic improvement over visiting orders (the "balanced" tier).
//!
//! A solution is a permutation of place indices. The population is seeded
//! with the greedy order plus random shuffles. Each generation keeps the
//! elites, fills the rest by tournament selection, order crossover, and a
//! swap or segment-reverse mutation, then evaluates the offspring through the
//! full simulation.
//!
//! The run stops at the generation cap, after `stagnation_limit` generations
//! without a new best, or when the wall-clock limit passes, whichever comes
//! first. The limit is checked between generations; on expiry the best
//! individual so far is returned.
//!
//! All randomness flows from one seeded [`StdRng`], and evaluation order does
//! not touch it, so a fixed seed reproduces the run with or without rayon.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::config::GeneticConfig;
use crate::context::PlanContext;
use crate::error::StrategyError;
use crate::greedy::GreedyConstruction;
use crate::traits::{RouteStrategy, SearchOutcome};

#[derive(Debug, Clone, PartialEq)]
struct Individual {
    order: Vec<usize>,
    /// Higher is better.
    fitness: f64,
}

/// Why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    GenerationCap,
    Stagnated,
    Deadline,
}

/// Outcome of a genetic run with statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionReport {
    pub best_order: Vec<usize>,
    pub best_fitness: f64,
    pub generations: usize,
    pub termination: Termination,
}

#[derive(Debug, Clone, Default)]
pub struct GeneticOptimizer;

impl GeneticOptimizer {
    pub fn evolve(&self, ctx: &PlanContext<'_>) -> EvolutionReport {
        let config = &ctx.config.genetic;
        let deadline = Instant::now() + Duration::from_millis(config.time_limit_ms);
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let n = ctx.len();

        let mut population = Vec::with_capacity(config.population_size);
        population.push(GreedyConstruction.construct(ctx));
        while population.len() < config.population_size {
            let mut order: Vec<usize> = (0..n).collect();
            order.shuffle(&mut rng);
            population.push(order);
        }
        let mut population = evaluate(ctx, population, config.parallel);

        let mut best = fittest(&population).clone();
        let mut stagnation = 0usize;
        let mut generations = 0usize;
        let mut termination = Termination::GenerationCap;

        while generations < config.max_generations {
            if Instant::now() >= deadline {
                termination = Termination::Deadline;
                break;
            }

            population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
            let elite_count = config.elite_count.min(population.len());
            let mut next: Vec<Individual> = population[..elite_count].to_vec();

            let mut offspring = Vec::with_capacity(config.population_size - elite_count);
            while next.len() + offspring.len() < config.population_size {
                let p1 = tournament(&population, config.tournament_size, &mut rng);
                let p2 = tournament(&population, config.tournament_size, &mut rng);

                let children = if rng.random::<f64>() < config.crossover_rate {
                    let (c1, c2) = order_crossover(&population[p1].order, &population[p2].order, &mut rng);
                    vec![c1, c2]
                } else {
                    vec![population[p1].order.clone()]
                };

                for mut child in children {
                    if next.len() + offspring.len() >= config.population_size {
                        break;
                    }
                    if rng.random::<f64>() < config.mutation_rate {
                        mutate(&mut child, &mut rng);
                    }
                    offspring.push(child);
                }
            }

            next.extend(evaluate(ctx, offspring, config.parallel));
            population = next;
            generations += 1;

            let generation_best = fittest(&population);
            if generation_best.fitness > best.fitness {
                best = generation_best.clone();
                stagnation = 0;
            } else {
                stagnation += 1;
            }

            if generations % 25 == 0 {
                debug!(generations, best_fitness = best.fitness, "genetic progress");
            }

            if config.stagnation_limit > 0 && stagnation >= config.stagnation_limit {
                termination = Termination::Stagnated;
                break;
            }
        }

        debug!(
            generations,
            best_fitness = best.fitness,
            ?termination,
            seed,
            "genetic search finished"
        );

        EvolutionReport {
            best_order: best.order,
            best_fitness: best.fitness,
            generations,
            termination,
        }
    }
}

impl RouteStrategy for GeneticOptimizer {
    fn name(&self) -> &'static str {
        "genetic"
    }

    fn search(&self, ctx: &PlanContext<'_>) -> Result<SearchOutcome, StrategyError> {
        if ctx.is_empty() {
            return Err(StrategyError::NoCandidate {
                strategy: self.name(),
            });
        }
        Ok(SearchOutcome::heuristic(self.evolve(ctx).best_order))
    }
}

fn evaluate(ctx: &PlanContext<'_>, orders: Vec<Vec<usize>>, parallel: bool) -> Vec<Individual> {
    let score = |order: Vec<usize>| Individual {
        fitness: ctx.fitness(&order),
        order,
    };
    if parallel {
        orders.into_par_iter().map(score).collect()
    } else {
        orders.into_iter().map(score).collect()
    }
}

/// First individual with the highest fitness.
fn fittest(population: &[Individual]) -> &Individual {
    let mut best = &population[0];
    for candidate in &population[1..] {
        if candidate.fitness > best.fitness {
            best = candidate;
        }
    }
    best
}

/// Pick `k` individuals at random and return the index of the fittest.
fn tournament<R: Rng>(population: &[Individual], k: usize, rng: &mut R) -> usize {
    let n = population.len();
    let mut best = rng.random_range(0..n);
    for _ in 1..k.max(1) {
        let idx = rng.random_range(0..n);
        if population[idx].fitness > population[best].fitness {
            best = idx;
        }
    }
    best
}

fn mutate<R: Rng>(order: &mut [usize], rng: &mut R) {
    if rng.random_bool(0.5) {
        swap_mutation(order, rng);
    } else {
        reverse_mutation(order, rng);
    }
}

/// Order crossover (OX): keep a random segment of one parent in place and
/// fill the other positions with the second parent's remaining elements in
/// their relative order, wrapping after the segment.
pub fn order_crossover<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let n = parent1.len();
    debug_assert_eq!(n, parent2.len(), "parents must have equal length");
    if n < 2 {
        return (parent1.to_vec(), parent2.to_vec());
    }

    let (start, end) = random_segment(n, rng);
    (
        ox_child(parent1, parent2, start, end),
        ox_child(parent2, parent1, start, end),
    )
}

fn ox_child(template: &[usize], donor: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = template.len();
    let mut child = vec![usize::MAX; n];
    let mut kept = vec![false; n];

    for i in start..=end {
        child[i] = template[i];
        kept[template[i]] = true;
    }

    let mut pos = (end + 1) % n;
    for offset in 0..n {
        let gene = donor[(end + 1 + offset) % n];
        if !kept[gene] {
            child[pos] = gene;
            pos = (pos + 1) % n;
        }
    }

    child
}

/// Exchange two random positions.
pub fn swap_mutation<R: Rng>(order: &mut [usize], rng: &mut R) {
    let n = order.len();
    if n < 2 {
        return;
    }
    let i = rng.random_range(0..n);
    let j = rng.random_range(0..n);
    order.swap(i, j);
}

/// Reverse a random segment (a 2-opt move).
pub fn reverse_mutation<R: Rng>(order: &mut [usize], rng: &mut R) {
    let n = order.len();
    if n < 2 {
        return;
    }
    let (start, end) = random_segment(n, rng);
    order[start..=end].reverse();
}

/// Random inclusive segment `[start, end]` with `start < end`.
fn random_segment<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let mut b = rng.random_range(0..n - 1);
    if b >= a {
        b += 1;
    }
    (a.min(b), a.max(b))
}
