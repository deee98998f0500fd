//! Per-call planning context shared by all strategies.

use crate::config::EngineConfig;
use crate::model::{Place, RouteSettings};
use crate::score::{ScoreBounds, ScoreFunction};
use crate::simulator::{Simulation, Simulator};
use crate::traits::TravelMatrix;

/// Everything a strategy needs to evaluate orderings.
///
/// Built once per `optimize()` call around the precomputed matrix; never
/// shared between calls.
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub places: &'a [Place],
    pub settings: &'a RouteSettings,
    pub matrix: &'a TravelMatrix,
    pub config: &'a EngineConfig,
    simulator: Simulator<'a>,
    score: ScoreFunction,
}

impl<'a> PlanContext<'a> {
    pub fn new(
        places: &'a [Place],
        settings: &'a RouteSettings,
        matrix: &'a TravelMatrix,
        config: &'a EngineConfig,
    ) -> Self {
        let bounds = ScoreBounds::from_instance(places, matrix, settings);
        Self {
            places,
            settings,
            matrix,
            config,
            simulator: Simulator::new(places, matrix, settings),
            score: ScoreFunction::new(settings.weights, config.scoring, bounds),
        }
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn simulator(&self) -> &Simulator<'a> {
        &self.simulator
    }

    pub fn score(&self) -> &ScoreFunction {
        &self.score
    }

    /// Fitness of a full ordering. Higher is better.
    pub fn fitness(&self, order: &[usize]) -> f64 {
        self.score.fitness(&self.simulator.summarize(order))
    }

    pub fn simulate(&self, order: &[usize]) -> Simulation {
        self.simulator.simulate(order)
    }
}
