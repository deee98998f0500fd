//! Multi-objective scoring.
//!
//! Five objectives are normalized to `[0, 1]` and combined with the caller's
//! preference weights (divided by their total, so the weighted part of a score
//! is itself in `[0, 1]`):
//!
//! | objective            | better when |
//! |----------------------|-------------|
//! | average rating       | higher      |
//! | total distance       | lower       |
//! | total time           | lower       |
//! | total cost           | lower       |
//! | accessibility match  | higher      |
//!
//! Whole routes are normalized against [`ScoreBounds::from_instance`], the
//! range attainable over the candidate set, so fitness values from different
//! strategies are directly comparable. Per-step greedy choices normalize
//! min-max across the pool of reachable candidates via
//! [`ScoreBounds::from_pool`].
//!
//! Penalties are subtracted after weighting: one `skip_penalty` per skipped
//! place and `overflow_penalty_per_minute` for any time past the budget.
//! With the default skip penalty above 1.0 a route with fewer skips always
//! outranks one with more.

use crate::config::ScoringConfig;
use crate::model::{Place, PreferenceWeights, RouteSettings};
use crate::simulator::{RouteSummary, node_of};
use crate::traits::TravelMatrix;

/// Raw objective values of a route or a single step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Features {
    pub rating: f64,
    pub distance_km: f64,
    pub minutes: f64,
    pub cost: f64,
    /// Fraction in `[0, 1]`.
    pub accessibility: f64,
}

impl From<&RouteSummary> for Features {
    fn from(summary: &RouteSummary) -> Self {
        Self {
            rating: summary.average_rating(),
            distance_km: summary.distance_km,
            minutes: f64::from(summary.total_minutes()),
            cost: summary.cost,
            accessibility: summary.accessibility_ratio(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub lo: f64,
    pub hi: f64,
}

impl Range {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Maps `value` into `[0, 1]`. A degenerate range maps everything to 0.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.hi - self.lo;
        if span <= 1e-12 {
            return 0.0;
        }
        ((value - self.lo) / span).clamp(0.0, 1.0)
    }

    fn spanning(values: impl Iterator<Item = f64>) -> Self {
        let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if lo > hi { Self::new(0.0, 0.0) } else { Self::new(lo, hi) }
    }
}

/// Normalization ranges for each objective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBounds {
    pub rating: Range,
    pub distance_km: Range,
    pub minutes: Range,
    pub cost: Range,
    pub accessibility: Range,
}

impl ScoreBounds {
    /// Ranges attainable by any ordering of `places`.
    ///
    /// Upper bounds for distance and time charge every place its most
    /// expensive incoming leg, which no real route can exceed.
    pub fn from_instance(places: &[Place], matrix: &TravelMatrix, settings: &RouteSettings) -> Self {
        let category = settings.constraints.fee_category;
        let mut max_km = 0.0;
        let mut max_minutes = 0.0;
        for (idx, place) in places.iter().enumerate() {
            let to = node_of(idx);
            let (km, minutes) = (0..matrix.len())
                .filter(|&from| from != to)
                .fold((0.0_f64, 0_u32), |(km, min), from| {
                    (km.max(matrix.distance_km(from, to)), min.max(matrix.minutes(from, to)))
                });
            max_km += km;
            max_minutes += f64::from(minutes.saturating_add(place.average_visit_duration));
        }

        Self {
            rating: Range::spanning(places.iter().map(|p| p.rating)),
            distance_km: Range::new(0.0, max_km),
            minutes: Range::new(0.0, max_minutes),
            cost: Range::new(
                0.0,
                places.iter().map(|p| p.entry_fee.for_category(category)).sum(),
            ),
            accessibility: Range::new(0.0, 1.0),
        }
    }

    /// Min-max ranges across a candidate pool.
    pub fn from_pool(pool: &[Features]) -> Self {
        Self {
            rating: Range::spanning(pool.iter().map(|f| f.rating)),
            distance_km: Range::spanning(pool.iter().map(|f| f.distance_km)),
            minutes: Range::spanning(pool.iter().map(|f| f.minutes)),
            cost: Range::spanning(pool.iter().map(|f| f.cost)),
            accessibility: Range::spanning(pool.iter().map(|f| f.accessibility)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreFunction {
    weights: PreferenceWeights,
    penalties: ScoringConfig,
    bounds: ScoreBounds,
}

impl ScoreFunction {
    pub fn new(weights: PreferenceWeights, penalties: ScoringConfig, bounds: ScoreBounds) -> Self {
        Self {
            weights,
            penalties,
            bounds,
        }
    }

    pub fn bounds(&self) -> &ScoreBounds {
        &self.bounds
    }

    /// Weighted objective sum in `[0, 1]`. Higher is better.
    pub fn weighted(&self, features: &Features, bounds: &ScoreBounds) -> f64 {
        let total = self.weights.total();
        if total <= 0.0 {
            return 0.0;
        }
        let w = &self.weights;
        let sum = w.rating_weight * bounds.rating.normalize(features.rating)
            + w.distance_weight * (1.0 - bounds.distance_km.normalize(features.distance_km))
            + w.time_weight * (1.0 - bounds.minutes.normalize(features.minutes))
            + w.cost_weight * (1.0 - bounds.cost.normalize(features.cost))
            + w.accessibility_weight * bounds.accessibility.normalize(features.accessibility);
        sum / total
    }

    pub fn penalty(&self, skipped: usize, overflow_minutes: u32) -> f64 {
        self.penalties.skip_penalty * skipped as f64
            + self.penalties.overflow_penalty_per_minute * f64::from(overflow_minutes)
    }

    /// Fitness of a whole route. Higher is better.
    pub fn fitness(&self, summary: &RouteSummary) -> f64 {
        self.fitness_with(
            &Features::from(summary),
            summary.skipped,
            summary.overflow_minutes,
        )
    }

    /// Fitness from explicit objective values, e.g. optimistic bounds.
    pub fn fitness_with(&self, features: &Features, skipped: usize, overflow_minutes: u32) -> f64 {
        self.weighted(features, &self.bounds) - self.penalty(skipped, overflow_minutes)
    }

    /// Scores each candidate of a pool, min-max normalized within the pool.
    pub fn step_scores(&self, pool: &[Features]) -> Vec<f64> {
        let bounds = ScoreBounds::from_pool(pool);
        pool.iter().map(|f| self.weighted(f, &bounds)).collect()
    }
}
