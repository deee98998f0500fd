//! Route optimization entry point.
//!
//! [`Optimizer::optimize`] validates the input, builds the travel matrix once,
//! picks the tier, runs it, and re-simulates the winner before handing it to
//! the itinerary builder.
//!
//! Tier selection walks the optimal → balanced → fast chain until the place
//! count fits the tier's limit. If the chosen strategy faults, the greedy
//! construction is used instead and the result reports `fast`. That fallback
//! is the only one in the engine.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::branch_bound::BranchAndBound;
use crate::config::{EngineConfig, TierLimits};
use crate::context::PlanContext;
use crate::error::{ConfigError, InputError, StrategyError};
use crate::genetic::GeneticOptimizer;
use crate::greedy::GreedyConstruction;
use crate::haversine::HaversineMatrix;
use crate::itinerary::{ItineraryBuilder, OptimizedRoute, RunInfo};
use crate::model::{MAX_SPAN_MINUTES, OptimizationLevel, Place, RouteSettings, StartLocation};
use crate::traits::{RouteStrategy, SearchOutcome, TravelMatrixProvider, is_permutation};

/// Plans with the default configuration and haversine travel estimates.
pub fn optimize(
    places: &[Place],
    start: &StartLocation,
    settings: &RouteSettings,
) -> Result<OptimizedRoute, InputError> {
    Optimizer::default().optimize(places, start, settings)
}

/// Reusable, stateless planner. Safe to share across threads.
#[derive(Debug, Clone)]
pub struct Optimizer<M = HaversineMatrix> {
    config: EngineConfig,
    matrix_provider: M,
}

impl Default for Optimizer<HaversineMatrix> {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            matrix_provider: HaversineMatrix::new(config.average_speed_kmh),
            config,
        }
    }
}

impl Optimizer<HaversineMatrix> {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let provider = HaversineMatrix::new(config.average_speed_kmh);
        Self::with_provider(config, provider)
    }
}

impl<M: TravelMatrixProvider> Optimizer<M> {
    pub fn with_provider(config: EngineConfig, matrix_provider: M) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            matrix_provider,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn optimize(
        &self,
        places: &[Place],
        start: &StartLocation,
        settings: &RouteSettings,
    ) -> Result<OptimizedRoute, InputError> {
        validate(places, start, settings, &self.config.limits)?;

        let locations: Vec<(f64, f64)> = std::iter::once(start.coordinates.as_tuple())
            .chain(places.iter().map(|p| p.coordinates.as_tuple()))
            .collect();
        let matrix = self.matrix_provider.matrix_for(&locations);
        if !matrix.is_square(locations.len()) {
            return Err(InputError::MalformedRequest(
                "travel matrix does not cover every location".to_string(),
            ));
        }

        let ctx = PlanContext::new(places, settings, &matrix, &self.config);
        let requested = settings.optimization_level;
        let tier = resolve_tier(requested, places.len(), &self.config.limits);
        if tier != requested {
            warn!(
                requested = requested.name(),
                used = tier.name(),
                places = places.len(),
                "place count exceeds tier limit, downgrading"
            );
        }

        Ok(self.route_with(&ctx, start, tier, strategy_for(tier)))
    }

    /// Runs `strategy` as `tier` and builds the result from its order.
    ///
    /// A strategy error or an order that is not a permutation falls back to
    /// greedy construction, reported as `fast`.
    fn route_with(
        &self,
        ctx: &PlanContext<'_>,
        start: &StartLocation,
        tier: OptimizationLevel,
        strategy: &dyn RouteStrategy,
    ) -> OptimizedRoute {
        let requested = ctx.settings.optimization_level;
        let (algorithm, outcome) = match run_strategy(strategy, ctx) {
            Ok(outcome) => (tier, outcome),
            Err(err) => {
                warn!(
                    tier = tier.name(),
                    strategy = strategy.name(),
                    error = %err,
                    "strategy failed, falling back to greedy"
                );
                (
                    OptimizationLevel::Fast,
                    SearchOutcome::heuristic(GreedyConstruction.construct(ctx)),
                )
            }
        };

        let simulation = ctx.simulate(&outcome.order);
        let fitness = ctx.score().fitness(&simulation.summary);
        let run = RunInfo {
            requested,
            algorithm,
            fitness,
            proven_optimal: outcome.proven_optimal,
        };
        let result = ItineraryBuilder::new(ctx.places, start, ctx.settings, self.config.efficiency)
            .build(&simulation, run);

        info!(
            requested = requested.name(),
            algorithm = algorithm.name(),
            places = ctx.len(),
            feasible = result.metrics.feasible,
            skipped = result.metrics.places_skipped,
            fitness,
            "route optimized"
        );

        result
    }
}

/// Largest tier at or below `requested` whose limit admits `count` places.
pub fn resolve_tier(
    requested: OptimizationLevel,
    count: usize,
    limits: &TierLimits,
) -> OptimizationLevel {
    let mut tier = requested;
    while let Some(limit) = tier.place_limit(limits) {
        if count <= limit {
            break;
        }
        match tier.downgrade() {
            Some(lower) => tier = lower,
            None => break,
        }
    }
    tier
}

fn strategy_for(tier: OptimizationLevel) -> &'static dyn RouteStrategy {
    match tier {
        OptimizationLevel::Fast => &GreedyConstruction,
        OptimizationLevel::Balanced => &GeneticOptimizer,
        OptimizationLevel::Optimal => &BranchAndBound,
    }
}

fn run_strategy(
    strategy: &dyn RouteStrategy,
    ctx: &PlanContext<'_>,
) -> Result<SearchOutcome, StrategyError> {
    let outcome = strategy.search(ctx)?;
    if is_permutation(&outcome.order, ctx.len()) {
        Ok(outcome)
    } else {
        Err(StrategyError::MalformedOrdering {
            expected: ctx.len(),
        })
    }
}

/// Rejects anything the engine cannot plan for, before computing anything.
pub fn validate(
    places: &[Place],
    start: &StartLocation,
    settings: &RouteSettings,
    limits: &TierLimits,
) -> Result<(), InputError> {
    let count = places.len();
    if count < limits.min_places {
        return Err(InputError::TooFewPlaces {
            count,
            min: limits.min_places,
        });
    }
    if count > limits.max_places {
        return Err(InputError::TooManyPlaces {
            count,
            max: limits.max_places,
        });
    }

    if !start.coordinates.is_valid() {
        return Err(InputError::InvalidCoordinates {
            id: start.id.clone(),
            lat: start.coordinates.lat,
            lng: start.coordinates.lng,
        });
    }

    let mut seen = HashSet::with_capacity(count);
    for place in places {
        if !seen.insert(place.id.as_str()) {
            return Err(InputError::DuplicatePlace {
                id: place.id.clone(),
            });
        }
        if !place.coordinates.is_valid() {
            return Err(InputError::InvalidCoordinates {
                id: place.id.clone(),
                lat: place.coordinates.lat,
                lng: place.coordinates.lng,
            });
        }
        if place.average_visit_duration == 0 {
            return Err(InputError::NonPositiveDuration {
                id: place.id.clone(),
            });
        }
        if place.average_visit_duration > MAX_SPAN_MINUTES {
            return Err(InputError::VisitTooLong {
                id: place.id.clone(),
                max: MAX_SPAN_MINUTES,
            });
        }
        if !(0.0..=5.0).contains(&place.rating) {
            return Err(InputError::InvalidRating {
                id: place.id.clone(),
                rating: place.rating,
            });
        }
        let fee = place.entry_fee;
        if !(fee.indian.is_finite() && fee.indian >= 0.0 && fee.foreign.is_finite() && fee.foreign >= 0.0)
        {
            return Err(InputError::InvalidFee {
                id: place.id.clone(),
            });
        }
    }

    if settings.total_time_available == 0 {
        return Err(InputError::NonPositiveTimeBudget);
    }
    if settings.total_time_available > MAX_SPAN_MINUTES {
        return Err(InputError::TimeBudgetTooLong {
            max: MAX_SPAN_MINUTES,
        });
    }
    if let Some(budget) = settings.constraints.budget {
        if !(budget.is_finite() && budget >= 0.0) {
            return Err(InputError::InvalidBudget);
        }
    }
    for (name, weight) in settings.weights.named() {
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(InputError::InvalidWeight { name });
        }
    }

    Ok(())
}
