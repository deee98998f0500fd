//! Engine configuration.
//!
//! Every tunable constant of the planner lives here with a documented default.
//! Configuration can be built in code with the `with_*` setters or loaded from
//! TOML; missing keys fall back to the defaults.
//!
//! ```toml
//! average_speed_kmh = 25.0
//!
//! [genetic]
//! seed = 7
//! time_limit_ms = 500
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::haversine::DEFAULT_SPEED_KMH;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Assumed average travel speed in km/h. Converts haversine distance to
    /// travel minutes.
    pub average_speed_kmh: f64,
    pub efficiency: EfficiencyFormula,
    pub limits: TierLimits,
    pub scoring: ScoringConfig,
    pub genetic: GeneticConfig,
    pub branch_bound: BranchBoundConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            average_speed_kmh: DEFAULT_SPEED_KMH,
            efficiency: EfficiencyFormula::default(),
            limits: TierLimits::default(),
            scoring: ScoringConfig::default(),
            genetic: GeneticConfig::default(),
            branch_bound: BranchBoundConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_speed_kmh(mut self, speed: f64) -> Self {
        self.average_speed_kmh = speed;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.genetic.seed = Some(seed);
        self
    }

    pub fn with_genetic(mut self, genetic: GeneticConfig) -> Self {
        self.genetic = genetic;
        self
    }

    pub fn with_limits(mut self, limits: TierLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_efficiency(mut self, efficiency: EfficiencyFormula) -> Self {
        self.efficiency = efficiency;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.average_speed_kmh.is_finite() && self.average_speed_kmh > 0.0) {
            return Err(invalid("average_speed_kmh", "must be a positive number"));
        }
        let eff = &self.efficiency;
        if !(eff.visit_ratio_weight >= 0.0 && eff.time_utilization_weight >= 0.0) {
            return Err(invalid("efficiency", "weights must be non-negative"));
        }
        let limits = &self.limits;
        if limits.min_places == 0 || limits.min_places > limits.max_places {
            return Err(invalid("limits", "min_places must be in 1..=max_places"));
        }
        if limits.optimal > limits.balanced {
            return Err(invalid("limits", "optimal limit must not exceed balanced"));
        }
        if !(self.scoring.skip_penalty > 0.0 && self.scoring.overflow_penalty_per_minute >= 0.0) {
            return Err(invalid("scoring", "penalties must be positive"));
        }
        let ga = &self.genetic;
        if ga.population_size < 2 {
            return Err(invalid("genetic.population_size", "must be at least 2"));
        }
        if ga.elite_count == 0 || ga.elite_count >= ga.population_size {
            return Err(invalid(
                "genetic.elite_count",
                "must be in 1..population_size",
            ));
        }
        if ga.tournament_size == 0 {
            return Err(invalid("genetic.tournament_size", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&ga.crossover_rate) || !(0.0..=1.0).contains(&ga.mutation_rate) {
            return Err(invalid("genetic", "rates must be within 0..=1"));
        }
        if self.branch_bound.max_nodes == 0 {
            return Err(invalid("branch_bound.max_nodes", "must be positive"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

/// `efficiency% = round(100 * (visit_ratio_weight * visited / total
///                 + time_utilization_weight * visit_time / time_available))`,
/// clamped to 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EfficiencyFormula {
    pub visit_ratio_weight: f64,
    pub time_utilization_weight: f64,
}

impl Default for EfficiencyFormula {
    fn default() -> Self {
        Self {
            visit_ratio_weight: 0.5,
            time_utilization_weight: 0.5,
        }
    }
}

impl EfficiencyFormula {
    pub fn percent(
        &self,
        visited: usize,
        total: usize,
        visit_minutes: u32,
        available_minutes: u32,
    ) -> u32 {
        let visit_ratio = if total == 0 {
            0.0
        } else {
            visited as f64 / total as f64
        };
        let utilization = if available_minutes == 0 {
            0.0
        } else {
            f64::from(visit_minutes) / f64::from(available_minutes)
        };
        let raw = 100.0
            * (self.visit_ratio_weight * visit_ratio + self.time_utilization_weight * utilization);
        raw.round().clamp(0.0, 100.0) as u32
    }
}

/// Place-count bounds for input validation and tier selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierLimits {
    pub min_places: usize,
    pub max_places: usize,
    pub balanced: usize,
    pub optimal: usize,
}

impl Default for TierLimits {
    fn default() -> Self {
        Self {
            min_places: 2,
            max_places: 20,
            balanced: 20,
            optimal: 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Subtracted per skipped place. Must exceed the largest possible
    /// weighted sum (1.0) so feasible routes outrank infeasible ones.
    pub skip_penalty: f64,
    /// Subtracted per minute beyond the time budget.
    pub overflow_penalty_per_minute: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            skip_penalty: 10.0,
            overflow_penalty_per_minute: 0.1,
        }
    }
}

/// Parameters for the balanced tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub population_size: usize,
    pub max_generations: usize,
    /// Stop after this many generations without a new best. 0 disables.
    pub stagnation_limit: usize,
    pub tournament_size: usize,
    /// Individuals copied unchanged into the next generation. At least 1.
    pub elite_count: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    /// `None` draws a fresh seed per run.
    pub seed: Option<u64>,
    /// Wall-clock limit, checked between generations.
    pub time_limit_ms: u64,
    /// Evaluate each generation on the rayon pool.
    pub parallel: bool,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 60,
            max_generations: 300,
            stagnation_limit: 40,
            tournament_size: 3,
            elite_count: 2,
            crossover_rate: 0.9,
            mutation_rate: 0.3,
            seed: None,
            time_limit_ms: 2_000,
            parallel: true,
        }
    }
}

impl GeneticConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    pub fn with_stagnation_limit(mut self, n: usize) -> Self {
        self.stagnation_limit = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Parameters for the optimal tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchBoundConfig {
    /// Search nodes expanded before giving up on a proof of optimality and
    /// returning the incumbent.
    pub max_nodes: u64,
    /// Local search passes over the greedy order before the search starts.
    pub local_search_iterations: usize,
}

impl Default for BranchBoundConfig {
    fn default() -> Self {
        Self {
            max_nodes: 5_000_000,
            local_search_iterations: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haversine::HaversineMatrix;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_speed_matches_matrix_default() {
        let config = EngineConfig::default();
        assert_eq!(config.average_speed_kmh, HaversineMatrix::default().speed_kmh);
        assert_eq!(config.branch_bound.local_search_iterations, 100);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            average_speed_kmh = 25.0

            [genetic]
            seed = 7
            time_limit_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.average_speed_kmh, 25.0);
        assert_eq!(config.genetic.seed, Some(7));
        assert_eq!(config.genetic.time_limit_ms, 500);
        assert_eq!(config.genetic.population_size, 60);
        assert_eq!(config.limits, TierLimits::default());
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = EngineConfig::from_toml_str("average_speed_kmh = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "average_speed_kmh", .. }));

        let err = EngineConfig::from_toml_str("[genetic]\nelite_count = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = EngineConfig::from_toml_str("average_speed_kmh = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_efficiency_formula() {
        let formula = EfficiencyFormula::default();
        // 3 of 4 visited, 240 of 480 minutes used: 100 * (0.375 + 0.25)
        assert_eq!(formula.percent(3, 4, 240, 480), 63);
        assert_eq!(formula.percent(0, 4, 0, 480), 0);
        assert_eq!(formula.percent(4, 4, 480, 480), 100);
        assert_eq!(formula.percent(4, 4, 900, 480), 100);
    }
}
