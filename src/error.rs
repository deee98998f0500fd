//! Error types for the planner.
//!
//! Only [`InputError`] crosses the `optimize()` boundary. Strategy faults are
//! absorbed by the orchestrator's fallback chain.

use thiserror::Error;

/// Rejected input. Raised before any computation happens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("at least {min} places are required, got {count}")]
    TooFewPlaces { count: usize, min: usize },

    #[error("at most {max} places are supported, got {count}")]
    TooManyPlaces { count: usize, max: usize },

    #[error("place '{id}' has invalid coordinates ({lat}, {lng})")]
    InvalidCoordinates { id: String, lat: f64, lng: f64 },

    #[error("place '{id}' must have a positive visit duration")]
    NonPositiveDuration { id: String },

    #[error("place '{id}' has a visit longer than {max} minutes")]
    VisitTooLong { id: String, max: u32 },

    #[error("place '{id}' has rating {rating}, expected 0 to 5")]
    InvalidRating { id: String, rating: f64 },

    #[error("place '{id}' has a negative or non-finite entry fee")]
    InvalidFee { id: String },

    #[error("place '{id}' appears more than once")]
    DuplicatePlace { id: String },

    #[error("total time available must be positive")]
    NonPositiveTimeBudget,

    #[error("total time available must not exceed {max} minutes")]
    TimeBudgetTooLong { max: u32 },

    #[error("budget must be a non-negative number")]
    InvalidBudget,

    #[error("preference weight '{name}' must be a non-negative number")]
    InvalidWeight { name: &'static str },

    #[error("invalid time of day '{0}', expected HH:MM")]
    InvalidClockTime(String),

    #[error("invalid opening hours '{0}'")]
    InvalidOpeningHours(String),

    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

/// Fault inside a search strategy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("strategy produced an ordering that is not a permutation of {expected} places")]
    MalformedOrdering { expected: usize },

    #[error("strategy {strategy} found no candidate ordering")]
    NoCandidate { strategy: &'static str },
}

/// Invalid engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}
