//! tour-planner: sightseeing route optimization engine.
//!
//! Orders a set of candidate places into a time-stamped, feasible itinerary
//! that scores well against weighted preferences. Travel time is a haversine
//! estimate at a configurable average speed, not real routing.
//!
//! Three interchangeable tiers: greedy construction (`fast`), a genetic
//! algorithm (`balanced`), and branch-and-bound (`optimal`).

pub mod branch_bound;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod context;
pub mod contract;
pub mod error;
pub mod genetic;
pub mod greedy;
pub mod haversine;
pub mod itinerary;
pub mod local_search;
pub mod model;
pub mod polyline;
pub mod score;
pub mod simulator;
pub mod solver;
pub mod traits;

pub use clock::ClockTime;
pub use config::EngineConfig;
pub use error::{ConfigError, InputError};
pub use itinerary::OptimizedRoute;
pub use model::{OptimizationLevel, Place, RouteSettings, StartLocation};
pub use solver::{Optimizer, optimize};
