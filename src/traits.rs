//! Seams between the orchestrator and its collaborators.
//!
//! Travel estimation and search strategies are both pluggable: the default
//! travel provider is [`HaversineMatrix`](crate::haversine::HaversineMatrix),
//! and each optimization tier is one [`RouteStrategy`].

use crate::context::PlanContext;
use crate::error::StrategyError;

/// Pairwise travel distance and time between points.
///
/// Row/column order follows the `locations` slice handed to
/// [`TravelMatrixProvider::matrix_for`]. The planner always passes the start
/// location first, then the candidate places in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelMatrix {
    distance_km: Vec<Vec<f64>>,
    minutes: Vec<Vec<u32>>,
}

impl TravelMatrix {
    /// Builds a matrix from square distance and time tables of equal size.
    pub fn new(distance_km: Vec<Vec<f64>>, minutes: Vec<Vec<u32>>) -> Self {
        debug_assert_eq!(distance_km.len(), minutes.len());
        Self {
            distance_km,
            minutes,
        }
    }

    /// Number of points (start included).
    pub fn len(&self) -> usize {
        self.distance_km.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distance_km.is_empty()
    }

    pub fn distance_km(&self, from: usize, to: usize) -> f64 {
        self.distance_km[from][to]
    }

    pub fn minutes(&self, from: usize, to: usize) -> u32 {
        self.minutes[from][to]
    }

    /// Whether the tables are square and match `expected` points.
    pub fn is_square(&self, expected: usize) -> bool {
        self.distance_km.len() == expected
            && self.minutes.len() == expected
            && self.distance_km.iter().all(|row| row.len() == expected)
            && self.minutes.iter().all(|row| row.len() == expected)
    }
}

/// Provides a travel matrix for a set of `(lat, lng)` locations.
pub trait TravelMatrixProvider {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> TravelMatrix;
}

/// Result of a strategy run: a visiting order over place indices.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Permutation of `0..places.len()`.
    pub order: Vec<usize>,
    /// The search finished and its answer is optimal for the score function.
    pub proven_optimal: bool,
}

impl SearchOutcome {
    pub fn heuristic(order: Vec<usize>) -> Self {
        Self {
            order,
            proven_optimal: false,
        }
    }
}

/// One optimization tier.
pub trait RouteStrategy {
    fn name(&self) -> &'static str;

    fn search(&self, ctx: &PlanContext<'_>) -> Result<SearchOutcome, StrategyError>;
}

/// Whether `order` contains every index of `0..n` exactly once.
pub fn is_permutation(order: &[usize], n: usize) -> bool {
    if order.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &idx in order {
        if idx >= n || seen[idx] {
            return false;
        }
        seen[idx] = true;
    }
    true
}
