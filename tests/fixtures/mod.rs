//! Test fixtures for tour-planner.
//!
//! Provides realistic test data including:
//! - Real Coimbatore attractions (coordinates from OpenStreetMap)
//! - A predictable grid travel matrix for exact timing assertions

#![allow(dead_code)]

pub mod coimbatore_places;

pub use coimbatore_places::*;

use tour_planner::traits::{TravelMatrix, TravelMatrixProvider};

/// Manhattan distance on raw degrees: 1 degree = 60 minutes = 30 km.
///
/// Simple and predictable, so tests can compute expected times by hand.
pub struct GridMatrix;

impl TravelMatrixProvider for GridMatrix {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> TravelMatrix {
        let n = locations.len();
        let mut km = vec![vec![0.0; n]; n];
        let mut minutes = vec![vec![0; n]; n];
        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                let dist = (from.0 - to.0).abs() + (from.1 - to.1).abs();
                km[i][j] = dist * 30.0;
                minutes[i][j] = (dist * 60.0).round() as u32;
            }
        }
        TravelMatrix::new(km, minutes)
    }
}

/// Installs a test-writer subscriber so `tracing` output shows on failure.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
