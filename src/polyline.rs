//! Polyline of the tour path for the map collaborator.
//!
//! Travel is estimated as straight great-circle legs, so the path is simply
//! the visited stops in order. Encoding to a compact polyline string is left
//! to the consumer.

use serde::{Deserialize, Serialize};

use crate::haversine::haversine_km;
use crate::model::Coordinates;

/// Decoded `(lat, lng)` points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn through<'a>(stops: impl IntoIterator<Item = &'a Coordinates>) -> Self {
        Self::new(stops.into_iter().map(Coordinates::as_tuple).collect())
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Great-circle length of all legs in kilometers.
    pub fn length_km(&self) -> f64 {
        self.points
            .windows(2)
            .map(|leg| haversine_km(leg[0], leg[1]))
            .sum()
    }
}
