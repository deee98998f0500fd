//! Haversine travel matrix.
//!
//! Uses great-circle distance to estimate travel time at a fixed average
//! speed. This is an approximation: it ignores roads and traffic entirely.

use crate::traits::{TravelMatrix, TravelMatrixProvider};

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Average city travel speed in km/h, used when none is configured.
pub const DEFAULT_SPEED_KMH: f64 = 30.0;

/// Great-circle distance between two `(lat, lng)` points in kilometers.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Haversine-based travel matrix provider.
///
/// Computes each unordered pair once and mirrors it, so the result is
/// symmetric with a zero diagonal.
#[derive(Debug, Clone)]
pub struct HaversineMatrix {
    /// Assumed average travel speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineMatrix {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Convert distance in km to whole travel minutes.
    pub fn km_to_minutes(&self, km: f64) -> u32 {
        let hours = km / self.speed_kmh;
        (hours * 60.0).round() as u32
    }
}

impl TravelMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> TravelMatrix {
        let n = locations.len();
        let mut distance = vec![vec![0.0; n]; n];
        let mut minutes = vec![vec![0; n]; n];

        for i in 0..n {
            for j in i + 1..n {
                let km = haversine_km(locations[i], locations[j]);
                let mins = self.km_to_minutes(km);
                distance[i][j] = km;
                distance[j][i] = km;
                minutes[i][j] = mins;
                minutes[j][i] = mins;
            }
        }

        TravelMatrix::new(distance, minutes)
    }
}
