//! Real Coimbatore sightseeing spots for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap. Visit durations, ratings, fees,
//! and opening hours are representative, not authoritative.

use tour_planner::model::{Place, StartLocation};
use tour_planner::ClockTime;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    pub fn start(&self) -> StartLocation {
        StartLocation::new(self.name, self.lat, self.lng)
    }

    pub fn place(&self, id: &str) -> Place {
        Place::new(id, self.name, self.lat, self.lng)
    }
}

// ============================================================================
// Start locations
// ============================================================================

/// Peelamedu, near the airport road.
pub const PEELAMEDU: Location = Location::new("Peelamedu", 11.0638, 77.0596);

pub const GANDHIPURAM_BUS_STAND: Location = Location::new("Gandhipuram Bus Stand", 11.0183, 76.9674);

// ============================================================================
// Temples
// ============================================================================

pub const TEMPLES: &[Location] = &[
    Location::new("Marudhamalai Murugan Temple", 11.0462, 76.8517),
    Location::new("Perur Pateeswarar Temple", 10.9757, 76.9141),
    Location::new("Eachanari Vinayagar Temple", 10.9260, 76.9830),
    Location::new("Adiyogi Shiva Statue", 10.9724, 76.7370),
];

// ============================================================================
// Museums and parks
// ============================================================================

pub const MUSEUMS_AND_PARKS: &[Location] = &[
    Location::new("Gass Forest Museum", 11.0183, 76.9366),
    Location::new("GD Naidu Museum", 11.0350, 77.0380),
    Location::new("VOC Park and Zoo", 11.0043, 76.9616),
    Location::new("Race Course Walk", 11.0005, 76.9760),
    Location::new("Kovai Kondattam", 10.9398, 76.8705),
];

// ============================================================================
// Lakes and falls
// ============================================================================

pub const LAKES: &[Location] = &[
    Location::new("Valankulam Lake", 10.9939, 76.9744),
    Location::new("Ukkadam Big Tank", 10.9877, 76.9590),
    Location::new("Kovai Kutralam Falls", 10.9435, 76.6874),
];

/// Every attraction above, in a fixed order.
pub fn all_locations() -> Vec<Location> {
    TEMPLES
        .iter()
        .chain(MUSEUMS_AND_PARKS)
        .chain(LAKES)
        .cloned()
        .collect()
}

/// Fully attributed places for the city tour scenarios.
pub fn city_tour() -> Vec<Place> {
    vec![
        TEMPLES[0]
            .place("marudhamalai")
            .with_category("temple")
            .with_duration(90)
            .with_rating(4.7)
            .with_window(ClockTime::hm(6, 0), ClockTime::hm(20, 0))
            .with_accessibility(false, true),
        TEMPLES[1]
            .place("perur")
            .with_category("temple")
            .with_duration(60)
            .with_rating(4.6)
            .with_window(ClockTime::hm(6, 0), ClockTime::hm(13, 0)),
        MUSEUMS_AND_PARKS[0]
            .place("gass-museum")
            .with_category("museum")
            .with_duration(60)
            .with_rating(4.2)
            .with_fee(20.0, 100.0)
            .with_window(ClockTime::hm(10, 0), ClockTime::hm(17, 0))
            .with_accessibility(true, true),
        MUSEUMS_AND_PARKS[2]
            .place("voc-park")
            .with_category("park")
            .with_duration(75)
            .with_rating(3.9)
            .with_fee(30.0, 30.0)
            .with_window(ClockTime::hm(9, 0), ClockTime::hm(18, 0))
            .with_accessibility(true, true),
        LAKES[0]
            .place("valankulam")
            .with_category("lake")
            .with_duration(45)
            .with_rating(4.3)
            .with_accessibility(true, true),
        MUSEUMS_AND_PARKS[1]
            .place("gd-naidu")
            .with_category("museum")
            .with_duration(60)
            .with_rating(4.4)
            .with_fee(50.0, 200.0)
            .with_window(ClockTime::hm(9, 0), ClockTime::hm(17, 30))
            .with_accessibility(true, false),
    ]
}
