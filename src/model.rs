//! Planner data model: places, settings, and the stops/metrics we emit.
//!
//! All values are plain immutable records. Inputs are supplied by the caller
//! (normally via the catalog collaborator), outputs are created fresh on every
//! `optimize()` call.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::clock::ClockTime;
use crate::config::TierLimits;

/// WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub const fn as_tuple(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// Entry fee by visitor category.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EntryFee {
    pub indian: f64,
    pub foreign: f64,
}

impl EntryFee {
    pub fn for_category(&self, category: FeeCategory) -> f64 {
        match category {
            FeeCategory::Domestic => self.indian,
            FeeCategory::Foreign => self.foreign,
        }
    }
}

/// Daily opening hours. A `close` at or before `open` means the place closes
/// after midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningWindow {
    pub open: ClockTime,
    pub close: ClockTime,
}

impl OpeningWindow {
    pub const fn new(open: ClockTime, close: ClockTime) -> Self {
        Self { open, close }
    }

    pub fn is_overnight(&self) -> bool {
        self.close <= self.open
    }

    /// Closing time on the same timeline as `open`.
    pub fn effective_close(&self) -> ClockTime {
        if self.is_overnight() {
            self.close.plus(24 * 60)
        } else {
            self.close
        }
    }

    /// Earliest time a visit of `duration` minutes can start when arriving at
    /// `arrival`, or `None` if it cannot finish before closing.
    ///
    /// An overnight window is also open from midnight until `close`, left over
    /// from the previous evening. A later arrival never yields an earlier start.
    pub fn visit_start(&self, arrival: ClockTime, duration: u32) -> Option<ClockTime> {
        if self.is_overnight() && arrival.plus(duration) <= self.close {
            return Some(arrival);
        }
        let start = arrival.max(self.open);
        (start.plus(duration) <= self.effective_close()).then_some(start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessibility {
    pub wheelchair: bool,
    pub kid_friendly: bool,
}

/// A candidate sightseeing place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub coordinates: Coordinates,
    /// Minutes spent at the place.
    pub average_visit_duration: u32,
    /// 0 to 5.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub entry_fee: EntryFee,
    /// `None` means always open.
    #[serde(default)]
    pub opening_window: Option<OpeningWindow>,
    #[serde(default)]
    pub closed_days: Vec<Weekday>,
    #[serde(default)]
    pub accessibility: Accessibility,
}

impl Place {
    /// A place with a 60 minute visit and no other attributes.
    pub fn new(id: impl Into<String>, name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            coordinates: Coordinates::new(lat, lng),
            average_visit_duration: 60,
            rating: 0.0,
            entry_fee: EntryFee::default(),
            opening_window: None,
            closed_days: Vec::new(),
            accessibility: Accessibility::default(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.average_visit_duration = minutes;
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_fee(mut self, indian: f64, foreign: f64) -> Self {
        self.entry_fee = EntryFee { indian, foreign };
        self
    }

    pub fn with_window(mut self, open: ClockTime, close: ClockTime) -> Self {
        self.opening_window = Some(OpeningWindow::new(open, close));
        self
    }

    pub fn closed_on(mut self, day: Weekday) -> Self {
        self.closed_days.push(day);
        self
    }

    pub fn with_accessibility(mut self, wheelchair: bool, kid_friendly: bool) -> Self {
        self.accessibility = Accessibility {
            wheelchair,
            kid_friendly,
        };
        self
    }

    /// Whether this place satisfies every requested accessibility need.
    pub fn meets(&self, needs: &Accessibility) -> bool {
        (!needs.wheelchair || self.accessibility.wheelchair)
            && (!needs.kid_friendly || self.accessibility.kid_friendly)
    }
}

/// Where the tour begins. Always stop 0, never visited for any duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartLocation {
    #[serde(default = "StartLocation::default_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub coordinates: Coordinates,
}

impl StartLocation {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: Self::default_id(),
            name: name.into(),
            coordinates: Coordinates::new(lat, lng),
        }
    }

    fn default_id() -> String {
        "start".to_string()
    }
}

/// Search tier, trading runtime for solution quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    Fast,
    #[default]
    Balanced,
    Optimal,
}

impl OptimizationLevel {
    pub const fn name(self) -> &'static str {
        match self {
            OptimizationLevel::Fast => "fast",
            OptimizationLevel::Balanced => "balanced",
            OptimizationLevel::Optimal => "optimal",
        }
    }

    /// Largest place count this tier accepts. `None` for the fast tier,
    /// which is the fallback and runs for any accepted input.
    pub fn place_limit(self, limits: &TierLimits) -> Option<usize> {
        match self {
            OptimizationLevel::Fast => None,
            OptimizationLevel::Balanced => Some(limits.balanced),
            OptimizationLevel::Optimal => Some(limits.optimal),
        }
    }

    /// Next tier down the optimal → balanced → fast chain.
    pub const fn downgrade(self) -> Option<OptimizationLevel> {
        match self {
            OptimizationLevel::Optimal => Some(OptimizationLevel::Balanced),
            OptimizationLevel::Balanced => Some(OptimizationLevel::Fast),
            OptimizationLevel::Fast => None,
        }
    }
}

/// Relative objective weights. They need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferenceWeights {
    pub rating_weight: f64,
    pub distance_weight: f64,
    pub time_weight: f64,
    pub cost_weight: f64,
    pub accessibility_weight: f64,
}

impl Default for PreferenceWeights {
    fn default() -> Self {
        Self {
            rating_weight: 0.4,
            distance_weight: 0.2,
            time_weight: 0.2,
            cost_weight: 0.1,
            accessibility_weight: 0.1,
        }
    }
}

impl PreferenceWeights {
    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("ratingWeight", self.rating_weight),
            ("distanceWeight", self.distance_weight),
            ("timeWeight", self.time_weight),
            ("costWeight", self.cost_weight),
            ("accessibilityWeight", self.accessibility_weight),
        ]
    }

    pub fn total(&self) -> f64 {
        self.named().iter().map(|(_, w)| w).sum()
    }
}

/// Which entry fee column applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeCategory {
    #[default]
    Domestic,
    Foreign,
}

/// Hard and soft constraints on the tour.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteConstraints {
    /// Spending ceiling for entry fees. `None` is unlimited.
    pub budget: Option<f64>,
    pub fee_category: FeeCategory,
    /// Accessibility needs of the party, scored as a match ratio.
    pub accessibility: Accessibility,
}

/// Longest time budget or single visit accepted, in minutes (one week).
pub const MAX_SPAN_MINUTES: u32 = 7 * 24 * 60;

/// Everything the caller controls about a single optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSettings {
    pub start_time: ClockTime,
    /// Minutes.
    pub total_time_available: u32,
    #[serde(default)]
    pub start_day: Option<Weekday>,
    #[serde(default)]
    pub optimization_level: OptimizationLevel,
    #[serde(default)]
    pub weights: PreferenceWeights,
    #[serde(default)]
    pub constraints: RouteConstraints,
}

impl RouteSettings {
    pub fn new(start_time: ClockTime, total_time_available: u32) -> Self {
        Self {
            start_time,
            total_time_available,
            start_day: None,
            optimization_level: OptimizationLevel::default(),
            weights: PreferenceWeights::default(),
            constraints: RouteConstraints::default(),
        }
    }

    pub fn with_level(mut self, level: OptimizationLevel) -> Self {
        self.optimization_level = level;
        self
    }

    pub fn with_weights(mut self, weights: PreferenceWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.constraints.budget = Some(budget);
        self
    }

    pub fn with_start_day(mut self, day: Weekday) -> Self {
        self.start_day = Some(day);
        self
    }

    pub fn with_accessibility(mut self, needs: Accessibility) -> Self {
        self.constraints.accessibility = needs;
        self
    }

    /// Latest clock time by which every visit must be finished.
    pub fn deadline(&self) -> ClockTime {
        self.start_time.plus(self.total_time_available)
    }
}

/// Why a place was left out of the tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// The place would close before the visit could finish.
    ClosedOnArrival,
    /// The place does not open on the tour day.
    ClosedToday,
    /// Visiting would overrun the total time available.
    ExceedsTimeBudget,
    /// The entry fee would overrun the spending ceiling.
    ExceedsBudget,
}

/// One entry of the produced route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub order: usize,
    pub place_id: String,
    pub name: String,
    pub coordinates: Coordinates,
    pub arrival_time: ClockTime,
    /// Minutes spent waiting for the place to open.
    pub wait_time: u32,
    pub departure_time: ClockTime,
    pub visit_duration: u32,
    pub travel_time_to_next: u32,
    pub travel_distance_to_next: f64,
    pub visited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
}

/// Aggregate figures for a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Kilometres.
    pub total_distance: f64,
    pub total_travel_time: u32,
    pub total_visit_time: u32,
    pub total_wait_time: u32,
    /// Travel plus visit minutes.
    pub total_time: u32,
    pub total_cost: f64,
    pub average_rating: f64,
    /// Percentage, 0 to 100.
    pub efficiency: u32,
    pub estimated_end_time: ClockTime,
    pub places_visited: usize,
    pub places_skipped: usize,
    pub feasible: bool,
}
