//! Forward time simulation of a visiting order.
//!
//! The simulator walks an ordering from the start location, assigning arrival
//! and departure times and deciding which places must be skipped. Skipping
//! never aborts the walk: later places are still attempted in order.
//!
//! Skip policy: travel to a skipped place is still charged. The clock advances
//! to the arrival time and the traveller continues from the skipped place, so
//! the next leg is measured from where they actually are. No visit time or
//! entry fee is charged for the skipped place.

use crate::clock::ClockTime;
use crate::model::{Place, RouteSettings, SkipReason};
use crate::traits::TravelMatrix;

/// Matrix row of the start location.
pub const START_NODE: usize = 0;

/// Matrix row of the place at `place` index.
pub const fn node_of(place: usize) -> usize {
    place + 1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Visited,
    Skipped(SkipReason),
}

impl StepOutcome {
    pub fn is_visited(self) -> bool {
        matches!(self, StepOutcome::Visited)
    }
}

/// Trace entry for one place.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub place: usize,
    pub arrival: ClockTime,
    pub wait: u32,
    pub departure: ClockTime,
    /// Travel from the previous stop (or the start).
    pub travel_minutes: u32,
    pub travel_km: f64,
    pub outcome: StepOutcome,
}

/// Running totals of a (partial) route.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub travel_minutes: u32,
    pub visit_minutes: u32,
    pub wait_minutes: u32,
    pub cost: f64,
    pub rating_sum: f64,
    pub visited: usize,
    pub skipped: usize,
    /// Visited places meeting the party's accessibility needs.
    pub accessible_visited: usize,
    /// Clock minutes past the time budget.
    pub overflow_minutes: u32,
}

impl RouteSummary {
    /// Travel plus visit minutes.
    pub fn total_minutes(&self) -> u32 {
        self.travel_minutes.saturating_add(self.visit_minutes)
    }

    pub fn average_rating(&self) -> f64 {
        if self.visited == 0 {
            0.0
        } else {
            self.rating_sum / self.visited as f64
        }
    }

    pub fn accessibility_ratio(&self) -> f64 {
        if self.visited == 0 {
            0.0
        } else {
            self.accessible_visited as f64 / self.visited as f64
        }
    }
}

/// Where the walk currently stands.
#[derive(Debug, Clone)]
pub struct SimState {
    clock: ClockTime,
    node: usize,
    summary: RouteSummary,
    steps: Option<Vec<StepRecord>>,
}

impl SimState {
    pub fn clock(&self) -> ClockTime {
        self.clock
    }

    /// Matrix row of the traveller's position.
    pub fn node(&self) -> usize {
        self.node
    }

    pub fn summary(&self) -> &RouteSummary {
        &self.summary
    }
}

/// What would happen if `place` were attempted next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    pub place: usize,
    pub outcome: StepOutcome,
    pub travel_minutes: u32,
    pub travel_km: f64,
    pub arrival: ClockTime,
    pub wait: u32,
    pub fee: f64,
}

/// Completed simulation of a full ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub order: Vec<usize>,
    pub steps: Vec<StepRecord>,
    pub summary: RouteSummary,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

impl Simulation {
    /// No place skipped and the budget respected.
    pub fn is_feasible(&self, settings: &RouteSettings) -> bool {
        self.summary.skipped == 0
            && self.summary.overflow_minutes == 0
            && self.summary.total_minutes() <= settings.total_time_available
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Simulator<'a> {
    places: &'a [Place],
    matrix: &'a TravelMatrix,
    settings: &'a RouteSettings,
}

impl<'a> Simulator<'a> {
    pub fn new(places: &'a [Place], matrix: &'a TravelMatrix, settings: &'a RouteSettings) -> Self {
        Self {
            places,
            matrix,
            settings,
        }
    }

    /// Fresh state at the start location, recording a step trace.
    pub fn begin(&self) -> SimState {
        SimState {
            clock: self.settings.start_time,
            node: START_NODE,
            summary: RouteSummary::default(),
            steps: Some(Vec::with_capacity(self.places.len())),
        }
    }

    /// Fresh state without a trace. Cheap to clone during search.
    pub fn begin_untraced(&self) -> SimState {
        SimState {
            steps: None,
            ..self.begin()
        }
    }

    pub fn probe(&self, state: &SimState, place: usize) -> Probe {
        let to = node_of(place);
        let travel_minutes = self.matrix.minutes(state.node, to);
        let travel_km = self.matrix.distance_km(state.node, to);
        let arrival = state.clock.plus(travel_minutes);
        let fee = self.fee(place);

        let (outcome, wait) = match self.visit_at(place, arrival, state.summary.cost) {
            Ok(start) => (StepOutcome::Visited, start.since(arrival)),
            Err(reason) => (StepOutcome::Skipped(reason), 0),
        };

        Probe {
            place,
            outcome,
            travel_minutes,
            travel_km,
            arrival,
            wait,
            fee,
        }
    }

    /// Entry fee of `place` for the party's fee category.
    pub fn fee(&self, place: usize) -> f64 {
        self.places[place]
            .entry_fee
            .for_category(self.settings.constraints.fee_category)
    }

    /// When a visit to `place` would start on arrival at `arrival` with
    /// `spent` already paid in fees, or why it must be skipped.
    ///
    /// Checks run in order: closed day, opening window, time budget, fee
    /// budget. Arriving later or having spent more never turns a skip into a
    /// visit.
    pub fn visit_at(
        &self,
        place: usize,
        arrival: ClockTime,
        spent: f64,
    ) -> Result<ClockTime, SkipReason> {
        let target = &self.places[place];
        let duration = target.average_visit_duration;

        if let Some(day) = self.settings.start_day {
            if target.closed_days.contains(&day) {
                return Err(SkipReason::ClosedToday);
            }
        }

        let start = match target.opening_window {
            Some(window) => window
                .visit_start(arrival, duration)
                .ok_or(SkipReason::ClosedOnArrival)?,
            None => arrival,
        };

        if start.plus(duration) > self.settings.deadline() {
            return Err(SkipReason::ExceedsTimeBudget);
        }

        if let Some(budget) = self.settings.constraints.budget {
            if spent + self.fee(place) > budget + f64::EPSILON {
                return Err(SkipReason::ExceedsBudget);
            }
        }

        Ok(start)
    }

    /// Attempt `place` next and move the traveller there.
    pub fn advance(&self, state: &mut SimState, place: usize) -> StepOutcome {
        let probe = self.probe(state, place);
        let target = &self.places[place];
        let summary = &mut state.summary;

        summary.distance_km += probe.travel_km;
        summary.travel_minutes = summary.travel_minutes.saturating_add(probe.travel_minutes);

        let departure = match probe.outcome {
            StepOutcome::Visited => {
                let duration = target.average_visit_duration;
                summary.visit_minutes = summary.visit_minutes.saturating_add(duration);
                summary.wait_minutes = summary.wait_minutes.saturating_add(probe.wait);
                summary.cost += probe.fee;
                summary.rating_sum += target.rating;
                summary.visited += 1;
                if target.meets(&self.settings.constraints.accessibility) {
                    summary.accessible_visited += 1;
                }
                probe.arrival.plus(probe.wait).plus(duration)
            }
            StepOutcome::Skipped(_) => {
                summary.skipped += 1;
                probe.arrival
            }
        };

        state.clock = departure;
        state.node = node_of(place);
        summary.overflow_minutes = departure.since(self.settings.deadline());

        if let Some(steps) = state.steps.as_mut() {
            steps.push(StepRecord {
                place,
                arrival: probe.arrival,
                wait: probe.wait,
                departure,
                travel_minutes: probe.travel_minutes,
                travel_km: probe.travel_km,
                outcome: probe.outcome,
            });
        }

        probe.outcome
    }

    /// Walk the whole ordering.
    pub fn simulate(&self, order: &[usize]) -> Simulation {
        let mut state = self.begin();
        for &place in order {
            self.advance(&mut state, place);
        }
        Simulation {
            order: order.to_vec(),
            steps: state.steps.unwrap_or_default(),
            summary: state.summary,
            start_time: self.settings.start_time,
            end_time: state.clock,
        }
    }

    /// Totals only, without building a trace.
    pub fn summarize(&self, order: &[usize]) -> RouteSummary {
        let mut state = self.begin_untraced();
        for &place in order {
            self.advance(&mut state, place);
        }
        state.summary
    }
}
