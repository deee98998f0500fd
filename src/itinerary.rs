//! Turns a winning order and its simulation trace into the output contract.

use serde::{Deserialize, Serialize};

use crate::clock::ClockTime;
use crate::config::EfficiencyFormula;
use crate::model::{Metrics, OptimizationLevel, Place, RouteSettings, SkipReason, StartLocation, Stop};
use crate::polyline::Polyline;
use crate::simulator::{Simulation, StepOutcome};

/// Final answer of one `optimize()` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedRoute {
    /// Tier the caller asked for.
    pub requested: OptimizationLevel,
    /// Tier that produced this route, after any downgrade or fallback.
    pub algorithm: OptimizationLevel,
    pub route: Vec<Stop>,
    pub metrics: Metrics,
    pub itinerary: Itinerary,
    pub fitness: f64,
    pub proven_optimal: bool,
}

/// Human-facing view of the visited stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub start_name: String,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub entries: Vec<ItineraryEntry>,
    pub skipped: Vec<SkippedPlace>,
    pub path: Polyline,
    /// Great-circle length of `path`, rounded to 2 decimals.
    pub path_length_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryEntry {
    pub order: usize,
    pub place_id: String,
    pub name: String,
    pub category: String,
    pub arrive: ClockTime,
    pub depart: ClockTime,
    pub wait_minutes: u32,
    pub visit_minutes: u32,
    pub travel_minutes_from_previous: u32,
    pub distance_km_from_previous: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedPlace {
    pub place_id: String,
    pub name: String,
    pub reason: SkipReason,
}

/// How the route was found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunInfo {
    pub requested: OptimizationLevel,
    pub algorithm: OptimizationLevel,
    pub fitness: f64,
    pub proven_optimal: bool,
}

pub struct ItineraryBuilder<'a> {
    places: &'a [Place],
    start: &'a StartLocation,
    settings: &'a RouteSettings,
    efficiency: EfficiencyFormula,
}

impl<'a> ItineraryBuilder<'a> {
    pub fn new(
        places: &'a [Place],
        start: &'a StartLocation,
        settings: &'a RouteSettings,
        efficiency: EfficiencyFormula,
    ) -> Self {
        Self {
            places,
            start,
            settings,
            efficiency,
        }
    }

    pub fn build(&self, simulation: &Simulation, run: RunInfo) -> OptimizedRoute {
        let route = self.stops(simulation);
        let metrics = self.metrics(simulation);
        let itinerary = self.itinerary(simulation, &route);

        OptimizedRoute {
            requested: run.requested,
            algorithm: run.algorithm,
            route,
            metrics,
            itinerary,
            fitness: run.fitness,
            proven_optimal: run.proven_optimal,
        }
    }

    /// Stop 0 is the start location, followed by one stop per place.
    fn stops(&self, simulation: &Simulation) -> Vec<Stop> {
        let steps = &simulation.steps;
        let leg_after = |i: usize| {
            steps
                .get(i)
                .map(|s| (s.travel_minutes, round2(s.travel_km)))
                .unwrap_or((0, 0.0))
        };

        let (first_minutes, first_km) = leg_after(0);
        let mut stops = Vec::with_capacity(steps.len() + 1);
        stops.push(Stop {
            order: 0,
            place_id: self.start.id.clone(),
            name: self.start.name.clone(),
            coordinates: self.start.coordinates,
            arrival_time: simulation.start_time,
            wait_time: 0,
            departure_time: simulation.start_time,
            visit_duration: 0,
            travel_time_to_next: first_minutes,
            travel_distance_to_next: first_km,
            visited: true,
            skip_reason: None,
        });

        for (i, step) in steps.iter().enumerate() {
            let place = &self.places[step.place];
            let (next_minutes, next_km) = leg_after(i + 1);
            let (visited, skip_reason, visit_duration) = match step.outcome {
                StepOutcome::Visited => (true, None, place.average_visit_duration),
                StepOutcome::Skipped(reason) => (false, Some(reason), 0),
            };
            stops.push(Stop {
                order: i + 1,
                place_id: place.id.clone(),
                name: place.name.clone(),
                coordinates: place.coordinates,
                arrival_time: step.arrival,
                wait_time: step.wait,
                departure_time: step.departure,
                visit_duration,
                travel_time_to_next: next_minutes,
                travel_distance_to_next: next_km,
                visited,
                skip_reason,
            });
        }

        stops
    }

    fn metrics(&self, simulation: &Simulation) -> Metrics {
        let summary = &simulation.summary;
        Metrics {
            total_distance: round2(summary.distance_km),
            total_travel_time: summary.travel_minutes,
            total_visit_time: summary.visit_minutes,
            total_wait_time: summary.wait_minutes,
            total_time: summary.total_minutes(),
            total_cost: round2(summary.cost),
            average_rating: round2(summary.average_rating()),
            efficiency: self.efficiency.percent(
                summary.visited,
                self.places.len(),
                summary.visit_minutes,
                self.settings.total_time_available,
            ),
            estimated_end_time: simulation.end_time,
            places_visited: summary.visited,
            places_skipped: summary.skipped,
            feasible: simulation.is_feasible(self.settings),
        }
    }

    fn itinerary(&self, simulation: &Simulation, route: &[Stop]) -> Itinerary {
        let mut entries = Vec::new();
        let mut skipped = Vec::new();
        // Legs are charged from the previous physical position, including skipped stops.
        let mut pending_minutes = 0;
        let mut pending_km = 0.0;

        for (step, stop) in simulation.steps.iter().zip(route.iter().skip(1)) {
            let place = &self.places[step.place];
            pending_minutes = step.travel_minutes.saturating_add(pending_minutes);
            pending_km += step.travel_km;
            match step.outcome {
                StepOutcome::Visited => {
                    entries.push(ItineraryEntry {
                        order: entries.len() + 1,
                        place_id: place.id.clone(),
                        name: place.name.clone(),
                        category: place.category.clone(),
                        arrive: stop.arrival_time,
                        depart: stop.departure_time,
                        wait_minutes: stop.wait_time,
                        visit_minutes: stop.visit_duration,
                        travel_minutes_from_previous: pending_minutes,
                        distance_km_from_previous: round2(pending_km),
                    });
                    pending_minutes = 0;
                    pending_km = 0.0;
                }
                StepOutcome::Skipped(reason) => skipped.push(SkippedPlace {
                    place_id: place.id.clone(),
                    name: place.name.clone(),
                    reason,
                }),
            }
        }

        let path = Polyline::through(
            route
                .iter()
                .filter(|stop| stop.visited)
                .map(|stop| &stop.coordinates),
        );

        Itinerary {
            start_name: self.start.name.clone(),
            start_time: simulation.start_time,
            end_time: simulation.end_time,
            entries,
            skipped,
            path_length_km: round2(path.length_km()),
            path,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haversine::haversine_km;
    use crate::simulator::Simulator;
    use crate::traits::TravelMatrix;

    fn fixture() -> (Vec<Place>, StartLocation, TravelMatrix) {
        let places = vec![
            Place::new("a", "Temple", 11.01, 76.95).with_duration(60).with_rating(4.5),
            Place::new("b", "Museum", 11.02, 76.96)
                .with_duration(45)
                .with_rating(4.0)
                .with_window(ClockTime::hm(8, 0), ClockTime::hm(9, 15)),
            Place::new("c", "Lake", 11.03, 76.97).with_duration(30).with_rating(3.5),
        ];
        let start = StartLocation::new("Hotel", 11.0, 76.94);
        let km = vec![
            vec![0.0, 2.0, 4.0, 6.0],
            vec![2.0, 0.0, 2.0, 4.0],
            vec![4.0, 2.0, 0.0, 2.0],
            vec![6.0, 4.0, 2.0, 0.0],
        ];
        let minutes = vec![
            vec![0, 5, 10, 15],
            vec![5, 0, 5, 10],
            vec![10, 5, 0, 5],
            vec![15, 10, 5, 0],
        ];
        (places, start, TravelMatrix::new(km, minutes))
    }

    fn run() -> RunInfo {
        RunInfo {
            requested: OptimizationLevel::Fast,
            algorithm: OptimizationLevel::Fast,
            fitness: 0.5,
            proven_optimal: false,
        }
    }

    #[test]
    fn test_stops_are_sequential_and_chained() {
        let (places, start, matrix) = fixture();
        let settings = RouteSettings::new(ClockTime::hm(9, 0), 480);
        let sim = Simulator::new(&places, &matrix, &settings).simulate(&[0, 1, 2]);
        let out = ItineraryBuilder::new(&places, &start, &settings, EfficiencyFormula::default())
            .build(&sim, run());

        assert_eq!(out.route.len(), 4);
        for (i, stop) in out.route.iter().enumerate() {
            assert_eq!(stop.order, i);
        }
        for pair in out.route.windows(2) {
            assert!(
                pair[1].arrival_time.minutes()
                    >= pair[0].departure_time.minutes() + pair[0].travel_time_to_next
            );
        }
        assert_eq!(out.route[0].place_id, "start");
        assert_eq!(out.route[3].travel_time_to_next, 0);
    }

    #[test]
    fn test_skipped_place_reported() {
        let (places, start, matrix) = fixture();
        let settings = RouteSettings::new(ClockTime::hm(9, 0), 480);
        let sim = Simulator::new(&places, &matrix, &settings).simulate(&[0, 1, 2]);
        let out = ItineraryBuilder::new(&places, &start, &settings, EfficiencyFormula::default())
            .build(&sim, run());

        // Museum closes at 09:15, the temple visit ends at 10:05.
        assert!(!out.route[2].visited);
        assert_eq!(out.route[2].skip_reason, Some(SkipReason::ClosedOnArrival));
        assert_eq!(out.itinerary.skipped.len(), 1);
        assert_eq!(out.itinerary.skipped[0].place_id, "b");
        assert_eq!(out.itinerary.entries.len(), 2);
        // Lake leg includes the detour through the skipped museum.
        assert_eq!(out.itinerary.entries[1].travel_minutes_from_previous, 10);
        assert_eq!(out.metrics.places_skipped, 1);
        assert!(!out.metrics.feasible);
        assert_eq!(out.itinerary.path.points().len(), 3);

        // Start, temple, lake: the skipped museum is not on the drawn path.
        let expected = haversine_km((11.0, 76.94), (11.01, 76.95))
            + haversine_km((11.01, 76.95), (11.03, 76.97));
        assert!(out.itinerary.path_length_km > 0.0);
        assert_eq!(out.itinerary.path_length_km, round2(expected));
    }

    #[test]
    fn test_metrics_totals() {
        let (places, start, matrix) = fixture();
        let settings = RouteSettings::new(ClockTime::hm(7, 0), 480);
        let sim = Simulator::new(&places, &matrix, &settings).simulate(&[1, 0, 2]);
        let out = ItineraryBuilder::new(&places, &start, &settings, EfficiencyFormula::default())
            .build(&sim, run());
        let m = &out.metrics;

        assert!(m.feasible);
        assert_eq!(m.places_visited, 3);
        assert_eq!(m.total_time, m.total_travel_time + m.total_visit_time);
        assert_eq!(m.total_visit_time, 135);
        // Museum opens at 08:00; arrival at 07:10 waits 50 minutes.
        assert_eq!(m.total_wait_time, 50);
        assert_eq!(m.average_rating, 4.0);
        assert_eq!(m.estimated_end_time, sim.end_time);
    }
}
