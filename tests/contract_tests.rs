//! JSON contract tests: what a request-serving layer sends and receives.

mod fixtures;

use serde_json::{Value, json};

use tour_planner::config::GeneticConfig;
use tour_planner::contract::{OptimizeRequest, OptimizeResponse, handle_json, optimize_batch};
use tour_planner::{EngineConfig, Optimizer};

use fixtures::{GridMatrix, init_tracing};

fn optimizer() -> Optimizer<GridMatrix> {
    let genetic = GeneticConfig::default()
        .with_seed(17)
        .with_time_limit_ms(60_000);
    Optimizer::with_provider(EngineConfig::default().with_genetic(genetic), GridMatrix).unwrap()
}

fn request(optimize_for: &str, minutes: i64) -> Value {
    json!({
        "places": [
            {
                "id": "fort",
                "name": "Fort",
                "category": "Heritage",
                "coordinates": {"lat": 10.1, "lng": 76.0},
                "averageVisitDuration": 60,
                "rating": 4.5,
                "entryFee": {"indian": 25, "foreign": 300},
                "openingHours": "09:00-17:00"
            },
            {
                "id": "lake",
                "name": "Lake",
                "coordinates": {"lat": 10.0, "lng": 76.1},
                "rating": 4.0,
                "openingHours": "24 hours"
            },
            {
                "id": "market",
                "name": "Market",
                "coordinates": {"lat": 10.1, "lng": 76.1},
                "averageVisitDuration": 30,
                "rating": 3.5,
                "closedDays": ["Sun"]
            }
        ],
        "startLocation": {"name": "Hotel", "coordinates": {"lat": 10.0, "lng": 76.0}},
        "constraints": {"startTime": "09:00", "totalTimeAvailable": minutes},
        "preferences": {"optimizeFor": optimize_for}
    })
}

fn call(body: &Value) -> Value {
    let raw = handle_json(&optimizer(), &body.to_string());
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn success_response_shape() {
    init_tracing();
    let response = call(&request("optimal", 480));

    assert_eq!(response["success"], true);
    assert_eq!(response["algorithm"], "optimal");
    assert_eq!(response["requestedAlgorithm"], "optimal");

    let route = response["route"].as_array().unwrap();
    assert_eq!(route.len(), 4);
    assert_eq!(route[0]["placeId"], "start");
    assert_eq!(route[0]["order"], 0);
    assert_eq!(route[1]["arrivalTime"].as_str().unwrap().len(), 5);

    let metrics = &response["metrics"];
    assert_eq!(metrics["feasible"], true);
    assert_eq!(metrics["placesVisited"], 3);
    // Lake falls back to the default visit length.
    assert_eq!(metrics["totalVisitTime"], 150);
    assert_eq!(metrics["totalCost"], 25.0);
    assert_eq!(
        metrics["totalTime"].as_u64().unwrap(),
        metrics["totalTravelTime"].as_u64().unwrap() + metrics["totalVisitTime"].as_u64().unwrap()
    );

    assert_eq!(response["itinerary"]["entries"].as_array().unwrap().len(), 3);
    assert!(response["itinerary"]["pathLengthKm"].as_f64().unwrap() > 0.0);
}

#[test]
fn closed_day_in_request_is_honoured() {
    let mut body = request("fast", 480);
    body["constraints"]["startDay"] = json!("Sun");
    let response = call(&body);

    assert_eq!(response["success"], true);
    assert_eq!(response["metrics"]["feasible"], false);
    let skipped = response["itinerary"]["skipped"].as_array().unwrap();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0]["placeId"], "market");
    assert_eq!(skipped[0]["reason"], "closedToday");
}

#[test]
fn invalid_input_becomes_failure_body() {
    let mut body = request("balanced", 480);
    body["places"][0]["coordinates"]["lat"] = json!(123.0);
    let response = call(&body);
    assert_eq!(response["success"], false);
    assert!(response["message"].as_str().unwrap().contains("fort"));

    let response = call(&request("balanced", -10));
    assert_eq!(response["success"], false);

    let mut body = request("balanced", 480);
    body["places"].as_array_mut().unwrap().truncate(1);
    let response = call(&body);
    assert_eq!(response["success"], false);
}

#[test]
fn oversized_numbers_become_failure_bodies() {
    let response = call(&request("optimal", i64::from(u32::MAX)));
    assert_eq!(response["success"], false);
    assert!(response["message"].as_str().unwrap().contains("must not exceed"));

    let mut body = request("fast", 480);
    body["places"][1]["averageVisitDuration"] = json!(1e12);
    let response = call(&body);
    assert_eq!(response["success"], false);
    assert!(response["message"].as_str().unwrap().contains("lake"));
}

#[test]
fn malformed_json_becomes_failure_body() {
    let raw = handle_json(&optimizer(), "{\"places\": [");
    let response: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(response["success"], false);
    assert!(response["message"].is_string());
    assert!(response.get("route").is_none());
}

#[test]
fn batch_keeps_request_order() {
    let requests: Vec<OptimizeRequest> = [
        request("fast", 480),
        request("balanced", -1),
        request("optimal", 480),
    ]
    .iter()
    .map(|v| serde_json::from_value(v.clone()).unwrap())
    .collect();

    let responses = optimize_batch(&optimizer(), &requests);
    assert_eq!(responses.len(), 3);
    assert!(responses[0].is_success());
    assert!(!responses[1].is_success());
    match &responses[2] {
        OptimizeResponse::Success(body) => assert_eq!(body.route.len(), 4),
        OptimizeResponse::Failure(failure) => panic!("unexpected failure: {}", failure.message),
    }
}
