//! JSON request/response contract for the request-serving layer.
//!
//! Failures never escape as errors here: they become
//! `{ "success": false, "message": ... }`. A route with skipped places is a
//! success with `metrics.feasible == false`.

use chrono::Weekday;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogPlace, normalize_catalog};
use crate::clock::ClockTime;
use crate::error::InputError;
use crate::itinerary::{Itinerary, OptimizedRoute};
use crate::model::{
    Accessibility, FeeCategory, MAX_SPAN_MINUTES, Metrics, OptimizationLevel, PreferenceWeights,
    RouteConstraints, RouteSettings, StartLocation, Stop,
};
use crate::solver::Optimizer;
use crate::traits::TravelMatrixProvider;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    pub places: Vec<CatalogPlace>,
    pub start_location: StartLocation,
    pub constraints: RequestConstraints,
    #[serde(default)]
    pub preferences: RequestPreferences,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConstraints {
    pub start_time: String,
    /// Minutes. Signed so that negative input is reported as a validation
    /// failure rather than a parse failure.
    pub total_time_available: i64,
    #[serde(default)]
    pub start_day: Option<Weekday>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub fee_category: FeeCategory,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPreferences {
    #[serde(default)]
    pub optimize_for: OptimizationLevel,
    #[serde(flatten)]
    pub weights: PreferenceWeights,
}

impl OptimizeRequest {
    /// Typed settings for the engine.
    pub fn settings(&self) -> Result<RouteSettings, InputError> {
        let c = &self.constraints;
        let start_time: ClockTime = c.start_time.parse()?;
        if c.total_time_available <= 0 {
            return Err(InputError::NonPositiveTimeBudget);
        }
        let total_time_available = u32::try_from(c.total_time_available)
            .ok()
            .filter(|&minutes| minutes <= MAX_SPAN_MINUTES)
            .ok_or(InputError::TimeBudgetTooLong {
                max: MAX_SPAN_MINUTES,
            })?;

        Ok(RouteSettings {
            start_time,
            total_time_available,
            start_day: c.start_day,
            optimization_level: self.preferences.optimize_for,
            weights: self.preferences.weights,
            constraints: RouteConstraints {
                budget: c.budget,
                fee_category: c.fee_category,
                accessibility: c.accessibility,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessBody {
    pub success: bool,
    pub algorithm: OptimizationLevel,
    pub requested_algorithm: OptimizationLevel,
    pub route: Vec<Stop>,
    pub metrics: Metrics,
    pub itinerary: Itinerary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureBody {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptimizeResponse {
    Success(Box<SuccessBody>),
    Failure(FailureBody),
}

impl OptimizeResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        OptimizeResponse::Failure(FailureBody {
            success: false,
            message: message.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OptimizeResponse::Success(_))
    }
}

impl From<OptimizedRoute> for OptimizeResponse {
    fn from(result: OptimizedRoute) -> Self {
        OptimizeResponse::Success(Box::new(SuccessBody {
            success: true,
            algorithm: result.algorithm,
            requested_algorithm: result.requested,
            route: result.route,
            metrics: result.metrics,
            itinerary: result.itinerary,
        }))
    }
}

impl From<InputError> for OptimizeResponse {
    fn from(err: InputError) -> Self {
        OptimizeResponse::failure(err.to_string())
    }
}

pub fn handle_request<M: TravelMatrixProvider>(
    optimizer: &Optimizer<M>,
    request: &OptimizeRequest,
) -> OptimizeResponse {
    let outcome = normalize_catalog(&request.places).and_then(|places| {
        let settings = request.settings()?;
        optimizer.optimize(&places, &request.start_location, &settings)
    });
    match outcome {
        Ok(result) => result.into(),
        Err(err) => err.into(),
    }
}

/// Handles a raw JSON request and returns the JSON response.
pub fn handle_json<M: TravelMatrixProvider>(optimizer: &Optimizer<M>, body: &str) -> String {
    let response = match serde_json::from_str::<OptimizeRequest>(body) {
        Ok(request) => handle_request(optimizer, &request),
        Err(err) => InputError::MalformedRequest(err.to_string()).into(),
    };
    serde_json::to_string(&response).unwrap_or_else(|err| {
        format!(
            r#"{{"success":false,"message":"failed to encode response: {}"}}"#,
            err.to_string().replace('"', "'")
        )
    })
}

/// Runs independent requests in parallel, one rayon task per request.
pub fn optimize_batch<M>(optimizer: &Optimizer<M>, requests: &[OptimizeRequest]) -> Vec<OptimizeResponse>
where
    M: TravelMatrixProvider + Sync,
{
    requests
        .par_iter()
        .map(|request| handle_request(optimizer, request))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"{
        "places": [
            {"id": "a", "name": "A", "coordinates": {"lat": 11.01, "lng": 76.96}, "rating": 4.5},
            {"id": "b", "name": "B", "coordinates": {"lat": 11.02, "lng": 76.97}, "rating": 4.0}
        ],
        "startLocation": {"name": "Hotel", "coordinates": {"lat": 11.0, "lng": 76.95}},
        "constraints": {"startTime": "09:00", "totalTimeAvailable": 300, "startDay": "Sat"},
        "preferences": {"optimizeFor": "fast", "ratingWeight": 0.6}
    }"#;

    #[test]
    fn test_request_parses_with_defaults() {
        let request: OptimizeRequest = serde_json::from_str(REQUEST).unwrap();
        let settings = request.settings().unwrap();

        assert_eq!(settings.start_time, ClockTime::hm(9, 0));
        assert_eq!(settings.start_day, Some(Weekday::Sat));
        assert_eq!(settings.optimization_level, OptimizationLevel::Fast);
        assert_eq!(settings.weights.rating_weight, 0.6);
        assert_eq!(
            settings.weights.distance_weight,
            PreferenceWeights::default().distance_weight
        );
        assert_eq!(request.start_location.id, "start");
    }

    #[test]
    fn test_non_positive_budget_rejected() {
        let mut request: OptimizeRequest = serde_json::from_str(REQUEST).unwrap();
        request.constraints.total_time_available = -30;
        assert_eq!(request.settings(), Err(InputError::NonPositiveTimeBudget));
    }

    #[test]
    fn test_oversized_budget_rejected() {
        let mut request: OptimizeRequest = serde_json::from_str(REQUEST).unwrap();
        request.constraints.total_time_available = i64::from(u32::MAX);
        assert_eq!(
            request.settings(),
            Err(InputError::TimeBudgetTooLong {
                max: MAX_SPAN_MINUTES
            })
        );

        request.constraints.total_time_available = i64::from(MAX_SPAN_MINUTES);
        assert!(request.settings().is_ok());
    }

    #[test]
    fn test_bad_start_time_rejected() {
        let mut request: OptimizeRequest = serde_json::from_str(REQUEST).unwrap();
        request.constraints.start_time = "9am".to_string();
        assert!(matches!(request.settings(), Err(InputError::InvalidClockTime(_))));
    }

    #[test]
    fn test_failure_shape() {
        let json = serde_json::to_value(OptimizeResponse::failure("nope")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "nope");
    }
}
