//! Normalization of catalog records into immutable [`Place`] values.
//!
//! The location catalog hands over loosely-shaped records: optional fields,
//! free-form opening hours, inconsistent casing. [`normalize_place`] is a pure
//! function that returns a fresh `Place` with documented defaults and never
//! touches its input. Malformed coordinates are rejected, never repaired.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::clock::ClockTime;
use crate::error::InputError;
use crate::model::{Accessibility, Coordinates, EntryFee, MAX_SPAN_MINUTES, OpeningWindow, Place};

/// Visit length assumed when the catalog has none.
pub const DEFAULT_VISIT_MINUTES: u32 = 60;

/// A place record as the catalog supplies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPlace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub average_visit_duration: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub entry_fee: Option<EntryFee>,
    /// `"HH:MM-HH:MM"`, or `"24 hours"` / empty for always open.
    #[serde(default)]
    pub opening_hours: Option<String>,
    #[serde(default)]
    pub closed_days: Vec<Weekday>,
    #[serde(default)]
    pub accessibility: Option<Accessibility>,
}

impl From<&Place> for CatalogPlace {
    fn from(place: &Place) -> Self {
        Self {
            id: place.id.clone(),
            name: place.name.clone(),
            category: Some(place.category.clone()),
            coordinates: place.coordinates,
            average_visit_duration: Some(f64::from(place.average_visit_duration)),
            rating: Some(place.rating),
            entry_fee: Some(place.entry_fee),
            opening_hours: place
                .opening_window
                .map(|w| format!("{}-{}", w.open, w.close)),
            closed_days: place.closed_days.clone(),
            accessibility: Some(place.accessibility),
        }
    }
}

pub fn normalize_place(raw: &CatalogPlace) -> Result<Place, InputError> {
    let id = raw.id.trim().to_string();

    if !raw.coordinates.is_valid() {
        return Err(InputError::InvalidCoordinates {
            id,
            lat: raw.coordinates.lat,
            lng: raw.coordinates.lng,
        });
    }

    let average_visit_duration = match raw.average_visit_duration {
        None => DEFAULT_VISIT_MINUTES,
        Some(minutes) if minutes.is_finite() && minutes >= 0.5 => {
            let minutes = minutes.round();
            if minutes > f64::from(MAX_SPAN_MINUTES) {
                return Err(InputError::VisitTooLong {
                    id,
                    max: MAX_SPAN_MINUTES,
                });
            }
            minutes as u32
        }
        Some(_) => return Err(InputError::NonPositiveDuration { id }),
    };

    let rating = raw.rating.unwrap_or(0.0);
    if !(0.0..=5.0).contains(&rating) {
        return Err(InputError::InvalidRating { id, rating });
    }

    let entry_fee = raw.entry_fee.unwrap_or_default();
    if !fee_is_valid(entry_fee.indian) || !fee_is_valid(entry_fee.foreign) {
        return Err(InputError::InvalidFee { id });
    }

    let opening_window = match raw.opening_hours.as_deref() {
        None => None,
        Some(hours) => parse_opening_hours(hours)?,
    };

    let mut closed_days = raw.closed_days.clone();
    closed_days.sort_by_key(|d| d.num_days_from_monday());
    closed_days.dedup();

    Ok(Place {
        id,
        name: raw.name.trim().to_string(),
        category: raw
            .category
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .unwrap_or_default(),
        coordinates: raw.coordinates,
        average_visit_duration,
        rating,
        entry_fee,
        opening_window,
        closed_days,
        accessibility: raw.accessibility.unwrap_or_default(),
    })
}

/// Normalizes a whole catalog, failing on the first bad record.
pub fn normalize_catalog(raw: &[CatalogPlace]) -> Result<Vec<Place>, InputError> {
    raw.iter().map(normalize_place).collect()
}

fn fee_is_valid(fee: f64) -> bool {
    fee.is_finite() && fee >= 0.0
}

/// Parses `"HH:MM-HH:MM"`. Always-open spellings yield `None`.
pub fn parse_opening_hours(raw: &str) -> Result<Option<OpeningWindow>, InputError> {
    let trimmed = raw.trim();
    let lowered = trimmed.to_lowercase();
    if trimmed.is_empty() || matches!(lowered.as_str(), "24 hours" | "24h" | "always" | "always open") {
        return Ok(None);
    }

    let (open, close) = trimmed
        .split_once('-')
        .ok_or_else(|| InputError::InvalidOpeningHours(raw.to_string()))?;
    let open: ClockTime = open
        .parse()
        .map_err(|_| InputError::InvalidOpeningHours(raw.to_string()))?;
    let close: ClockTime = close
        .parse()
        .map_err(|_| InputError::InvalidOpeningHours(raw.to_string()))?;
    if open == close {
        return Ok(None);
    }
    Ok(Some(OpeningWindow::new(open, close)))
}
