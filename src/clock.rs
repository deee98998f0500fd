//! Time-of-day values used for start times, opening windows, and stop timestamps.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::InputError;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Minutes since midnight.
///
/// Arithmetic never wraps: an itinerary that runs past midnight simply
/// carries values above 1440. Only the `"HH:MM"` rendering wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ClockTime(u32);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    pub const fn hm(hours: u32, minutes: u32) -> Self {
        Self(hours * 60 + minutes)
    }

    pub const fn minutes(self) -> u32 {
        self.0
    }

    /// Saturates at `u32::MAX` minutes instead of wrapping.
    pub const fn plus(self, minutes: u32) -> Self {
        Self(self.0.saturating_add(minutes))
    }

    /// Minutes elapsed since `earlier`, zero if `earlier` is later.
    pub const fn since(self, earlier: ClockTime) -> u32 {
        self.0.saturating_sub(earlier.0)
    }
}

impl FromStr for ClockTime {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map_err(|_| InputError::InvalidClockTime(s.to_string()))?;
        Ok(Self(parsed.hour() * 60 + parsed.minute()))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let of_day = self.0 % MINUTES_PER_DAY;
        write!(f, "{:02}:{:02}", of_day / 60, of_day % 60)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
