//! Availability types
//!
//! Slots are computed per request, never stored.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Half-open time window within a single day: `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Offerable slots for a date. An empty slot set is a normal result, not an
/// error.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AvailabilityResponse {
    pub date: NaiveDate,
    pub slots: Vec<TimeRange>,
    pub is_fully_booked: bool,
}
