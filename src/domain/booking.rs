//! Booking and recurring-template types

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pricing::Frequency;

/// Booking status
///
/// Cancellation is a status transition, never a row removal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "in_progress" => Some(BookingStatus::InProgress),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A concrete scheduled cleaning.
///
/// `scheduled_date` is a timezone-naive calendar date and `scheduled_time` a
/// plain time of day; rendering in a local timezone cannot shift the day.
/// For recurring instances, at most one booking exists per
/// `(recurrence_id, scheduled_date)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub client_id: Uuid,
    pub cleaner_id: Option<Uuid>,
    pub service_type: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub duration_minutes: Option<i32>,
    pub address: String,
    pub final_price: Decimal,
    pub status: BookingStatus,
    pub frequency: Frequency,
    pub recurrence_id: Option<Uuid>,
    pub special_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A durable definition of a repeating booking, independent of any single
/// calendar date. Ended by setting `end_date`; never hard-deleted while
/// historical bookings reference it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringBookingTemplate {
    pub id: Uuid,
    pub client_id: Uuid,
    pub service_type: String,
    pub address: String,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: i16,
    pub booking_time: NaiveTime,
    pub service_frequency: Frequency,
    pub final_price: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// High-water mark for materialization; the catch-up window starts the
    /// day after this date.
    pub last_materialized_date: Option<NaiveDate>,
    pub special_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Booking status transition input
#[derive(Debug, Clone, Deserialize)]
pub struct BookingStatusInput {
    pub status: BookingStatus,
}

/// End-a-template input
#[derive(Debug, Clone, Deserialize)]
pub struct EndTemplateInput {
    pub end_date: NaiveDate,
}

/// Draft submission input: the contact step collects the client, the payment
/// step supplies the method token forwarded to the payment service.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitDraftInput {
    pub client_id: Uuid,
    pub payment_method_token: String,
}

/// 0 = Sunday .. 6 = Saturday, matching `RecurringBookingTemplate::day_of_week`.
pub fn weekday_index(date: NaiveDate) -> i16 {
    date.weekday().num_days_from_sunday() as i16
}
