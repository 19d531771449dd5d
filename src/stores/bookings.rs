//! Booking persistence

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::availability::TimeRange;
use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::pricing::Frequency;

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    client_id: Uuid,
    cleaner_id: Option<Uuid>,
    service_type: String,
    scheduled_date: NaiveDate,
    scheduled_time: NaiveTime,
    duration_minutes: Option<i32>,
    address: String,
    final_price: Decimal,
    status: String,
    frequency: String,
    recurrence_id: Option<Uuid>,
    special_instructions: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Self {
            id: row.id,
            client_id: row.client_id,
            cleaner_id: row.cleaner_id,
            service_type: row.service_type,
            scheduled_date: row.scheduled_date,
            scheduled_time: row.scheduled_time,
            duration_minutes: row.duration_minutes,
            address: row.address,
            final_price: row.final_price,
            status: BookingStatus::parse(&row.status).unwrap_or(BookingStatus::Pending),
            frequency: Frequency::parse(&row.frequency).unwrap_or_default(),
            recurrence_id: row.recurrence_id,
            special_instructions: row.special_instructions,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fields for a new booking row, whether created by submission or by the
/// materializer.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub client_id: Uuid,
    pub service_type: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub duration_minutes: Option<i32>,
    pub address: String,
    pub final_price: Decimal,
    pub frequency: Frequency,
    pub recurrence_id: Option<Uuid>,
    pub special_instructions: Option<String>,
}

const SELECT_COLUMNS: &str = "id, client_id, cleaner_id, service_type, scheduled_date, \
     scheduled_time, duration_minutes, address, final_price, status, frequency, \
     recurrence_id, special_instructions, created_at, updated_at";

/// Insert a booking.
///
/// For recurring instances the `(recurrence_id, scheduled_date)` uniqueness
/// constraint is the last-resort duplication guard: a conflicting insert is
/// a no-op and returns `None`.
pub async fn insert(pool: &PgPool, new: &NewBooking) -> Result<Option<Booking>, sqlx::Error> {
    let row = sqlx::query_as::<_, BookingRow>(&format!(
        "INSERT INTO bookings \
             (client_id, service_type, scheduled_date, scheduled_time, duration_minutes, \
              address, final_price, status, frequency, recurrence_id, special_instructions) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $9, $10) \
         ON CONFLICT (recurrence_id, scheduled_date) WHERE recurrence_id IS NOT NULL DO NOTHING \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(new.client_id)
    .bind(&new.service_type)
    .bind(new.scheduled_date)
    .bind(new.scheduled_time)
    .bind(new.duration_minutes)
    .bind(&new.address)
    .bind(new.final_price)
    .bind(new.frequency.as_str())
    .bind(new.recurrence_id)
    .bind(&new.special_instructions)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Into::into))
}

/// The idempotence gate checked immediately before each materializer insert.
pub async fn find_by_recurrence_and_date(
    pool: &PgPool,
    recurrence_id: Uuid,
    date: NaiveDate,
) -> Result<Option<Booking>, sqlx::Error> {
    let row = sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM bookings \
         WHERE recurrence_id = $1 AND scheduled_date = $2"
    ))
    .bind(recurrence_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Into::into))
}

/// Dates already materialized for a template, for pre-filtering a catch-up
/// window.
pub async fn dates_for_recurrence(
    pool: &PgPool,
    recurrence_id: Uuid,
) -> Result<HashSet<NaiveDate>, sqlx::Error> {
    let dates: Vec<NaiveDate> =
        sqlx::query_scalar("SELECT scheduled_date FROM bookings WHERE recurrence_id = $1")
            .bind(recurrence_id)
            .fetch_all(pool)
            .await?;

    Ok(dates.into_iter().collect())
}

pub async fn list_for_date(pool: &PgPool, date: NaiveDate) -> Result<Vec<Booking>, sqlx::Error> {
    let rows = sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM bookings \
         WHERE scheduled_date = $1 \
         ORDER BY scheduled_time, id"
    ))
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Time windows occupied by non-cancelled bookings on a date.
///
/// Bookings without an explicit duration occupy `default_duration_minutes`.
/// Takes an executor so the availability read can share one transaction
/// with the staffing and time-off reads.
pub async fn booked_windows_for_date<'e, E: PgExecutor<'e>>(
    executor: E,
    date: NaiveDate,
    default_duration_minutes: u32,
) -> Result<Vec<TimeRange>, sqlx::Error> {
    let rows: Vec<(NaiveTime, Option<i32>)> = sqlx::query_as(
        "SELECT scheduled_time, duration_minutes FROM bookings \
         WHERE scheduled_date = $1 AND status <> 'cancelled' \
         ORDER BY scheduled_time",
    )
    .bind(date)
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(start, duration)| {
            let minutes = duration
                .and_then(|d| u32::try_from(d).ok())
                .unwrap_or(default_duration_minutes);
            let end = start
                .overflowing_add_signed(chrono::Duration::minutes(i64::from(minutes)))
                .0;
            // A job running past midnight occupies the rest of the day.
            let end = if end <= start {
                NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(start)
            } else {
                end
            };
            TimeRange::new(start, end)
        })
        .collect())
}

pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: BookingStatus,
) -> Result<Option<Booking>, sqlx::Error> {
    let row = sqlx::query_as::<_, BookingRow>(&format!(
        "UPDATE bookings SET status = $2, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Into::into))
}
