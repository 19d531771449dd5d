//! Staffing schedule and time-off reads
//!
//! Both take an executor so the availability handler can read working
//! windows, time off, and booked windows inside one transaction and see a
//! single consistent snapshot.

use chrono::{NaiveDate, NaiveTime};
use sqlx::PgExecutor;

use crate::domain::availability::TimeRange;

/// Configured working windows across all active cleaners for a weekday
/// (0 = Sunday).
pub async fn working_windows<'e, E: PgExecutor<'e>>(
    executor: E,
    weekday: i16,
) -> Result<Vec<TimeRange>, sqlx::Error> {
    let rows: Vec<(NaiveTime, NaiveTime)> = sqlx::query_as(
        "SELECT window_start, window_end FROM staffing_windows \
         WHERE day_of_week = $1 AND active \
         ORDER BY window_start, window_end",
    )
    .bind(weekday)
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(start, end)| TimeRange::new(start, end))
        .collect())
}

/// Approved time-off windows for a date.
pub async fn approved_time_off<'e, E: PgExecutor<'e>>(
    executor: E,
    date: NaiveDate,
) -> Result<Vec<TimeRange>, sqlx::Error> {
    let rows: Vec<(NaiveTime, NaiveTime)> = sqlx::query_as(
        "SELECT window_start, window_end FROM time_off \
         WHERE off_date = $1 AND status = 'approved' \
         ORDER BY window_start, window_end",
    )
    .bind(date)
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(start, end)| TimeRange::new(start, end))
        .collect())
}
