//! Availability route

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::domain::availability::AvailabilityResponse;
use crate::domain::booking::weekday_index;
use crate::engine::availability::resolve_slots;
use crate::error::ApiError;
use crate::stores::{bookings, staffing};

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

/// GET /availability?date=YYYY-MM-DD
///
/// Offerable slots for the date. All three reads share one transaction so
/// the resolver sees a single consistent snapshot; a booking committed
/// halfway through cannot show a half-applied state.
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let date = query.date;

    let mut tx = state.db.begin().await?;
    let working = staffing::working_windows(&mut *tx, weekday_index(date)).await?;
    let time_off = staffing::approved_time_off(&mut *tx, date).await?;
    let mut busy = bookings::booked_windows_for_date(
        &mut *tx,
        date,
        state.settings.default_job_duration_minutes,
    )
    .await?;
    tx.commit().await?;

    busy.extend(time_off);
    let slots = resolve_slots(&working, &busy, state.settings.slot_granularity_minutes);
    let is_fully_booked = slots.is_empty();

    Ok(Json(DataResponse::new(AvailabilityResponse {
        date,
        slots,
        is_fully_booked,
    })))
}
