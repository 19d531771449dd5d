//! Booking routes

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::domain::booking::BookingStatusInput;
use crate::error::ApiError;
use crate::stores::bookings;

#[derive(Debug, Deserialize)]
pub struct BookingsQuery {
    pub date: NaiveDate,
}

/// GET /bookings?date=YYYY-MM-DD
///
/// Day view for dispatch and the cleaner portal.
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let list = bookings::list_for_date(&state.db, query.date).await?;
    Ok(Json(DataResponse::new(list)))
}

/// PATCH /bookings/:booking_id/status
///
/// Status transition; cancellation included. Rows are never deleted.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    Json(input): Json<BookingStatusInput>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = bookings::update_status(&state.db, booking_id, input.status)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    Ok(Json(DataResponse::new(booking)))
}
