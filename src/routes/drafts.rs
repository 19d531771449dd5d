//! Wizard draft session routes
//!
//! Each handler that mutates a draft recomputes pricing before responding,
//! so the cached breakdown on the session can never drift from a fresh
//! recompute.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{Created, DataResponse};
use crate::app::AppState;
use crate::domain::booking::{weekday_index, SubmitDraftInput};
use crate::domain::draft::{BookingDraft, DraftUpdate};
use crate::domain::pricing::Frequency;
use crate::engine::pricing::calculate_pricing;
use crate::error::ApiError;
use crate::stores::{bookings, pricing_rules, templates};

/// Sanity caps for the details step; anything past these is a typo, not a
/// house.
const MAX_SQUARE_FOOTAGE: u32 = 50_000;
const MAX_ROOMS: u32 = 20;

#[derive(Debug, Serialize)]
pub struct DraftSessionResponse {
    pub session_id: Uuid,
    pub draft: BookingDraft,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub booking: crate::domain::booking::Booking,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_id: Option<Uuid>,
    pub payment_intent_id: String,
}

/// POST /drafts
///
/// Open a wizard session with an empty draft.
pub async fn create_draft(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (session_id, draft) = state.drafts.create();
    Created(DataResponse::new(DraftSessionResponse { session_id, draft }))
}

/// GET /drafts/:draft_id
pub async fn get_draft(
    State(state): State<Arc<AppState>>,
    Path(draft_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = state
        .drafts
        .get(draft_id)
        .ok_or_else(|| ApiError::not_found("Draft session not found"))?;

    Ok(Json(DataResponse::new(DraftSessionResponse {
        session_id: draft_id,
        draft,
    })))
}

/// PATCH /drafts/:draft_id
///
/// Shallow field-level merge, then a pricing recompute against the active
/// rules. Absent fields are untouched.
pub async fn update_draft(
    State(state): State<Arc<AppState>>,
    Path(draft_id): Path<Uuid>,
    Json(update): Json<DraftUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    validate_update(&update)?;

    let mut draft = state
        .drafts
        .update(draft_id, update)
        .ok_or_else(|| ApiError::not_found("Draft session not found"))?;

    let rules = pricing_rules::list_active(&state.db).await?;
    draft.pricing = Some(calculate_pricing(&draft, &rules));
    state.drafts.cache_pricing(draft_id, &draft);

    Ok(Json(DataResponse::new(DraftSessionResponse {
        session_id: draft_id,
        draft,
    })))
}

/// DELETE /drafts/:draft_id
///
/// Reset the session back to an empty draft.
pub async fn reset_draft(
    State(state): State<Arc<AppState>>,
    Path(draft_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = state
        .drafts
        .reset(draft_id)
        .ok_or_else(|| ApiError::not_found("Draft session not found"))?;

    Ok(Json(DataResponse::new(DraftSessionResponse {
        session_id: draft_id,
        draft,
    })))
}

/// POST /drafts/:draft_id/submit
///
/// Convert the draft into a booking (and a recurring template when the
/// frequency repeats). Payment approval is a hard precondition; the session
/// is cleared only after everything succeeded.
pub async fn submit_draft(
    State(state): State<Arc<AppState>>,
    Path(draft_id): Path<Uuid>,
    Json(input): Json<SubmitDraftInput>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = state
        .drafts
        .get(draft_id)
        .ok_or_else(|| ApiError::not_found("Draft session not found"))?;

    let address = draft
        .address
        .as_ref()
        .ok_or_else(|| ApiError::bad_request("Draft has no service address"))?;
    if !address.in_service_area {
        return Err(ApiError::bad_request("Address is outside the service area"));
    }
    let service_type = draft
        .service_type
        .clone()
        .ok_or_else(|| ApiError::bad_request("Draft has no service type"))?;
    let schedule = draft
        .schedule
        .clone()
        .ok_or_else(|| ApiError::bad_request("Draft has no scheduled date and time"))?;
    if draft.contact.is_none() {
        return Err(ApiError::bad_request("Draft has no contact information"));
    }

    let scheduled_time = parse_time_slot(&schedule.time_slot)
        .ok_or_else(|| ApiError::bad_request("Unrecognized time slot"))?;

    // Authoritative recompute at submission; the cached breakdown is only a
    // memoization.
    let rules = pricing_rules::list_active(&state.db).await?;
    let breakdown = calculate_pricing(&draft, &rules);

    let intent = state
        .payments
        .create_intent(breakdown.total, "usd", &input.payment_method_token)
        .await?;
    if !intent.approved {
        return Err(ApiError::bad_request("Payment was not approved"));
    }

    // Recurring drafts become a template; the first visit is created right
    // away and the materializer takes over from there.
    let recurrence_id = if draft.frequency != Frequency::OneTime {
        let template = templates::insert(
            &state.db,
            &templates::NewTemplate {
                client_id: input.client_id,
                service_type: service_type.clone(),
                address: address.formatted.clone(),
                day_of_week: weekday_index(schedule.date),
                booking_time: scheduled_time,
                service_frequency: draft.frequency,
                final_price: breakdown.total,
                start_date: schedule.date,
                special_instructions: draft
                    .logistics
                    .as_ref()
                    .and_then(|l| l.instructions.clone()),
            },
        )
        .await?;
        Some(template.id)
    } else {
        None
    };

    let duration_minutes = (breakdown.duration_hours * 60.0).round() as i32;
    let booking = bookings::insert(
        &state.db,
        &bookings::NewBooking {
            client_id: input.client_id,
            service_type,
            scheduled_date: schedule.date,
            scheduled_time,
            duration_minutes: Some(duration_minutes),
            address: address.formatted.clone(),
            final_price: breakdown.total,
            frequency: draft.frequency,
            recurrence_id,
            special_instructions: draft
                .logistics
                .as_ref()
                .and_then(|l| l.instructions.clone()),
        },
    )
    .await?
    .ok_or_else(|| ApiError::conflict("A booking already exists for that date"))?;

    if let Some(template_id) = recurrence_id {
        templates::advance_last_materialized(&state.db, template_id, schedule.date).await?;
    }

    // Capture timing is the payment service's concern; a capture hiccup is
    // retried out of band and must not unwind the booking.
    if let Err(e) = state.payments.capture(&intent.intent_id).await {
        tracing::warn!(
            booking_id = %booking.id,
            intent_id = %intent.intent_id,
            error = %e,
            "Payment capture deferred"
        );
    }

    // The one place allowed to clear a session, and only after success.
    state.drafts.remove(draft_id);

    Ok(Created(DataResponse::new(SubmissionResponse {
        booking,
        recurrence_id,
        payment_intent_id: intent.intent_id,
    })))
}

/// Accepts both the wizard's `HH:MM` labels and the `HH:MM:SS` form that
/// availability responses serialize, so a client can echo a returned slot
/// verbatim.
fn parse_time_slot(s: &str) -> Option<chrono::NaiveTime> {
    chrono::NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| chrono::NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// The input-validation boundary: out-of-range fields are rejected here and
/// never reach the calculator.
fn validate_update(update: &DraftUpdate) -> Result<(), ApiError> {
    if update
        .square_footage
        .is_some_and(|sqft| sqft > MAX_SQUARE_FOOTAGE)
    {
        return Err(ApiError::bad_request("Square footage out of range"));
    }
    if update.bedrooms.is_some_and(|n| n > MAX_ROOMS) {
        return Err(ApiError::bad_request("Bedroom count out of range"));
    }
    if update.bathrooms.is_some_and(|n| n > MAX_ROOMS) {
        return Err(ApiError::bad_request("Bathroom count out of range"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::availability::TimeRange;
    use chrono::NaiveTime;

    #[test]
    fn time_slot_accepts_both_wire_forms() {
        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        assert_eq!(parse_time_slot("10:00"), Some(ten));
        assert_eq!(parse_time_slot("10:00:00"), Some(ten));
        assert_eq!(parse_time_slot("10"), None);
        assert_eq!(parse_time_slot("mid-morning"), None);
    }

    #[test]
    fn availability_slot_round_trips_into_a_schedule() {
        let slot = TimeRange::new(
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        );
        let label = serde_json::to_value(&slot).unwrap()["start"]
            .as_str()
            .unwrap()
            .to_string();
        assert_eq!(parse_time_slot(&label), Some(slot.start));
    }
}
