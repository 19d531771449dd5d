//! Stateless quoting
//!
//! The wizard can price any draft shape without opening a session; the
//! calculator is pure, so this endpoint cannot fail for a well-formed body.

use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::domain::draft::BookingDraft;
use crate::engine::pricing::calculate_pricing;
use crate::error::ApiError;
use crate::stores::pricing_rules;

/// POST /quotes
///
/// Price a draft against the active rule set.
pub async fn create_quote(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<BookingDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let rules = pricing_rules::list_active(&state.db).await?;
    let breakdown = calculate_pricing(&draft, &rules);
    Ok(Json(DataResponse::new(breakdown)))
}
