pub mod admin;
pub mod availability;
pub mod bookings;
pub mod drafts;
pub mod health;
pub mod quotes;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Stateless quoting
        .route("/quotes", post(quotes::create_quote))
        // Wizard draft sessions
        .route("/drafts", post(drafts::create_draft))
        .route("/drafts/:draft_id", get(drafts::get_draft))
        .route("/drafts/:draft_id", patch(drafts::update_draft))
        .route("/drafts/:draft_id", delete(drafts::reset_draft))
        .route("/drafts/:draft_id/submit", post(drafts::submit_draft))
        // Scheduling
        .route("/availability", get(availability::get_availability))
        .route("/bookings", get(bookings::list_bookings))
        .route("/bookings/:booking_id/status", patch(bookings::update_status))
        // Admin
        .route("/admin/pricing-rules", get(admin::list_pricing_rules))
        .route("/admin/pricing-rules", post(admin::create_pricing_rule))
        .route(
            "/admin/pricing-rules/:rule_id",
            patch(admin::update_pricing_rule),
        )
        .route(
            "/admin/recurring-templates/:template_id/end",
            patch(admin::end_template),
        )
        .route("/admin/materialize", post(admin::run_materialization))
}
