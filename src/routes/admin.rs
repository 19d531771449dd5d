//! Admin routes: rate table management, template lifecycle, and the manual
//! materialization trigger.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{Created, DataResponse, MessageResponse};
use crate::app::AppState;
use crate::domain::booking::EndTemplateInput;
use crate::domain::pricing::{CreatePricingRuleInput, RuleKind, UpdatePricingRuleInput};
use crate::error::ApiError;
use crate::services::materializer;
use crate::stores::{pricing_rules, templates};

/// GET /admin/pricing-rules
///
/// Full rate table, inactive rules included.
pub async fn list_pricing_rules(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let rules = pricing_rules::list_all(&state.db).await?;
    Ok(Json(DataResponse::new(rules)))
}

/// POST /admin/pricing-rules
pub async fn create_pricing_rule(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CreatePricingRuleInput>,
) -> Result<impl IntoResponse, ApiError> {
    if input.service_type.trim().is_empty() {
        return Err(ApiError::bad_request("service_type must not be empty"));
    }

    // At most one active base price per service type.
    if matches!(input.kind, RuleKind::BasePrice { .. })
        && pricing_rules::has_active_base_price(&state.db, &input.service_type).await?
    {
        return Err(ApiError::conflict(format!(
            "An active base price already exists for {}",
            input.service_type
        )));
    }

    let rule = pricing_rules::insert(&state.db, &input)
        .await?
        .ok_or_else(|| ApiError::internal("Inserted pricing rule failed to decode"))?;

    Ok(Created(DataResponse::new(rule)))
}

/// PATCH /admin/pricing-rules/:rule_id
///
/// Edit or deactivate. Rules are never deleted, so historical quotes stay
/// reproducible.
pub async fn update_pricing_rule(
    State(state): State<Arc<AppState>>,
    Path(rule_id): Path<Uuid>,
    Json(input): Json<UpdatePricingRuleInput>,
) -> Result<impl IntoResponse, ApiError> {
    let current = pricing_rules::find_state(&state.db, rule_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Pricing rule not found"))?;

    // The at-most-one-active-base-price invariant also binds updates that
    // reactivate a base price or retype a rule into one.
    if resolves_to_active_base(&current, &input)
        && pricing_rules::has_other_active_base_price(&state.db, &current.service_type, rule_id)
            .await?
    {
        return Err(ApiError::conflict(format!(
            "An active base price already exists for {}",
            current.service_type
        )));
    }

    let rule = pricing_rules::update(&state.db, rule_id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("Pricing rule not found"))?;

    Ok(Json(DataResponse::new(rule)))
}

/// Whether applying `input` leaves the rule as an active base price.
fn resolves_to_active_base(
    current: &pricing_rules::RuleState,
    input: &UpdatePricingRuleInput,
) -> bool {
    let rule_type = input
        .kind
        .as_ref()
        .map_or(current.rule_type.as_str(), |kind| kind.rule_type());
    rule_type == "base_price" && input.active.unwrap_or(current.active)
}

/// PATCH /admin/recurring-templates/:template_id/end
///
/// End a recurring plan. The template row stays; historical bookings
/// reference it.
pub async fn end_template(
    State(state): State<Arc<AppState>>,
    Path(template_id): Path<Uuid>,
    Json(input): Json<EndTemplateInput>,
) -> Result<impl IntoResponse, ApiError> {
    let template = templates::find(&state.db, template_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recurring template not found"))?;

    if input.end_date < template.start_date {
        return Err(ApiError::bad_request("end_date precedes the template's start_date"));
    }

    let updated = templates::set_end_date(&state.db, template_id, input.end_date)
        .await?
        .ok_or_else(|| ApiError::not_found("Recurring template not found"))?;

    Ok(Json(DataResponse::new(updated)))
}

/// POST /admin/materialize
///
/// Kick off a materialization pass without waiting for the interval. Side
/// effect only; the run is fire-and-forget.
pub async fn run_materialization(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tokio::spawn(async move {
        if let Err(e) = materializer::run_materialization(&state).await {
            tracing::error!(error = %e, "Manual materialization run failed");
        }
    });

    MessageResponse::new("Materialization run started")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::pricing_rules::RuleState;
    use rust_decimal::Decimal;

    fn rule_state(rule_type: &str, active: bool) -> RuleState {
        RuleState {
            service_type: "Standard Home Cleaning".to_string(),
            rule_type: rule_type.to_string(),
            active,
        }
    }

    #[test]
    fn reactivating_a_base_price_needs_the_uniqueness_check() {
        let input = UpdatePricingRuleInput {
            kind: None,
            active: Some(true),
        };
        assert!(resolves_to_active_base(&rule_state("base_price", false), &input));
    }

    #[test]
    fn retyping_into_base_price_needs_the_uniqueness_check() {
        let input = UpdatePricingRuleInput {
            kind: Some(RuleKind::BasePrice {
                amount: Decimal::new(14_000, 2),
            }),
            active: None,
        };
        assert!(resolves_to_active_base(&rule_state("extra_service", true), &input));
    }

    #[test]
    fn deactivation_and_non_base_updates_pass() {
        let deactivate = UpdatePricingRuleInput {
            kind: None,
            active: Some(false),
        };
        assert!(!resolves_to_active_base(&rule_state("base_price", true), &deactivate));

        let reactivate_non_base = UpdatePricingRuleInput {
            kind: None,
            active: Some(true),
        };
        assert!(!resolves_to_active_base(
            &rule_state("sqft_rate", false),
            &reactivate_non_base
        ));
    }

    #[test]
    fn editing_an_active_base_price_in_place_still_counts_as_active_base() {
        // Amount edits keep the rule an active base price; the store check
        // excludes the rule itself, so this passes unless a second one exists.
        let input = UpdatePricingRuleInput {
            kind: Some(RuleKind::BasePrice {
                amount: Decimal::new(15_000, 2),
            }),
            active: None,
        };
        assert!(resolves_to_active_base(&rule_state("base_price", true), &input));
    }
}
