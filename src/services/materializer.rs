//! Recurrence materializer
//!
//! Background job that expands active recurring templates into concrete
//! bookings. Runs on a fixed interval with no synchronous caller; a failed
//! template is logged and picked up again on the next run rather than
//! retried in-process. Duplication is guarded three deep: the catch-up
//! window starts after `last_materialized_date`, each candidate date is
//! re-checked against the store immediately before insert, and the
//! `(recurrence_id, scheduled_date)` uniqueness constraint settles any race
//! left by overlapping runs.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tokio::time::MissedTickBehavior;

use crate::app::AppState;
use crate::domain::booking::RecurringBookingTemplate;
use crate::engine::recurrence;
use crate::stores::{bookings, templates};

#[derive(Debug, Default, Clone, Copy)]
pub struct MaterializationSummary {
    pub templates: usize,
    pub created: u32,
    pub skipped: u32,
    pub failed_templates: u32,
}

/// One materialization pass over every active template.
pub async fn run_materialization(state: &AppState) -> Result<MaterializationSummary, sqlx::Error> {
    let today = Utc::now().date_naive();
    let active = templates::list_active(&state.db, today).await?;

    let mut summary = MaterializationSummary {
        templates: active.len(),
        ..Default::default()
    };

    for template in &active {
        match materialize_template(state, template, today).await {
            Ok((created, skipped)) => {
                summary.created += created;
                summary.skipped += skipped;
            }
            Err(e) => {
                // One bad template must not block the rest of the run.
                summary.failed_templates += 1;
                tracing::warn!(
                    template_id = %template.id,
                    error = %e,
                    "Template materialization failed; will retry on next run"
                );
            }
        }
    }

    tracing::info!(
        templates = summary.templates,
        created = summary.created,
        skipped = summary.skipped,
        failed = summary.failed_templates,
        "Recurrence materialization run complete"
    );

    Ok(summary)
}

/// Materialize all due occurrences for one template. Returns
/// (created, skipped-as-duplicate).
async fn materialize_template(
    state: &AppState,
    template: &RecurringBookingTemplate,
    today: NaiveDate,
) -> Result<(u32, u32), sqlx::Error> {
    let due = recurrence::due_occurrences(template, today);
    if due.is_empty() {
        return Ok((0, 0));
    }
    let high_water = due.last().copied();

    let existing = bookings::dates_for_recurrence(&state.db, template.id).await?;
    let candidates = recurrence::without_existing(due.clone(), &existing);

    let mut created: u32 = 0;
    let mut skipped: u32 = (due.len() - candidates.len()) as u32;

    for date in candidates {
        // Authoritative idempotence gate, re-checked immediately before each
        // create because the job may be retried or overlap itself.
        if bookings::find_by_recurrence_and_date(&state.db, template.id, date)
            .await?
            .is_some()
        {
            skipped += 1;
            continue;
        }

        let new = bookings::NewBooking {
            client_id: template.client_id,
            service_type: template.service_type.clone(),
            scheduled_date: date,
            scheduled_time: template.booking_time,
            duration_minutes: None,
            address: template.address.clone(),
            final_price: template.final_price,
            frequency: template.service_frequency,
            recurrence_id: Some(template.id),
            special_instructions: template.special_instructions.clone(),
        };

        match bookings::insert(&state.db, &new).await? {
            Some(booking) => {
                created += 1;
                tracing::debug!(
                    template_id = %template.id,
                    booking_id = %booking.id,
                    scheduled_date = %date,
                    "Materialized recurring booking"
                );
            }
            // Constraint hit from a concurrent run: a no-op, not an error.
            None => skipped += 1,
        }
    }

    if let Some(last) = high_water {
        templates::advance_last_materialized(&state.db, template.id, last).await?;
    }

    Ok((created, skipped))
}

/// Start the interval loop. Fire-and-forget; errors are logged per run.
pub fn spawn(state: Arc<AppState>) {
    tokio::spawn(async move {
        let period = std::time::Duration::from_secs(state.settings.materializer_interval_seconds);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if let Err(e) = run_materialization(&state).await {
                tracing::error!(error = %e, "Recurrence materialization run failed");
            }
        }
    });
}
