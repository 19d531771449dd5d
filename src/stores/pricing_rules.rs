//! Pricing rule persistence
//!
//! Rows keep a discriminator column plus nullable numeric columns; decoding
//! produces the tagged `RuleKind` so the calculator never sees an invalid
//! combination. A row that fails to decode is a configuration gap: it is
//! logged and skipped, never fatal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::pricing::{CreatePricingRuleInput, Frequency, PricingRule, RuleKind, UpdatePricingRuleInput};

#[derive(Debug, sqlx::FromRow)]
struct PricingRuleRow {
    id: Uuid,
    service_type: String,
    rule_type: String,
    amount: Option<Decimal>,
    rate_per_unit: Option<Decimal>,
    included_units: Option<i32>,
    extra_name: Option<String>,
    frequency: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PricingRuleRow {
    fn decode(self) -> Option<PricingRule> {
        let kind = match self.rule_type.as_str() {
            "base_price" => RuleKind::BasePrice {
                amount: self.amount?,
            },
            "sqft_rate" => RuleKind::SqftRate {
                rate_per_sqft: self.rate_per_unit?,
                included_sqft: u32::try_from(self.included_units.unwrap_or(0)).ok()?,
            },
            "bedroom_rate" => RuleKind::BedroomRate {
                rate_per_room: self.rate_per_unit?,
                included_rooms: u32::try_from(self.included_units.unwrap_or(0)).ok()?,
            },
            "bathroom_rate" => RuleKind::BathroomRate {
                rate_per_room: self.rate_per_unit?,
                included_rooms: u32::try_from(self.included_units.unwrap_or(0)).ok()?,
            },
            "extra_service" => RuleKind::ExtraService {
                name: self.extra_name?,
                amount: self.amount?,
            },
            "frequency_discount" => RuleKind::FrequencyDiscount {
                frequency: Frequency::parse(self.frequency.as_deref()?)?,
                percent_off: self.rate_per_unit?,
            },
            _ => return None,
        };

        Some(PricingRule {
            id: self.id,
            service_type: self.service_type,
            kind,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Column values for one rule kind.
struct KindColumns<'a> {
    rule_type: &'static str,
    amount: Option<Decimal>,
    rate_per_unit: Option<Decimal>,
    included_units: Option<i32>,
    extra_name: Option<&'a str>,
    frequency: Option<&'static str>,
}

fn kind_columns(kind: &RuleKind) -> KindColumns<'_> {
    let mut columns = KindColumns {
        rule_type: kind.rule_type(),
        amount: None,
        rate_per_unit: None,
        included_units: None,
        extra_name: None,
        frequency: None,
    };
    match kind {
        RuleKind::BasePrice { amount } => columns.amount = Some(*amount),
        RuleKind::SqftRate {
            rate_per_sqft,
            included_sqft,
        } => {
            columns.rate_per_unit = Some(*rate_per_sqft);
            columns.included_units = Some(*included_sqft as i32);
        }
        RuleKind::BedroomRate {
            rate_per_room,
            included_rooms,
        }
        | RuleKind::BathroomRate {
            rate_per_room,
            included_rooms,
        } => {
            columns.rate_per_unit = Some(*rate_per_room);
            columns.included_units = Some(*included_rooms as i32);
        }
        RuleKind::ExtraService { name, amount } => {
            columns.extra_name = Some(name.as_str());
            columns.amount = Some(*amount);
        }
        RuleKind::FrequencyDiscount {
            frequency,
            percent_off,
        } => {
            columns.frequency = Some(frequency.as_str());
            columns.rate_per_unit = Some(*percent_off);
        }
    }
    columns
}

fn decode_rows(rows: Vec<PricingRuleRow>) -> Vec<PricingRule> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            let rule_type = row.rule_type.clone();
            let decoded = row.decode();
            if decoded.is_none() {
                tracing::warn!(rule_id = %id, rule_type = %rule_type, "Skipping undecodable pricing rule");
            }
            decoded
        })
        .collect()
}

const SELECT_COLUMNS: &str = "id, service_type, rule_type, amount, rate_per_unit, included_units, \
     extra_name, frequency, active, created_at, updated_at";

/// All active rules, the calculator's working set.
pub async fn list_active(pool: &PgPool) -> Result<Vec<PricingRule>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PricingRuleRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM pricing_rules WHERE active ORDER BY service_type, rule_type, created_at"
    ))
    .fetch_all(pool)
    .await?;

    Ok(decode_rows(rows))
}

/// Full rule table for the admin view, inactive rows included.
pub async fn list_all(pool: &PgPool) -> Result<Vec<PricingRule>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PricingRuleRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM pricing_rules ORDER BY service_type, rule_type, created_at"
    ))
    .fetch_all(pool)
    .await?;

    Ok(decode_rows(rows))
}

/// Whether an active base-price rule already exists for the service type.
pub async fn has_active_base_price(pool: &PgPool, service_type: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM pricing_rules \
         WHERE service_type = $1 AND rule_type = 'base_price' AND active)",
    )
    .bind(service_type)
    .fetch_one(pool)
    .await
}

/// Raw discriminator state for invariant checks, readable even when the row
/// itself no longer decodes.
#[derive(Debug)]
pub struct RuleState {
    pub service_type: String,
    pub rule_type: String,
    pub active: bool,
}

pub async fn find_state(pool: &PgPool, id: Uuid) -> Result<Option<RuleState>, sqlx::Error> {
    let row: Option<(String, String, bool)> =
        sqlx::query_as("SELECT service_type, rule_type, active FROM pricing_rules WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(service_type, rule_type, active)| RuleState {
        service_type,
        rule_type,
        active,
    }))
}

/// Like `has_active_base_price`, excluding the rule being edited.
pub async fn has_other_active_base_price(
    pool: &PgPool,
    service_type: &str,
    exclude_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM pricing_rules \
         WHERE service_type = $1 AND rule_type = 'base_price' AND active AND id <> $2)",
    )
    .bind(service_type)
    .bind(exclude_id)
    .fetch_one(pool)
    .await
}

pub async fn insert(
    pool: &PgPool,
    input: &CreatePricingRuleInput,
) -> Result<Option<PricingRule>, sqlx::Error> {
    let columns = kind_columns(&input.kind);
    let row = sqlx::query_as::<_, PricingRuleRow>(&format!(
        "INSERT INTO pricing_rules \
             (service_type, rule_type, amount, rate_per_unit, included_units, extra_name, frequency) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(&input.service_type)
    .bind(columns.rule_type)
    .bind(columns.amount)
    .bind(columns.rate_per_unit)
    .bind(columns.included_units)
    .bind(columns.extra_name)
    .bind(columns.frequency)
    .fetch_one(pool)
    .await?;

    Ok(row.decode())
}

/// Edit or deactivate a rule. Rules are never deleted so historical quotes
/// stay reproducible.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    input: &UpdatePricingRuleInput,
) -> Result<Option<PricingRule>, sqlx::Error> {
    let columns = input.kind.as_ref().map(kind_columns);
    let row = sqlx::query_as::<_, PricingRuleRow>(&format!(
        "UPDATE pricing_rules SET \
             rule_type = COALESCE($2, rule_type), \
             amount = CASE WHEN $2 IS NULL THEN amount ELSE $3 END, \
             rate_per_unit = CASE WHEN $2 IS NULL THEN rate_per_unit ELSE $4 END, \
             included_units = CASE WHEN $2 IS NULL THEN included_units ELSE $5 END, \
             extra_name = CASE WHEN $2 IS NULL THEN extra_name ELSE $6 END, \
             frequency = CASE WHEN $2 IS NULL THEN frequency ELSE $7 END, \
             active = COALESCE($8, active), \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(id)
    .bind(columns.as_ref().map(|c| c.rule_type))
    .bind(columns.as_ref().and_then(|c| c.amount))
    .bind(columns.as_ref().and_then(|c| c.rate_per_unit))
    .bind(columns.as_ref().and_then(|c| c.included_units))
    .bind(columns.as_ref().and_then(|c| c.extra_name))
    .bind(columns.as_ref().and_then(|c| c.frequency))
    .bind(input.active)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(PricingRuleRow::decode))
}
