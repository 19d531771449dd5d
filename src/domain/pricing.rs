//! Pricing rule types
//!
//! The rate table is admin-configurable and versioned by soft deactivation:
//! rules are never deleted, so a historical quote stays reproducible against
//! the rule set that produced it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking frequency
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    OneTime,
    Weekly,
    Biweekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::OneTime => "one_time",
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "one_time" => Some(Frequency::OneTime),
            "weekly" => Some(Frequency::Weekly),
            "biweekly" => Some(Frequency::Biweekly),
            "monthly" => Some(Frequency::Monthly),
            _ => None,
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One kind of pricing rule.
///
/// A tagged variant per kind keeps the flat-amount / per-unit-rate split
/// unrepresentable as an invalid combination: a base price cannot carry a
/// rate, an extra cannot lack a name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "rule_type", rename_all = "snake_case")]
pub enum RuleKind {
    BasePrice {
        amount: Decimal,
    },
    SqftRate {
        rate_per_sqft: Decimal,
        /// Square footage covered by the base price; only footage beyond
        /// this is charged.
        included_sqft: u32,
    },
    BedroomRate {
        rate_per_room: Decimal,
        included_rooms: u32,
    },
    BathroomRate {
        rate_per_room: Decimal,
        included_rooms: u32,
    },
    ExtraService {
        name: String,
        amount: Decimal,
    },
    FrequencyDiscount {
        frequency: Frequency,
        /// Percentage off the post-extras subtotal, e.g. 10 for 10%.
        percent_off: Decimal,
    },
}

impl RuleKind {
    pub fn rule_type(&self) -> &'static str {
        match self {
            RuleKind::BasePrice { .. } => "base_price",
            RuleKind::SqftRate { .. } => "sqft_rate",
            RuleKind::BedroomRate { .. } => "bedroom_rate",
            RuleKind::BathroomRate { .. } => "bathroom_rate",
            RuleKind::ExtraService { .. } => "extra_service",
            RuleKind::FrequencyDiscount { .. } => "frequency_discount",
        }
    }
}

/// A pricing rule row scoped to one service type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingRule {
    pub id: Uuid,
    pub service_type: String,
    #[serde(flatten)]
    pub kind: RuleKind,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create pricing rule input
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePricingRuleInput {
    pub service_type: String,
    #[serde(flatten)]
    pub kind: RuleKind,
}

/// Update pricing rule input (deactivation included; no hard delete)
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePricingRuleInput {
    pub kind: Option<RuleKind>,
    pub active: Option<bool>,
}

/// One itemized contributor to a quote (base, surcharge, extra, discount).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub description: String,
    pub amount: Decimal,
}

/// Itemized quote for a draft. A derived cache on the draft, never a source
/// of truth: always recomputable from the draft fields and the active rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBreakdown {
    pub line_items: Vec<LineItem>,
    pub total: Decimal,
    pub duration_hours: f64,
}
