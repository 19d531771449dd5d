//! Quote calculation
//!
//! `calculate_pricing` is pure and total: the wizard calls it after every
//! draft mutation, so it must always produce a renderable quote and must
//! never fail for a well-typed draft. A missing rule is a configuration gap
//! recovered via documented defaults, not an error.

use rust_decimal::Decimal;

use crate::domain::draft::BookingDraft;
use crate::domain::pricing::{Frequency, LineItem, PriceBreakdown, PricingRule, RuleKind};

/// Fallback base price when no `base_price` rule exists for the service
/// type: $120.00.
pub fn default_base_price() -> Decimal {
    Decimal::new(12_000, 2)
}

/// Minimum room counts assumed when the draft has not reached the details
/// step yet.
const MIN_ROOMS: u32 = 1;

/// Itemize and total a draft against a rule set.
///
/// Calling this twice on an unchanged draft yields identical output; the UI
/// diffs breakdowns across keystrokes and relies on that.
pub fn calculate_pricing(draft: &BookingDraft, rules: &[PricingRule]) -> PriceBreakdown {
    let service_type = draft.service_type.as_deref().unwrap_or("");
    let mut line_items = Vec::new();

    // Base price. An unknown service type prices against the default so a
    // quote always renders something actionable.
    let base = find_rule(rules, service_type, |kind| match kind {
        RuleKind::BasePrice { amount } => Some(*amount),
        _ => None,
    })
    .unwrap_or_else(default_base_price);
    line_items.push(LineItem {
        description: "Base price".to_string(),
        amount: base,
    });

    // Square footage beyond the plan's included allowance, never negative.
    if let (Some(sqft), Some((rate, included))) = (
        draft.square_footage,
        find_rule(rules, service_type, |kind| match kind {
            RuleKind::SqftRate {
                rate_per_sqft,
                included_sqft,
            } => Some((*rate_per_sqft, *included_sqft)),
            _ => None,
        }),
    ) {
        let billable = sqft.saturating_sub(included);
        if billable > 0 {
            line_items.push(LineItem {
                description: format!("Square footage ({} sq ft over {})", billable, included),
                amount: (rate * Decimal::from(billable)).round_dp(2),
            });
        }
    }

    // Rooms beyond the included counts, floored at zero.
    let bedrooms = draft.bedrooms.unwrap_or(MIN_ROOMS).max(MIN_ROOMS);
    if let Some((rate, included)) = find_rule(rules, service_type, |kind| match kind {
        RuleKind::BedroomRate {
            rate_per_room,
            included_rooms,
        } => Some((*rate_per_room, *included_rooms)),
        _ => None,
    }) {
        let billable = bedrooms.saturating_sub(included);
        if billable > 0 {
            line_items.push(LineItem {
                description: format!("Additional bedrooms ({})", billable),
                amount: (rate * Decimal::from(billable)).round_dp(2),
            });
        }
    }

    let bathrooms = draft.bathrooms.unwrap_or(MIN_ROOMS).max(MIN_ROOMS);
    if let Some((rate, included)) = find_rule(rules, service_type, |kind| match kind {
        RuleKind::BathroomRate {
            rate_per_room,
            included_rooms,
        } => Some((*rate_per_room, *included_rooms)),
        _ => None,
    }) {
        let billable = bathrooms.saturating_sub(included);
        if billable > 0 {
            line_items.push(LineItem {
                description: format!("Additional bathrooms ({})", billable),
                amount: (rate * Decimal::from(billable)).round_dp(2),
            });
        }
    }

    // Extras, one line item each, in selection order. An extra with no rule
    // simply does not price.
    for extra in &draft.selected_extras {
        if let Some(amount) = find_rule(rules, service_type, |kind| match kind {
            RuleKind::ExtraService { name, amount } if name == extra => Some(*amount),
            _ => None,
        }) {
            line_items.push(LineItem {
                description: extra.clone(),
                amount,
            });
        }
    }

    let subtotal: Decimal = line_items.iter().map(|item| item.amount).sum();

    // Frequency discount on the post-extras subtotal.
    let mut total = subtotal;
    if draft.frequency != Frequency::OneTime {
        if let Some(percent_off) = find_rule(rules, service_type, |kind| match kind {
            RuleKind::FrequencyDiscount {
                frequency,
                percent_off,
            } if *frequency == draft.frequency => Some(*percent_off),
            _ => None,
        }) {
            let discount = (subtotal * percent_off / Decimal::from(100)).round_dp(2);
            if discount > Decimal::ZERO {
                line_items.push(LineItem {
                    description: format!("{} discount", frequency_label(draft.frequency)),
                    amount: -discount,
                });
                total -= discount;
            }
        }
    }

    if total < Decimal::ZERO {
        total = Decimal::ZERO;
    }

    PriceBreakdown {
        line_items,
        total: total.round_dp(2),
        duration_hours: estimate_duration_hours(draft),
    }
}

/// Look up an active rule, preferring the draft's service type and falling
/// back to any service type so a misconfigured or unknown type still quotes.
fn find_rule<T>(
    rules: &[PricingRule],
    service_type: &str,
    select: impl Fn(&RuleKind) -> Option<T>,
) -> Option<T> {
    rules
        .iter()
        .filter(|r| r.active && r.service_type == service_type)
        .find_map(|r| select(&r.kind))
        .or_else(|| {
            rules
                .iter()
                .filter(|r| r.active)
                .find_map(|r| select(&r.kind))
        })
}

fn frequency_label(frequency: Frequency) -> &'static str {
    match frequency {
        Frequency::OneTime => "One-time",
        Frequency::Weekly => "Weekly",
        Frequency::Biweekly => "Biweekly",
        Frequency::Monthly => "Monthly",
    }
}

/// Crew-time estimate for the draft, in quarter-hour steps.
///
/// Two hours for the base visit, half an hour per room beyond the first of
/// each kind, a quarter hour per extra, and half an hour per 500 sq ft over
/// 1000.
fn estimate_duration_hours(draft: &BookingDraft) -> f64 {
    let bedrooms = draft.bedrooms.unwrap_or(MIN_ROOMS).max(MIN_ROOMS);
    let bathrooms = draft.bathrooms.unwrap_or(MIN_ROOMS).max(MIN_ROOMS);
    let sqft = draft.square_footage.unwrap_or(0);

    // Saturating throughout: `/quotes` takes unvalidated bodies, and an
    // absurd draft must still price rather than overflow.
    let quarter_hours = 8u32 // 2h base
        .saturating_add((bedrooms - 1).saturating_mul(2))
        .saturating_add((bathrooms - 1).saturating_mul(2))
        .saturating_add(u32::try_from(draft.selected_extras.len()).unwrap_or(u32::MAX))
        .saturating_add((sqft.saturating_sub(1000) / 500).saturating_mul(2));

    f64::from(quarter_hours) / 4.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn rule(service_type: &str, kind: RuleKind) -> PricingRule {
        PricingRule {
            id: Uuid::new_v4(),
            service_type: service_type.to_string(),
            kind,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn standard_rules() -> Vec<PricingRule> {
        let st = "Standard Home Cleaning";
        vec![
            rule(st, RuleKind::BasePrice { amount: dec("140") }),
            rule(
                st,
                RuleKind::SqftRate {
                    rate_per_sqft: dec("0.05"),
                    included_sqft: 1000,
                },
            ),
            rule(
                st,
                RuleKind::BedroomRate {
                    rate_per_room: dec("15"),
                    included_rooms: 3,
                },
            ),
            rule(
                st,
                RuleKind::BathroomRate {
                    rate_per_room: dec("20"),
                    included_rooms: 2,
                },
            ),
            rule(
                st,
                RuleKind::ExtraService {
                    name: "Inside Fridge".to_string(),
                    amount: dec("25"),
                },
            ),
            rule(
                st,
                RuleKind::FrequencyDiscount {
                    frequency: Frequency::Biweekly,
                    percent_off: dec("10"),
                },
            ),
        ]
    }

    fn standard_draft() -> BookingDraft {
        BookingDraft {
            service_type: Some("Standard Home Cleaning".to_string()),
            frequency: Frequency::Biweekly,
            square_footage: Some(1500),
            bedrooms: Some(3),
            bathrooms: Some(2),
            selected_extras: vec!["Inside Fridge".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn standard_biweekly_quote_totals_171() {
        let breakdown = calculate_pricing(&standard_draft(), &standard_rules());

        // 140 base + 25 sqft (500 x 0.05) + 25 extra = 190, minus 10% = 171
        assert_eq!(breakdown.total, dec("171.00"));

        let descriptions: Vec<&str> = breakdown
            .line_items
            .iter()
            .map(|item| item.description.as_str())
            .collect();
        assert_eq!(
            descriptions,
            vec![
                "Base price",
                "Square footage (500 sq ft over 1000)",
                "Inside Fridge",
                "Biweekly discount",
            ]
        );
        assert_eq!(breakdown.line_items[3].amount, dec("-19.00"));
    }

    #[test]
    fn recompute_is_idempotent() {
        let draft = standard_draft();
        let rules = standard_rules();
        let first = calculate_pricing(&draft, &rules);
        let second = calculate_pricing(&draft, &rules);
        assert_eq!(first, second);
    }

    #[test]
    fn adding_extras_never_decreases_total() {
        let rules = standard_rules();
        let mut draft = standard_draft();
        draft.selected_extras.clear();
        let without = calculate_pricing(&draft, &rules);

        draft.selected_extras.push("Inside Fridge".to_string());
        let with = calculate_pricing(&draft, &rules);

        assert!(with.total >= without.total);
    }

    #[test]
    fn empty_draft_prices_at_base_alone() {
        let rules = standard_rules();
        let draft = BookingDraft {
            service_type: Some("Standard Home Cleaning".to_string()),
            ..Default::default()
        };
        let breakdown = calculate_pricing(&draft, &rules);
        assert_eq!(breakdown.line_items.len(), 1);
        assert_eq!(breakdown.total, dec("140"));
    }

    #[test]
    fn unknown_service_type_falls_back_to_any_base() {
        let rules = standard_rules();
        let draft = BookingDraft {
            service_type: Some("Move-Out Deep Clean".to_string()),
            ..Default::default()
        };
        let breakdown = calculate_pricing(&draft, &rules);
        assert_eq!(breakdown.total, dec("140"));
    }

    #[test]
    fn no_rules_at_all_uses_default_base() {
        let draft = standard_draft();
        let breakdown = calculate_pricing(&draft, &[]);
        assert_eq!(breakdown.total, default_base_price());
    }

    #[test]
    fn total_and_non_discount_items_never_negative() {
        let rules = standard_rules();
        let draft = BookingDraft {
            service_type: Some("Standard Home Cleaning".to_string()),
            frequency: Frequency::Biweekly,
            square_footage: Some(400), // under the included allowance
            bedrooms: Some(1),
            bathrooms: Some(1),
            ..Default::default()
        };
        let breakdown = calculate_pricing(&draft, &rules);
        assert!(breakdown.total >= Decimal::ZERO);
        for item in &breakdown.line_items {
            if !item.description.ends_with("discount") {
                assert!(item.amount >= Decimal::ZERO, "{:?}", item);
            }
        }
    }

    #[test]
    fn inactive_rules_are_ignored() {
        let mut rules = standard_rules();
        for r in &mut rules {
            if matches!(r.kind, RuleKind::FrequencyDiscount { .. }) {
                r.active = false;
            }
        }
        let breakdown = calculate_pricing(&standard_draft(), &rules);
        assert_eq!(breakdown.total, dec("190.00"));
    }

    #[test]
    fn extreme_field_values_still_price() {
        let draft = BookingDraft {
            service_type: Some("Standard Home Cleaning".to_string()),
            square_footage: Some(u32::MAX),
            bedrooms: Some(u32::MAX),
            bathrooms: Some(u32::MAX),
            ..Default::default()
        };
        let breakdown = calculate_pricing(&draft, &standard_rules());
        assert!(breakdown.total >= Decimal::ZERO);
        // The room terms alone saturate the quarter-hour counter.
        assert_eq!(breakdown.duration_hours, f64::from(u32::MAX) / 4.0);
    }

    #[test]
    fn duration_grows_with_scope() {
        let small = calculate_pricing(&BookingDraft::default(), &standard_rules());
        let large = calculate_pricing(&standard_draft(), &standard_rules());
        assert!(large.duration_hours > small.duration_hours);
        assert_eq!(small.duration_hours, 2.0);
    }
}
