//! Recurrence occurrence planning
//!
//! Pure calendar math for the materializer: given a template and today's
//! date, which occurrence dates are due? Occurrences anchor at the first
//! matching weekday on or after `start_date` and step by the frequency
//! cycle, so a delayed run catches up on every missed occurrence instead of
//! silently dropping them.

use chrono::{Duration, NaiveDate};
use std::collections::HashSet;

use crate::domain::booking::{weekday_index, RecurringBookingTemplate};
use crate::domain::pricing::Frequency;

/// Days between occurrences.
fn cycle_days(frequency: Frequency) -> Option<i64> {
    match frequency {
        // One-time bookings never become templates.
        Frequency::OneTime => None,
        Frequency::Weekly => Some(7),
        Frequency::Biweekly => Some(14),
        // Four-week cycle keeps the template's weekday stable.
        Frequency::Monthly => Some(28),
    }
}

/// First date on or after `start` falling on `day_of_week` (0 = Sunday).
pub fn first_occurrence(start: NaiveDate, day_of_week: i16) -> NaiveDate {
    let offset = i64::from((day_of_week - weekday_index(start)).rem_euclid(7));
    start + Duration::days(offset)
}

/// Occurrence dates due for the template, up to and including `today`.
///
/// Dates at or before `last_materialized_date` are already done; `end_date`
/// caps the window when present. The result is ascending and duplicate-free
/// by construction.
pub fn due_occurrences(template: &RecurringBookingTemplate, today: NaiveDate) -> Vec<NaiveDate> {
    let Some(step) = cycle_days(template.service_frequency) else {
        return Vec::new();
    };

    let mut end = today;
    if let Some(template_end) = template.end_date {
        end = end.min(template_end);
    }

    let mut due = Vec::new();
    let mut date = first_occurrence(template.start_date, template.day_of_week);
    while date <= end {
        let already_done = template
            .last_materialized_date
            .is_some_and(|last| date <= last);
        if !already_done {
            due.push(date);
        }
        date += Duration::days(step);
    }
    due
}

/// Drop due dates that already have a booking.
///
/// The materializer re-checks each date against the store immediately before
/// insert; this pre-filter just avoids pointless round trips when the same
/// run (or an overlapping one) already created the instance.
pub fn without_existing(due: Vec<NaiveDate>, existing: &HashSet<NaiveDate>) -> Vec<NaiveDate> {
    due.into_iter()
        .filter(|date| !existing.contains(date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn template(
        day_of_week: i16,
        frequency: Frequency,
        start: NaiveDate,
    ) -> RecurringBookingTemplate {
        RecurringBookingTemplate {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            service_type: "Standard Home Cleaning".to_string(),
            address: "123 Main St".to_string(),
            day_of_week,
            booking_time: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            service_frequency: frequency,
            final_price: Decimal::new(14_000, 2),
            start_date: start,
            end_date: None,
            last_materialized_date: None,
            special_instructions: None,
            created_at: Utc::now(),
        }
    }

    // 2020-06-01 was a Monday; Tuesdays that month: 2, 9, 16, 23, 30.

    #[test]
    fn catch_up_covers_every_elapsed_tuesday() {
        // Start three weeks back on a Wednesday; today is a Tuesday.
        let tpl = template(2, Frequency::Weekly, date(2020, 6, 3));
        let due = due_occurrences(&tpl, date(2020, 6, 23));
        assert_eq!(due, vec![date(2020, 6, 9), date(2020, 6, 16), date(2020, 6, 23)]);
    }

    #[test]
    fn start_yesterday_due_today() {
        // 2020-06-22 was a Monday, so a Tuesday template started then is
        // first due the next day.
        let tpl = template(2, Frequency::Weekly, date(2020, 6, 22));
        let due = due_occurrences(&tpl, date(2020, 6, 23));
        assert_eq!(due, vec![date(2020, 6, 23)]);
    }

    #[test]
    fn nothing_due_after_high_water_mark() {
        let mut tpl = template(2, Frequency::Weekly, date(2020, 6, 3));
        tpl.last_materialized_date = Some(date(2020, 6, 23));
        assert!(due_occurrences(&tpl, date(2020, 6, 23)).is_empty());
    }

    #[test]
    fn partial_high_water_mark_resumes_after_it() {
        let mut tpl = template(2, Frequency::Weekly, date(2020, 6, 3));
        tpl.last_materialized_date = Some(date(2020, 6, 9));
        let due = due_occurrences(&tpl, date(2020, 6, 23));
        assert_eq!(due, vec![date(2020, 6, 16), date(2020, 6, 23)]);
    }

    #[test]
    fn biweekly_steps_two_weeks() {
        let tpl = template(2, Frequency::Biweekly, date(2020, 6, 1));
        let due = due_occurrences(&tpl, date(2020, 6, 30));
        assert_eq!(due, vec![date(2020, 6, 2), date(2020, 6, 16), date(2020, 6, 30)]);
    }

    #[test]
    fn monthly_steps_four_weeks() {
        let tpl = template(2, Frequency::Monthly, date(2020, 6, 1));
        let due = due_occurrences(&tpl, date(2020, 6, 30));
        assert_eq!(due, vec![date(2020, 6, 2), date(2020, 6, 30)]);
    }

    #[test]
    fn end_date_caps_the_window() {
        let mut tpl = template(2, Frequency::Weekly, date(2020, 6, 3));
        tpl.end_date = Some(date(2020, 6, 17));
        let due = due_occurrences(&tpl, date(2020, 6, 30));
        assert_eq!(due, vec![date(2020, 6, 9), date(2020, 6, 16)]);
    }

    #[test]
    fn future_start_yields_nothing() {
        let tpl = template(2, Frequency::Weekly, date(2020, 7, 1));
        assert!(due_occurrences(&tpl, date(2020, 6, 23)).is_empty());
    }

    #[test]
    fn one_time_frequency_never_recurs() {
        let tpl = template(2, Frequency::OneTime, date(2020, 6, 3));
        assert!(due_occurrences(&tpl, date(2020, 6, 30)).is_empty());
    }

    #[test]
    fn existing_bookings_are_filtered_out() {
        let tpl = template(2, Frequency::Weekly, date(2020, 6, 3));
        let due = due_occurrences(&tpl, date(2020, 6, 23));
        let existing: HashSet<NaiveDate> = [date(2020, 6, 16)].into_iter().collect();
        assert_eq!(
            without_existing(due, &existing),
            vec![date(2020, 6, 9), date(2020, 6, 23)]
        );
    }

    #[test]
    fn planning_twice_with_mark_advanced_adds_nothing() {
        let mut tpl = template(2, Frequency::Weekly, date(2020, 6, 3));
        let today = date(2020, 6, 23);
        let first_run = due_occurrences(&tpl, today);
        assert_eq!(first_run.len(), 3);

        tpl.last_materialized_date = first_run.last().copied();
        assert!(due_occurrences(&tpl, today).is_empty());
    }

    #[test]
    fn first_occurrence_wraps_the_week() {
        // Saturday 2020-06-06; next Tuesday is the 9th.
        assert_eq!(first_occurrence(date(2020, 6, 6), 2), date(2020, 6, 9));
        // A Tuesday start is itself the first occurrence.
        assert_eq!(first_occurrence(date(2020, 6, 2), 2), date(2020, 6, 2));
    }
}
