//! Slot resolution
//!
//! Start from the union of cleaner working windows for the weekday, subtract
//! everything already committed (confirmed bookings, approved time off), and
//! discretize what remains into bookable slots on a fixed-granularity grid.
//! Output order is ascending by start time and stable across calls for the
//! same inputs; the UI renders slots in returned order.

use chrono::{NaiveTime, Timelike};

use crate::domain::availability::TimeRange;

/// Offerable slots of `granularity_minutes` length within the free time.
///
/// `busy` carries both booked windows and time off; callers concatenate the
/// two. Slots align to the granularity grid counted from midnight, so an
/// 08:30 window opening with hourly slots first offers 09:00.
pub fn resolve_slots(
    working: &[TimeRange],
    busy: &[TimeRange],
    granularity_minutes: u32,
) -> Vec<TimeRange> {
    let granularity = granularity_minutes.max(1);
    let free = subtract(merge(working), &merge(busy));

    let mut slots = Vec::new();
    for (start, end) in free {
        let mut slot_start = start.div_ceil(granularity) * granularity;
        while slot_start + granularity <= end {
            if let Some(slot) = range_from_minutes(slot_start, slot_start + granularity) {
                slots.push(slot);
            }
            slot_start += granularity;
        }
    }
    slots
}

fn minutes(t: NaiveTime) -> u32 {
    t.num_seconds_from_midnight() / 60
}

fn range_from_minutes(start: u32, end: u32) -> Option<TimeRange> {
    Some(TimeRange::new(
        NaiveTime::from_num_seconds_from_midnight_opt(start * 60, 0)?,
        NaiveTime::from_num_seconds_from_midnight_opt(end * 60, 0)?,
    ))
}

/// Sort and coalesce overlapping or touching windows into minute intervals.
fn merge(ranges: &[TimeRange]) -> Vec<(u32, u32)> {
    let mut intervals: Vec<(u32, u32)> = ranges
        .iter()
        .map(|r| (minutes(r.start), minutes(r.end)))
        .filter(|(start, end)| start < end)
        .collect();
    intervals.sort_unstable();

    let mut merged: Vec<(u32, u32)> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match merged.last_mut() {
            Some((_, last_end)) if start <= *last_end => *last_end = (*last_end).max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Remove every busy interval from the free intervals. Both inputs must be
/// merged and ascending.
fn subtract(free: Vec<(u32, u32)>, busy: &[(u32, u32)]) -> Vec<(u32, u32)> {
    let mut result = Vec::new();
    for (mut start, end) in free {
        for &(busy_start, busy_end) in busy {
            if busy_end <= start || busy_start >= end {
                continue;
            }
            if busy_start > start {
                result.push((start, busy_start));
            }
            start = start.max(busy_end);
            if start >= end {
                break;
            }
        }
        if start < end {
            result.push((start, end));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn range(start: (u32, u32), end: (u32, u32)) -> TimeRange {
        TimeRange::new(t(start.0, start.1), t(end.0, end.1))
    }

    #[test]
    fn open_day_fills_with_hourly_slots() {
        let slots = resolve_slots(&[range((9, 0), (12, 0))], &[], 60);
        assert_eq!(
            slots,
            vec![
                range((9, 0), (10, 0)),
                range((10, 0), (11, 0)),
                range((11, 0), (12, 0)),
            ]
        );
    }

    #[test]
    fn booked_window_is_excluded() {
        let working = [range((8, 0), (17, 0))];
        let booked = [range((10, 0), (12, 0))];
        let slots = resolve_slots(&working, &booked, 60);

        assert!(!slots.is_empty());
        for slot in &slots {
            assert!(!slot.overlaps(&booked[0]), "slot {:?} overlaps booking", slot);
        }
    }

    #[test]
    fn fully_booked_day_has_no_slots() {
        let working = [range((9, 0), (12, 0))];
        let booked = [range((9, 0), (12, 0))];
        assert!(resolve_slots(&working, &booked, 60).is_empty());
    }

    #[test]
    fn time_off_subtracts_like_bookings() {
        let working = [range((9, 0), (17, 0))];
        let busy = [range((9, 0), (13, 0)), range((14, 0), (17, 0))];
        let slots = resolve_slots(&working, &busy, 60);
        assert_eq!(slots, vec![range((13, 0), (14, 0))]);
    }

    #[test]
    fn overlapping_cleaner_windows_union() {
        let working = [range((9, 0), (12, 0)), range((11, 0), (15, 0))];
        let slots = resolve_slots(&working, &[], 60);
        assert_eq!(slots.len(), 6);
        assert_eq!(slots.first().unwrap().start, t(9, 0));
        assert_eq!(slots.last().unwrap().end, t(15, 0));
    }

    #[test]
    fn unaligned_opening_snaps_to_grid() {
        let slots = resolve_slots(&[range((8, 30), (11, 0))], &[], 60);
        assert_eq!(slots, vec![range((9, 0), (10, 0)), range((10, 0), (11, 0))]);
    }

    #[test]
    fn half_hour_granularity() {
        let slots = resolve_slots(&[range((9, 0), (10, 30))], &[], 30);
        assert_eq!(
            slots,
            vec![
                range((9, 0), (9, 30)),
                range((9, 30), (10, 0)),
                range((10, 0), (10, 30)),
            ]
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let working = [range((12, 0), (18, 0)), range((8, 0), (11, 0))];
        let busy = [range((13, 0), (14, 0))];
        let first = resolve_slots(&working, &busy, 60);
        let second = resolve_slots(&working, &busy, 60);
        assert_eq!(first, second);
        let mut sorted = first.clone();
        sorted.sort_by_key(|slot| slot.start);
        assert_eq!(first, sorted);
    }

    #[test]
    fn inverted_and_empty_windows_are_ignored() {
        let working = [range((12, 0), (9, 0)), range((9, 0), (9, 0))];
        assert!(resolve_slots(&working, &[], 60).is_empty());
    }
}
