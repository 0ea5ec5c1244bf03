//! Quarterly quota boundaries.
//!
//! Only computes boundaries. Zeroing `swaps_used` is triggered by an external
//! batch job through [`crate::EntitlementEngine::reset_quarter_usage`].

use chrono::{DateTime, Datelike, TimeZone, Utc};

use crate::trial::ceil_days;

/// Start of the next calendar quarter (Jan 1, Apr 1, Jul 1, Oct 1 at 00:00 UTC)
/// strictly after `reference`.
///
/// Saturates at `DateTime::<Utc>::MAX_UTC` in the last representable quarter.
#[must_use]
pub fn next_quarter_reset(reference: DateTime<Utc>) -> DateTime<Utc> {
    let current_quarter_start_month = (reference.month0() / 3) * 3 + 1;
    let (year, month) = if current_quarter_start_month == 10 {
        (reference.year() + 1, 1)
    } else {
        (reference.year(), current_quarter_start_month + 3)
    };

    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Whole days until the next reset, rounded up.
#[must_use]
pub fn days_until_quarter_reset(reference: DateTime<Utc>) -> i64 {
    ceil_days(next_quarter_reset(reference) - reference)
}

/// `true` when a quarter boundary lies in `(since, now]`.
///
/// Lets the batch trigger decide whether usage last reset at `since` is stale.
#[must_use]
pub fn crossed_quarter_boundary(since: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= next_quarter_reset(since)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn next_reset_for_each_quarter() {
        assert_eq!(next_quarter_reset(at(2025, 2, 10, 12)), at(2025, 4, 1, 0));
        assert_eq!(next_quarter_reset(at(2025, 5, 31, 23)), at(2025, 7, 1, 0));
        assert_eq!(next_quarter_reset(at(2025, 9, 30, 23)), at(2025, 10, 1, 0));
        assert_eq!(next_quarter_reset(at(2025, 12, 31, 23)), at(2026, 1, 1, 0));
    }

    #[test]
    fn reset_is_strictly_after_a_boundary_reference() {
        assert_eq!(next_quarter_reset(at(2025, 4, 1, 0)), at(2025, 7, 1, 0));
        assert_eq!(next_quarter_reset(at(2026, 1, 1, 0)), at(2026, 4, 1, 0));
    }

    #[test]
    fn last_representable_quarter_saturates() {
        let max = DateTime::<Utc>::MAX_UTC;
        assert_eq!(next_quarter_reset(max), max);
        assert_eq!(days_until_quarter_reset(max), 0);
        assert!(crossed_quarter_boundary(max, max));
    }

    #[test]
    fn days_until_reset_rounds_up() {
        assert_eq!(days_until_quarter_reset(at(2025, 3, 31, 0)), 1);
        assert_eq!(days_until_quarter_reset(at(2025, 3, 31, 12)), 1);
        assert_eq!(days_until_quarter_reset(at(2025, 1, 1, 0)), 90);
    }

    #[test]
    fn boundary_crossing() {
        assert!(!crossed_quarter_boundary(at(2025, 1, 5, 0), at(2025, 3, 31, 23)));
        assert!(crossed_quarter_boundary(at(2025, 1, 5, 0), at(2025, 4, 1, 0)));
        assert!(crossed_quarter_boundary(at(2024, 11, 5, 0), at(2025, 2, 1, 0)));
    }
}
