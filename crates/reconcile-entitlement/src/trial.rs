//! Trial clock
//!
//! The only place that turns a trial start into an end date, an inactivity
//! date, or a day count. Everything else asks this module.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use reconcile_core::{
    CoreError, CoreResult, TrialConfig, TrialStart, TRIAL_END_FIELD, TRIAL_START_FIELD,
};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Trial date arithmetic for a fixed trial length and grace window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialClock {
    duration: Duration,
    grace: Duration,
}

impl TrialClock {
    #[must_use]
    pub fn new(duration_days: u32, grace_days: u32) -> Self {
        Self {
            duration: Duration::days(i64::from(duration_days)),
            grace: Duration::days(i64::from(grace_days)),
        }
    }

    #[must_use]
    pub fn from_config(config: &TrialConfig) -> Self {
        Self::new(config.duration_days, config.grace_days)
    }

    fn checked_trial_end(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        start.checked_add_signed(self.duration)
    }

    fn checked_inactive_date(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.checked_trial_end(start)?.checked_add_signed(self.grace)
    }

    /// First instant at which the trial is no longer active.
    ///
    /// Saturates at `DateTime::<Utc>::MAX_UTC` when the end lies past the
    /// representable range.
    #[must_use]
    pub fn trial_end_date(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        self.checked_trial_end(start)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Trial end plus the grace window, saturating like [`Self::trial_end_date`].
    #[must_use]
    pub fn inactive_date(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        self.checked_inactive_date(start)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// `true` iff the trial has started and `now` is before its end.
    ///
    /// A start in the future counts as active: clock skew must not expire a
    /// trial early.
    #[must_use]
    pub fn is_trial_active(&self, start: &TrialStart, now: DateTime<Utc>) -> bool {
        match start.started_at() {
            Some(start) => now < self.trial_end_date(start),
            None => false,
        }
    }

    /// Whole days left in the trial, rounded up; 0 when unset or ended.
    #[must_use]
    pub fn trial_days_remaining(&self, start: &TrialStart, now: DateTime<Utc>) -> i64 {
        match start.started_at() {
            Some(start) => ceil_days(self.trial_end_date(start) - now),
            None => 0,
        }
    }

    /// `true` once the grace window after trial end has fully run out.
    ///
    /// Fires at [`Self::inactive_date`] itself: with a 30-day grace and a
    /// trial ending 2025-01-15, 2025-02-14T00:00:00Z is past grace and
    /// 2025-02-13T23:59:59Z is not.
    #[must_use]
    pub fn is_grace_elapsed(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now >= self.inactive_date(start)
    }

    /// Whole days until an expired trial goes inactive, rounded up, floored at 0.
    #[must_use]
    pub fn days_until_inactive(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        ceil_days(self.inactive_date(start) - now)
    }

    /// Derives a start date from the legacy end-date field.
    ///
    /// `None` when there is no end date or the derived start is out of range.
    #[must_use]
    pub fn coerce_trial_start_date(
        &self,
        trial_end: Option<DateTime<Utc>>,
    ) -> Option<DateTime<Utc>> {
        trial_end.and_then(|end| end.checked_sub_signed(self.duration))
    }

    /// Builds the trial start from the persisted fields.
    ///
    /// The legacy end date is consulted only when no start date is stored.
    /// Unparseable text, and dates whose inactivity date falls outside the
    /// representable range, are kept as [`TrialStart::Malformed`] instead of
    /// failing the load.
    #[must_use]
    pub fn load_trial_start(
        &self,
        trial_start_date: Option<&str>,
        trial_end_date: Option<&str>,
    ) -> TrialStart {
        let malformed = |field: &'static str, raw: &str| TrialStart::Malformed {
            field,
            raw: raw.to_string(),
        };

        if let Some(raw) = trial_start_date {
            return match parse_timestamp(TRIAL_START_FIELD, raw) {
                Ok(start) if self.checked_inactive_date(start).is_some() => {
                    TrialStart::Started(start)
                }
                _ => malformed(TRIAL_START_FIELD, raw),
            };
        }

        let Some(raw) = trial_end_date else {
            return TrialStart::Unset;
        };
        parse_timestamp(TRIAL_END_FIELD, raw)
            .ok()
            .and_then(|end| self.coerce_trial_start_date(Some(end)))
            .filter(|start| self.checked_inactive_date(*start).is_some())
            .map_or_else(|| malformed(TRIAL_END_FIELD, raw), TrialStart::Started)
    }
}

impl Default for TrialClock {
    fn default() -> Self {
        Self::from_config(&TrialConfig::default())
    }
}

/// Parses an RFC 3339 timestamp, or a bare `YYYY-MM-DD` date as UTC midnight.
pub fn parse_timestamp(field: &'static str, raw: &str) -> CoreResult<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
        .ok_or_else(|| CoreError::malformed_timestamp(field, raw))
}

/// Rounds a span up to whole days, never below zero.
pub(crate) fn ceil_days(span: Duration) -> i64 {
    let millis = span.num_milliseconds();
    if millis <= 0 {
        0
    } else {
        (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    }
}
