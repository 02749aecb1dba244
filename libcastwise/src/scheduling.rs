//! Posting-time selection and schedule bounds
//!
//! - [`OptimalTimeScheduler`] finds the next slot inside a platform's weekly
//!   posting window.
//! - [`check_window`] keeps a candidate time between now and
//!   [`MAX_SCHEDULE_DAYS`] ahead.
//! - [`parse_timestamp`] turns user input into an instant, refusing anything
//!   that is not a well-formed ISO-8601 time.
//!
//! Nothing here reads the clock: callers pass `now` and reference instants in.

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::ScheduleError;
use crate::rules::{OptimalWindow, RateLimitPolicy, RuleTable};
use crate::types::PlatformKey;

/// How far ahead a post may be scheduled
pub const MAX_SCHEDULE_DAYS: i64 = 30;

/// Naive layouts accepted in addition to RFC 3339; interpreted as UTC
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Picks posting times from each platform's recurring window
#[derive(Debug, Clone)]
pub struct OptimalTimeScheduler {
    rules: Arc<RuleTable>,
}

impl OptimalTimeScheduler {
    pub fn new(rules: Arc<RuleTable>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Next slot in `platform`'s posting window after `reference`
    ///
    /// Platforms without a window row get `reference` back unchanged.
    pub fn next_optimal_time(&self, platform: &str, reference: DateTime<Utc>) -> DateTime<Utc> {
        match self.rules.window(platform) {
            Some((key, window)) => {
                let next = next_in_window(window, reference).unwrap_or(reference);
                debug!(platform = %key, %reference, %next, "Computed next optimal time");
                next
            }
            None => {
                debug!(platform, "No posting window for platform, keeping reference time");
                reference
            }
        }
    }
}

/// Everything worth telling a user about when to post on one platform
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    /// Platform name as requested, lowercased
    pub platform: String,
    /// `None` for platforms without a posting window
    pub window: Option<OptimalWindow>,
    pub next_optimal: DateTime<Utc>,
    pub rate_limit: Option<RateLimitPolicy>,
}

impl OptimalTimeScheduler {
    /// Posting window, next slot and rate limit for `platform`
    ///
    /// Unknown platforms yield a suggestion with no window whose next slot
    /// is `reference` itself.
    pub fn suggest(&self, platform: &str, reference: DateTime<Utc>) -> Suggestion {
        let key = platform.parse::<PlatformKey>().ok();

        Suggestion {
            platform: platform.trim().to_lowercase(),
            window: key.and_then(|k| self.rules.window_for(k)).cloned(),
            next_optimal: self.next_optimal_time(platform, reference),
            rate_limit: key.and_then(|k| self.rules.rate_limit_for(k)).copied(),
        }
    }
}

/// Next whole-hour slot of `window` following `reference`
///
/// On the reference's own day only hours strictly after the reference hour
/// qualify; on any later day the earliest allowed hour is taken. Returns
/// `None` only when the calendar overflows.
pub fn next_in_window(window: &OptimalWindow, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let today = reference.date_naive();
    let landing = window.next_allowed_day(today)?;

    let (day, hour) = if landing == today {
        match window.first_hour_after(reference.hour()) {
            Some(hour) => (landing, hour),
            None => {
                let tomorrow = landing.checked_add_days(Days::new(1))?;
                (window.next_allowed_day(tomorrow)?, window.first_hour())
            }
        }
    } else {
        (landing, window.first_hour())
    };

    Some(day.and_hms_opt(hour, 0, 0)?.and_utc())
}

/// Reject times in the past or more than [`MAX_SCHEDULE_DAYS`] ahead
///
/// Both `now` and `now + MAX_SCHEDULE_DAYS` are themselves accepted.
pub fn check_window(candidate: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), ScheduleError> {
    if candidate < now {
        return Err(ScheduleError::PastTime);
    }

    let horizon = TimeDelta::try_days(MAX_SCHEDULE_DAYS)
        .and_then(|span| now.checked_add_signed(span))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    if candidate > horizon {
        return Err(ScheduleError::TooFarFuture {
            max_days: MAX_SCHEDULE_DAYS,
        });
    }

    Ok(())
}

/// Parse an ISO-8601 instant
///
/// Accepts RFC 3339 with an offset (`2025-01-20T10:00:00Z`,
/// `2025-01-20T12:00:00+02:00`), the same without an offset, and a bare date
/// (`2025-01-20`, midnight). Offset-free input is taken as UTC.
///
/// # Errors
///
/// Returns [`ScheduleError::MalformedTimestamp`] for anything else.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, ScheduleError> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ScheduleError::MalformedTimestamp(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    fn at(s: &str) -> DateTime<Utc> {
        parse_timestamp(s).unwrap()
    }

    fn scheduler() -> OptimalTimeScheduler {
        OptimalTimeScheduler::new(Arc::new(RuleTable::builtin()))
    }

    // NEXT OPTIMAL TIME

    #[test]
    fn test_same_day_picks_next_hour() {
        // Tuesday 09:30, x allows Tue 9-12
        let next = scheduler().next_optimal_time("x", at("2025-01-21T09:30:00Z"));
        assert_eq!(next, at("2025-01-21T10:00:00Z"));
    }

    #[test]
    fn test_same_day_exact_hour_moves_forward() {
        let next = scheduler().next_optimal_time("x", at("2025-01-21T09:00:00Z"));
        assert_eq!(next, at("2025-01-21T10:00:00Z"));
    }

    #[test]
    fn test_same_day_before_window_opens() {
        let next = scheduler().next_optimal_time("x", at("2025-01-21T03:15:42Z"));
        assert_eq!(next, at("2025-01-21T09:00:00Z"));
    }

    #[test]
    fn test_same_day_after_last_hour_rolls_to_next_allowed_day() {
        // Friday 12:05 is past x's last hour; next allowed day is Tuesday
        let next = scheduler().next_optimal_time("x", at("2025-01-24T12:05:00Z"));
        assert_eq!(next, at("2025-01-28T09:00:00Z"));
    }

    #[test]
    fn test_disallowed_day_lands_on_earliest_hour() {
        // Sunday evening: later calendar day, no "after current hour" rule
        let next = scheduler().next_optimal_time("x", at("2025-01-19T23:59:59Z"));
        assert_eq!(next, at("2025-01-21T09:00:00Z"));
        assert_eq!(next.weekday(), Weekday::Tue);
    }

    #[test]
    fn test_youtube_saturday_rolls_to_thursday() {
        let next = scheduler().next_optimal_time("youtube", at("2025-01-25T18:00:00Z"));
        assert_eq!(next, at("2025-01-30T14:00:00Z"));
    }

    #[test]
    fn test_platform_lookup_is_case_insensitive() {
        let reference = at("2025-01-21T09:30:00Z");
        assert_eq!(
            scheduler().next_optimal_time("TikTok", reference),
            at("2025-01-21T19:00:00Z")
        );
    }

    #[test]
    fn test_unknown_platform_returns_reference() {
        let reference = at("2025-01-21T09:30:17Z");
        assert_eq!(scheduler().next_optimal_time("myspace", reference), reference);
    }

    #[test]
    fn test_platform_without_window_returns_reference() {
        let empty = OptimalTimeScheduler::new(Arc::new(RuleTable::empty()));
        let reference = at("2025-01-21T09:30:17Z");
        assert_eq!(empty.next_optimal_time("x", reference), reference);
    }

    #[test]
    fn test_midnight_hour_is_reachable() {
        let window = OptimalWindow::new(vec![Weekday::Mon, Weekday::Tue], vec![0]).unwrap();
        // Monday 00:30: hour 0 is not strictly after 0, so Tuesday 00:00
        let next = next_in_window(&window, at("2025-01-20T00:30:00Z")).unwrap();
        assert_eq!(next, at("2025-01-21T00:00:00Z"));
    }

    #[test]
    fn test_single_day_window_wraps_full_week() {
        let window = OptimalWindow::new(vec![Weekday::Wed], vec![10]).unwrap();
        let next = next_in_window(&window, at("2025-01-22T11:00:00Z")).unwrap();
        assert_eq!(next, at("2025-01-29T10:00:00Z"));
    }

    #[test]
    fn test_suggest_known_platform() {
        let suggestion = scheduler().suggest("LinkedIn", at("2025-01-19T08:30:00Z"));
        assert_eq!(suggestion.platform, "linkedin");
        assert_eq!(suggestion.next_optimal, at("2025-01-21T08:00:00Z"));
        assert_eq!(suggestion.window.unwrap().hours(), &[8, 9, 10]);
        assert_eq!(suggestion.rate_limit, Some(RateLimitPolicy::new(2, 1000)));
    }

    #[test]
    fn test_suggest_unknown_platform() {
        let reference = at("2025-01-19T08:30:00Z");
        let suggestion = scheduler().suggest("myspace", reference);
        assert_eq!(suggestion.platform, "myspace");
        assert!(suggestion.window.is_none());
        assert!(suggestion.rate_limit.is_none());
        assert_eq!(suggestion.next_optimal, reference);
    }

    // WINDOW CHECK

    #[test]
    fn test_check_window_accepts_now_and_horizon() {
        let now = at("2025-01-01T00:00:00Z");
        assert!(check_window(now, now).is_ok());
        assert!(check_window(at("2025-01-31T00:00:00Z"), now).is_ok());
    }

    #[test]
    fn test_check_window_rejects_past() {
        let now = at("2025-01-01T00:00:00Z");
        assert_eq!(
            check_window(at("2024-12-31T23:59:59Z"), now),
            Err(ScheduleError::PastTime)
        );
    }

    #[test]
    fn test_check_window_rejects_beyond_horizon() {
        let now = at("2025-01-01T00:00:00Z");
        assert_eq!(
            check_window(at("2025-01-31T00:00:01Z"), now),
            Err(ScheduleError::TooFarFuture { max_days: 30 })
        );
    }

    // TIMESTAMP PARSING

    #[test]
    fn test_parse_rfc3339_with_offset() {
        assert_eq!(
            parse_timestamp("2025-01-20T12:00:00+02:00").unwrap(),
            at("2025-01-20T10:00:00Z")
        );
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let parsed = parse_timestamp("2025-01-20T10:00:00.250Z").unwrap();
        assert_eq!(parsed.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_naive_as_utc() {
        assert_eq!(
            parse_timestamp("2025-01-20T10:00").unwrap(),
            at("2025-01-20T10:00:00Z")
        );
        assert_eq!(
            parse_timestamp("2025-01-20T10:00:30").unwrap(),
            at("2025-01-20T10:00:30Z")
        );
    }

    #[test]
    fn test_parse_bare_date_is_midnight() {
        assert_eq!(
            parse_timestamp("2025-01-20").unwrap(),
            at("2025-01-20T00:00:00Z")
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "tomorrow", "2025-13-01", "2025-01-20T25:00:00Z", "20/01/2025"] {
            assert!(
                matches!(
                    parse_timestamp(input),
                    Err(ScheduleError::MalformedTimestamp(_))
                ),
                "expected '{}' to be rejected",
                input
            );
        }
    }
}
