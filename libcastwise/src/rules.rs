//! Per-platform rule tables
//!
//! A [`RuleTable`] holds everything the engines know about a platform:
//! its weekly posting window, content and media limits, and the rate-limit
//! policy a dispatcher must respect. Tables are immutable once built and are
//! handed to each engine at construction, so tests can swap in synthetic
//! tables freely.
//!
//! # Example
//!
//! ```
//! use libcastwise::rules::RuleTable;
//! use libcastwise::types::PlatformKey;
//!
//! let rules = RuleTable::builtin();
//! let limits = rules.limits_for(PlatformKey::X).unwrap();
//! assert_eq!(limits.max_length, 280);
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

use crate::error::RuleError;
use crate::types::PlatformKey;

/// Weekly recurring set of weekdays and whole hours (UTC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimalWindow {
    weekdays: Vec<Weekday>,
    hours: Vec<u32>,
}

impl OptimalWindow {
    /// Build a window, rejecting empty sets and hours outside `0..=23`
    ///
    /// Weekdays are kept in Sunday-first order and hours ascending, both
    /// without duplicates.
    pub fn new(
        weekdays: impl IntoIterator<Item = Weekday>,
        hours: impl IntoIterator<Item = u32>,
    ) -> Result<Self, RuleError> {
        let mut weekdays: Vec<Weekday> = weekdays.into_iter().collect();
        weekdays.sort_by_key(|d| d.num_days_from_sunday());
        weekdays.dedup();

        let mut hours: Vec<u32> = hours.into_iter().collect();
        hours.sort_unstable();
        hours.dedup();

        if weekdays.is_empty() {
            return Err(RuleError::EmptyWeekdays);
        }
        if hours.is_empty() {
            return Err(RuleError::EmptyHours);
        }
        if let Some(&bad) = hours.iter().find(|&&h| h > 23) {
            return Err(RuleError::InvalidHour(bad));
        }

        Ok(Self { weekdays, hours })
    }

    pub fn weekdays(&self) -> &[Weekday] {
        &self.weekdays
    }

    pub fn hours(&self) -> &[u32] {
        &self.hours
    }

    pub fn allows_day(&self, day: Weekday) -> bool {
        self.weekdays.contains(&day)
    }

    pub fn allows_hour(&self, hour: u32) -> bool {
        self.hours.contains(&hour)
    }

    /// Earliest allowed hour of any allowed day
    pub fn first_hour(&self) -> u32 {
        self.hours[0]
    }

    /// Smallest allowed hour strictly after `hour`
    pub fn first_hour_after(&self, hour: u32) -> Option<u32> {
        self.hours.iter().copied().find(|&h| h > hour)
    }

    /// First date on or after `from` whose weekday is allowed
    ///
    /// The window repeats weekly, so at most six steps are taken. `None` only
    /// when the calendar runs out.
    pub fn next_allowed_day(&self, from: NaiveDate) -> Option<NaiveDate> {
        (0..7u64)
            .filter_map(|offset| from.checked_add_days(Days::new(offset)))
            .find(|date| self.allows_day(date.weekday()))
    }
}

/// Restriction on which media families may share a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionRule {
    Unrestricted,
    NoVideoImageMix,
}

/// Non-blocking content heuristic attached to a platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// Content uses `@` without the platform's mention marker
    MentionFormat {
        marker: &'static str,
        hint: &'static str,
    },
    /// Content links to a domain the platform tends to demote
    SuppressedLink {
        domain: &'static str,
        hint: &'static str,
    },
}

impl Advisory {
    /// Returns the hint when the heuristic fires for `content`
    pub fn check(&self, content: &str) -> Option<&'static str> {
        match self {
            Advisory::MentionFormat { marker, hint } => {
                (content.contains('@') && !content.contains(marker)).then_some(*hint)
            }
            Advisory::SuppressedLink { domain, hint } => content.contains(domain).then_some(*hint),
        }
    }
}

/// Content and media constraints for one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformLimits {
    pub max_length: usize,
    /// Ceiling for accounts on a paid or verified tier
    pub elevated_max_length: Option<usize>,
    pub supported_media_types: Vec<&'static str>,
    pub max_media_count: usize,
    pub max_media_size_mb: u64,
    pub max_video_duration_secs: u64,
    pub min_video_duration_secs: Option<u64>,
    pub requires_video: bool,
    pub composition: CompositionRule,
    pub advisories: Vec<Advisory>,
}

impl PlatformLimits {
    /// Length ceiling that applies to the given account tier
    pub fn effective_max_length(&self, elevated: bool) -> usize {
        match (elevated, self.elevated_max_length) {
            (true, Some(max)) => max,
            _ => self.max_length,
        }
    }

    pub fn supports(&self, media_type: &str) -> bool {
        self.supported_media_types.iter().any(|t| *t == media_type)
    }
}

/// Concurrency ceiling and start spacing for submissions to one platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitPolicy {
    pub max_concurrent: usize,
    pub min_delay_ms: u64,
}

impl RateLimitPolicy {
    pub fn new(max_concurrent: usize, min_delay_ms: u64) -> Self {
        Self {
            max_concurrent,
            min_delay_ms,
        }
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }
}

/// Every rule the engines consult, keyed by platform
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuleTable {
    windows: BTreeMap<PlatformKey, OptimalWindow>,
    limits: BTreeMap<PlatformKey, PlatformLimits>,
    rate_limits: BTreeMap<PlatformKey, RateLimitPolicy>,
}

impl RuleTable {
    /// A table with no rows; combine with the `with_*` methods
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, platform: PlatformKey, window: OptimalWindow) -> Self {
        self.windows.insert(platform, window);
        self
    }

    pub fn with_limits(
        mut self,
        platform: PlatformKey,
        limits: PlatformLimits,
    ) -> Result<Self, RuleError> {
        if limits.max_length == 0 {
            return Err(RuleError::ZeroMaxLength);
        }
        self.limits.insert(platform, limits);
        Ok(self)
    }

    /// A zero `max_concurrent` is rejected: such a lane could never submit
    pub fn with_rate_limit(
        mut self,
        platform: PlatformKey,
        policy: RateLimitPolicy,
    ) -> Result<Self, RuleError> {
        if policy.max_concurrent == 0 {
            return Err(RuleError::ZeroConcurrency);
        }
        self.rate_limits.insert(platform, policy);
        Ok(self)
    }

    pub fn window_for(&self, platform: PlatformKey) -> Option<&OptimalWindow> {
        self.windows.get(&platform)
    }

    pub fn limits_for(&self, platform: PlatformKey) -> Option<&PlatformLimits> {
        self.limits.get(&platform)
    }

    pub fn rate_limit_for(&self, platform: PlatformKey) -> Option<&RateLimitPolicy> {
        self.rate_limits.get(&platform)
    }

    /// Look up a window by user-supplied platform name
    pub fn window(&self, platform: &str) -> Option<(PlatformKey, &OptimalWindow)> {
        let key = platform.parse::<PlatformKey>().ok()?;
        self.window_for(key).map(|w| (key, w))
    }

    /// Look up limits by user-supplied platform name
    pub fn limits(&self, platform: &str) -> Option<(PlatformKey, &PlatformLimits)> {
        let key = platform.parse::<PlatformKey>().ok()?;
        self.limits_for(key).map(|l| (key, l))
    }

    /// Platforms that have content limits, in declaration order
    pub fn supported_platforms(&self) -> Vec<PlatformKey> {
        self.limits.keys().copied().collect()
    }

    /// Comma-separated list of [`Self::supported_platforms`]
    pub fn supported_list(&self) -> String {
        self.supported_platforms()
            .iter()
            .map(PlatformKey::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The rules Castwise ships with
    pub fn builtin() -> Self {
        use Weekday::{Fri, Mon, Sat, Thu, Tue, Wed};

        let mut table = Self::empty();

        for (platform, days, hours) in [
            (PlatformKey::X, vec![Tue, Wed, Thu, Fri], vec![9, 10, 11, 12]),
            (PlatformKey::LinkedIn, vec![Tue, Wed, Thu], vec![8, 9, 10]),
            (
                PlatformKey::Facebook,
                vec![Mon, Tue, Wed, Thu, Fri],
                vec![9, 10, 11, 12, 13],
            ),
            (
                PlatformKey::Threads,
                vec![Mon, Tue, Wed, Thu, Fri],
                vec![11, 12, 13, 14],
            ),
            (PlatformKey::TikTok, vec![Tue, Wed, Thu], vec![19, 20, 21]),
            (PlatformKey::YouTube, vec![Thu, Fri, Sat], vec![14, 15, 16, 17]),
        ] {
            table
                .windows
                .insert(platform, OptimalWindow { weekdays: days, hours });
        }

        for (platform, limits) in builtin_limits() {
            table.limits.insert(platform, limits);
        }

        for (platform, max_concurrent, min_delay_ms) in [
            (PlatformKey::X, 1, 2000),
            (PlatformKey::LinkedIn, 2, 1000),
            (PlatformKey::Facebook, 100, 500),
            (PlatformKey::Threads, 2, 3000),
            (PlatformKey::TikTok, 1, 5000),
            (PlatformKey::YouTube, 200, 1000),
        ] {
            table
                .rate_limits
                .insert(platform, RateLimitPolicy::new(max_concurrent, min_delay_ms));
        }

        table
    }
}

fn builtin_limits() -> Vec<(PlatformKey, PlatformLimits)> {
    vec![
        (
            PlatformKey::X,
            PlatformLimits {
                max_length: 280,
                elevated_max_length: Some(4000),
                supported_media_types: vec!["image/jpeg", "image/png", "image/gif", "video/mp4"],
                max_media_count: 4,
                max_media_size_mb: 15,
                max_video_duration_secs: 140,
                min_video_duration_secs: None,
                requires_video: false,
                composition: CompositionRule::Unrestricted,
                advisories: vec![Advisory::SuppressedLink {
                    domain: "facebook.com",
                    hint: "X may suppress posts containing Facebook links",
                }],
            },
        ),
        (
            PlatformKey::LinkedIn,
            PlatformLimits {
                max_length: 3000,
                elevated_max_length: None,
                supported_media_types: vec![
                    "image/jpeg",
                    "image/png",
                    "image/gif",
                    "video/mp4",
                    "application/pdf",
                ],
                max_media_count: 9,
                max_media_size_mb: 200,
                max_video_duration_secs: 600,
                min_video_duration_secs: None,
                requires_video: false,
                composition: CompositionRule::Unrestricted,
                advisories: vec![Advisory::MentionFormat {
                    marker: "urn:li:",
                    hint: "LinkedIn mentions should use format: @[Name](urn:li:organization:ID)",
                }],
            },
        ),
        (
            PlatformKey::Facebook,
            PlatformLimits {
                max_length: 63206,
                elevated_max_length: None,
                supported_media_types: vec!["image/jpeg", "image/png", "video/mp4"],
                max_media_count: 10,
                max_media_size_mb: 4,
                max_video_duration_secs: 14400,
                min_video_duration_secs: None,
                requires_video: false,
                composition: CompositionRule::Unrestricted,
                advisories: vec![],
            },
        ),
        (
            PlatformKey::Threads,
            PlatformLimits {
                max_length: 500,
                elevated_max_length: None,
                supported_media_types: vec!["image/jpeg", "image/png", "video/mp4"],
                max_media_count: 10,
                max_media_size_mb: 8,
                max_video_duration_secs: 300,
                min_video_duration_secs: None,
                requires_video: false,
                composition: CompositionRule::Unrestricted,
                advisories: vec![],
            },
        ),
        (
            PlatformKey::TikTok,
            PlatformLimits {
                max_length: 2000,
                elevated_max_length: None,
                supported_media_types: vec!["video/mp4", "image/jpeg", "image/png"],
                max_media_count: 35,
                max_media_size_mb: 287,
                max_video_duration_secs: 600,
                min_video_duration_secs: Some(3),
                requires_video: false,
                composition: CompositionRule::NoVideoImageMix,
                advisories: vec![],
            },
        ),
        (
            PlatformKey::YouTube,
            PlatformLimits {
                max_length: 5000,
                elevated_max_length: None,
                supported_media_types: vec!["video/mp4", "video/webm", "video/avi", "video/mov"],
                max_media_count: 1,
                max_media_size_mb: 128_000,
                max_video_duration_secs: 43_200,
                min_video_duration_secs: Some(1),
                requires_video: true,
                composition: CompositionRule::Unrestricted,
                advisories: vec![],
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_rejects_empty_sets() {
        assert_eq!(
            OptimalWindow::new(vec![], vec![9]).unwrap_err(),
            RuleError::EmptyWeekdays
        );
        assert_eq!(
            OptimalWindow::new(vec![Weekday::Mon], vec![]).unwrap_err(),
            RuleError::EmptyHours
        );
    }

    #[test]
    fn test_window_rejects_out_of_range_hour() {
        assert_eq!(
            OptimalWindow::new(vec![Weekday::Mon], vec![9, 24]).unwrap_err(),
            RuleError::InvalidHour(24)
        );
    }

    #[test]
    fn test_window_normalizes_order() {
        let window =
            OptimalWindow::new(vec![Weekday::Fri, Weekday::Sun, Weekday::Fri], vec![12, 9, 12])
                .unwrap();
        assert_eq!(window.weekdays(), &[Weekday::Sun, Weekday::Fri]);
        assert_eq!(window.hours(), &[9, 12]);
        assert_eq!(window.first_hour(), 9);
    }

    #[test]
    fn test_first_hour_after() {
        let window = OptimalWindow::new(vec![Weekday::Mon], vec![0, 9, 12]).unwrap();
        assert_eq!(window.first_hour_after(0), Some(9));
        assert_eq!(window.first_hour_after(9), Some(12));
        assert_eq!(window.first_hour_after(12), None);
    }

    #[test]
    fn test_next_allowed_day_wraps_week() {
        let window = OptimalWindow::new(vec![Weekday::Mon], vec![9]).unwrap();
        // 2025-01-14 is a Tuesday
        let from = NaiveDate::from_ymd_opt(2025, 1, 14).unwrap();
        assert_eq!(
            window.next_allowed_day(from),
            NaiveDate::from_ymd_opt(2025, 1, 20)
        );
        let monday = NaiveDate::from_ymd_opt(2025, 1, 13).unwrap();
        assert_eq!(window.next_allowed_day(monday), Some(monday));
    }

    #[test]
    fn test_builtin_table_covers_every_platform() {
        let rules = RuleTable::builtin();
        for key in PlatformKey::ALL {
            let window = rules.window_for(key).expect("window");
            assert!(!window.weekdays().is_empty());
            assert!(!window.hours().is_empty());
            assert!(rules.limits_for(key).expect("limits").max_length > 0);
            assert!(rules.rate_limit_for(key).is_some());
        }
        assert_eq!(
            rules.supported_list(),
            "x, linkedin, facebook, threads, tiktok, youtube"
        );
    }

    #[test]
    fn test_builtin_windows_match_published_schedule() {
        let rules = RuleTable::builtin();
        let x = rules.window_for(PlatformKey::X).unwrap();
        assert_eq!(
            x.weekdays(),
            &[Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
        );
        assert_eq!(x.hours(), &[9, 10, 11, 12]);

        let youtube = rules.window_for(PlatformKey::YouTube).unwrap();
        assert_eq!(
            youtube.weekdays(),
            &[Weekday::Thu, Weekday::Fri, Weekday::Sat]
        );
    }

    #[test]
    fn test_effective_max_length() {
        let rules = RuleTable::builtin();
        let x = rules.limits_for(PlatformKey::X).unwrap();
        assert_eq!(x.effective_max_length(false), 280);
        assert_eq!(x.effective_max_length(true), 4000);

        // No elevated tier defined: the flag changes nothing
        let threads = rules.limits_for(PlatformKey::Threads).unwrap();
        assert_eq!(threads.effective_max_length(true), 500);
    }

    #[test]
    fn test_lookup_by_name() {
        let rules = RuleTable::builtin();
        assert_eq!(rules.limits("TikTok").map(|(k, _)| k), Some(PlatformKey::TikTok));
        assert!(rules.limits("myspace").is_none());
        assert!(RuleTable::empty().window("x").is_none());
    }

    #[test]
    fn test_with_limits_rejects_zero_length() {
        let mut limits = RuleTable::builtin()
            .limits_for(PlatformKey::X)
            .unwrap()
            .clone();
        limits.max_length = 0;
        assert_eq!(
            RuleTable::empty()
                .with_limits(PlatformKey::X, limits)
                .unwrap_err(),
            RuleError::ZeroMaxLength
        );
    }

    #[test]
    fn test_with_rate_limit_rejects_zero_concurrency() {
        assert_eq!(
            RuleTable::empty()
                .with_rate_limit(PlatformKey::X, RateLimitPolicy::new(0, 1000))
                .unwrap_err(),
            RuleError::ZeroConcurrency
        );

        let rules = RuleTable::empty()
            .with_rate_limit(PlatformKey::X, RateLimitPolicy::new(3, 250))
            .unwrap();
        assert_eq!(
            rules.rate_limit_for(PlatformKey::X),
            Some(&RateLimitPolicy::new(3, 250))
        );
    }

    #[test]
    fn test_builtin_rate_limits_allow_submissions() {
        let rules = RuleTable::builtin();
        for platform in PlatformKey::ALL {
            assert!(rules.rate_limit_for(platform).unwrap().max_concurrent >= 1);
        }
    }

    #[test]
    fn test_advisories() {
        let mention = Advisory::MentionFormat {
            marker: "urn:li:",
            hint: "use urn",
        };
        assert_eq!(mention.check("Thanks @acme"), Some("use urn"));
        assert_eq!(mention.check("Thanks @[Acme](urn:li:organization:1)"), None);
        assert_eq!(mention.check("No mentions"), None);

        let link = Advisory::SuppressedLink {
            domain: "facebook.com",
            hint: "suppressed",
        };
        assert_eq!(link.check("see https://facebook.com/acme"), Some("suppressed"));
        assert_eq!(link.check("see https://example.com"), None);
    }

    #[test]
    fn test_rate_limit_policy_delay() {
        let policy = RateLimitPolicy::new(1, 2000);
        assert_eq!(policy.min_delay(), Duration::from_secs(2));
    }
}
