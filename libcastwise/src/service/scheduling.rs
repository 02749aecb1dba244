//! Scheduling service
//!
//! Ties the scheduler, the window check and the post factory together:
//! resolve platforms, pick or parse a time, bound it, build the post.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{CastwiseError, Result};
use crate::post::ScheduledPostFactory;
use crate::rules::RuleTable;
use crate::scheduling::{check_window, parse_timestamp, OptimalTimeScheduler, Suggestion};
use crate::types::{PlatformKey, ScheduledPost};

/// Request to schedule a post
#[derive(Debug, Clone, Default)]
pub struct ScheduleRequest {
    /// Platform names as typed by the user
    pub platforms: Vec<String>,
    pub content: String,
    /// ISO-8601 time; the first platform's next optimal slot when absent
    pub time: Option<String>,
    pub media: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SchedulingService {
    rules: Arc<RuleTable>,
    scheduler: OptimalTimeScheduler,
    factory: Arc<ScheduledPostFactory>,
}

impl SchedulingService {
    pub fn new(rules: Arc<RuleTable>, factory: Arc<ScheduledPostFactory>) -> Self {
        Self {
            scheduler: OptimalTimeScheduler::new(Arc::clone(&rules)),
            rules,
            factory,
        }
    }

    pub fn scheduler(&self) -> &OptimalTimeScheduler {
        &self.scheduler
    }

    /// Suggestions for each named platform, in request order
    pub fn suggest(&self, platforms: &[String], reference: DateTime<Utc>) -> Vec<Suggestion> {
        platforms
            .iter()
            .map(|platform| self.scheduler.suggest(platform, reference))
            .collect()
    }

    /// Resolve user-supplied names to platform keys
    ///
    /// # Errors
    ///
    /// [`CastwiseError::UnknownPlatform`] for the first name that is not a
    /// platform with rules, [`CastwiseError::InvalidInput`] for an empty list.
    pub fn resolve_platforms(&self, names: &[String]) -> Result<Vec<PlatformKey>> {
        if names.is_empty() {
            return Err(CastwiseError::InvalidInput(
                "At least one platform is required".to_string(),
            ));
        }

        let mut keys: Vec<PlatformKey> = Vec::with_capacity(names.len());
        for name in names {
            let key = self
                .rules
                .limits(name)
                .map(|(key, _)| key)
                .ok_or_else(|| CastwiseError::UnknownPlatform {
                    platform: name.clone(),
                    supported: self.rules.supported_list(),
                })?;
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    /// Build a pending post for `request`, measured against `now`
    ///
    /// # Errors
    ///
    /// - unknown platform or empty platform list
    /// - malformed `time`
    /// - a time in the past or beyond the scheduling horizon
    pub fn schedule(&self, request: &ScheduleRequest, now: DateTime<Utc>) -> Result<ScheduledPost> {
        let platforms = self.resolve_platforms(&request.platforms)?;

        let scheduled_time = match request.time.as_deref() {
            Some(time) => parse_timestamp(time)?,
            None => {
                // resolve_platforms guarantees at least one entry
                let first = platforms[0];
                let next = self.scheduler.next_optimal_time(first.as_str(), now);
                debug!(platform = %first, %next, "No time given, using next optimal slot");
                next
            }
        };

        check_window(scheduled_time, now)?;

        let post = self.factory.create(
            platforms,
            request.content.clone(),
            scheduled_time,
            request.media.clone(),
        );

        info!(post_id = %post.id, scheduled = %post.scheduled_time, "Scheduled post");
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScheduleError;
    use crate::types::PostStatus;

    fn service() -> SchedulingService {
        SchedulingService::new(
            Arc::new(RuleTable::builtin()),
            Arc::new(ScheduledPostFactory::new()),
        )
    }

    fn at(s: &str) -> DateTime<Utc> {
        parse_timestamp(s).unwrap()
    }

    fn request(platforms: &[&str], time: Option<&str>) -> ScheduleRequest {
        ScheduleRequest {
            platforms: platforms.iter().map(|s| s.to_string()).collect(),
            content: "Launch day".to_string(),
            time: time.map(str::to_string),
            media: vec![],
        }
    }

    #[test]
    fn test_schedule_with_explicit_time() {
        let post = service()
            .schedule(
                &request(&["x", "linkedin"], Some("2025-01-20T10:00:00Z")),
                at("2025-01-19T00:00:00Z"),
            )
            .unwrap();

        assert_eq!(post.platforms, vec![PlatformKey::X, PlatformKey::LinkedIn]);
        assert_eq!(post.scheduled_time, at("2025-01-20T10:00:00Z"));
        assert_eq!(post.status, PostStatus::Pending);
    }

    #[test]
    fn test_schedule_defaults_to_first_platform_window() {
        // Sunday morning; tiktok's first slot is Tuesday 19:00
        let post = service()
            .schedule(&request(&["tiktok", "x"], None), at("2025-01-19T08:30:00Z"))
            .unwrap();
        assert_eq!(post.scheduled_time, at("2025-01-21T19:00:00Z"));
    }

    #[test]
    fn test_schedule_rejects_unknown_platform() {
        let err = service()
            .schedule(&request(&["x", "myspace"], None), at("2025-01-19T08:30:00Z"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown platform: myspace. Supported: x, linkedin, facebook, threads, tiktok, youtube"
        );
    }

    #[test]
    fn test_schedule_rejects_empty_platforms() {
        let err = service()
            .schedule(&request(&[], None), at("2025-01-19T08:30:00Z"))
            .unwrap_err();
        assert!(matches!(err, CastwiseError::InvalidInput(_)));
    }

    #[test]
    fn test_schedule_rejects_past_and_far_future() {
        let now = at("2025-01-01T00:00:00Z");

        let past = service()
            .schedule(&request(&["x"], Some("2024-12-31T23:00:00Z")), now)
            .unwrap_err();
        assert!(matches!(past, CastwiseError::Schedule(ScheduleError::PastTime)));

        let far = service()
            .schedule(&request(&["x"], Some("2025-02-01T00:00:01Z")), now)
            .unwrap_err();
        assert_eq!(
            far.to_string(),
            "Scheduled time is too far in the future (max 30 days)"
        );
    }

    #[test]
    fn test_schedule_rejects_malformed_time() {
        let err = service()
            .schedule(&request(&["x"], Some("next tuesday")), at("2025-01-01T00:00:00Z"))
            .unwrap_err();
        assert!(matches!(
            err,
            CastwiseError::Schedule(ScheduleError::MalformedTimestamp(_))
        ));
    }

    #[test]
    fn test_resolve_platforms_dedups_and_normalizes() {
        let keys = service()
            .resolve_platforms(&["X".to_string(), " x ".to_string(), "YouTube".to_string()])
            .unwrap();
        assert_eq!(keys, vec![PlatformKey::X, PlatformKey::YouTube]);
    }

    #[test]
    fn test_suggest_keeps_request_order() {
        let names = vec!["youtube".to_string(), "x".to_string()];
        let suggestions = service().suggest(&names, at("2025-01-19T08:30:00Z"));
        let platforms: Vec<&str> = suggestions.iter().map(|s| s.platform.as_str()).collect();
        assert_eq!(platforms, ["youtube", "x"]);
    }
}
