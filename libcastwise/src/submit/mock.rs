//! Mock submitter for testing
//!
//! Records every call, can fail selected platforms permanently or for the
//! first few attempts, and can simulate latency. Latency uses `tokio::time`,
//! so tests running with paused time complete instantly while still
//! observing realistic start times.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};

use crate::error::PlatformError;
use crate::submit::Submitter;
use crate::types::{PlatformKey, ScheduledPost};

/// Configuration for mock submitter behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Delay before each submission completes (simulates network latency)
    pub delay: Duration,

    /// Platforms that always fail, with the error they return
    pub failures: BTreeMap<PlatformKey, PlatformError>,

    /// Platforms that answer with a rate-limit error for their first N calls
    pub rate_limited: BTreeMap<PlatformKey, usize>,
}

/// One recorded call to [`MockSubmitter::submit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionCall {
    pub platform: PlatformKey,
    pub post_id: String,
    pub content: String,
    pub started_at: Instant,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<SubmissionCall>,
    in_flight: BTreeMap<PlatformKey, usize>,
    max_in_flight: BTreeMap<PlatformKey, usize>,
    attempts: BTreeMap<PlatformKey, usize>,
}

/// Mock submitter for testing
///
/// Cloning shares the recorded state, so a test can keep one handle while
/// the dispatcher owns another.
#[derive(Debug, Clone, Default)]
pub struct MockSubmitter {
    config: MockConfig,
    state: Arc<Mutex<MockState>>,
}

impl MockSubmitter {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            state: Arc::default(),
        }
    }

    /// A submitter where every call succeeds immediately
    pub fn success() -> Self {
        Self::default()
    }

    /// A submitter where every call takes `delay`
    pub fn with_delay(delay: Duration) -> Self {
        Self::new(MockConfig {
            delay,
            ..Default::default()
        })
    }

    /// Make `platform` fail every call with a submission error
    pub fn failing(mut self, platform: PlatformKey, message: &str) -> Self {
        self.config
            .failures
            .insert(platform, PlatformError::Submission(message.to_string()));
        self
    }

    /// Make `platform` answer with a rate-limit error for its first `times` calls
    pub fn rate_limited(mut self, platform: PlatformKey, times: usize) -> Self {
        self.config.rate_limited.insert(platform, times);
        self
    }

    /// All calls in the order they started
    pub fn calls(&self) -> Vec<SubmissionCall> {
        self.state().calls.clone()
    }

    /// Calls made to one platform, in start order
    pub fn calls_for(&self, platform: PlatformKey) -> Vec<SubmissionCall> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.platform == platform)
            .cloned()
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    /// Highest number of simultaneous calls ever seen for `platform`
    pub fn max_in_flight(&self, platform: PlatformKey) -> usize {
        self.state()
            .max_in_flight
            .get(&platform)
            .copied()
            .unwrap_or(0)
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, platform: PlatformKey, post: &ScheduledPost) -> usize {
        let mut state = self.state();
        state.calls.push(SubmissionCall {
            platform,
            post_id: post.id.clone(),
            content: post.content.clone(),
            started_at: Instant::now(),
        });

        let in_flight = {
            let count = state.in_flight.entry(platform).or_insert(0);
            *count += 1;
            *count
        };
        let max = state.max_in_flight.entry(platform).or_insert(0);
        *max = (*max).max(in_flight);

        let attempt = state.attempts.entry(platform).or_insert(0);
        *attempt += 1;
        *attempt
    }

    fn finish(&self, platform: PlatformKey) {
        if let Some(count) = self.state().in_flight.get_mut(&platform) {
            *count = count.saturating_sub(1);
        }
    }
}

#[async_trait]
impl Submitter for MockSubmitter {
    async fn submit(
        &self,
        platform: PlatformKey,
        post: &ScheduledPost,
    ) -> Result<String, PlatformError> {
        let attempt = self.begin(platform, post);

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        self.finish(platform);

        if let Some(error) = self.config.failures.get(&platform) {
            return Err(error.clone());
        }

        let limited = self.config.rate_limited.get(&platform).copied().unwrap_or(0);
        if attempt <= limited {
            return Err(PlatformError::RateLimit(format!(
                "{} throttled attempt {}",
                platform, attempt
            )));
        }

        Ok(format!("mock://{}/{}", platform, post.id))
    }
}
