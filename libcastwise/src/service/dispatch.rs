//! Rate-limited dispatch of scheduled posts
//!
//! The dispatcher turns each (post, platform) pair into a job and runs every
//! job through its platform's lane:
//!
//! - a fair semaphore caps in-flight submissions at the policy's
//!   `max_concurrent`; extra jobs wait rather than fail
//! - a start gate spaces successive submission starts by at least
//!   `min_delay`, even when permits are free
//! - jobs join their lanes in ascending `scheduled_time` order, ties keeping
//!   input order
//!
//! Lanes are independent, so platforms proceed concurrently. A platform with
//! no policy row gets a lane with neither cap nor spacing. Jobs are submitted
//! as soon as their lane allows; holding posts until their scheduled time is
//! up to the caller.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, warn};

use super::events::{DispatchEvent, EventBus, EventReceiver};
use crate::error::PlatformError;
use crate::rules::{RateLimitPolicy, RuleTable};
use crate::submit::Submitter;
use crate::types::{PlatformKey, PlatformResult, ScheduledPost};

/// Attempts per job when the platform keeps answering with rate-limit errors
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Submits posts while honouring each platform's [`RateLimitPolicy`]
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use chrono::Utc;
/// use libcastwise::post::ScheduledPostFactory;
/// use libcastwise::rules::RuleTable;
/// use libcastwise::service::dispatch::Dispatcher;
/// use libcastwise::submit::mock::MockSubmitter;
/// use libcastwise::types::PlatformKey;
///
/// # async fn example() {
/// let dispatcher = Dispatcher::new(
///     Arc::new(RuleTable::builtin()),
///     Arc::new(MockSubmitter::success()),
/// );
///
/// let post = ScheduledPostFactory::new().create(
///     vec![PlatformKey::X, PlatformKey::LinkedIn],
///     "Hello",
///     Utc::now(),
///     vec![],
/// );
///
/// let done = dispatcher.dispatch_one(post).await;
/// println!("{}", done.status);
/// # }
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    rules: Arc<RuleTable>,
    submitter: Arc<dyn Submitter>,
    event_bus: EventBus,
    max_attempts: u32,
}

/// Per-platform admission control, alive for one `dispatch` call
struct Lane {
    permits: Option<Semaphore>,
    min_delay: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl Lane {
    fn new(policy: Option<&RateLimitPolicy>) -> Self {
        match policy {
            Some(policy) => Self {
                // RuleTable only holds policies with max_concurrent >= 1
                permits: Some(Semaphore::new(policy.max_concurrent)),
                min_delay: policy.min_delay(),
                last_start: Mutex::new(None),
            },
            None => Self {
                permits: None,
                min_delay: Duration::ZERO,
                last_start: Mutex::new(None),
            },
        }
    }

    /// Wait until `min_delay` has passed since the previous start, then
    /// claim the current instant as this lane's latest start
    async fn wait_turn(&self) {
        let mut last_start = self.last_start.lock().await;
        if let Some(previous) = *last_start {
            sleep_until(previous + self.min_delay).await;
        }
        *last_start = Some(Instant::now());
    }
}

impl Dispatcher {
    pub fn new(rules: Arc<RuleTable>, submitter: Arc<dyn Submitter>) -> Self {
        Self {
            rules,
            submitter,
            event_bus: EventBus::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Report progress on an existing bus instead of a private one
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Set how many times a rate-limited submission is tried (at least once)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }

    /// Dispatch a single post
    pub async fn dispatch_one(&self, post: ScheduledPost) -> ScheduledPost {
        let mut done = self.dispatch(vec![post]).await;
        // dispatch returns exactly as many posts as it receives
        done.swap_remove(0)
    }

    /// Submit every post to every one of its platforms
    ///
    /// Returns the posts ordered by `scheduled_time` with one recorded
    /// result per platform and their aggregate status updated.
    pub async fn dispatch(&self, mut posts: Vec<ScheduledPost>) -> Vec<ScheduledPost> {
        posts.sort_by_key(|post| post.scheduled_time);

        let lanes: BTreeMap<PlatformKey, Lane> = posts
            .iter()
            .flat_map(|post| post.platforms.iter().copied())
            .map(|platform| (platform, Lane::new(self.rules.rate_limit_for(platform))))
            .collect();

        for post in &posts {
            self.event_bus.emit(DispatchEvent::DispatchStarted {
                post_id: post.id.clone(),
                platforms: post.platforms.clone(),
            });
        }

        info!(posts = posts.len(), lanes = lanes.len(), "Dispatching posts");

        let lanes = &lanes;
        let jobs = posts.iter().enumerate().flat_map(move |(index, post)| {
            post.platforms.iter().map(move |&platform| {
                // Every platform named by a post got a lane above
                let lane = &lanes[&platform];
                async move {
                    let result = self.run_job(lane, platform, post).await;
                    (index, platform, result)
                }
            })
        });

        let outcomes = join_all(jobs).await;

        for (index, platform, result) in outcomes {
            posts[index].record_result(platform, result);
        }

        for post in &posts {
            self.event_bus.emit(DispatchEvent::DispatchCompleted {
                post_id: post.id.clone(),
                status: post.status,
            });
        }

        posts
    }

    async fn run_job(&self, lane: &Lane, platform: PlatformKey, post: &ScheduledPost) -> PlatformResult {
        let _permit = match &lane.permits {
            Some(permits) => match permits.acquire().await {
                Ok(permit) => Some(permit),
                Err(_) => return PlatformResult::failed(format!("{} lane closed", platform)),
            },
            None => None,
        };

        let mut attempt = 1;
        let result = loop {
            lane.wait_turn().await;

            debug!(post_id = %post.id, %platform, attempt, "Submitting");
            self.event_bus.emit(DispatchEvent::SubmissionStarted {
                post_id: post.id.clone(),
                platform,
                attempt,
            });

            match self.submitter.submit(platform, post).await {
                Ok(url) => {
                    info!(post_id = %post.id, %platform, %url, "Submitted");
                    break PlatformResult::posted(url);
                }
                Err(PlatformError::RateLimit(message)) if attempt < self.max_attempts => {
                    let backoff = retry_backoff(attempt);
                    warn!(
                        post_id = %post.id,
                        %platform,
                        attempt,
                        max_attempts = self.max_attempts,
                        "Rate limited: {}. Retrying in {}",
                        message,
                        humantime::format_duration(backoff)
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(post_id = %post.id, %platform, attempt, "Submission failed: {}", e);
                    break PlatformResult::failed(e.to_string());
                }
            }
        };

        self.event_bus.emit(DispatchEvent::SubmissionFinished {
            post_id: post.id.clone(),
            platform,
            result: result.clone(),
        });

        result
    }
}

/// Exponential backoff: 1s, 2s, 4s, ...
fn retry_backoff(attempt: u32) -> Duration {
    Duration::from_secs(2_u64.saturating_pow(attempt.saturating_sub(1)))
}
