//! Construction of [`ScheduledPost`] records

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::types::{PlatformKey, PostStatus, ScheduledPost};

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Builds pending posts with fresh identifiers
///
/// Ids look like `post_<unix millis>_<9 base-36 chars>`. The millisecond
/// part never goes backwards for a given factory, even if the wall clock
/// does. The factory does not check the scheduled time; run
/// [`crate::scheduling::check_window`] first when that matters.
#[derive(Debug, Default)]
pub struct ScheduledPostFactory {
    last_millis: AtomicI64,
}

impl ScheduledPostFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        platforms: Vec<PlatformKey>,
        content: impl Into<String>,
        scheduled_time: DateTime<Utc>,
        media_urls: Vec<String>,
    ) -> ScheduledPost {
        ScheduledPost {
            id: self.next_id(Utc::now()),
            platforms,
            content: content.into(),
            media_urls,
            scheduled_time,
            status: PostStatus::Pending,
            results: BTreeMap::new(),
        }
    }

    /// Generate an id stamped no earlier than any previous one
    pub fn next_id(&self, observed: DateTime<Utc>) -> String {
        let observed_millis = observed.timestamp_millis();
        let previous = self.last_millis.fetch_max(observed_millis, Ordering::SeqCst);
        let millis = previous.max(observed_millis);

        let mut rng = rand::thread_rng();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();

        format!("post_{}_{}", millis, suffix)
    }
}
