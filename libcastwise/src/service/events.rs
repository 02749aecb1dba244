//! Dispatch progress events
//!
//! An in-process broadcast bus the [`Dispatcher`](super::dispatch::Dispatcher)
//! reports through. Emitting never blocks: with no subscribers the event is
//! dropped, and a lagging subscriber loses the oldest events first.
//!
//! # Example
//!
//! ```
//! use libcastwise::service::events::{DispatchEvent, EventBus};
//! use libcastwise::types::PlatformKey;
//!
//! # async fn example() {
//! let bus = EventBus::new(100);
//! let mut events = bus.subscribe();
//!
//! bus.emit(DispatchEvent::DispatchStarted {
//!     post_id: "post_1_abc".to_string(),
//!     platforms: vec![PlatformKey::X],
//! });
//!
//! let event = events.recv().await.unwrap();
//! assert!(matches!(event, DispatchEvent::DispatchStarted { .. }));
//! # }
//! ```

use serde::Serialize;
use tokio::sync::broadcast;

use crate::types::{PlatformKey, PlatformResult, PostStatus};

pub type EventReceiver = broadcast::Receiver<DispatchEvent>;

/// Broadcast bus for dispatch progress
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DispatchEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: DispatchEvent) {
        // Err only means nobody is listening
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Events emitted while dispatching posts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchEvent {
    /// A post entered the dispatcher
    DispatchStarted {
        post_id: String,
        platforms: Vec<PlatformKey>,
    },

    /// A submission attempt passed its platform's rate limit and began
    SubmissionStarted {
        post_id: String,
        platform: PlatformKey,
        attempt: u32,
    },

    /// The final outcome for one platform
    SubmissionFinished {
        post_id: String,
        platform: PlatformKey,
        result: PlatformResult,
    },

    /// Every platform of a post has an outcome
    DispatchCompleted { post_id: String, status: PostStatus },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_emitted_event() {
        let bus = EventBus::new(10);
        let mut events = bus.subscribe();

        bus.emit(DispatchEvent::DispatchStarted {
            post_id: "post_1_abc".to_string(),
            platforms: vec![PlatformKey::X],
        });

        match events.recv().await.unwrap() {
            DispatchEvent::DispatchStarted { post_id, platforms } => {
                assert_eq!(post_id, "post_1_abc");
                assert_eq!(platforms, vec![PlatformKey::X]);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new(10);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let event = DispatchEvent::DispatchCompleted {
            post_id: "post_1_abc".to_string(),
            status: PostStatus::Posted,
        };
        bus.emit(event.clone());

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn test_no_subscribers() {
        let bus = EventBus::new(10);
        bus.emit(DispatchEvent::DispatchCompleted {
            post_id: "post_1_abc".to_string(),
            status: PostStatus::Failed,
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serialization() {
        let event = DispatchEvent::SubmissionStarted {
            post_id: "post_1_abc".to_string(),
            platform: PlatformKey::TikTok,
            attempt: 2,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "submission_started");
        assert_eq!(value["platform"], "tiktok");
        assert_eq!(value["attempt"], 2);
    }
}
