//! Submission abstraction
//!
//! A [`Submitter`] hands one post to one platform and reports where it
//! landed. Real platform clients are out of scope for this crate; embedders
//! plug their own implementations into the
//! [`Dispatcher`](crate::service::dispatch::Dispatcher), and tests use
//! [`mock::MockSubmitter`].
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use libcastwise::error::PlatformError;
//! use libcastwise::submit::Submitter;
//! use libcastwise::types::{PlatformKey, ScheduledPost};
//!
//! struct Stdout;
//!
//! #[async_trait]
//! impl Submitter for Stdout {
//!     async fn submit(
//!         &self,
//!         platform: PlatformKey,
//!         post: &ScheduledPost,
//!     ) -> Result<String, PlatformError> {
//!         println!("[{}] {}", platform, post.content);
//!         Ok(format!("stdout://{}/{}", platform, post.id))
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::types::{PlatformKey, ScheduledPost};

// Available outside tests so integration tests and embedders can use it
pub mod mock;

/// Publishes posts to a platform
///
/// Implementations must be safe to call concurrently; the dispatcher decides
/// how many calls per platform are in flight at once.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Submit `post` to `platform`
    ///
    /// Returns the URL of the published post.
    ///
    /// # Errors
    ///
    /// `PlatformError::RateLimit` is treated as transient and retried by the
    /// dispatcher; any other error is recorded as a failure straight away.
    async fn submit(&self, platform: PlatformKey, post: &ScheduledPost)
        -> Result<String, PlatformError>;
}
