//! Castwise - posting-time and content checks for social platforms
//!
//! This library holds the per-platform rule tables and the engines built on
//! them: picking optimal posting times, bounding schedules, validating copy
//! and media, and dispatching posts under each platform's rate limit. The
//! `cast-*` command-line tools are thin wrappers around it.

pub mod assistant;
pub mod config;
pub mod error;
pub mod logging;
pub mod media;
pub mod post;
pub mod report;
pub mod rules;
pub mod scheduling;
pub mod service;
pub mod submit;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{CastwiseError, Result};
pub use rules::RuleTable;
pub use service::CastwiseService;
pub use types::{PlatformKey, PlatformResult, PostStatus, ScheduledPost};
