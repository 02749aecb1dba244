//! Service layer for Castwise
//!
//! `CastwiseService` is the single entry point the command-line tools use.
//! It owns the shared rule table and hands out the sub-services:
//!
//! - `SchedulingService`: suggest times and build scheduled posts
//! - `ValidationService`: check content against platform limits
//! - `Dispatcher`: submit posts under each platform's rate limit
//! - `EventBus`: dispatch progress events
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use libcastwise::service::CastwiseService;
//! use libcastwise::service::scheduling::ScheduleRequest;
//!
//! let service = CastwiseService::new();
//!
//! let verdict = service.validation().validate("x", "Hello!", &[], false);
//! assert!(verdict.is_valid());
//!
//! let request = ScheduleRequest {
//!     platforms: vec!["x".to_string()],
//!     content: "Hello!".to_string(),
//!     ..Default::default()
//! };
//! let post = service.scheduling().schedule(&request, Utc::now())?;
//! println!("{}", post.id);
//! # Ok::<(), libcastwise::CastwiseError>(())
//! ```

pub mod dispatch;
pub mod events;
pub mod scheduling;
pub mod validation;

use std::sync::Arc;

use self::dispatch::Dispatcher;
use self::events::{EventBus, EventReceiver};
use self::scheduling::SchedulingService;
use self::validation::ValidationService;
use crate::post::ScheduledPostFactory;
use crate::rules::RuleTable;
use crate::submit::Submitter;

/// Main service facade that coordinates all sub-services
///
/// All sub-services share one `Arc<RuleTable>` and one post factory, so ids
/// stay monotonic across everything created through the facade.
#[derive(Debug, Clone)]
pub struct CastwiseService {
    rules: Arc<RuleTable>,
    scheduling: SchedulingService,
    validation: ValidationService,
    event_bus: EventBus,
}

impl Default for CastwiseService {
    fn default() -> Self {
        Self::new()
    }
}

impl CastwiseService {
    /// Create a service over the built-in rule table
    pub fn new() -> Self {
        Self::with_rules(Arc::new(RuleTable::builtin()))
    }

    /// Create a service over a custom rule table
    ///
    /// Useful for tests and for embedders with their own platform data.
    pub fn with_rules(rules: Arc<RuleTable>) -> Self {
        let factory = Arc::new(ScheduledPostFactory::new());

        Self {
            scheduling: SchedulingService::new(Arc::clone(&rules), factory),
            validation: ValidationService::new(Arc::clone(&rules)),
            event_bus: EventBus::default(),
            rules,
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn scheduling(&self) -> &SchedulingService {
        &self.scheduling
    }

    pub fn validation(&self) -> &ValidationService {
        &self.validation
    }

    /// A dispatcher over this service's rules, reporting on its event bus
    pub fn dispatcher(&self, submitter: Arc<dyn Submitter>) -> Dispatcher {
        Dispatcher::new(Arc::clone(&self.rules), submitter).with_event_bus(self.event_bus.clone())
    }

    /// Subscribe to dispatch progress events
    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }
}
