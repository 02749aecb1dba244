//! Error types for Castwise
//!
//! Rule violations found while validating content or schedules are not
//! errors in this sense: they are reported as findings or as a
//! [`ScheduleError`] value. The types here cover conditions that stop an
//! operation outright.

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CastwiseError>;

#[derive(Error, Debug)]
pub enum CastwiseError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Schedule(#[from] ScheduleError),

    #[error("Assistant error: {0}")]
    Assistant(#[from] AssistantError),

    #[error("Unknown platform: {platform}. Supported: {supported}")]
    UnknownPlatform { platform: String, supported: String },

    #[error("{0}")]
    InvalidInput(String),
}

impl CastwiseError {
    /// Returns the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CastwiseError::Assistant(AssistantError::Spawn { .. }) => 2,
            CastwiseError::Assistant(_) => 1,
            CastwiseError::Schedule(_) => 1,
            CastwiseError::UnknownPlatform { .. } => 1,
            CastwiseError::InvalidInput(_) => 1,
            CastwiseError::Config(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Scheduling bounds violations and unparseable instants
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Scheduled time is in the past")]
    PastTime,

    #[error("Scheduled time is too far in the future (max {max_days} days)")]
    TooFarFuture { max_days: i64 },

    #[error("Malformed timestamp: '{0}' is not an ISO-8601 instant")]
    MalformedTimestamp(String),
}

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with code {code}: {stderr}")]
    Exited {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("{command} timed out after {}", human(.timeout))]
    Timeout { command: String, timeout: Duration },

    #[error("I/O error while talking to the assistant: {0}")]
    Io(#[from] std::io::Error),

    #[error("Assistant returned no usable content")]
    EmptyOutput,
}

fn human(duration: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*duration)
}

/// Outcome of a failed submission to a platform
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
}

/// Rejected rule table rows
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Posting window must allow at least one weekday")]
    EmptyWeekdays,

    #[error("Posting window must allow at least one hour")]
    EmptyHours,

    #[error("Invalid hour {0}: hours must be within 0..=23")]
    InvalidHour(u32),

    #[error("Maximum content length must be greater than zero")]
    ZeroMaxLength,

    #[error("Rate limit must allow at least one submission in flight")]
    ZeroConcurrency,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_schedule_errors() {
        assert_eq!(CastwiseError::Schedule(ScheduleError::PastTime).exit_code(), 1);
        assert_eq!(
            CastwiseError::Schedule(ScheduleError::TooFarFuture { max_days: 30 }).exit_code(),
            1
        );
        assert_eq!(
            CastwiseError::Schedule(ScheduleError::MalformedTimestamp("nope".into())).exit_code(),
            1
        );
    }

    #[test]
    fn test_exit_code_spawn_failure() {
        let error = CastwiseError::Assistant(AssistantError::Spawn {
            command: "agent".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        });
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_other_assistant_failures() {
        let error = CastwiseError::Assistant(AssistantError::Exited {
            command: "agent".to_string(),
            code: 3,
            stderr: "boom".to_string(),
        });
        assert_eq!(error.exit_code(), 1);
        assert_eq!(CastwiseError::Assistant(AssistantError::EmptyOutput).exit_code(), 1);
    }

    #[test]
    fn test_schedule_error_messages() {
        assert_eq!(
            ScheduleError::PastTime.to_string(),
            "Scheduled time is in the past"
        );
        assert_eq!(
            ScheduleError::TooFarFuture { max_days: 30 }.to_string(),
            "Scheduled time is too far in the future (max 30 days)"
        );
        assert!(ScheduleError::MalformedTimestamp("tomorrow-ish".into())
            .to_string()
            .contains("tomorrow-ish"));
    }

    #[test]
    fn test_schedule_error_is_transparent_in_wrapper() {
        let error: CastwiseError = ScheduleError::PastTime.into();
        assert_eq!(error.to_string(), "Scheduled time is in the past");
    }

    #[test]
    fn test_timeout_message_uses_human_duration() {
        let error = AssistantError::Timeout {
            command: "agent".to_string(),
            timeout: Duration::from_secs(120),
        };
        assert_eq!(error.to_string(), "agent timed out after 2m");
    }

    #[test]
    fn test_unknown_platform_lists_supported() {
        let error = CastwiseError::UnknownPlatform {
            platform: "myspace".to_string(),
            supported: "x, linkedin".to_string(),
        };
        assert_eq!(error.to_string(), "Unknown platform: myspace. Supported: x, linkedin");
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_config_error_formatting() {
        let error = CastwiseError::Config(ConfigError::MissingField("assistant.command".into()));
        assert_eq!(
            error.to_string(),
            "Configuration error: Missing required field: assistant.command"
        );
    }

    #[test]
    fn test_platform_error_clone() {
        let original = PlatformError::Submission("Connection reset".to_string());
        let cloned = original.clone();
        assert_eq!(original, cloned);
        assert_eq!(cloned.to_string(), "Submission failed: Connection reset");
    }
}
