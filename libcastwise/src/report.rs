//! Text and JSON renderings for the command-line tools

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc, Weekday};
use serde_json::{json, Value};

use crate::error::CastwiseError;
use crate::scheduling::Suggestion;
use crate::service::validation::ValidationResult;
use crate::types::ScheduledPost;

/// Characters of content shown in a post summary
pub const CONTENT_PREVIEW_CHARS: usize = 50;

/// Printed after a scheduled post
pub const PREVIEW_NOTE: &str = "Note: This is a scheduling preview. Nothing has been published.\n\
Publishing goes through libcastwise's Dispatcher with a Submitter for each platform.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = CastwiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(CastwiseError::InvalidInput(format!(
                "Invalid format '{}'. Must be 'text' or 'json'",
                s
            ))),
        }
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix
pub fn iso_millis(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Truncate to `max_chars` characters, appending `...` when anything was cut
pub fn truncate_content(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

fn short_day(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

fn join_mapped<T>(items: &[T], f: impl Fn(&T) -> String) -> String {
    items.iter().map(f).collect::<Vec<_>>().join(", ")
}

// SCHEDULED POST

pub fn format_post(post: &ScheduledPost) -> String {
    let mut lines = vec![
        "=== Scheduled Post ===".to_string(),
        format!("ID: {}", post.id),
        format!("Status: {}", post.status),
        format!("Scheduled: {}", iso_millis(post.scheduled_time)),
        format!("Platforms: {}", join_mapped(&post.platforms, |p| p.to_string())),
        format!(
            "Content: {}",
            truncate_content(&post.content, CONTENT_PREVIEW_CHARS)
        ),
        format!("Media: {} files", post.media_urls.len()),
    ];

    if !post.results.is_empty() {
        lines.push(String::new());
        lines.push("Results:".to_string());
        for (platform, result) in &post.results {
            if result.success {
                lines.push(format!(
                    "  ✓ {}: {}",
                    platform,
                    result.post_url.as_deref().unwrap_or_default()
                ));
            } else {
                lines.push(format!(
                    "  ✗ {}: {}",
                    platform,
                    result.error_message.as_deref().unwrap_or_default()
                ));
            }
        }
    }

    lines.join("\n")
}

pub fn post_json(post: &ScheduledPost) -> Value {
    json!({
        "id": post.id,
        "status": post.status,
        "scheduled_time": iso_millis(post.scheduled_time),
        "platforms": post.platforms,
        "content": post.content,
        "media_urls": post.media_urls,
        "results": post.results,
    })
}

// SUGGESTIONS

pub fn format_suggestions(suggestions: &[Suggestion]) -> String {
    let mut lines = vec!["=== Optimal Posting Times (UTC) ===".to_string()];

    for suggestion in suggestions {
        lines.push(String::new());
        lines.push(format!("{}:", suggestion.platform.to_uppercase()));

        match &suggestion.window {
            Some(window) => {
                lines.push(format!(
                    "  Best days: {}",
                    join_mapped(window.weekdays(), |d| short_day(*d).to_string())
                ));
                lines.push(format!(
                    "  Best hours: {}",
                    join_mapped(window.hours(), |h| format!("{}:00", h))
                ));
            }
            None => lines.push("  No posting window known for this platform".to_string()),
        }

        lines.push(format!("  Next optimal: {}", iso_millis(suggestion.next_optimal)));

        if let Some(policy) = &suggestion.rate_limit {
            lines.push(format!(
                "  Rate limit: {} at a time, {} between posts",
                policy.max_concurrent,
                humantime::format_duration(policy.min_delay())
            ));
        }
    }

    lines.join("\n")
}

pub fn suggestions_json(suggestions: &[Suggestion]) -> Value {
    Value::Array(
        suggestions
            .iter()
            .map(|s| {
                json!({
                    "platform": s.platform,
                    "best_days": s.window.as_ref().map(|w| {
                        w.weekdays().iter().map(|d| short_day(*d)).collect::<Vec<_>>()
                    }),
                    "best_hours": s.window.as_ref().map(|w| w.hours().to_vec()),
                    "next_optimal": iso_millis(s.next_optimal),
                    "rate_limit": s.rate_limit,
                })
            })
            .collect(),
    )
}

// VALIDATION

/// Inputs echoed back alongside a [`ValidationResult`]
#[derive(Debug, Clone, Copy)]
pub struct ValidationReport<'a> {
    pub platform: &'a str,
    pub content: &'a str,
    pub media: &'a [String],
    pub result: &'a ValidationResult,
}

impl ValidationReport<'_> {
    pub fn to_text(&self) -> String {
        let mut lines = vec![
            "=== Validation Result ===".to_string(),
            format!("Platform: {}", self.platform),
            format!("Content length: {} characters", self.content.chars().count()),
            format!("Media files: {}", self.media.len()),
            format!("Valid: {}", if self.result.is_valid() { "✓" } else { "✗" }),
        ];

        if !self.result.errors().is_empty() {
            lines.push(String::new());
            lines.push("Errors:".to_string());
            lines.extend(self.result.errors().iter().map(|e| format!("  ✗ {}", e)));
        }

        if !self.result.warnings().is_empty() {
            lines.push(String::new());
            lines.push("Warnings:".to_string());
            lines.extend(self.result.warnings().iter().map(|w| format!("  ⚠ {}", w)));
        }

        lines.join("\n")
    }

    pub fn to_json(&self) -> Value {
        json!({
            "platform": self.platform,
            "content_length": self.content.chars().count(),
            "media_count": self.media.len(),
            "valid": self.result.is_valid(),
            "errors": self.result.errors(),
            "warnings": self.result.warnings(),
            "findings": self.result.findings(),
        })
    }
}
