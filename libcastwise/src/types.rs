//! Core types for Castwise

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Social platforms Castwise knows rules for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKey {
    X,
    LinkedIn,
    Facebook,
    Threads,
    TikTok,
    YouTube,
}

impl PlatformKey {
    pub const ALL: [PlatformKey; 6] = [
        PlatformKey::X,
        PlatformKey::LinkedIn,
        PlatformKey::Facebook,
        PlatformKey::Threads,
        PlatformKey::TikTok,
        PlatformKey::YouTube,
    ];

    /// Lowercase identifier used on the command line and in output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::LinkedIn => "linkedin",
            Self::Facebook => "facebook",
            Self::Threads => "threads",
            Self::TikTok => "tiktok",
            Self::YouTube => "youtube",
        }
    }

    /// Brand spelling for user-facing messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::X => "X",
            Self::LinkedIn => "LinkedIn",
            Self::Facebook => "Facebook",
            Self::Threads => "Threads",
            Self::TikTok => "TikTok",
            Self::YouTube => "YouTube",
        }
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlatformKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        PlatformKey::ALL
            .into_iter()
            .find(|key| key.as_str() == needle)
            .ok_or_else(|| format!("Unknown platform: '{}'", s.trim()))
    }
}

/// Split a comma-separated platform list, trimming and lowercasing entries
///
/// Entries are kept as strings so callers decide how to treat names that
/// are not a [`PlatformKey`].
pub fn split_platform_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split a comma-separated list of media locators
pub fn split_media_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Pending,
    Posted,
    Failed,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Posted => write!(f, "posted"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of submitting a post to one platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PlatformResult {
    pub fn posted(post_url: impl Into<String>) -> Self {
        Self {
            success: true,
            post_url: Some(post_url.into()),
            error_message: None,
        }
    }

    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            success: false,
            post_url: None,
            error_message: Some(error_message.into()),
        }
    }
}

/// A post prepared for publication on one or more platforms
///
/// Built by [`crate::post::ScheduledPostFactory`]. `results` is filled in by
/// whatever submits the post, one entry per platform, through
/// [`ScheduledPost::record_result`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledPost {
    pub id: String,
    pub platforms: Vec<PlatformKey>,
    pub content: String,
    pub media_urls: Vec<String>,
    pub scheduled_time: DateTime<Utc>,
    pub status: PostStatus,
    pub results: BTreeMap<PlatformKey, PlatformResult>,
}

impl ScheduledPost {
    /// Store the outcome for one platform and recompute the aggregate status
    pub fn record_result(&mut self, platform: PlatformKey, result: PlatformResult) {
        self.results.insert(platform, result);
        self.status = self.aggregate_status();
    }

    /// Failed if any platform failed, posted once every platform succeeded
    pub fn aggregate_status(&self) -> PostStatus {
        if self.results.values().any(|r| !r.success) {
            return PostStatus::Failed;
        }

        let all_posted = !self.platforms.is_empty()
            && self
                .platforms
                .iter()
                .all(|p| self.results.get(p).is_some_and(|r| r.success));

        if all_posted {
            PostStatus::Posted
        } else {
            PostStatus::Pending
        }
    }
}
