//! Media type detection from file names

use serde::{Deserialize, Serialize};

/// Media type assigned to any extension missing from the table
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Resolve a file name or URL to its canonical media type
///
/// Only the text after the final `.` is considered, case-insensitively.
/// Names without a recognised extension resolve to [`UNKNOWN_MEDIA_TYPE`].
pub fn resolve_media_type(filename: &str) -> &'static str {
    let lowered = filename.to_lowercase();
    let extension = lowered.rsplit('.').next().unwrap_or_default();

    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "avi" => "video/avi",
        "mov" => "video/mov",
        "pdf" => "application/pdf",
        _ => UNKNOWN_MEDIA_TYPE,
    }
}

/// Broad family of a media type, used by composition rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Image,
    Video,
    Document,
    Other,
}

impl MediaCategory {
    pub fn of(media_type: &str) -> Self {
        if media_type.starts_with("image/") {
            Self::Image
        } else if media_type.starts_with("video/") {
            Self::Video
        } else if media_type == UNKNOWN_MEDIA_TYPE {
            Self::Other
        } else if media_type.starts_with("application/") {
            Self::Document
        } else {
            Self::Other
        }
    }

    pub fn of_file(filename: &str) -> Self {
        Self::of(resolve_media_type(filename))
    }
}
