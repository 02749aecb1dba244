//! Content validation service
//!
//! Checks a post's text and media against one platform's limits. Every rule
//! produces zero or more [`Finding`]s; errors block publication, warnings are
//! advice only. Findings always come out in the same order:
//! length, media count, media types, required video, composition, advisories.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::media::{resolve_media_type, MediaCategory};
use crate::rules::{Advisory, CompositionRule, PlatformLimits, RuleTable};
use crate::types::PlatformKey;

/// Fraction of the length limit past which a warning is raised (in tenths)
const NEAR_LIMIT_TENTHS: usize = 9;

/// Service for validating content against platform requirements
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use libcastwise::rules::RuleTable;
/// use libcastwise::service::validation::ValidationService;
///
/// let service = ValidationService::new(Arc::new(RuleTable::builtin()));
/// let result = service.validate("youtube", "Trailer", &[], false);
///
/// assert!(!result.is_valid());
/// assert_eq!(result.errors(), ["youtube requires video content"]);
/// ```
#[derive(Debug, Clone)]
pub struct ValidationService {
    rules: Arc<RuleTable>,
}

/// Request to validate a post for one platform
#[derive(Debug, Clone, Default)]
pub struct ValidationRequest {
    pub platform: String,
    pub content: String,
    /// Media file names or URLs
    pub media: Vec<String>,
    /// Apply the platform's elevated (premium) length ceiling if it has one
    pub elevated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    UnknownPlatform,
    ContentTooLong,
    NearLengthLimit,
    TooManyMedia,
    UnsupportedMediaType,
    MissingRequiredVideo,
    IncompatibleMediaMix,
    MentionFormat,
    SuppressedLink,
}

/// One rule outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub kind: FindingKind,
    pub message: String,
}

impl Finding {
    pub fn error(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
        }
    }

    pub fn warning(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Aggregated outcome of a validation run
///
/// Only constructible from findings, so `valid` always equals
/// "no error findings".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
    findings: Vec<Finding>,
}

impl ValidationResult {
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        let (errors, warnings): (Vec<&Finding>, Vec<&Finding>) =
            findings.iter().partition(|f| f.is_error());

        Self {
            valid: errors.is_empty(),
            errors: errors.iter().map(|f| f.message.clone()).collect(),
            warnings: warnings.iter().map(|f| f.message.clone()).collect(),
            findings,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// True when some finding of `kind` was produced
    pub fn has(&self, kind: FindingKind) -> bool {
        self.findings.iter().any(|f| f.kind == kind)
    }
}

impl ValidationService {
    /// Create a new validation service
    ///
    /// # Arguments
    ///
    /// * `rules` - Shared rule table holding each platform's limits
    pub fn new(rules: Arc<RuleTable>) -> Self {
        Self { rules }
    }

    pub fn validate_request(&self, request: &ValidationRequest) -> ValidationResult {
        self.validate(
            &request.platform,
            &request.content,
            &request.media,
            request.elevated,
        )
    }

    /// Validate content and media for one platform
    ///
    /// An unknown platform yields a single error and no other checks run.
    /// Otherwise every rule runs regardless of earlier failures.
    pub fn validate(
        &self,
        platform: &str,
        content: &str,
        media: &[String],
        elevated: bool,
    ) -> ValidationResult {
        let Some((key, limits)) = self.rules.limits(platform) else {
            return ValidationResult::from_findings(vec![Finding::error(
                FindingKind::UnknownPlatform,
                format!(
                    "Unknown platform: {}. Supported: {}",
                    platform,
                    self.rules.supported_list()
                ),
            )]);
        };

        let findings: Vec<Finding> = [
            check_length(limits, content, elevated),
            check_media_count(limits, media),
            check_media_types(limits, media),
            check_required_video(key, limits, media),
            check_composition(key, limits, media),
            check_advisories(limits, content),
        ]
        .into_iter()
        .flatten()
        .collect();

        let result = ValidationResult::from_findings(findings);
        debug!(
            platform = %key,
            valid = result.is_valid(),
            errors = result.errors().len(),
            warnings = result.warnings().len(),
            "Validated content"
        );
        result
    }

    /// Convenience wrapper returning only the verdict
    pub fn is_valid(&self, platform: &str, content: &str, media: &[String]) -> bool {
        self.validate(platform, content, media, false).is_valid()
    }

    /// Limits row for a platform, if it is known
    pub fn limits(&self, platform: &str) -> Option<&PlatformLimits> {
        self.rules.limits(platform).map(|(_, limits)| limits)
    }
}

fn check_length(limits: &PlatformLimits, content: &str, elevated: bool) -> Vec<Finding> {
    let max = limits.effective_max_length(elevated);
    let length = content.chars().count();

    if length > max {
        vec![Finding::error(
            FindingKind::ContentTooLong,
            format!("Content too long: {}/{} characters", length, max),
        )]
    } else if length * 10 > max * NEAR_LIMIT_TENTHS {
        vec![Finding::warning(
            FindingKind::NearLengthLimit,
            format!("Content near limit: {}/{} characters", length, max),
        )]
    } else {
        vec![]
    }
}

fn check_media_count(limits: &PlatformLimits, media: &[String]) -> Vec<Finding> {
    if media.len() > limits.max_media_count {
        vec![Finding::error(
            FindingKind::TooManyMedia,
            format!(
                "Too many media files: {}/{}",
                media.len(),
                limits.max_media_count
            ),
        )]
    } else {
        vec![]
    }
}

fn check_media_types(limits: &PlatformLimits, media: &[String]) -> Vec<Finding> {
    media
        .iter()
        .filter_map(|file| {
            let media_type = resolve_media_type(file);
            (!limits.supports(media_type)).then(|| {
                Finding::error(
                    FindingKind::UnsupportedMediaType,
                    format!("Unsupported media type: {} ({})", file, media_type),
                )
            })
        })
        .collect()
}

fn check_required_video(key: PlatformKey, limits: &PlatformLimits, media: &[String]) -> Vec<Finding> {
    if limits.requires_video && media.is_empty() {
        vec![Finding::error(
            FindingKind::MissingRequiredVideo,
            format!("{} requires video content", key),
        )]
    } else {
        vec![]
    }
}

fn check_composition(key: PlatformKey, limits: &PlatformLimits, media: &[String]) -> Vec<Finding> {
    match limits.composition {
        CompositionRule::Unrestricted => vec![],
        CompositionRule::NoVideoImageMix => {
            let categories: Vec<MediaCategory> =
                media.iter().map(|f| MediaCategory::of_file(f)).collect();
            let has_video = categories.contains(&MediaCategory::Video);
            let has_image = categories.contains(&MediaCategory::Image);

            if has_video && has_image {
                vec![Finding::error(
                    FindingKind::IncompatibleMediaMix,
                    format!(
                        "{} does not support mixing videos and images in one post",
                        key.display_name()
                    ),
                )]
            } else {
                vec![]
            }
        }
    }
}

fn check_advisories(limits: &PlatformLimits, content: &str) -> Vec<Finding> {
    limits
        .advisories
        .iter()
        .filter_map(|advisory| {
            let kind = match advisory {
                Advisory::MentionFormat { .. } => FindingKind::MentionFormat,
                Advisory::SuppressedLink { .. } => FindingKind::SuppressedLink,
            };
            advisory
                .check(content)
                .map(|hint| Finding::warning(kind, hint))
        })
        .collect()
}
