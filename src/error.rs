use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Machine-readable failure codes surfaced on [`crate::ExtractionResult`].
///
/// This is a closed set: callers match on it to decide how to present a
/// failure, so new failure modes must map onto one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    VideoUnavailable,
    VideoRemoved,
    VideoPrivate,
    AgeRestricted,
    InstagramAuthRequired,
    RateLimited,
    AccountNotFound,
    MembersOnly,
    NotFound,
    AccessDenied,
    ExtractionFailed,
    NoAudio,
    Timeout,
    SystemError,
    NoContent,
    LlmExtractionFailed,
    NoImagesFound,
    ImageDownloadFailed,
    VisionExtractionFailed,
    TiktokPhotoError,
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::VideoUnavailable => "VIDEO_UNAVAILABLE",
            ErrorCode::VideoRemoved => "VIDEO_REMOVED",
            ErrorCode::VideoPrivate => "VIDEO_PRIVATE",
            ErrorCode::AgeRestricted => "AGE_RESTRICTED",
            ErrorCode::InstagramAuthRequired => "INSTAGRAM_AUTH_REQUIRED",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::AccountNotFound => "ACCOUNT_NOT_FOUND",
            ErrorCode::MembersOnly => "MEMBERS_ONLY",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AccessDenied => "ACCESS_DENIED",
            ErrorCode::ExtractionFailed => "EXTRACTION_FAILED",
            ErrorCode::NoAudio => "NO_AUDIO",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::SystemError => "SYSTEM_ERROR",
            ErrorCode::NoContent => "NO_CONTENT",
            ErrorCode::LlmExtractionFailed => "LLM_EXTRACTION_FAILED",
            ErrorCode::NoImagesFound => "NO_IMAGES_FOUND",
            ErrorCode::ImageDownloadFailed => "IMAGE_DOWNLOAD_FAILED",
            ErrorCode::VisionExtractionFailed => "VISION_EXTRACTION_FAILED",
            ErrorCode::TiktokPhotoError => "TIKTOK_PHOTO_ERROR",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Codes for content that structurally does not exist. No metadata-only
    /// fallback can recover these, so the pipeline stops immediately.
    pub fn is_definitive(&self) -> bool {
        matches!(
            self,
            ErrorCode::VideoUnavailable
                | ErrorCode::VideoRemoved
                | ErrorCode::VideoPrivate
                | ErrorCode::NotFound
                | ErrorCode::AccountNotFound
                | ErrorCode::MembersOnly
        )
    }

    /// Default user-facing sentence for codes that are not produced by the
    /// media-tool error table.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::NoAudio => {
                "We couldn't extract audio from this video. It may not contain audio."
            }
            ErrorCode::Timeout => "The video took too long to download. Please try again later.",
            ErrorCode::SystemError => "A system error occurred. Please try again later.",
            ErrorCode::NoContent => {
                "We couldn't find any recipe content at this link. Please check the link and try again."
            }
            ErrorCode::LlmExtractionFailed => {
                "We couldn't turn this content into a recipe right now. Please try again in a few minutes."
            }
            ErrorCode::NoImagesFound => {
                "We couldn't find any images in this photo post. It may be private or deleted."
            }
            ErrorCode::ImageDownloadFailed => {
                "We found the photos in this post but couldn't download them. Please try again later."
            }
            ErrorCode::VisionExtractionFailed => {
                "We couldn't read a recipe from these photos. Please try again in a few minutes."
            }
            ErrorCode::TiktokPhotoError => {
                "Something went wrong while processing this TikTok photo post. Please try again."
            }
            ErrorCode::ExtractionFailed => {
                "We couldn't extract this video. It may be in an unsupported format."
            }
            _ => "An unexpected error occurred. Please try again.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur inside the extraction pipeline.
///
/// These never cross [`crate::RecipeExtractor::extract`]; they are folded into
/// a failed [`crate::ExtractionResult`] there.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// JSON could not be parsed
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem or subprocess I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a page or tool output
    #[error("Failed to parse: {0}")]
    Parse(String),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    Builder(String),

    /// Error parsing HTTP headers
    #[error("Header parse error: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Job record missing or in an unexpected state
    #[error("Job error: {0}")]
    Job(String),
}
