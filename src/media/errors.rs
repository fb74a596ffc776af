use crate::error::ErrorCode;
use crate::platform::Platform;
use std::fmt;
use std::time::Duration;

/// How a media tool invocation went wrong, before any text matching.
#[derive(Debug)]
pub enum ToolFailure {
    TimedOut(Duration),
    NotInstalled(String),
    /// The process ran and exited unsuccessfully. `code` is `None` when it
    /// was killed by a signal.
    Exited { code: Option<i32>, stderr: String },
    Io(std::io::Error),
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolFailure::TimedOut(limit) => {
                write!(f, "media tool timed out after {} seconds", limit.as_secs())
            }
            ToolFailure::NotInstalled(binary) => write!(f, "{} not found", binary),
            ToolFailure::Exited { code: Some(code), stderr } => {
                write!(f, "exit code {}: {}", code, stderr.trim())
            }
            ToolFailure::Exited { code: None, stderr } => {
                write!(f, "terminated by signal: {}", stderr.trim())
            }
            ToolFailure::Io(e) => write!(f, "{}", e),
        }
    }
}

/// A classified failure: machine code, raw text for logs, and a sentence
/// that can be shown to users.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFailure {
    pub code: ErrorCode,
    pub error: String,
    pub friendly: String,
}

impl MediaFailure {
    pub fn new(code: ErrorCode, error: impl Into<String>, friendly: impl Into<String>) -> Self {
        Self {
            code,
            error: error.into(),
            friendly: friendly.into(),
        }
    }
}

// Ordered; the first pattern found in the lowercased stderr wins.
const ERROR_PATTERNS: &[(&str, ErrorCode, &str)] = &[
    (
        "video unavailable",
        ErrorCode::VideoUnavailable,
        "This video is no longer available. It may have been deleted by the creator.",
    ),
    (
        "this video has been removed",
        ErrorCode::VideoRemoved,
        "This video has been removed by the creator or the platform.",
    ),
    (
        "video is private",
        ErrorCode::VideoPrivate,
        "This video is private. Only the creator can view it.",
    ),
    (
        "private video",
        ErrorCode::VideoPrivate,
        "This video is private. Only the creator can view it.",
    ),
    (
        "sign in to confirm your age",
        ErrorCode::AgeRestricted,
        "This video is age-restricted and cannot be extracted.",
    ),
    (
        "age-restricted",
        ErrorCode::AgeRestricted,
        "This video is age-restricted and cannot be extracted.",
    ),
    (
        "login required",
        ErrorCode::InstagramAuthRequired,
        "Instagram requires authentication. Please try again later.",
    ),
    (
        "rate-limit",
        ErrorCode::RateLimited,
        "Too many requests. Please wait a few minutes and try again.",
    ),
    (
        "couldn't find this account",
        ErrorCode::AccountNotFound,
        "This TikTok account no longer exists or has been banned.",
    ),
    (
        "video is currently unavailable",
        ErrorCode::VideoUnavailable,
        "This video is currently unavailable. It may be under review or deleted.",
    ),
    (
        "video has been removed by the uploader",
        ErrorCode::VideoRemoved,
        "This video has been removed by the uploader.",
    ),
    (
        "video has been removed for violating",
        ErrorCode::VideoRemoved,
        "This video has been removed for violating platform guidelines.",
    ),
    (
        "this video is not available",
        ErrorCode::VideoUnavailable,
        "This video is not available. It may be region-restricted or deleted.",
    ),
    (
        "join this channel to get access",
        ErrorCode::MembersOnly,
        "This video is only available to channel members.",
    ),
    (
        "unable to extract",
        ErrorCode::ExtractionFailed,
        "We couldn't extract this video. It may be in an unsupported format.",
    ),
    (
        "http error 404",
        ErrorCode::NotFound,
        "This video doesn't exist or the link is broken.",
    ),
    (
        "http error 403",
        ErrorCode::AccessDenied,
        "Access to this video is denied. It may be private or region-restricted.",
    ),
];

/// Match raw tool output against the known error table, falling back to a
/// platform-specific sentence.
pub fn classify_stderr(stderr: &str, platform: Platform) -> (ErrorCode, &'static str) {
    let lower = stderr.to_lowercase();
    for (pattern, code, message) in ERROR_PATTERNS {
        if lower.contains(pattern) {
            return (*code, *message);
        }
    }

    match platform {
        Platform::Instagram => (
            ErrorCode::ExtractionFailed,
            "We couldn't access this Instagram video. It may be private, deleted, or temporarily unavailable.",
        ),
        Platform::Tiktok => (
            ErrorCode::ExtractionFailed,
            "We couldn't access this TikTok video. It may be private, deleted, or temporarily unavailable.",
        ),
        Platform::Youtube => (
            ErrorCode::ExtractionFailed,
            "We couldn't access this YouTube video. It may be private, deleted, or region-restricted.",
        ),
        Platform::Web => (
            ErrorCode::UnknownError,
            "We couldn't process this video. Please check the link and try again.",
        ),
    }
}

/// Classify a tool failure. Structured exit information is consulted first;
/// stderr text matching is the last resort.
pub fn classify(failure: &ToolFailure, platform: Platform) -> MediaFailure {
    match failure {
        ToolFailure::TimedOut(_) => MediaFailure::new(
            ErrorCode::Timeout,
            failure.to_string(),
            ErrorCode::Timeout.default_message(),
        ),
        ToolFailure::NotInstalled(_) => MediaFailure::new(
            ErrorCode::SystemError,
            failure.to_string(),
            ErrorCode::SystemError.default_message(),
        ),
        // yt-dlp exits with 2 on usage errors, which only a bad invocation causes
        ToolFailure::Exited { code: Some(2), .. } | ToolFailure::Exited { code: None, .. } => {
            MediaFailure::new(
                ErrorCode::SystemError,
                failure.to_string(),
                ErrorCode::SystemError.default_message(),
            )
        }
        ToolFailure::Exited { stderr, .. } => {
            let (code, friendly) = classify_stderr(stderr, platform);
            MediaFailure::new(code, stderr.trim(), friendly)
        }
        ToolFailure::Io(_) => MediaFailure::new(
            ErrorCode::UnknownError,
            failure.to_string(),
            ErrorCode::UnknownError.default_message(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exited(stderr: &str) -> ToolFailure {
        ToolFailure::Exited {
            code: Some(1),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_private_video() {
        let failure = classify(
            &exited("ERROR: [youtube] abc: Private video. Sign in if you've been granted access"),
            Platform::Youtube,
        );
        assert_eq!(failure.code, ErrorCode::VideoPrivate);
        assert!(failure.code.is_definitive());
        assert!(failure.friendly.contains("private"));
    }

    #[test]
    fn test_table_order_first_match_wins() {
        // Contains both "video unavailable" and "http error 404"
        let (code, _) = classify_stderr(
            "ERROR: Video unavailable (HTTP Error 404: Not Found)",
            Platform::Youtube,
        );
        assert_eq!(code, ErrorCode::VideoUnavailable);
    }

    #[test]
    fn test_instagram_login_required() {
        let (code, message) = classify_stderr(
            "ERROR: [Instagram] Cx1: Requested content is not available, rate-limit reached or login required",
            Platform::Instagram,
        );
        // "login required" precedes "rate-limit" in the table
        assert_eq!(code, ErrorCode::InstagramAuthRequired);
        assert!(!code.is_definitive());
        assert!(message.contains("Instagram"));
    }

    #[test]
    fn test_members_only_and_http_codes() {
        assert_eq!(
            classify_stderr("Join this channel to get access to members-only content", Platform::Youtube).0,
            ErrorCode::MembersOnly
        );
        assert_eq!(
            classify_stderr("ERROR: HTTP Error 403: Forbidden", Platform::Tiktok).0,
            ErrorCode::AccessDenied
        );
    }

    #[test]
    fn test_platform_fallbacks() {
        let (code, message) = classify_stderr("something odd", Platform::Tiktok);
        assert_eq!(code, ErrorCode::ExtractionFailed);
        assert!(message.contains("TikTok"));

        let (code, _) = classify_stderr("something odd", Platform::Web);
        assert_eq!(code, ErrorCode::UnknownError);
    }

    #[test]
    fn test_structured_failures_skip_text_matching() {
        let timeout = classify(&ToolFailure::TimedOut(Duration::from_secs(120)), Platform::Youtube);
        assert_eq!(timeout.code, ErrorCode::Timeout);
        assert!(timeout.error.contains("120"));

        let missing = classify(&ToolFailure::NotInstalled("yt-dlp".to_string()), Platform::Tiktok);
        assert_eq!(missing.code, ErrorCode::SystemError);

        // Usage errors never hit the table even if the text looks familiar
        let usage = classify(
            &ToolFailure::Exited {
                code: Some(2),
                stderr: "video unavailable".to_string(),
            },
            Platform::Youtube,
        );
        assert_eq!(usage.code, ErrorCode::SystemError);

        let killed = classify(
            &ToolFailure::Exited {
                code: None,
                stderr: String::new(),
            },
            Platform::Youtube,
        );
        assert_eq!(killed.code, ErrorCode::SystemError);
    }
}
