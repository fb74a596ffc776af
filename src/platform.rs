use crate::error::ExtractError;
use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

lazy_static! {
    static ref YOUTUBE_ID: Regex = Regex::new(
        r"(?:youtube\.com/watch\?(?:[^#]*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/)([A-Za-z0-9_-]+)"
    )
    .unwrap();
    static ref TIKTOK_CANONICAL: Regex =
        Regex::new(r"tiktok\.com/(@[^/?#]+)/(video|photo)/(\d+)").unwrap();
    static ref TIKTOK_ID: Regex = Regex::new(r"/(?:video|photo)/(\d+)").unwrap();
    static ref INSTAGRAM_POST: Regex =
        Regex::new(r"instagram\.com/(?:[^/?#]+/)?(reels?|p|tv)/([A-Za-z0-9_-]+)").unwrap();
}

/// Source platform of a URL, decided by host substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Youtube,
    Tiktok,
    Instagram,
    Web,
}

impl Platform {
    pub fn detect(url: &str) -> Platform {
        let lower = url.to_lowercase();
        if lower.contains("youtube.com") || lower.contains("youtu.be") {
            Platform::Youtube
        } else if lower.contains("tiktok.com") {
            Platform::Tiktok
        } else if lower.contains("instagram.com") {
            Platform::Instagram
        } else {
            Platform::Web
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Web => "web",
        }
    }

    pub fn is_video(&self) -> bool {
        !matches!(self, Platform::Web)
    }
}

/// True for TikTok photo carousels, which carry no audio track.
pub fn is_slideshow(url: &str) -> bool {
    Platform::detect(url) == Platform::Tiktok && url.contains("/photo/")
}

/// Platform-specific content id, used only for duplicate matching.
pub fn extract_video_id(url: &str) -> Option<String> {
    let captures = match Platform::detect(url) {
        Platform::Youtube => YOUTUBE_ID.captures(url)?,
        Platform::Tiktok => TIKTOK_ID.captures(url)?,
        Platform::Instagram => {
            return INSTAGRAM_POST
                .captures(url)
                .map(|c| c[2].to_string());
        }
        Platform::Web => return None,
    };
    Some(captures[1].to_string())
}

/// Follows redirects for short links.
#[async_trait]
pub trait RedirectResolver: Send + Sync {
    /// Return the final URL after following every redirect.
    async fn resolve(&self, url: &str) -> Result<String, ExtractError>;
}

/// Resolves redirects with an HTTP HEAD request.
pub struct HttpRedirectResolver {
    client: Client,
}

impl HttpRedirectResolver {
    pub fn new(timeout: Duration) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RedirectResolver for HttpRedirectResolver {
    async fn resolve(&self, url: &str) -> Result<String, ExtractError> {
        let response = self.client.head(url).send().await?;
        Ok(response.url().to_string())
    }
}

/// Rewrites URLs to one canonical form per piece of content.
///
/// Normalization is idempotent: a canonical URL normalizes to itself, so the
/// output can be stored and compared for duplicate detection.
pub struct UrlNormalizer {
    resolver: Arc<dyn RedirectResolver>,
}

impl UrlNormalizer {
    pub fn new(resolver: Arc<dyn RedirectResolver>) -> Self {
        Self { resolver }
    }

    pub async fn normalize(&self, url: &str) -> String {
        let url = url.trim();
        match Platform::detect(url) {
            Platform::Tiktok => {
                if is_tiktok_short_link(url) {
                    match self.resolver.resolve(url).await {
                        Ok(resolved) => {
                            debug!("Resolved TikTok link {} -> {}", url, resolved);
                            canonical_tiktok(&resolved)
                        }
                        Err(e) => {
                            warn!("Failed to resolve TikTok link {}: {}", url, e);
                            url.to_string()
                        }
                    }
                } else {
                    canonical_tiktok(url)
                }
            }
            Platform::Youtube => match YOUTUBE_ID.captures(url) {
                Some(c) => format!("https://www.youtube.com/watch?v={}", &c[1]),
                None => url.to_string(),
            },
            Platform::Instagram => match INSTAGRAM_POST.captures(url) {
                Some(c) => {
                    let kind = if c[1].starts_with("reel") { "reel" } else { &c[1] };
                    format!("https://www.instagram.com/{}/{}/", kind, &c[2])
                }
                None => url.to_string(),
            },
            Platform::Web => url.to_string(),
        }
    }
}

fn is_tiktok_short_link(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("tiktok.com/t/")
        || lower.contains("vm.tiktok.com")
        || lower.contains("vt.tiktok.com")
}

fn strip_query(url: &str) -> &str {
    let end = url.find(|c: char| c == '?' || c == '#').unwrap_or(url.len());
    &url[..end]
}

fn canonical_tiktok(url: &str) -> String {
    let stripped = strip_query(url);
    match TIKTOK_CANONICAL.captures(stripped) {
        Some(c) => format!("https://www.tiktok.com/{}/{}/{}", &c[1], &c[2], &c[3]),
        None => stripped.to_string(),
    }
}
