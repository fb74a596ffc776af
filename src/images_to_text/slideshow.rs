//! Image URLs and bytes for TikTok photo carousels.

use crate::error::ErrorCode;
use crate::media::MediaTool;
use crate::platform::Platform;
use crate::strategy::{run_in_order, Strategy};
use crate::url_to_text::fetchers::{
    PageFetcher, DESKTOP_USER_AGENT, FACEBOOK_USER_AGENT, IPHONE_USER_AGENT,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

pub const TIKTOK_REFERER: &str = "https://www.tiktok.com/";

const PAGE_USER_AGENTS: [&str; 3] = [DESKTOP_USER_AGENT, IPHONE_USER_AGENT, FACEBOOK_USER_AGENT];
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "heic"];

lazy_static! {
    static ref UNIVERSAL_DATA: Regex = Regex::new(
        r#"(?s)<script[^>]*id="__UNIVERSAL_DATA_FOR_REHYDRATION__"[^>]*>(.*?)</script>"#
    )
    .unwrap();
    static ref SIGI_STATE: Regex =
        Regex::new(r#"(?s)<script[^>]*id="SIGI_STATE"[^>]*>(.*?)</script>"#).unwrap();
    static ref IMAGE_URL_LIST: Regex =
        Regex::new(r#""imageURL"\s*:\s*\{\s*"urlList"\s*:\s*(\[[^\]]*\])"#).unwrap();
    static ref OG_IMAGE: Selector = Selector::parse("meta[property='og:image']").unwrap();
}

#[derive(Error, Debug)]
pub enum SlideshowError {
    #[error("No images found for {0}")]
    NoImages(String),

    #[error("None of the {0} images could be downloaded")]
    DownloadFailed(usize),
}

impl SlideshowError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SlideshowError::NoImages(_) => ErrorCode::NoImagesFound,
            SlideshowError::DownloadFailed(_) => ErrorCode::ImageDownloadFailed,
        }
    }
}

/// Image URLs found for a post, with the caption when the source had one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageList {
    pub urls: Vec<String>,
    pub caption: Option<String>,
}

/// Downloaded carousel, base64-encoded in page order.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideshowImages {
    pub images: Vec<String>,
    pub caption: Option<String>,
}

pub struct SlideshowScraper {
    media: Arc<dyn MediaTool>,
    pages: Arc<dyn PageFetcher>,
    max_images: usize,
}

impl SlideshowScraper {
    pub fn new(media: Arc<dyn MediaTool>, pages: Arc<dyn PageFetcher>, max_images: usize) -> Self {
        Self {
            media,
            pages,
            max_images,
        }
    }

    pub async fn scrape(&self, url: &str) -> Result<SlideshowImages, SlideshowError> {
        let list = self.find_image_urls(url).await;
        if list.urls.is_empty() {
            return Err(SlideshowError::NoImages(url.to_string()));
        }
        let images = self.download(&list.urls).await?;
        Ok(SlideshowImages {
            images,
            caption: list.caption,
        })
    }

    /// Media tool dump first, then the post page under each user agent.
    pub async fn find_image_urls(&self, url: &str) -> ImageList {
        match self.media.dump_metadata(url, Platform::Tiktok).await {
            Ok(dump) => {
                let list = images_from_dump(&dump);
                if !list.urls.is_empty() {
                    info!("Found {} slideshow images in metadata dump", list.urls.len());
                    return list;
                }
            }
            Err(e) => debug!("Metadata dump unavailable for {}: {}", url, e),
        }

        let mut og_fallback: Option<ImageList> = None;
        for user_agent in PAGE_USER_AGENTS {
            let html = match self.pages.fetch_html(url, Some(user_agent)).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Slideshow page fetch failed ({}): {}", user_agent, e);
                    continue;
                }
            };

            match scan_page(&html) {
                Some(("og-image", list)) => {
                    og_fallback.get_or_insert(list);
                }
                Some((strategy, list)) => {
                    info!("Found {} slideshow images via {}", list.urls.len(), strategy);
                    return list;
                }
                None => debug!("No slideshow images in page for {}", user_agent),
            }
        }
        og_fallback.unwrap_or_default()
    }

    /// Fetch up to `max_images` one at a time; individual failures are skipped.
    pub async fn download(&self, urls: &[String]) -> Result<Vec<String>, SlideshowError> {
        let wanted = &urls[..urls.len().min(self.max_images)];
        let mut images = Vec::with_capacity(wanted.len());

        for (index, image_url) in wanted.iter().enumerate() {
            match self.pages.fetch_bytes(image_url, Some(TIKTOK_REFERER)).await {
                Ok(bytes) if !bytes.is_empty() => images.push(STANDARD.encode(&bytes)),
                Ok(_) => warn!("Slideshow image {} was empty", index + 1),
                Err(e) => warn!("Slideshow image {} failed: {}", index + 1, e),
            }
        }

        if images.is_empty() {
            return Err(SlideshowError::DownloadFailed(wanted.len()));
        }
        debug!("Downloaded {}/{} slideshow images", images.len(), wanted.len());
        Ok(images)
    }
}

/// `images[].url` (or `images[].urlList[0]`), else image-like `formats[].url`.
pub fn images_from_dump(dump: &Value) -> ImageList {
    let caption = dump
        .get("description")
        .or_else(|| dump.get("title"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let from_images: Vec<String> = dump
        .get("images")
        .and_then(Value::as_array)
        .map(|images| {
            images
                .iter()
                .filter_map(|image| {
                    image
                        .get("url")
                        .and_then(Value::as_str)
                        .or_else(|| image.pointer("/urlList/0").and_then(Value::as_str))
                        .map(str::to_string)
                })
                .collect()
        })
        .unwrap_or_default();

    let urls = if from_images.is_empty() {
        dump.get("formats")
            .and_then(Value::as_array)
            .map(|formats| {
                formats
                    .iter()
                    .filter(|format| is_image_format(format))
                    .filter_map(|format| format.get("url").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    } else {
        from_images
    };

    ImageList {
        urls: dedupe(urls),
        caption,
    }
}

fn is_image_format(format: &Value) -> bool {
    let ext = format.get("ext").and_then(Value::as_str).unwrap_or_default();
    let url = format.get("url").and_then(Value::as_str).unwrap_or_default();
    let path = url.split('?').next().unwrap_or_default().to_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|candidate| ext.eq_ignore_ascii_case(candidate) || path.ends_with(&format!(".{}", candidate)))
}

fn scan_page(html: &str) -> Option<(&'static str, ImageList)> {
    let strategies: [&dyn Strategy<str, Output = ImageList>; 4] =
        [&UniversalData, &SigiState, &ImageUrlRegex, &OgImage];
    run_in_order(&strategies, html)
}

struct UniversalData;

impl Strategy<str> for UniversalData {
    type Output = ImageList;

    fn name(&self) -> &'static str {
        "universal-data"
    }

    fn try_extract(&self, html: &str) -> Option<ImageList> {
        let data = embedded_json(&UNIVERSAL_DATA, html)?;
        let item = data.pointer("/__DEFAULT_SCOPE__/webapp.video-detail/itemInfo/itemStruct")?;
        image_post(item)
    }
}

struct SigiState;

impl Strategy<str> for SigiState {
    type Output = ImageList;

    fn name(&self) -> &'static str {
        "sigi-state"
    }

    fn try_extract(&self, html: &str) -> Option<ImageList> {
        let data = embedded_json(&SIGI_STATE, html)?;
        data.get("ItemModule")?
            .as_object()?
            .values()
            .find_map(image_post)
    }
}

struct ImageUrlRegex;

impl Strategy<str> for ImageUrlRegex {
    type Output = ImageList;

    fn name(&self) -> &'static str {
        "image-url-regex"
    }

    fn try_extract(&self, html: &str) -> Option<ImageList> {
        let urls: Vec<String> = IMAGE_URL_LIST
            .captures_iter(html)
            .filter_map(|caps| serde_json::from_str::<Vec<String>>(&caps[1]).ok())
            .filter_map(|list| list.into_iter().next())
            .collect();
        non_empty(urls, None)
    }
}

struct OgImage;

impl Strategy<str> for OgImage {
    type Output = ImageList;

    fn name(&self) -> &'static str {
        "og-image"
    }

    fn try_extract(&self, html: &str) -> Option<ImageList> {
        let document = Html::parse_document(html);
        let url = document
            .select(&OG_IMAGE)
            .filter_map(|meta| meta.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())?
            .to_string();
        non_empty(vec![url], None)
    }
}

fn embedded_json(pattern: &Regex, html: &str) -> Option<Value> {
    let raw = pattern.captures(html)?;
    match serde_json::from_str(raw[1].trim()) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Embedded page state is not JSON: {}", e);
            None
        }
    }
}

fn image_post(item: &Value) -> Option<ImageList> {
    let urls = item
        .pointer("/imagePost/images")?
        .as_array()?
        .iter()
        .filter_map(|image| image.pointer("/imageURL/urlList/0").and_then(Value::as_str))
        .map(str::to_string)
        .collect();
    let caption = item
        .get("desc")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    non_empty(urls, caption)
}

fn non_empty(urls: Vec<String>, caption: Option<String>) -> Option<ImageList> {
    let urls = dedupe(urls);
    (!urls.is_empty()).then_some(ImageList { urls, caption })
}

fn dedupe(urls: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(urls.len());
    for url in urls {
        if !url.is_empty() && !seen.contains(&url) {
            seen.push(url);
        }
    }
    seen
}
