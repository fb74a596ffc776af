use crate::confidence::is_placeholder_title;
use crate::content::append_notes;
use crate::engine::{EngineError, ExtractionEngine};
use crate::error::ErrorCode;
use crate::images_to_text::SlideshowScraper;
use crate::media::MetadataFetcher;
use crate::model::{ExtractionMethod, ExtractionQuality, ExtractionResult};
use crate::platform::Platform;
use crate::progress::{emit, ProgressSink};
use log::{info, warn};

/// TikTok photo carousel: download the images and read them with the vision engine.
pub async fn process(
    scraper: &SlideshowScraper,
    metadata: &dyn MetadataFetcher,
    engine: &ExtractionEngine,
    url: &str,
    location: &str,
    notes: &str,
    progress: Option<&dyn ProgressSink>,
) -> ExtractionResult {
    emit(progress, "metadata", 20, "Fetching post details...").await;
    let oembed = metadata.fetch_oembed(url, Platform::Tiktok).await;

    emit(progress, "downloading", 30, "Downloading photos...").await;
    let slideshow = match scraper.scrape(url).await {
        Ok(slideshow) => slideshow,
        Err(e) => {
            warn!("Slideshow scrape failed for {}: {}", url, e);
            return ExtractionResult::failed(e.code(), e.to_string());
        }
    };
    info!("Reading {} slideshow images", slideshow.images.len());

    let caption = slideshow
        .caption
        .or_else(|| oembed.title.clone())
        .unwrap_or_default();
    let caption = append_notes(caption, notes);

    emit(progress, "extracting", 70, "Extracting recipe from photos...").await;
    let output = match engine
        .extract_slideshow(url, slideshow.images, &caption, location)
        .await
    {
        Ok(output) => output,
        Err(EngineError::NoContent) => {
            return ExtractionResult::failed(ErrorCode::NoImagesFound, "No images to read")
        }
        Err(EngineError::AllProvidersFailed(_)) => {
            return ExtractionResult::failed(
                ErrorCode::VisionExtractionFailed,
                "Vision extraction failed",
            )
        }
    };

    let mut recipe = output.into_recipe(url, location);
    if recipe.ingredient_count() == 0 && recipe.step_count() == 0 {
        return ExtractionResult::failed(
            ErrorCode::TiktokPhotoError,
            "Photos did not contain a readable recipe",
        )
        .with_raw_text(caption);
    }
    if is_placeholder_title(&recipe.title) {
        if let Some(title) = oembed.title.as_deref().filter(|t| !is_placeholder_title(t)) {
            recipe.title = title.trim().to_string();
        }
    }
    recipe.media.thumbnail = oembed.thumbnail;

    ExtractionResult::succeeded(
        recipe,
        ExtractionMethod::TiktokPhotoVision,
        ExtractionQuality::High,
    )
    .with_raw_text(caption)
}
