use crate::builder::RecipeExtractorBuilder;
use crate::confidence::evaluate;
use crate::engine::ExtractionEngine;
use crate::error::{ErrorCode, ExtractError};
use crate::images_to_text::SlideshowScraper;
use crate::media::{MediaTool, MetadataFetcher};
use crate::model::{ExtractionMethod, ExtractionResult};
use crate::pipelines::{image, slideshow, website, VideoPipeline};
use crate::platform::{is_slideshow, Platform, UrlNormalizer};
use crate::progress::{emit, ProgressSink};
use crate::telemetry::ErrorReporter;
use crate::transcribe::Transcriber;
use crate::url_to_text::fetchers::PageFetcher;
use log::{info, warn};
use std::sync::Arc;

/// Turns a video or recipe-page URL (or recipe photos) into a normalized recipe.
///
/// Every expected failure is returned as an unsuccessful [`ExtractionResult`].
/// The terminal "complete" progress event is never sent from here; callers
/// send it once they have stored the result.
pub struct RecipeExtractor {
    pub(crate) normalizer: UrlNormalizer,
    pub(crate) metadata: Arc<dyn MetadataFetcher>,
    pub(crate) media: Arc<dyn MediaTool>,
    pub(crate) transcriber: Arc<dyn Transcriber>,
    pub(crate) pages: Arc<dyn PageFetcher>,
    pub(crate) engine: ExtractionEngine,
    pub(crate) slideshow: SlideshowScraper,
    pub(crate) reporter: Arc<dyn ErrorReporter>,
    pub(crate) default_location: String,
}

impl RecipeExtractor {
    pub fn builder() -> RecipeExtractorBuilder {
        RecipeExtractorBuilder::default()
    }

    /// Extract a recipe from `url`.
    ///
    /// An empty `location` uses the configured default. `fast_mode` skips
    /// audio download and transcription for video platforms.
    pub async fn extract(
        &self,
        url: &str,
        location: &str,
        notes: &str,
        progress: Option<&dyn ProgressSink>,
        fast_mode: bool,
    ) -> ExtractionResult {
        let location = self.location(location);
        info!("Starting extraction for {} (location: {})", url, location);

        match self.route(url, location, notes, progress, fast_mode).await {
            Ok(result) => self.finish(result, url),
            Err(e) => {
                self.reporter
                    .capture_error(&format!("Unexpected extraction error: {}", e), &[("url", url)]);
                ExtractionResult::failed(ErrorCode::UnknownError, e.to_string())
            }
        }
    }

    /// OCR of one photographed recipe.
    pub async fn extract_from_image(&self, image: &str, location: &str) -> ExtractionResult {
        self.extract_from_images(&[image.to_string()], location).await
    }

    /// OCR of a multi-page recipe, pages in order.
    pub async fn extract_from_images(&self, images: &[String], location: &str) -> ExtractionResult {
        let result = image::process(&self.engine, images.to_vec(), self.location(location)).await;
        self.finish(result, "image")
    }

    async fn route(
        &self,
        url: &str,
        location: &str,
        notes: &str,
        progress: Option<&dyn ProgressSink>,
        fast_mode: bool,
    ) -> Result<ExtractionResult, ExtractError> {
        let url = self.normalizer.normalize(url).await;
        let platform = Platform::detect(&url);

        if is_slideshow(&url) {
            emit(progress, "detecting", 10, "Detected tiktok photo post").await;
            return Ok(slideshow::process(
                &self.slideshow,
                self.metadata.as_ref(),
                &self.engine,
                &url,
                location,
                notes,
                progress,
            )
            .await);
        }

        if platform.is_video() {
            emit(
                progress,
                "detecting",
                10,
                &format!("Detected {} video", platform.as_str()),
            )
            .await;
            let pipeline = VideoPipeline {
                metadata: self.metadata.as_ref(),
                media: self.media.as_ref(),
                transcriber: self.transcriber.as_ref(),
                engine: &self.engine,
            };
            return Ok(pipeline
                .process(&url, platform, location, notes, progress, fast_mode)
                .await);
        }

        emit(progress, "detecting", 10, "Detected website").await;
        website::process(
            self.pages.as_ref(),
            &self.engine,
            &url,
            location,
            notes,
            progress,
        )
        .await
    }

    /// Attach confidence to text-derived results and report model failures.
    fn finish(&self, mut result: ExtractionResult, source: &str) -> ExtractionResult {
        if !result.success {
            if let Some(code @ (ErrorCode::LlmExtractionFailed | ErrorCode::VisionExtractionFailed)) =
                result.error_code
            {
                self.reporter.capture_warning(
                    "Recipe extraction failed on every provider",
                    &[("source", source), ("code", code.as_str())],
                );
            }
            warn!(
                "Extraction failed for {}: {}",
                source,
                result.error.as_deref().unwrap_or("unknown error")
            );
            return result;
        }

        let scored = matches!(
            result.extraction_method,
            ExtractionMethod::Whisper
                | ExtractionMethod::Basic
                | ExtractionMethod::OEmbed
                | ExtractionMethod::WebsiteAi
        );
        if let (true, Some(recipe)) = (scored, result.recipe.as_ref()) {
            let confidence = evaluate(
                recipe,
                result.raw_text.as_deref().unwrap_or_default(),
                result.extraction_quality,
                result.has_audio_transcript,
            );
            if confidence.low {
                warn!(
                    "Low confidence for {}: {}",
                    source,
                    confidence.warning.as_deref().unwrap_or_default()
                );
            }
            result.low_confidence = confidence.low;
            result.confidence_warning = confidence.warning;
        }
        result
    }

    fn location<'a>(&'a self, location: &'a str) -> &'a str {
        if location.trim().is_empty() {
            &self.default_location
        } else {
            location.trim()
        }
    }
}
