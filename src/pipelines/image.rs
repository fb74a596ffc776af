use crate::engine::{EngineError, ExtractionEngine};
use crate::error::ErrorCode;
use crate::model::{ExtractionMethod, ExtractionQuality, ExtractionResult};
use log::info;

/// Photographed or scanned recipe pages, read in order.
pub async fn process(
    engine: &ExtractionEngine,
    images: Vec<String>,
    location: &str,
) -> ExtractionResult {
    let images: Vec<String> = images
        .into_iter()
        .map(|image| image.trim().to_string())
        .filter(|image| !image.is_empty())
        .collect();
    if images.is_empty() {
        return ExtractionResult::failed(ErrorCode::NoContent, "No image data provided");
    }

    info!("Reading recipe from {} image(s)", images.len());
    match engine.extract_images(images, location).await {
        Ok(output) => ExtractionResult::succeeded(
            output.into_recipe("", location),
            ExtractionMethod::Ocr,
            ExtractionQuality::High,
        ),
        Err(EngineError::NoContent) => {
            ExtractionResult::failed(ErrorCode::NoContent, "No image data provided")
        }
        Err(EngineError::AllProvidersFailed(_)) => ExtractionResult::failed(
            ErrorCode::LlmExtractionFailed,
            "Image extraction failed",
        ),
    }
}
