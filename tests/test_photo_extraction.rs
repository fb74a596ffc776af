mod common;

use common::{
    chain, offline_builder, AudioOutcome, FakeMedia, FakeMetadata, FakePages, RecordingSink,
    ScriptedProvider, KATSU_JSON,
};
use recipe_extract::providers::ContentPart;
use recipe_extract::{ErrorCode, ExtractionMethod, ExtractionQuality, VideoMetadata};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

const PHOTO_URL: &str = "https://www.tiktok.com/@chef/photo/7300000000000000003?is_from_webapp=1";
const JPEG: [u8; 4] = [0xff, 0xd8, 0xff, 0xe0];

fn carousel_dump() -> serde_json::Value {
    json!({
        "description": "Katsu in three photos",
        "images": [
            {"url": "https://cdn.example.com/1.jpg"},
            {"urlList": ["https://cdn.example.com/2.jpg"]},
            {"url": "https://cdn.example.com/3.jpg"}
        ]
    })
}

fn pages_with(urls: &[&str]) -> FakePages {
    let mut pages = FakePages::default();
    for url in urls {
        pages.bytes.insert(url.to_string(), JPEG.to_vec());
    }
    pages
}

#[tokio::test]
async fn test_slideshow_reads_downloaded_photos() {
    let provider = ScriptedProvider::answering("openrouter", KATSU_JSON);
    let requests = provider.requests.clone();

    // Photo 3 is missing and gets skipped
    let extractor = offline_builder(chain(vec![(provider, 0)]))
        .metadata_fetcher(Arc::new(FakeMetadata(VideoMetadata {
            title: Some("Katsu carousel".to_string()),
            thumbnail: Some("https://cdn.example.com/cover.jpg".to_string()),
            ..Default::default()
        })))
        .media_tool(Arc::new(FakeMedia::new(
            AudioOutcome::Failed(ErrorCode::NoAudio),
            Some(carousel_dump()),
        )))
        .page_fetcher(Arc::new(pages_with(&[
            "https://cdn.example.com/1.jpg",
            "https://cdn.example.com/2.jpg",
        ])))
        .build()
        .unwrap();

    let sink = RecordingSink::default();
    let result = extractor
        .extract(PHOTO_URL, "", "no deep fryer", Some(&sink), false)
        .await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.extraction_method, ExtractionMethod::TiktokPhotoVision);
    assert_eq!(result.extraction_quality, ExtractionQuality::High);
    assert!(!result.low_confidence);
    assert_eq!(
        result.thumbnail_url.as_deref(),
        Some("https://cdn.example.com/cover.jpg")
    );
    let raw = result.raw_text.unwrap();
    assert!(raw.starts_with("Katsu in three photos"));
    assert!(raw.contains("no deep fryer"));

    let recipe = result.recipe.unwrap();
    assert_eq!(
        recipe.source_url,
        "https://www.tiktok.com/@chef/photo/7300000000000000003"
    );

    let request = requests.lock().unwrap()[0].clone();
    let images = request
        .parts
        .iter()
        .filter(|part| matches!(part, ContentPart::Image { .. }))
        .count();
    assert_eq!(images, 2);
    assert!(request.joined_text().contains("[PAGE 1 OF 2]"));

    let steps: Vec<String> = sink.steps().into_iter().map(|(step, _)| step).collect();
    assert_eq!(steps, vec!["detecting", "metadata", "downloading", "extracting"]);
}

#[tokio::test]
async fn test_slideshow_without_images() {
    let extractor = offline_builder(chain(vec![(ScriptedProvider::new("openrouter", vec![]), 0)]))
        .page_fetcher(Arc::new(FakePages::default()))
        .build()
        .unwrap();

    let result = extractor.extract(PHOTO_URL, "", "", None, false).await;

    assert!(!result.success);
    assert_eq!(result.error_code, Some(ErrorCode::NoImagesFound));
}

#[tokio::test]
async fn test_slideshow_downloads_all_failing() {
    let extractor = offline_builder(chain(vec![(ScriptedProvider::new("openrouter", vec![]), 0)]))
        .media_tool(Arc::new(FakeMedia::new(
            AudioOutcome::Failed(ErrorCode::NoAudio),
            Some(carousel_dump()),
        )))
        .page_fetcher(Arc::new(FakePages::default()))
        .build()
        .unwrap();

    let result = extractor.extract(PHOTO_URL, "", "", None, false).await;
    assert_eq!(result.error_code, Some(ErrorCode::ImageDownloadFailed));
}

#[tokio::test]
async fn test_slideshow_photos_without_recipe() {
    let extractor = offline_builder(chain(vec![(
        ScriptedProvider::answering("openrouter", r#"{"title": "Beach day", "ingredients": [], "steps": []}"#),
        0,
    )]))
    .media_tool(Arc::new(FakeMedia::new(
        AudioOutcome::Failed(ErrorCode::NoAudio),
        Some(carousel_dump()),
    )))
    .page_fetcher(Arc::new(pages_with(&["https://cdn.example.com/1.jpg"])))
    .build()
    .unwrap();

    let result = extractor.extract(PHOTO_URL, "", "", None, false).await;
    assert_eq!(result.error_code, Some(ErrorCode::TiktokPhotoError));
}

#[tokio::test]
async fn test_multi_page_images_are_read_in_order() {
    let provider = ScriptedProvider::answering("openrouter", &format!("```json\n{}\n```", KATSU_JSON));
    let requests = provider.requests.clone();
    let extractor = offline_builder(chain(vec![(provider, 0)])).build().unwrap();

    let pages = vec!["/9j/4AAQpage1".to_string(), "iVBORw0KGgopage2".to_string()];
    let result = extractor.extract_from_images(&pages, "Seattle").await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.extraction_method, ExtractionMethod::Ocr);
    assert_eq!(result.extraction_quality, ExtractionQuality::High);
    assert_eq!(result.recipe.unwrap().cost_location, "Seattle");

    let request = requests.lock().unwrap()[0].clone();
    let mimes: Vec<&str> = request
        .parts
        .iter()
        .filter_map(|part| match part {
            ContentPart::Image { mime, .. } => Some(mime.as_str()),
            ContentPart::Text(_) => None,
        })
        .collect();
    assert_eq!(mimes, vec!["image/jpeg", "image/png"]);
}

#[tokio::test]
async fn test_single_image_and_empty_input() {
    let provider = ScriptedProvider::answering("openrouter", KATSU_JSON);
    let calls = provider.calls.clone();
    let extractor = offline_builder(chain(vec![(provider, 0)])).build().unwrap();

    let empty = extractor.extract_from_images(&[" ".to_string()], "").await;
    assert!(!empty.success);
    assert_eq!(empty.error_code, Some(ErrorCode::NoContent));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let single = extractor.extract_from_image("/9j/4AAQcard", "").await;
    assert!(single.success);
    assert_eq!(single.recipe.unwrap().cost_location, "Guam");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_image_read_keeps_provider_detail_out_of_result() {
    let extractor = offline_builder(chain(vec![(
        ScriptedProvider::new("openrouter", vec![Err(503)]),
        0,
    )]))
    .build()
    .unwrap();

    let result = extractor.extract_from_image("/9j/4AAQcard", "").await;

    assert!(!result.success);
    assert_eq!(result.error_code, Some(ErrorCode::LlmExtractionFailed));
    assert_eq!(result.error.as_deref(), Some("Image extraction failed"));
}
