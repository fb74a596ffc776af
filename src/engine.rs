use crate::model::RecipeDraft;
use crate::normalize::normalize;
use crate::providers::{
    build_multi_image_prompt, build_ocr_prompt, build_recipe_prompt, build_slideshow_prompt,
    build_website_prompt, CompletionRequest, ContentPart, ProviderChain, ProviderError,
    CONTENT_PLACEHOLDER, SYSTEM_PROMPT,
};
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Extra per-image allowance on top of the provider timeout.
const PER_IMAGE_TIMEOUT: Duration = Duration::from_secs(15);
const MULTI_IMAGE_MAX_TOKENS: u32 = 5000;

lazy_static! {
    static ref EMOJI: Regex = Regex::new(
        r"[\x{1F600}-\x{1F64F}]|[\x{1F300}-\x{1F5FF}]|[\x{1F680}-\x{1F6FF}]|[\x{1F1E0}-\x{1F1FF}]|[\x{2600}-\x{26FF}]|[\x{2700}-\x{27BF}]"
    )
    .unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// What the engine reads: assembled text, or base64-encoded images in order.
#[derive(Debug, Clone)]
pub enum EngineInput {
    Text(String),
    Images(Vec<String>),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Nothing to extract from")]
    NoContent,

    #[error("All providers failed: {0}")]
    AllProvidersFailed(String),
}

impl From<ProviderError> for EngineError {
    fn from(err: ProviderError) -> Self {
        EngineError::AllProvidersFailed(err.to_string())
    }
}

/// Raw model JSON and the provider that produced it.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub value: Value,
    pub provider: String,
}

impl EngineOutput {
    /// Coerce the model output into the canonical recipe shape.
    pub fn into_recipe(self, source_url: &str, location: &str) -> RecipeDraft {
        normalize(RecipeDraft::from_value(&self.value), source_url, location)
    }
}

/// Sends text or images through the provider chain and returns parsed JSON.
pub struct ExtractionEngine {
    chain: ProviderChain,
}

impl ExtractionEngine {
    pub fn new(chain: ProviderChain) -> Self {
        Self { chain }
    }

    /// Run one extraction.
    ///
    /// For text input, `instructions` may contain `{content}`; the sanitized
    /// text is spliced in there, or appended when the placeholder is absent.
    /// Images are sent in order, page-labelled when there is more than one,
    /// followed by `instructions`.
    pub async fn extract(
        &self,
        input: EngineInput,
        instructions: &str,
    ) -> Result<EngineOutput, EngineError> {
        let request = build_request(input, instructions)?;
        let output = self.chain.complete_json(&request).await.map_err(|e| {
            // Provider detail is for logs only
            warn!("Extraction failed on every provider: {}", e);
            EngineError::from(e)
        })?;
        info!("Extraction produced JSON via {}", output.provider);
        Ok(EngineOutput {
            value: output.value,
            provider: output.provider,
        })
    }

    /// Recipe extraction from assembled video text.
    pub async fn extract_text(
        &self,
        source_url: &str,
        content: &str,
        location: &str,
    ) -> Result<EngineOutput, EngineError> {
        debug!("Extracting recipe from {} chars of text", content.len());
        self.extract(
            EngineInput::Text(content.to_string()),
            &build_recipe_prompt(source_url, location),
        )
        .await
    }

    pub async fn extract_website(
        &self,
        source_url: &str,
        content: &str,
        location: &str,
    ) -> Result<EngineOutput, EngineError> {
        self.extract(
            EngineInput::Text(content.to_string()),
            &build_website_prompt(source_url, location),
        )
        .await
    }

    /// OCR of one photographed or scanned recipe.
    pub async fn extract_image(
        &self,
        image: String,
        location: &str,
    ) -> Result<EngineOutput, EngineError> {
        self.extract(EngineInput::Images(vec![image]), &build_ocr_prompt(location))
            .await
    }

    /// OCR of a multi-page recipe; one image behaves like [`Self::extract_image`].
    pub async fn extract_images(
        &self,
        images: Vec<String>,
        location: &str,
    ) -> Result<EngineOutput, EngineError> {
        let instructions = match images.len() {
            1 => build_ocr_prompt(location),
            count => build_multi_image_prompt(count, location),
        };
        self.extract(EngineInput::Images(images), &instructions).await
    }

    pub async fn extract_slideshow(
        &self,
        source_url: &str,
        images: Vec<String>,
        caption: &str,
        location: &str,
    ) -> Result<EngineOutput, EngineError> {
        self.extract(
            EngineInput::Images(images),
            &build_slideshow_prompt(source_url, caption, location),
        )
        .await
    }
}

fn build_request(input: EngineInput, instructions: &str) -> Result<CompletionRequest, EngineError> {
    match input {
        EngineInput::Text(text) => {
            let content = sanitize_text(&text);
            if content.is_empty() {
                return Err(EngineError::NoContent);
            }
            let prompt = if instructions.contains(CONTENT_PLACEHOLDER) {
                instructions.replace(CONTENT_PLACEHOLDER, &content)
            } else {
                format!("{}\n\n{}", instructions, content)
            };
            Ok(CompletionRequest::text(SYSTEM_PROMPT, prompt))
        }
        EngineInput::Images(images) => {
            if images.is_empty() {
                return Err(EngineError::NoContent);
            }
            let count = images.len();
            let mut parts = Vec::with_capacity(count * 2 + 1);
            for (i, data) in images.into_iter().enumerate() {
                if count > 1 {
                    parts.push(ContentPart::Text(format!("[PAGE {} OF {}]", i + 1, count)));
                }
                parts.push(ContentPart::Image {
                    mime: detect_mime(&data).to_string(),
                    data,
                });
            }
            parts.push(ContentPart::Text(instructions.to_string()));

            Ok(CompletionRequest {
                system: SYSTEM_PROMPT.to_string(),
                parts,
                json_mode: false,
                max_tokens: (count > 1).then_some(MULTI_IMAGE_MAX_TOKENS),
                extra_timeout: PER_IMAGE_TIMEOUT * count as u32,
            })
        }
    }
}

/// Strip characters that upset model APIs: emoji, smart punctuation and
/// runs of whitespace.
pub fn sanitize_text(text: &str) -> String {
    let text = EMOJI.replace_all(text, " ");
    let text = text
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace('\u{2026}', "...")
        .replace(['\u{2014}', '\u{2013}'], "-");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// MIME type of base64 image data, from its leading bytes.
pub fn detect_mime(base64_data: &str) -> &'static str {
    if base64_data.starts_with("iVBOR") {
        "image/png"
    } else if base64_data.starts_with("R0lG") {
        "image/gif"
    } else if base64_data.starts_with("UklG") {
        "image/webp"
    } else {
        // Also covers "/9j/"
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{LlmProvider, ProviderTier};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct RecordingProvider {
        reply: &'static str,
        seen: Arc<Mutex<Vec<CompletionRequest>>>,
    }

    #[async_trait]
    impl LlmProvider for RecordingProvider {
        fn provider_name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.reply.to_string())
        }
    }

    fn engine(reply: &'static str) -> (ExtractionEngine, Arc<Mutex<Vec<CompletionRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let provider = RecordingProvider {
            reply,
            seen: seen.clone(),
        };
        let chain = ProviderChain::new(
            vec![ProviderTier {
                provider: Box::new(provider),
                max_retries: 0,
            }],
            Duration::ZERO,
        )
        .unwrap();
        (ExtractionEngine::new(chain), seen)
    }

    #[test]
    fn test_sanitize_text() {
        let cleaned = sanitize_text("Best \u{1F60D} cookies\u{2026}  \u{201C}ever\u{201D} \u{2014} it\u{2019}s\n\ntrue \u{2615}");
        assert_eq!(cleaned, "Best cookies... \"ever\" - it's true");
    }

    #[test]
    fn test_detect_mime() {
        assert_eq!(detect_mime("/9j/4AAQSkZJRg"), "image/jpeg");
        assert_eq!(detect_mime("iVBORw0KGgo"), "image/png");
        assert_eq!(detect_mime("R0lGODlh"), "image/gif");
        assert_eq!(detect_mime("UklGRiQAAABXRUJQ"), "image/webp");
        assert_eq!(detect_mime("AAAA"), "image/jpeg");
    }

    #[tokio::test]
    async fn test_text_is_spliced_into_instructions() {
        let (engine, seen) = engine(r#"{"title":"Noodles"}"#);
        let output = engine
            .extract(
                EngineInput::Text("VIDEO TITLE: Noodles \u{1F35C}".to_string()),
                "Read this: {content} and reply",
            )
            .await
            .unwrap();

        assert_eq!(output.value["title"], "Noodles");
        assert_eq!(output.provider, "recording");
        let requests = seen.lock().unwrap();
        assert_eq!(
            requests[0].joined_text(),
            "Read this: VIDEO TITLE: Noodles and reply"
        );
        assert!(requests[0].json_mode);
    }

    #[tokio::test]
    async fn test_multiple_images_are_page_labelled() {
        let (engine, seen) = engine("{}");
        engine
            .extract_images(
                vec!["/9j/aaa".to_string(), "iVBORbbb".to_string()],
                "Guam",
            )
            .await
            .unwrap();

        let requests = seen.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.parts.len(), 5);
        assert_eq!(request.parts[0], ContentPart::Text("[PAGE 1 OF 2]".to_string()));
        assert_eq!(
            request.parts[3],
            ContentPart::Image {
                mime: "image/png".to_string(),
                data: "iVBORbbb".to_string()
            }
        );
        assert!(matches!(&request.parts[4], ContentPart::Text(t) if t.contains("The 2 images above")));
        assert_eq!(request.max_tokens, Some(5000));
        assert_eq!(request.extra_timeout, Duration::from_secs(30));
        assert!(!request.json_mode);
    }

    #[tokio::test]
    async fn test_single_image_has_no_page_label() {
        let (engine, seen) = engine("{}");
        engine
            .extract_image("/9j/aaa".to_string(), "Guam")
            .await
            .unwrap();

        let requests = seen.lock().unwrap();
        assert_eq!(requests[0].parts.len(), 2);
        assert!(matches!(requests[0].parts[0], ContentPart::Image { .. }));
        assert_eq!(requests[0].max_tokens, None);
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let (engine, seen) = engine("{}");
        let text = engine.extract(EngineInput::Text(" \u{1F600} ".to_string()), "x").await;
        let images = engine.extract(EngineInput::Images(Vec::new()), "x").await;

        assert!(matches!(text, Err(EngineError::NoContent)));
        assert!(matches!(images, Err(EngineError::NoContent)));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_reply_fails() {
        let (engine, _) = engine("Sorry, I can't help with that.");
        let result = engine.extract_text("u", "some text", "Guam").await;
        assert!(matches!(result, Err(EngineError::AllProvidersFailed(_))));
    }
}
