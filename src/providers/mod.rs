mod anthropic;
mod factory;
mod fallback;
mod open_ai;
mod prompt;
pub mod response;

pub use anthropic::AnthropicProvider;
pub use factory::ProviderFactory;
pub use fallback::{ChainOutput, ProviderChain, ProviderTier};
pub use open_ai::OpenAIProvider;
pub use prompt::{
    build_multi_image_prompt, build_ocr_prompt, build_recipe_prompt, build_slideshow_prompt,
    build_website_prompt, CONTENT_PLACEHOLDER, SYSTEM_PROMPT,
};
pub use response::parse_json_response;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// One piece of user content sent to a model.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    /// Base64 image data with its MIME type
    Image { mime: String, data: String },
}

/// A provider-agnostic chat completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub parts: Vec<ContentPart>,
    /// Ask for a JSON object response where the provider supports it
    pub json_mode: bool,
    /// Overrides the provider's configured limit
    pub max_tokens: Option<u32>,
    /// Added to the provider's configured timeout
    pub extra_timeout: Duration,
}

impl CompletionRequest {
    pub fn text(system: &str, prompt: String) -> Self {
        Self {
            system: system.to_string(),
            parts: vec![ContentPart::Text(prompt)],
            json_mode: true,
            max_tokens: None,
            extra_timeout: Duration::ZERO,
        }
    }

    pub fn has_images(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, ContentPart::Image { .. }))
    }

    /// All text parts joined, for providers that take a plain string.
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text(text) => Some(text.as_str()),
                ContentPart::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{0} not found in config or environment")]
    MissingApiKey(&'static str),

    #[error("Unknown provider kind: {0}")]
    UnknownKind(String),

    #[error("Provider '{0}' is not enabled in configuration")]
    Disabled(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Failed to parse JSON from response")]
    Unparseable,

    #[error("No providers available in fallback configuration")]
    NoProviders,

    #[error("All providers failed:\n{0}")]
    AllFailed(String),
}

/// Unified trait for all LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn provider_name(&self) -> &str;

    /// Run one completion and return the raw text content.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

/// Error bodies are only logged, so keep them short.
pub(crate) fn truncate_body(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_text_skips_images() {
        let request = CompletionRequest {
            system: SYSTEM_PROMPT.to_string(),
            parts: vec![
                ContentPart::Text("[PAGE 1 OF 1]".to_string()),
                ContentPart::Image {
                    mime: "image/png".to_string(),
                    data: "iVBORw0".to_string(),
                },
                ContentPart::Text("Extract the recipe".to_string()),
            ],
            json_mode: false,
            max_tokens: None,
            extra_timeout: Duration::ZERO,
        };
        assert!(request.has_images());
        assert_eq!(request.joined_text(), "[PAGE 1 OF 1]\n\nExtract the recipe");
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(500);
        assert_eq!(truncate_body(&long).len(), 200);
        assert_eq!(truncate_body("short"), "short");
    }
}
