use crate::config::ProviderConfig;
use crate::providers::{truncate_body, CompletionRequest, ContentPart, LlmProvider, ProviderError};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// OpenAI-compatible chat completions. Also serves OpenRouter, which speaks
/// the same protocol but wants attribution headers and has no JSON mode.
pub struct OpenAIProvider {
    client: Client,
    name: String,
    api_key: String,
    base_url: String,
    model: String,
    vision_model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
    openrouter: bool,
}

impl OpenAIProvider {
    /// Create a new provider from configuration
    pub fn new(name: &str, config: &ProviderConfig) -> Result<Self, ProviderError> {
        let openrouter = config.kind == "openrouter";
        let (env_var, default_base) = if openrouter {
            ("OPENROUTER_API_KEY", OPENROUTER_BASE_URL)
        } else {
            ("OPENAI_API_KEY", OPENAI_BASE_URL)
        };

        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(env_var).ok())
            .filter(|key| !key.is_empty())
            .ok_or(ProviderError::MissingApiKey(env_var))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base.to_string());

        Ok(OpenAIProvider {
            client: Client::new(),
            name: name.to_string(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            vision_model: config
                .vision_model
                .clone()
                .unwrap_or_else(|| config.model.clone()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout(),
            openrouter,
        })
    }

    fn message_content(request: &CompletionRequest) -> Value {
        if !request.has_images() {
            return Value::String(request.joined_text());
        }
        let parts: Vec<Value> = request
            .parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => json!({"type": "text", "text": text}),
                ContentPart::Image { mime, data } => json!({
                    "type": "image_url",
                    "image_url": {"url": format!("data:{};base64,{}", mime, data)}
                }),
            })
            .collect();
        Value::Array(parts)
    }

    fn payload(&self, request: &CompletionRequest) -> Value {
        let vision = request.has_images();
        let mut payload = json!({
            "model": if vision { &self.vision_model } else { &self.model },
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": Self::message_content(request)}
            ],
            "temperature": self.temperature,
            "max_tokens": request.max_tokens.unwrap_or(self.max_tokens)
        });
        // OpenAI supports response_format for guaranteed JSON
        if request.json_mode && !vision && !self.openrouter {
            payload["response_format"] = json!({"type": "json_object"});
        }
        payload
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(self.timeout + request.extra_timeout)
            .json(&self.payload(request));

        if self.openrouter {
            builder = builder
                .header("HTTP-Referer", "https://recipe-extractor.app")
                .header("X-Title", "Recipe Extractor");
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let response_body: Value = response.json().await?;
        debug!("{:?}", response_body);
        let content = response_body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .trim();
        if content.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SYSTEM_PROMPT;
    use mockito::{Matcher, Server};

    fn config(kind: &str, base_url: String) -> ProviderConfig {
        ProviderConfig {
            enabled: true,
            kind: kind.to_string(),
            model: "gpt-4o-mini".to_string(),
            vision_model: Some("gpt-4o".to_string()),
            temperature: 0.1,
            max_tokens: 4000,
            api_key: Some("fake_api_key".to_string()),
            base_url: Some(base_url),
            timeout: 5,
            max_retries: 1,
        }
    }

    #[tokio::test]
    async fn test_complete_text_uses_json_mode() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer fake_api_key")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "response_format": {"type": "json_object"}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": [{"message": {"content": "{\"title\": \"Pasta\"}"}}]}"#)
            .create_async()
            .await;

        let provider =
            OpenAIProvider::new("openai", &config("openai", format!("{}/v1", server.url())))
                .unwrap();
        let request = CompletionRequest::text(SYSTEM_PROMPT, "Extract".to_string());
        let result = provider.complete(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, "{\"title\": \"Pasta\"}");
    }

    #[tokio::test]
    async fn test_openrouter_headers_and_vision_model() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/chat/completions")
            .match_header("x-title", "Recipe Extractor")
            .match_header("http-referer", "https://recipe-extractor.app")
            .match_body(Matcher::PartialJson(json!({"model": "gpt-4o"})))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"content": "{}"}}]}"#)
            .create_async()
            .await;

        let provider = OpenAIProvider::new(
            "openrouter",
            &config("openrouter", format!("{}/api/v1", server.url())),
        )
        .unwrap();
        let request = CompletionRequest {
            parts: vec![
                ContentPart::Image {
                    mime: "image/jpeg".to_string(),
                    data: "/9j/4AAQ".to_string(),
                },
                ContentPart::Text("Read the card".to_string()),
            ],
            ..CompletionRequest::text(SYSTEM_PROMPT, String::new())
        };
        provider.complete(&request).await.unwrap();
        mock.assert_async().await;

        let payload = provider.payload(&request);
        assert!(payload.get("response_format").is_none());
        assert_eq!(
            payload["messages"][1]["content"][0]["image_url"]["url"],
            "data:image/jpeg;base64,/9j/4AAQ"
        );
    }

    #[tokio::test]
    async fn test_complete_api_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body(r#"{"error": "rate limited"}"#)
            .create_async()
            .await;

        let provider =
            OpenAIProvider::new("openai", &config("openai", format!("{}/v1", server.url())))
                .unwrap();
        let result = provider
            .complete(&CompletionRequest::text(SYSTEM_PROMPT, "x".to_string()))
            .await;

        mock.assert_async().await;
        assert!(matches!(result, Err(ProviderError::Status { status: 429, .. })));
    }

    #[tokio::test]
    async fn test_empty_content_is_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"content": ""}}]}"#)
            .create_async()
            .await;

        let provider =
            OpenAIProvider::new("openai", &config("openai", format!("{}/v1", server.url())))
                .unwrap();
        let result = provider
            .complete(&CompletionRequest::text(SYSTEM_PROMPT, "x".to_string()))
            .await;
        assert!(matches!(result, Err(ProviderError::EmptyResponse)));
    }

    #[test]
    fn test_provider_name() {
        let provider =
            OpenAIProvider::new("primary", &config("openai", "http://localhost".to_string()))
                .unwrap();
        assert_eq!(provider.provider_name(), "primary");
    }
}
