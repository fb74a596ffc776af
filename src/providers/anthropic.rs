use crate::config::ProviderConfig;
use crate::providers::{truncate_body, CompletionRequest, ContentPart, LlmProvider, ProviderError};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

pub struct AnthropicProvider {
    client: Client,
    name: String,
    api_key: String,
    base_url: String,
    model: String,
    vision_model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider from configuration
    pub fn new(name: &str, config: &ProviderConfig) -> Result<Self, ProviderError> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .filter(|key| !key.is_empty())
            .ok_or(ProviderError::MissingApiKey("ANTHROPIC_API_KEY"))?;

        Ok(AnthropicProvider {
            client: Client::new(),
            name: name.to_string(),
            api_key,
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(ANTHROPIC_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: config.model.clone(),
            vision_model: config
                .vision_model
                .clone()
                .unwrap_or_else(|| config.model.clone()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout(),
        })
    }

    fn payload(&self, request: &CompletionRequest) -> Value {
        let content: Vec<Value> = request
            .parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => json!({"type": "text", "text": text}),
                ContentPart::Image { mime, data } => json!({
                    "type": "image",
                    "source": {"type": "base64", "media_type": mime, "data": data}
                }),
            })
            .collect();

        json!({
            "model": if request.has_images() { &self.vision_model } else { &self.model },
            "max_tokens": request.max_tokens.unwrap_or(self.max_tokens),
            "temperature": self.temperature,
            "system": request.system,
            "messages": [{"role": "user", "content": content}]
        })
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .timeout(self.timeout + request.extra_timeout)
            .json(&self.payload(request))
            .send()
            .await?;

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

        match response_body["content"][0]["text"].as_str() {
            Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            _ => Err(ProviderError::EmptyResponse),
        }
    }
}
