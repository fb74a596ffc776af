use crate::config::TranscriptionConfig;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("No transcription API key configured")]
    MissingApiKey,

    #[error("Failed to read audio file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transcription request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transcription API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Transcription returned no text")]
    Empty,
}

/// Speech-to-text over a local audio file.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<String, TranscribeError>;
}

/// OpenAI-compatible `/v1/audio/transcriptions` client. One attempt per call.
pub struct WhisperClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    language: String,
}

impl WhisperClient {
    pub fn new(config: &TranscriptionConfig) -> Result<Self, TranscribeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            language: config.language.clone(),
        })
    }

    async fn build_form(&self, audio: &Path) -> Result<Form, TranscribeError> {
        let bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();
        let mime_type = match audio.extension().and_then(|e| e.to_str()) {
            Some("mp3") => "audio/mpeg",
            Some("m4a") => "audio/mp4",
            Some("wav") => "audio/wav",
            Some("webm") => "audio/webm",
            Some("ogg") | Some("opus") => "audio/ogg",
            _ => "application/octet-stream",
        };

        let part = Part::bytes(bytes).file_name(file_name).mime_str(mime_type)?;
        Ok(Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("language", self.language.clone())
            .text("response_format", "text")
            .text("temperature", "0"))
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio: &Path) -> Result<String, TranscribeError> {
        let api_key = self.api_key.as_deref().ok_or(TranscribeError::MissingApiKey)?;
        let form = self.build_form(audio).await?;

        info!("Transcribing {}", audio.display());
        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Transcription response status: {}", status);
        if !status.is_success() {
            return Err(TranscribeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = body.trim();
        if text.is_empty() {
            return Err(TranscribeError::Empty);
        }
        info!("Transcription complete: {} characters", text.len());
        Ok(text.to_string())
    }
}
