#![allow(dead_code)]

use async_trait::async_trait;
use recipe_extract::error::{ErrorCode, ExtractError};
use recipe_extract::media::{AudioExtractionResult, AudioFile, MediaFailure, MediaTool, MetadataFetcher};
use recipe_extract::model::VideoMetadata;
use recipe_extract::platform::{Platform, RedirectResolver};
use recipe_extract::providers::{CompletionRequest, ProviderError};
use recipe_extract::transcribe::{TranscribeError, Transcriber};
use recipe_extract::{
    ErrorReporter, ExtractionProgress, ExtractorConfig, LlmProvider, PageFetcher, ProgressSink,
    ProviderChain, ProviderTier, RecipeExtractorBuilder,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const KATSU_JSON: &str = r#"{
    "title": "Chicken Katsu",
    "servings": 4,
    "components": [{
        "name": "Chicken Katsu",
        "ingredients": [
            {"quantity": "2", "unit": "", "name": "chicken breasts", "estimatedCost": 6.5},
            {"quantity": "1", "unit": "cup", "name": "panko", "estimatedCost": 1.25},
            {"quantity": "2", "unit": "", "name": "eggs", "estimatedCost": 0.75}
        ],
        "steps": ["Pound the chicken thin.", "Dredge in egg and panko.", "Fry until golden."]
    }],
    "tags": ["japanese", "fried"]
}"#;

/// Replies in order, then fails with an empty response.
pub struct ScriptedProvider {
    name: &'static str,
    replies: Mutex<VecDeque<Result<String, u16>>>,
    pub calls: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    pub fn new(name: &'static str, replies: Vec<Result<&str, u16>>) -> Self {
        Self {
            name,
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|reply| reply.map(str::to_string))
                    .collect(),
            ),
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn answering(name: &'static str, json: &str) -> Self {
        Self::new(name, vec![Ok(json)])
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(status)) => Err(ProviderError::Status {
                status,
                body: "scripted failure".to_string(),
            }),
            None => Err(ProviderError::EmptyResponse),
        }
    }
}

/// Chain with no retry delay.
pub fn chain(tiers: Vec<(ScriptedProvider, u32)>) -> ProviderChain {
    let tiers = tiers
        .into_iter()
        .map(|(provider, max_retries)| ProviderTier {
            provider: Box::new(provider),
            max_retries,
        })
        .collect();
    ProviderChain::new(tiers, Duration::ZERO).unwrap()
}

pub struct FakeMetadata(pub VideoMetadata);

#[async_trait]
impl MetadataFetcher for FakeMetadata {
    async fn fetch_oembed(&self, _url: &str, _platform: Platform) -> VideoMetadata {
        self.0.clone()
    }
}

pub enum AudioOutcome {
    Downloaded,
    Failed(ErrorCode),
}

pub struct FakeMedia {
    pub audio: AudioOutcome,
    pub dump: Option<Value>,
    pub downloads: Arc<AtomicUsize>,
    pub dumps: Arc<AtomicUsize>,
}

impl FakeMedia {
    pub fn new(audio: AudioOutcome, dump: Option<Value>) -> Self {
        Self {
            audio,
            dump,
            downloads: Arc::new(AtomicUsize::new(0)),
            dumps: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl MediaTool for FakeMedia {
    async fn download_audio(&self, _url: &str, _platform: Platform) -> AudioExtractionResult {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        match &self.audio {
            AudioOutcome::Downloaded => {
                let dir = tempfile::tempdir().unwrap();
                let path = dir.path().join("audio.mp3");
                std::fs::write(&path, b"ID3").unwrap();
                AudioExtractionResult::Downloaded {
                    audio: AudioFile::new(path, dir),
                    duration: Some(42.0),
                }
            }
            AudioOutcome::Failed(code) => AudioExtractionResult::Failed(MediaFailure::new(
                *code,
                format!("ERROR: scripted {}", code.as_str()),
                code.default_message(),
            )),
        }
    }

    async fn dump_metadata(&self, _url: &str, _platform: Platform) -> Result<Value, ExtractError> {
        self.dumps.fetch_add(1, Ordering::SeqCst);
        self.dump
            .clone()
            .ok_or_else(|| ExtractError::Parse("no metadata".to_string()))
    }
}

pub struct FakeTranscriber {
    pub text: Option<String>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeTranscriber {
    pub fn new(text: Option<&str>) -> Self {
        Self {
            text: text.map(str::to_string),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String, TranscribeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(audio.exists(), "audio file must exist while transcribing");
        self.text.clone().ok_or(TranscribeError::Empty)
    }
}

/// Serves canned pages and image bytes keyed by URL.
#[derive(Default)]
pub struct FakePages {
    pub html: HashMap<String, String>,
    pub bytes: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl PageFetcher for FakePages {
    async fn fetch_html(&self, url: &str, _user_agent: Option<&str>) -> Result<String, ExtractError> {
        self.html.get(url).cloned().ok_or_else(|| ExtractError::Status {
            status: 404,
            url: url.to_string(),
        })
    }

    async fn fetch_bytes(&self, url: &str, _referer: Option<&str>) -> Result<Vec<u8>, ExtractError> {
        self.bytes.get(url).cloned().ok_or_else(|| ExtractError::Status {
            status: 404,
            url: url.to_string(),
        })
    }
}

pub struct NoRedirects;

#[async_trait]
impl RedirectResolver for NoRedirects {
    async fn resolve(&self, url: &str) -> Result<String, ExtractError> {
        Ok(url.to_string())
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    pub warnings: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl ErrorReporter for RecordingReporter {
    fn capture_warning(&self, message: &str, _context: &[(&str, &str)]) {
        self.warnings.lock().unwrap().push(message.to_string());
    }

    fn capture_error(&self, message: &str, _context: &[(&str, &str)]) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<ExtractionProgress>>,
}

impl RecordingSink {
    pub fn steps(&self) -> Vec<(String, u8)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|event| (event.step.clone(), event.progress))
            .collect()
    }
}

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn report(&self, event: ExtractionProgress) {
        self.events.lock().unwrap().push(event);
    }
}

/// Builder with defaults that never touch the network or a subprocess.
pub fn offline_builder(chain: ProviderChain) -> RecipeExtractorBuilder {
    recipe_extract::RecipeExtractor::builder()
        .config(ExtractorConfig::default())
        .provider_chain(chain)
        .redirect_resolver(Arc::new(NoRedirects))
        .metadata_fetcher(Arc::new(FakeMetadata(VideoMetadata::default())))
        .media_tool(Arc::new(FakeMedia::new(
            AudioOutcome::Failed(ErrorCode::ExtractionFailed),
            None,
        )))
        .transcriber(Arc::new(FakeTranscriber::new(None)))
}

pub fn recipe_page(head: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Recipe Page</title>
    {head}
</head>
<body>
    {body}
</body>
</html>"#
    )
}

pub fn json_ld_script(json: &str) -> String {
    format!(r#"<script type="application/ld+json">{json}</script>"#)
}
