pub mod errors;
pub mod oembed;
pub mod ytdlp;

pub use errors::{classify, classify_stderr, MediaFailure, ToolFailure};
pub use oembed::{MetadataFetcher, OEmbedFetcher};
pub use ytdlp::YtDlp;

use crate::error::ExtractError;
use crate::model::VideoMetadata;
use crate::platform::Platform;
use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A downloaded audio track. The owning temporary directory is removed when
/// this is released or dropped.
#[derive(Debug)]
pub struct AudioFile {
    path: PathBuf,
    _dir: TempDir,
}

impl AudioFile {
    pub fn new(path: PathBuf, dir: TempDir) -> Self {
        Self { path, _dir: dir }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file and its directory now.
    pub fn release(self) {
        debug!("Releasing audio file {}", self.path.display());
    }
}

#[derive(Debug)]
pub enum AudioExtractionResult {
    Downloaded {
        audio: AudioFile,
        /// Seconds, when the probe succeeded
        duration: Option<f64>,
    },
    Failed(MediaFailure),
}

impl AudioExtractionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AudioExtractionResult::Downloaded { .. })
    }
}

/// External media download tool.
#[async_trait]
pub trait MediaTool: Send + Sync {
    async fn download_audio(&self, url: &str, platform: Platform) -> AudioExtractionResult;

    /// The tool's full JSON description of a URL, without downloading media.
    async fn dump_metadata(&self, url: &str, platform: Platform) -> Result<Value, ExtractError>;

    /// Title, description and thumbnail from the metadata dump. Failures
    /// yield empty metadata.
    async fn fetch_rich_metadata(&self, url: &str, platform: Platform) -> VideoMetadata {
        match self.dump_metadata(url, platform).await {
            Ok(value) => metadata_from_dump(&value),
            Err(e) => {
                warn!("Rich metadata extraction failed for {}: {}", url, e);
                VideoMetadata::default()
            }
        }
    }
}

pub fn metadata_from_dump(value: &Value) -> VideoMetadata {
    let text = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    VideoMetadata {
        title: text("title"),
        description: text("description"),
        thumbnail: text("thumbnail"),
        duration: value.get("duration").and_then(Value::as_f64),
        uploader: text("uploader"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_from_dump() {
        let dump = json!({
            "title": "Crispy Tofu",
            "description": "Ingredients: 1 block tofu, 2 tbsp cornstarch",
            "thumbnail": "https://i.ytimg.com/vi/x/hq.jpg",
            "duration": 58.4,
            "uploader": "",
        });
        let meta = metadata_from_dump(&dump);
        assert_eq!(meta.title.as_deref(), Some("Crispy Tofu"));
        assert_eq!(meta.duration, Some(58.4));
        assert_eq!(meta.uploader, None);
    }

    #[test]
    fn test_audio_file_release_removes_directory() {
        let dir = tempfile::Builder::new()
            .prefix("recipe-audio-")
            .tempdir()
            .unwrap();
        let dir_path = dir.path().to_path_buf();
        let path = dir_path.join("audio.mp3");
        std::fs::write(&path, b"ID3").unwrap();

        let audio = AudioFile::new(path.clone(), dir);
        assert!(audio.path().exists());
        audio.release();
        assert!(!path.exists());
        assert!(!dir_path.exists());
    }
}
