use crate::config::MediaConfig;
use crate::error::{ErrorCode, ExtractError};
use crate::media::errors::{classify, MediaFailure, ToolFailure};
use crate::media::{AudioExtractionResult, AudioFile, MediaTool};
use crate::platform::Platform;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::time::timeout;

const COOKIE_FILE_NAME: &str = "instagram_cookies.txt";

/// Runs yt-dlp (and ffprobe for durations) as child processes.
pub struct YtDlp {
    binary: String,
    probe_binary: String,
    download_timeout: Duration,
    metadata_timeout: Duration,
    instagram_cookies: Option<String>,
}

impl YtDlp {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            probe_binary: config.probe_binary.clone(),
            download_timeout: Duration::from_secs(config.download_timeout),
            metadata_timeout: Duration::from_secs(config.metadata_timeout),
            instagram_cookies: config.instagram_cookies.clone(),
        }
    }

    async fn run(
        &self,
        binary: &str,
        args: &[OsString],
        limit: Duration,
    ) -> Result<Output, ToolFailure> {
        debug!("Executing {} {:?}", binary, args);
        let child = Command::new(binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ToolFailure::NotInstalled(binary.to_string()),
                _ => ToolFailure::Io(e),
            })?;

        // Dropping the future on timeout kills the child
        match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) if output.status.success() => Ok(output),
            Ok(Ok(output)) => Err(ToolFailure::Exited {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) => Err(ToolFailure::Io(e)),
            Err(_) => Err(ToolFailure::TimedOut(limit)),
        }
    }

    /// `--cookies <file>` for Instagram when cookies are configured.
    async fn cookie_args(&self, platform: Platform, dir: &Path) -> Vec<OsString> {
        if platform != Platform::Instagram {
            return Vec::new();
        }
        match resolve_cookies(self.instagram_cookies.as_deref(), dir).await {
            Some(path) => {
                info!("Using Instagram cookies from {}", path.display());
                vec!["--cookies".into(), path.into_os_string()]
            }
            None => {
                warn!("Instagram extraction may fail without cookies");
                Vec::new()
            }
        }
    }

    async fn probe_duration(&self, path: &Path) -> Option<f64> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "quiet".into(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "csv=p=0".into(),
            path.as_os_str().to_owned(),
        ];
        match self.run(&self.probe_binary, &args, self.metadata_timeout).await {
            Ok(output) => {
                let text = String::from_utf8_lossy(&output.stdout);
                match text.trim().parse::<f64>() {
                    Ok(seconds) => Some(seconds),
                    Err(e) => {
                        warn!("Could not parse audio duration '{}': {}", text.trim(), e);
                        None
                    }
                }
            }
            Err(e) => {
                warn!("Could not get audio duration: {}", e);
                None
            }
        }
    }
}

fn temp_dir() -> std::io::Result<TempDir> {
    tempfile::Builder::new().prefix("recipe-audio-").tempdir()
}

/// Cookie value is either raw Netscape cookie-file content, written into
/// `dir`, or a path to an existing cookie file.
pub async fn resolve_cookies(raw: Option<&str>, dir: &Path) -> Option<PathBuf> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.starts_with("# Netscape") || raw.starts_with("#HttpOnly") {
        let path = dir.join(COOKIE_FILE_NAME);
        return match tokio::fs::write(&path, format!("{}\n", raw)).await {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("Failed to write Instagram cookies: {}", e);
                None
            }
        };
    }

    let path = PathBuf::from(raw);
    if tokio::fs::metadata(&path).await.is_ok() {
        Some(path)
    } else {
        warn!("Instagram cookies file not found: {}", raw);
        None
    }
}

async fn find_audio_file(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_audio = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("audio."))
            .unwrap_or(false);
        if is_audio {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

#[async_trait]
impl MediaTool for YtDlp {
    async fn download_audio(&self, url: &str, platform: Platform) -> AudioExtractionResult {
        info!("Downloading audio from {}", url);
        let dir = match temp_dir() {
            Ok(dir) => dir,
            Err(e) => return AudioExtractionResult::Failed(classify(&ToolFailure::Io(e), platform)),
        };

        let template = dir.path().join("audio.%(ext)s");
        let mut args: Vec<OsString> = [
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "0",
            "--output",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(template.into_os_string());
        args.push("--no-playlist".into());
        args.push("--quiet".into());
        args.extend(self.cookie_args(platform, dir.path()).await);
        args.push(url.into());

        if let Err(failure) = self.run(&self.binary, &args, self.download_timeout).await {
            let classified = classify(&failure, platform);
            warn!(
                "Audio download failed ({}): {}",
                classified.code, classified.error
            );
            return AudioExtractionResult::Failed(classified);
        }

        let path = match find_audio_file(dir.path()).await {
            Ok(Some(path)) => path,
            Ok(None) => {
                return AudioExtractionResult::Failed(MediaFailure::new(
                    ErrorCode::NoAudio,
                    "No audio file found after download",
                    ErrorCode::NoAudio.default_message(),
                ))
            }
            Err(e) => return AudioExtractionResult::Failed(classify(&ToolFailure::Io(e), platform)),
        };

        info!("Audio downloaded: {}", path.display());
        let duration = self.probe_duration(&path).await;
        AudioExtractionResult::Downloaded {
            audio: AudioFile::new(path, dir),
            duration,
        }
    }

    async fn dump_metadata(&self, url: &str, platform: Platform) -> Result<Value, ExtractError> {
        let dir = temp_dir()?;
        let mut args: Vec<OsString> =
            vec!["--dump-json".into(), "--no-download".into(), "--quiet".into()];
        args.extend(self.cookie_args(platform, dir.path()).await);
        args.push(url.into());

        let output = self
            .run(&self.binary, &args, self.metadata_timeout)
            .await
            .map_err(|failure| ExtractError::Parse(failure.to_string()))?;
        let value = serde_json::from_slice(&output.stdout)?;
        Ok(value)
    }
}
