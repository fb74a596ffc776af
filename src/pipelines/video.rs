use crate::content::{append_notes, assemble};
use crate::engine::{EngineError, ExtractionEngine};
use crate::error::ErrorCode;
use crate::media::{AudioExtractionResult, MediaFailure, MediaTool, MetadataFetcher};
use crate::model::{ExtractionMethod, ExtractionQuality, ExtractionResult, VideoMetadata};
use crate::platform::Platform;
use crate::progress::{emit, ProgressSink};
use crate::transcribe::Transcriber;
use log::{debug, info, warn};

/// Collaborators for the short-video path.
pub struct VideoPipeline<'a> {
    pub metadata: &'a dyn MetadataFetcher,
    pub media: &'a dyn MediaTool,
    pub transcriber: &'a dyn Transcriber,
    pub engine: &'a ExtractionEngine,
}

/// Text assembled for the engine and how it was obtained.
struct Gathered {
    content: String,
    method: ExtractionMethod,
    quality: ExtractionQuality,
    has_audio: bool,
    thumbnail: Option<String>,
    audio_failure: Option<MediaFailure>,
}

impl VideoPipeline<'_> {
    /// Metadata, then audio and transcript, then the text engine.
    ///
    /// Definitive availability errors end the run before any fallback.
    /// `fast_mode` skips the audio stage entirely.
    pub async fn process(
        &self,
        url: &str,
        platform: Platform,
        location: &str,
        notes: &str,
        progress: Option<&dyn ProgressSink>,
        fast_mode: bool,
    ) -> ExtractionResult {
        emit(progress, "metadata", 20, "Fetching video metadata...").await;
        let oembed = self.metadata.fetch_oembed(url, platform).await;

        let gathered = match self.gather(url, platform, oembed, progress, fast_mode).await {
            Ok(gathered) => gathered,
            Err(failure) => {
                warn!("{} is definitively unavailable: {}", url, failure.error);
                return ExtractionResult::failed_with_message(
                    failure.code,
                    failure.error,
                    failure.friendly,
                );
            }
        };

        if gathered.content.trim().is_empty() {
            return match gathered.audio_failure {
                Some(failure) => {
                    ExtractionResult::failed_with_message(failure.code, failure.error, failure.friendly)
                }
                None => ExtractionResult::failed(
                    ErrorCode::NoContent,
                    "No content could be extracted from the video",
                ),
            };
        }
        let content = append_notes(gathered.content, notes);

        emit(progress, "extracting", 70, "Extracting recipe with AI...").await;
        let output = match self.engine.extract_text(url, &content, location).await {
            Ok(output) => output,
            Err(EngineError::NoContent) => {
                return ExtractionResult::failed(
                    ErrorCode::NoContent,
                    "No content could be extracted from the video",
                )
                .with_raw_text(content)
            }
            Err(EngineError::AllProvidersFailed(_)) => {
                return ExtractionResult::failed(
                    ErrorCode::LlmExtractionFailed,
                    "All extraction attempts failed",
                )
                .with_raw_text(content)
            }
        };

        let mut recipe = output.into_recipe(url, location);
        recipe.media.thumbnail = gathered.thumbnail;

        let mut result = ExtractionResult::succeeded(recipe, gathered.method, gathered.quality)
            .with_raw_text(content);
        result.has_audio_transcript = gathered.has_audio;
        result
    }

    async fn gather(
        &self,
        url: &str,
        platform: Platform,
        oembed: VideoMetadata,
        progress: Option<&dyn ProgressSink>,
        fast_mode: bool,
    ) -> Result<Gathered, MediaFailure> {
        let mut audio_failure = None;

        if fast_mode {
            debug!("Fast mode: skipping audio for {}", url);
        } else {
            emit(progress, "downloading", 30, "Downloading audio...").await;
            match self.media.download_audio(url, platform).await {
                AudioExtractionResult::Downloaded { audio, duration } => {
                    debug!("Audio downloaded ({:?} seconds)", duration);
                    emit(progress, "transcribing", 50, "Transcribing audio with Whisper...").await;
                    let transcript = self.transcriber.transcribe(audio.path()).await;
                    audio.release();

                    match transcript {
                        Ok(text) => {
                            info!("Transcribed {} chars of audio", text.len());
                            return Ok(Gathered {
                                content: assemble(&oembed, Some(&text)),
                                method: ExtractionMethod::Whisper,
                                quality: ExtractionQuality::High,
                                has_audio: true,
                                thumbnail: oembed.thumbnail,
                                audio_failure: None,
                            });
                        }
                        Err(e) => warn!("Transcription failed for {}: {}", url, e),
                    }
                }
                AudioExtractionResult::Failed(failure) => {
                    if failure.code.is_definitive() {
                        return Err(failure);
                    }
                    warn!("Audio download failed for {}: {}", url, failure.error);
                    audio_failure = Some(failure);
                }
            }
        }

        emit(progress, "metadata_fallback", 40, "Using video metadata...").await;
        let rich = self.media.fetch_rich_metadata(url, platform).await;

        if rich.title.is_some() || rich.description.is_some() {
            let quality = if rich.description.is_some() {
                ExtractionQuality::Medium
            } else {
                ExtractionQuality::Low
            };
            let merged = oembed.merge(rich);
            return Ok(Gathered {
                content: assemble(&merged, None),
                method: ExtractionMethod::Basic,
                quality,
                has_audio: false,
                thumbnail: merged.thumbnail,
                audio_failure,
            });
        }

        let title_only = VideoMetadata {
            title: oembed.title.clone(),
            ..Default::default()
        };
        Ok(Gathered {
            content: assemble(&title_only, None),
            method: ExtractionMethod::OEmbed,
            quality: ExtractionQuality::Low,
            has_audio: false,
            thumbnail: oembed.thumbnail,
            audio_failure,
        })
    }
}
