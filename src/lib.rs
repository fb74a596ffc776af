pub mod builder;
pub mod confidence;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod images_to_text;
pub mod ingredient;
pub mod jobs;
pub mod media;
pub mod model;
pub mod normalize;
pub mod pipelines;
pub mod platform;
pub mod progress;
pub mod providers;
pub mod strategy;
pub mod telemetry;
pub mod transcribe;
pub mod url_to_text;

pub use builder::RecipeExtractorBuilder;
pub use config::{load_config, ExtractorConfig};
pub use error::{ErrorCode, ExtractError};
pub use extractor::RecipeExtractor;
pub use jobs::{commit_unless_cancelled, CommitOutcome, InMemoryJobStore, JobStatus, JobStore};
pub use model::{
    Component, ExtractionMethod, ExtractionQuality, ExtractionResult, Ingredient, RecipeDraft,
    VideoMetadata,
};
pub use platform::Platform;
pub use progress::{ExtractionProgress, ProgressSink};
pub use providers::{LlmProvider, ProviderChain, ProviderTier};
pub use telemetry::{ErrorReporter, LogReporter};
pub use url_to_text::fetchers::{PageFetcher, RequestFetcher};
