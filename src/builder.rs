use std::sync::Arc;
use std::time::Duration;

use crate::config::ExtractorConfig;
use crate::engine::ExtractionEngine;
use crate::error::ExtractError;
use crate::extractor::RecipeExtractor;
use crate::images_to_text::SlideshowScraper;
use crate::media::{MediaTool, MetadataFetcher, OEmbedFetcher, YtDlp};
use crate::platform::{HttpRedirectResolver, RedirectResolver, UrlNormalizer};
use crate::providers::ProviderChain;
use crate::telemetry::{ErrorReporter, LogReporter};
use crate::transcribe::{Transcriber, WhisperClient};
use crate::url_to_text::fetchers::{PageFetcher, RequestFetcher};

const REDIRECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builder for a [`RecipeExtractor`].
///
/// Every collaborator is optional; anything left unset is constructed from
/// the configuration (which itself defaults to [`ExtractorConfig::load`]).
#[derive(Default)]
pub struct RecipeExtractorBuilder {
    config: Option<ExtractorConfig>,
    provider_chain: Option<ProviderChain>,
    media_tool: Option<Arc<dyn MediaTool>>,
    transcriber: Option<Arc<dyn Transcriber>>,
    metadata_fetcher: Option<Arc<dyn MetadataFetcher>>,
    page_fetcher: Option<Arc<dyn PageFetcher>>,
    redirect_resolver: Option<Arc<dyn RedirectResolver>>,
    error_reporter: Option<Arc<dyn ErrorReporter>>,
}

impl RecipeExtractorBuilder {
    /// Use an explicit configuration instead of loading one
    ///
    /// # Example
    /// ```
    /// use recipe_extract::{ExtractorConfig, RecipeExtractor};
    ///
    /// let mut config = ExtractorConfig::default();
    /// config.default_location = "Honolulu".to_string();
    /// let builder = RecipeExtractor::builder().config(config);
    /// ```
    pub fn config(mut self, config: ExtractorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a prebuilt provider chain instead of one built from configuration
    pub fn provider_chain(mut self, chain: ProviderChain) -> Self {
        self.provider_chain = Some(chain);
        self
    }

    /// Replace the yt-dlp backed media tool
    pub fn media_tool(mut self, media: Arc<dyn MediaTool>) -> Self {
        self.media_tool = Some(media);
        self
    }

    /// Replace the Whisper transcriber
    pub fn transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn metadata_fetcher(mut self, metadata: Arc<dyn MetadataFetcher>) -> Self {
        self.metadata_fetcher = Some(metadata);
        self
    }

    /// Replace the HTTP page fetcher used for websites and photo posts
    ///
    /// # Example
    /// ```
    /// use recipe_extract::{RecipeExtractor, RequestFetcher};
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// let fetcher = RequestFetcher::new(Duration::from_secs(10)).unwrap();
    /// let builder = RecipeExtractor::builder().page_fetcher(Arc::new(fetcher));
    /// ```
    pub fn page_fetcher(mut self, pages: Arc<dyn PageFetcher>) -> Self {
        self.page_fetcher = Some(pages);
        self
    }

    pub fn redirect_resolver(mut self, resolver: Arc<dyn RedirectResolver>) -> Self {
        self.redirect_resolver = Some(resolver);
        self
    }

    /// Send unexpected failures somewhere other than the log
    pub fn error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = Some(reporter);
        self
    }

    /// Assemble the extractor
    ///
    /// # Errors
    /// Returns `ExtractError` if:
    /// - No configuration was given and loading one fails
    /// - No language-model provider could be initialized
    /// - An HTTP client could not be built
    ///
    /// # Example
    /// ```no_run
    /// # use recipe_extract::RecipeExtractor;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let extractor = RecipeExtractor::builder().build()?;
    /// let result = extractor
    ///     .extract("https://www.youtube.com/shorts/abc123", "", "", None, false)
    ///     .await;
    /// println!("{}", result.success);
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<RecipeExtractor, ExtractError> {
        let config = match self.config {
            Some(config) => config,
            None => ExtractorConfig::load()?,
        };
        let timeout = Duration::from_secs(config.http.timeout);

        let chain = match self.provider_chain {
            Some(chain) => chain,
            None => ProviderChain::from_config(&config)
                .map_err(|e| ExtractError::Builder(format!("No usable provider: {}", e)))?,
        };

        let media: Arc<dyn MediaTool> = match self.media_tool {
            Some(media) => media,
            None => Arc::new(YtDlp::new(&config.media)),
        };
        let transcriber: Arc<dyn Transcriber> = match self.transcriber {
            Some(transcriber) => transcriber,
            None => Arc::new(
                WhisperClient::new(&config.transcription)
                    .map_err(|e| ExtractError::Builder(e.to_string()))?,
            ),
        };
        let metadata: Arc<dyn MetadataFetcher> = match self.metadata_fetcher {
            Some(metadata) => metadata,
            None => Arc::new(OEmbedFetcher::new(&config.oembed)?),
        };
        let pages: Arc<dyn PageFetcher> = match self.page_fetcher {
            Some(pages) => pages,
            None => Arc::new(RequestFetcher::new(timeout)?),
        };
        let resolver: Arc<dyn RedirectResolver> = match self.redirect_resolver {
            Some(resolver) => resolver,
            None => Arc::new(HttpRedirectResolver::new(REDIRECT_TIMEOUT)?),
        };
        let reporter: Arc<dyn ErrorReporter> = match self.error_reporter {
            Some(reporter) => reporter,
            None => Arc::new(LogReporter),
        };

        Ok(RecipeExtractor {
            normalizer: UrlNormalizer::new(resolver),
            slideshow: SlideshowScraper::new(
                media.clone(),
                pages.clone(),
                config.slideshow.max_images,
            ),
            metadata,
            media,
            transcriber,
            pages,
            engine: ExtractionEngine::new(chain),
            reporter,
            default_location: config.default_location,
        })
    }
}
