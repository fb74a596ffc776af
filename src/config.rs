use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Main extractor configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct ExtractorConfig {
    /// Location used for ingredient cost estimates when the caller gives none
    #[serde(default = "default_location")]
    pub default_location: String,
    /// Map of provider name to provider configuration
    #[serde(default = "default_providers")]
    pub providers: HashMap<String, ProviderConfig>,
    /// Order and pacing of provider fallback
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// External media tool (yt-dlp) settings
    #[serde(default)]
    pub media: MediaConfig,
    /// Speech-to-text settings
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    /// Platform embed endpoints
    #[serde(default)]
    pub oembed: OEmbedConfig,
    /// Page fetch settings
    #[serde(default)]
    pub http: HttpConfig,
    /// Photo-carousel settings
    #[serde(default)]
    pub slideshow: SlideshowConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            default_location: default_location(),
            providers: default_providers(),
            fallback: FallbackConfig::default(),
            media: MediaConfig::default(),
            transcription: TranscriptionConfig::default(),
            oembed: OEmbedConfig::default(),
            http: HttpConfig::default(),
            slideshow: SlideshowConfig::default(),
        }
    }
}

/// Configuration for a specific language-model provider
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Whether this provider is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Wire protocol: "openai", "openrouter" or "anthropic"
    pub kind: String,
    /// Model identifier for text extraction
    pub model: String,
    /// Model identifier for image input (defaults to `model`)
    pub vision_model: Option<String>,
    /// Temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// API key for authentication (can also be set via environment variable)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout: u64,
    /// Retries after the first failed attempt before falling back
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Configuration for provider fallback and retry pacing
#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    /// Order of providers to try (first to last)
    #[serde(default = "default_fallback_order")]
    pub order: Vec<String>,
    /// Base delay between retries in milliseconds (doubles per retry)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            order: default_fallback_order(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    /// Media download tool binary
    #[serde(default = "default_media_binary")]
    pub binary: String,
    /// Media inspection binary used for duration probing
    #[serde(default = "default_probe_binary")]
    pub probe_binary: String,
    /// Hard wall-clock ceiling for audio downloads, in seconds
    #[serde(default = "default_download_timeout")]
    pub download_timeout: u64,
    /// Timeout for metadata dumps, in seconds
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout: u64,
    /// Instagram cookies: raw Netscape cookie content or a path to a cookie file
    pub instagram_cookies: Option<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary: default_media_binary(),
            probe_binary: default_probe_binary(),
            download_timeout: default_download_timeout(),
            metadata_timeout: default_metadata_timeout(),
            instagram_cookies: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranscriptionConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_transcription_model")]
    pub model: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// Request timeout in seconds
    #[serde(default = "default_transcription_timeout")]
    pub timeout: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            model: default_transcription_model(),
            language: default_language(),
            timeout: default_transcription_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OEmbedConfig {
    #[serde(default = "default_youtube_oembed")]
    pub youtube_endpoint: String,
    #[serde(default = "default_tiktok_oembed")]
    pub tiktok_endpoint: String,
    #[serde(default = "default_instagram_oembed")]
    pub instagram_endpoint: String,
    /// Graph API token; Instagram oEmbed is skipped without one
    pub instagram_token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_oembed_timeout")]
    pub timeout: u64,
}

impl Default for OEmbedConfig {
    fn default() -> Self {
        Self {
            youtube_endpoint: default_youtube_oembed(),
            tiktok_endpoint: default_tiktok_oembed(),
            instagram_endpoint: default_instagram_oembed(),
            instagram_token: None,
            timeout: default_oembed_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Page fetch timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlideshowConfig {
    #[serde(default = "default_max_images")]
    pub max_images: usize,
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self {
            max_images: default_max_images(),
        }
    }
}

// Default value functions
fn default_location() -> String {
    "Guam".to_string()
}

fn default_true() -> bool {
    true
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_provider_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_fallback_order() -> Vec<String> {
    vec!["openrouter".to_string(), "openai".to_string()]
}

fn default_providers() -> HashMap<String, ProviderConfig> {
    let mut providers = HashMap::new();
    providers.insert(
        "openrouter".to_string(),
        ProviderConfig {
            enabled: true,
            kind: "openrouter".to_string(),
            model: "google/gemini-2.0-flash-001".to_string(),
            vision_model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key: None,
            base_url: None,
            timeout: 60,
            max_retries: 2,
        },
    );
    providers.insert(
        "openai".to_string(),
        ProviderConfig {
            enabled: true,
            kind: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            vision_model: Some("gpt-4o".to_string()),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key: None,
            base_url: None,
            timeout: 120,
            max_retries: 1,
        },
    );
    providers
}

fn default_media_binary() -> String {
    "yt-dlp".to_string()
}

fn default_probe_binary() -> String {
    "ffprobe".to_string()
}

fn default_download_timeout() -> u64 {
    120
}

fn default_metadata_timeout() -> u64 {
    30
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_transcription_timeout() -> u64 {
    120
}

fn default_youtube_oembed() -> String {
    "https://www.youtube.com/oembed".to_string()
}

fn default_tiktok_oembed() -> String {
    "https://www.tiktok.com/oembed".to_string()
}

fn default_instagram_oembed() -> String {
    "https://graph.facebook.com/v17.0/instagram_oembed".to_string()
}

fn default_oembed_timeout() -> u64 {
    10
}

fn default_timeout() -> u64 {
    30
}

fn default_max_images() -> usize {
    20
}

impl ExtractorConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_EXTRACT__ prefix
    /// 2. recipe-extract.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_EXTRACT__PROVIDERS__OPENAI__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    /// Providers in fallback order, skipping disabled or unknown names.
    pub fn ordered_providers(&self) -> Vec<(&str, &ProviderConfig)> {
        self.fallback
            .order
            .iter()
            .filter_map(|name| {
                self.providers
                    .get(name)
                    .filter(|provider| provider.enabled)
                    .map(|provider| (name.as_str(), provider))
            })
            .collect()
    }
}

/// Load configuration from file and environment variables
///
/// See [`ExtractorConfig::load`] for precedence.
pub fn load_config() -> Result<ExtractorConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("recipe-extract").required(false))
        // Use double underscore for nested: RECIPE_EXTRACT__MEDIA__BINARY
        .add_source(
            Environment::with_prefix("RECIPE_EXTRACT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_temperature(), 0.1);
        assert_eq!(default_max_tokens(), 4000);
        assert_eq!(default_retry_delay_ms(), 1000);
        assert_eq!(default_download_timeout(), 120);
        assert_eq!(default_max_images(), 20);
    }

    #[test]
    fn test_default_provider_table() {
        let config = ExtractorConfig::default();
        let ordered = config.ordered_providers();
        assert_eq!(ordered.len(), 2);

        let (primary_name, primary) = ordered[0];
        assert_eq!(primary_name, "openrouter");
        assert_eq!(primary.max_retries, 2);
        assert_eq!(primary.timeout, 60);

        let (secondary_name, secondary) = ordered[1];
        assert_eq!(secondary_name, "openai");
        assert_eq!(secondary.max_retries, 1);
        assert_eq!(secondary.timeout, 120);
        assert_eq!(secondary.vision_model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_disabled_provider_is_skipped() {
        let mut config = ExtractorConfig::default();
        if let Some(primary) = config.providers.get_mut("openrouter") {
            primary.enabled = false;
        }
        let ordered = config.ordered_providers();
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].0, "openai");
    }

    #[test]
    fn test_unknown_provider_in_order_is_skipped() {
        let mut config = ExtractorConfig::default();
        config.fallback.order.insert(0, "missing".to_string());
        assert_eq!(config.ordered_providers().len(), 2);
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let settings = Config::builder()
            .add_source(config::File::from_str(
                r#"
                default_location = "Honolulu"

                [media]
                instagram_cookies = "/etc/cookies.txt"

                [fallback]
                order = ["openai"]
                retry_delay_ms = 0
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: ExtractorConfig = settings.try_deserialize().unwrap();

        assert_eq!(config.default_location, "Honolulu");
        assert_eq!(config.media.binary, "yt-dlp");
        assert_eq!(
            config.media.instagram_cookies.as_deref(),
            Some("/etc/cookies.txt")
        );
        assert_eq!(config.ordered_providers().len(), 1);
        assert_eq!(config.fallback.retry_delay_ms, 0);
    }
}
