use crate::config::ProviderConfig;
use crate::providers::{AnthropicProvider, LlmProvider, OpenAIProvider, ProviderError};

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider instance from configuration.
    ///
    /// `name` is the table key the provider was configured under; the
    /// wire protocol is picked by `config.kind`.
    pub fn create(
        name: &str,
        config: &ProviderConfig,
    ) -> Result<Box<dyn LlmProvider>, ProviderError> {
        if !config.enabled {
            return Err(ProviderError::Disabled(name.to_string()));
        }

        match config.kind.as_str() {
            "openai" | "openrouter" => Ok(Box::new(OpenAIProvider::new(name, config)?)),
            "anthropic" => Ok(Box::new(AnthropicProvider::new(name, config)?)),
            other => Err(ProviderError::UnknownKind(other.to_string())),
        }
    }

    /// List all supported provider kinds
    pub fn available_providers() -> Vec<&'static str> {
        vec!["openrouter", "openai", "anthropic"]
    }
}
