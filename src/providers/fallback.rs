use crate::config::ExtractorConfig;
use crate::providers::{
    parse_json_response, CompletionRequest, LlmProvider, ProviderError, ProviderFactory,
};
use log::{debug, info, warn};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

/// One provider in the chain with its own retry budget.
pub struct ProviderTier {
    pub provider: Box<dyn LlmProvider>,
    /// Extra attempts after the first before moving to the next tier
    pub max_retries: u32,
}

/// Parsed JSON and the name of the provider that produced it.
#[derive(Debug, Clone)]
pub struct ChainOutput {
    pub value: Value,
    pub provider: String,
}

/// Ordered providers tried until one returns a JSON object.
pub struct ProviderChain {
    tiers: Vec<ProviderTier>,
    retry_delay: Duration,
}

impl ProviderChain {
    pub fn new(tiers: Vec<ProviderTier>, retry_delay: Duration) -> Result<Self, ProviderError> {
        if tiers.is_empty() {
            return Err(ProviderError::NoProviders);
        }
        Ok(Self { tiers, retry_delay })
    }

    /// Build the chain from configuration in fallback order.
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ProviderError> {
        let mut tiers = Vec::new();

        for name in &config.fallback.order {
            if !config.providers.contains_key(name) {
                warn!(
                    "Provider '{}' in fallback order not found in configuration",
                    name
                );
            }
        }

        for (name, provider_config) in config.ordered_providers() {
            match ProviderFactory::create(name, provider_config) {
                Ok(provider) => {
                    info!("Added '{}' to fallback chain", name);
                    tiers.push(ProviderTier {
                        provider,
                        max_retries: provider_config.max_retries,
                    });
                }
                Err(e) => {
                    warn!("Failed to initialize provider '{}': {}", name, e);
                }
            }
        }

        Self::new(tiers, Duration::from_millis(config.fallback.retry_delay_ms))
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.tiers
            .iter()
            .map(|tier| tier.provider.provider_name())
            .collect()
    }

    /// Run the request through each tier until one yields a JSON object.
    pub async fn complete_json(
        &self,
        request: &CompletionRequest,
    ) -> Result<ChainOutput, ProviderError> {
        let mut all_errors: Vec<String> = Vec::new();

        for tier in &self.tiers {
            match self.try_tier(tier, request).await {
                Ok(value) => {
                    return Ok(ChainOutput {
                        value,
                        provider: tier.provider.provider_name().to_string(),
                    })
                }
                Err(e) => {
                    all_errors.push(format!("{}: {}", tier.provider.provider_name(), e));
                }
            }
        }

        Err(ProviderError::AllFailed(all_errors.join("\n")))
    }

    /// Try a provider with exponential backoff retry logic
    async fn try_tier(
        &self,
        tier: &ProviderTier,
        request: &CompletionRequest,
    ) -> Result<Value, ProviderError> {
        let name = tier.provider.provider_name();
        let attempts = tier.max_retries + 1;
        let mut last_error = ProviderError::EmptyResponse;

        for attempt in 1..=attempts {
            if attempt > 1 {
                // Exponential backoff: base, 2x base, 4x base...
                let delay = self.retry_delay * 2u32.saturating_pow(attempt - 2);
                debug!("Waiting {:?} before retry", delay);
                sleep(delay).await;
            }

            debug!(
                "Attempting extraction with {} (attempt {}/{})",
                name, attempt, attempts
            );

            let outcome = match tier.provider.complete(request).await {
                Ok(raw) => match parse_json_response(&raw) {
                    Some(value) if value.is_object() => Ok(value),
                    _ => Err(ProviderError::Unparseable),
                },
                Err(e) => Err(e),
            };

            match outcome {
                Ok(value) => {
                    info!("Successfully extracted recipe using {}", name);
                    return Ok(value);
                }
                Err(e) => {
                    warn!(
                        "Provider {} failed (attempt {}/{}): {}",
                        name, attempt, attempts, e
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}
