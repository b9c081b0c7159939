use crate::config::{AppConfig, ProviderConfig};
use crate::error::{ExtractError, Result};
use crate::providers::{GroqProvider, LlmProvider, OpenAIProvider, Provider};
use std::time::Duration;

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider instance from configuration
    pub fn create(
        provider: Provider,
        config: &ProviderConfig,
        timeout: Option<Duration>,
    ) -> Result<Box<dyn LlmProvider>> {
        // Validate that provider is enabled
        if !config.enabled {
            return Err(ExtractError::ProviderNotConfigured(format!(
                "Provider '{}' is not enabled in configuration",
                provider
            )));
        }

        match provider {
            Provider::Groq => Ok(Box::new(GroqProvider::new(config, timeout)?)),
            Provider::OpenAI => Ok(Box::new(OpenAIProvider::new(config, timeout)?)),
        }
    }

    /// Create a provider using the section for it in the application config
    pub fn from_config(provider: Provider, config: &AppConfig) -> Result<Box<dyn LlmProvider>> {
        Self::create(
            provider,
            &config.provider(provider),
            Some(Duration::from_secs(config.timeout)),
        )
    }

    /// Get the default provider from configuration
    pub fn get_default_provider(config: &AppConfig) -> Result<Box<dyn LlmProvider>> {
        Self::from_config(config.default_provider, config)
    }

    /// List all available provider names
    pub fn available_providers() -> Vec<&'static str> {
        Provider::ALL.iter().map(Provider::as_str).collect()
    }
}
