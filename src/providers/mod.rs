mod chat;
mod factory;
mod groq;
mod open_ai;
mod prompt;

pub use factory::ProviderFactory;
pub use groq::GroqProvider;
pub use open_ai::OpenAIProvider;
pub use prompt::AnalysisType;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ExtractError, Result};

/// Unified trait for all vision providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "groq", "openai")
    fn provider_name(&self) -> &str;

    /// Send `prompt` together with the image at `image_url` and return the
    /// model's raw text answer
    async fn extract(&self, image_url: &str, prompt: &str) -> Result<String>;
}

/// Vision vendors the proxy can forward to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Groq,
    OpenAI,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Groq, Provider::OpenAI];

    /// Convert to provider name string used by the factory and config keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Groq => "groq",
            Provider::OpenAI => "openai",
        }
    }

    /// Vendor name as shown in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Groq => "Groq",
            Provider::OpenAI => "OpenAI",
        }
    }

    /// Path of the parse endpoint served for this vendor
    pub fn parse_route(&self) -> &'static str {
        match self {
            Provider::Groq => "/api/groq-parse",
            Provider::OpenAI => "/api/openai-parse",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ExtractError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ExtractError::BadRequest(format!("Unknown provider: {}", s)))
    }
}
