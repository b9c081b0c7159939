use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::providers::{AnalysisType, Provider};
use crate::storage::StorageBackend;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Shared secret gating the HTTP endpoints (falls back to `GLOBAL_API_KEY`)
    #[serde(default)]
    pub global_api_key: Option<String>,
    /// Provider used when a request does not name one
    #[serde(default)]
    pub default_provider: Provider,
    /// Analysis type used when a request does not name one
    #[serde(default)]
    pub default_analysis: AnalysisType,
    /// Storage backend used by `/api/scan` and the CLI when none is named
    #[serde(default)]
    pub default_storage: StorageBackend,
    /// Map of provider name to provider configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            global_api_key: None,
            default_provider: Provider::default(),
            default_analysis: AnalysisType::default(),
            default_storage: StorageBackend::default(),
            providers: HashMap::new(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
            timeout: default_timeout(),
        }
    }
}

/// Configuration for a specific vision provider. Every field is optional;
/// unset values fall back to the vendor defaults.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Whether this provider is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Model identifier (e.g., "gpt-4o-mini", "llama-3.2-11b-vision-preview")
    pub model: Option<String>,
    /// Temperature for generation (0.0-1.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Nucleus sampling cutoff
    pub top_p: Option<f32>,
    /// API key for authentication (can also be set via environment variable)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            model: None,
            temperature: None,
            max_tokens: None,
            top_p: None,
            api_key: None,
            base_url: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub minio: S3Config,
    #[serde(default)]
    pub aws: S3Config,
}

/// Connection settings for one S3-compatible bucket
#[derive(Debug, Deserialize, Clone, Default)]
pub struct S3Config {
    /// Service endpoint, e.g. `https://api.storage.example.net` (required for MinIO)
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Base of the URL handed back to clients; defaults to the object URL
    pub public_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Largest request body accepted by the upload and scan endpoints
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

// Default value functions
fn default_enabled() -> bool {
    true
}

fn default_timeout() -> u64 {
    60
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with MENU_EXTRACT__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: MENU_EXTRACT__PROVIDERS__GROQ__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config(None)
    }

    /// The global key, from configuration or the `GLOBAL_API_KEY` variable
    pub fn global_api_key(&self) -> Option<String> {
        self.global_api_key
            .clone()
            .or_else(|| std::env::var("GLOBAL_API_KEY").ok())
            .filter(|key| !key.is_empty())
    }

    /// Settings for a provider, or vendor defaults when the section is absent
    pub fn provider(&self, provider: Provider) -> ProviderConfig {
        self.providers
            .get(provider.as_str())
            .cloned()
            .unwrap_or_default()
    }
}

/// Load configuration from an optional explicit file plus the environment
///
/// Without `path`, an optional `config.toml` in the working directory is used.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        // Optional config file (can be missing)
        None => File::with_name("config").required(false),
    };

    let settings = Config::builder()
        .add_source(file)
        // Use double underscore for nested: MENU_EXTRACT__PROVIDERS__GROQ__API_KEY
        .add_source(
            Environment::with_prefix("MENU_EXTRACT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
