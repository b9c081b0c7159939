use thiserror::Error;

/// Errors that can occur while scanning, parsing or exporting menu items
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Global API key missing or wrong
    #[error("Unauthorized - Invalid API Key")]
    Unauthorized,

    /// Parse request without an image URL
    #[error("No image URL provided")]
    MissingImage,

    /// Analysis type not in the prompt table
    #[error("Unknown analysis type: {0}")]
    UnknownAnalysisType(String),

    /// Provider name not recognised or credentials missing
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// Vendor answered with a non-2xx status
    #[error("{provider} API error ({status}): {body}")]
    Upstream {
        provider: String,
        status: u16,
        body: String,
    },

    /// Vendor answered 2xx but without `choices[0].message.content`
    #[error("Invalid API response: {0}")]
    MalformedResponse(String),

    /// No usable JSON array in the model's answer
    #[error("Error processing JSON: {0}")]
    Parse(String),

    /// Object storage rejected the upload or is misconfigured
    #[error("Storage error: {0}")]
    Storage(String),

    /// No item with the given identifier
    #[error("Item not found: {0}")]
    NotFound(String),

    /// Request body could not be understood
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    BuilderError(String),

    /// Failed to reach a remote endpoint
    #[error("Request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl ExtractError {
    /// Whether the failure is the caller's fault rather than ours or the vendor's
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ExtractError::Unauthorized
                | ExtractError::MissingImage
                | ExtractError::UnknownAnalysisType(_)
                | ExtractError::NotFound(_)
                | ExtractError::BadRequest(_)
                | ExtractError::BuilderError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
