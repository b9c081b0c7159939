use std::path::PathBuf;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::{ExtractError, Result};
use crate::pipeline::{extract_items, upload_image, ScanResult};
use crate::providers::{AnalysisType, Provider, ProviderFactory};
use crate::storage::{create_store, ImageUpload, StorageBackend};

/// Represents the input image for a scan
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Read the image from a local file and upload it
    Path(PathBuf),
    /// Upload in-memory bytes
    Bytes {
        filename: String,
        bytes: Vec<u8>,
        content_type: Option<String>,
    },
    /// Image already reachable by the model; nothing is uploaded
    Url(String),
}

/// Builder for configuring and executing a single scan
#[derive(Debug, Default)]
pub struct MenuScannerBuilder {
    source: Option<ImageInput>,
    provider: Option<Provider>,
    analysis: Option<AnalysisType>,
    storage: Option<StorageBackend>,
    timeout: Option<Duration>,
    api_key: Option<String>,
    model: Option<String>,
    config: Option<AppConfig>,
}

impl MenuScannerBuilder {
    /// Scan an image file from disk
    ///
    /// # Example
    /// ```
    /// use menu_extract::MenuScanner;
    ///
    /// let builder = MenuScanner::builder()
    ///     .image_path("/path/to/menu.jpg");
    /// ```
    pub fn image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(ImageInput::Path(path.into()));
        self
    }

    /// Scan image bytes already in memory
    pub fn image_bytes(
        mut self,
        filename: impl Into<String>,
        bytes: Vec<u8>,
        content_type: Option<String>,
    ) -> Self {
        self.source = Some(ImageInput::Bytes {
            filename: filename.into(),
            bytes,
            content_type,
        });
        self
    }

    /// Scan an image the model can fetch by URL; storage is skipped
    ///
    /// # Example
    /// ```
    /// use menu_extract::MenuScanner;
    ///
    /// let builder = MenuScanner::builder()
    ///     .image_url("https://storage.example.net/menus/lunch.jpg");
    /// ```
    pub fn image_url(mut self, url: impl Into<String>) -> Self {
        self.source = Some(ImageInput::Url(url.into()));
        self
    }

    /// Set the vision provider
    ///
    /// # Example
    /// ```
    /// use menu_extract::{MenuScanner, Provider};
    ///
    /// let builder = MenuScanner::builder()
    ///     .image_path("menu.jpg")
    ///     .provider(Provider::OpenAI);
    /// ```
    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the analysis type (which prompt is sent)
    pub fn analysis(mut self, analysis: AnalysisType) -> Self {
        self.analysis = Some(analysis);
        self
    }

    /// Set where the image is uploaded before inference
    pub fn storage(mut self, storage: StorageBackend) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set a timeout for provider requests
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Set the vendor API key directly instead of relying on config or environment
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model name for the provider
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Use an already loaded configuration instead of reading config.toml
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build and execute the scan
    ///
    /// # Errors
    /// Returns `ExtractError` if:
    /// - No image was specified
    /// - The provider or storage backend is not configured
    /// - The upload or the provider request fails
    /// - The model's answer contains no JSON array
    ///
    /// # Example
    /// ```no_run
    /// # use menu_extract::{MenuScanner, AnalysisType};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let result = MenuScanner::builder()
    ///     .image_path("menu.jpg")
    ///     .analysis(AnalysisType::MenuV2)
    ///     .build()
    ///     .await?;
    /// println!("{} items", result.items.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn build(self) -> Result<ScanResult> {
        let source = self.source.ok_or_else(|| {
            ExtractError::BuilderError(
                "No image specified. Use .image_path(), .image_bytes() or .image_url()"
                    .to_string(),
            )
        })?;

        let config = match self.config {
            Some(config) => config,
            None => AppConfig::load()?,
        };

        let provider_kind = self.provider.unwrap_or(config.default_provider);
        let analysis = self.analysis.unwrap_or(config.default_analysis);

        let mut provider_config = config.provider(provider_kind);
        if self.api_key.is_some() {
            provider_config.api_key = self.api_key;
        }
        if self.model.is_some() {
            provider_config.model = self.model;
        }
        let timeout = self
            .timeout
            .unwrap_or_else(|| Duration::from_secs(config.timeout));
        let provider = ProviderFactory::create(provider_kind, &provider_config, Some(timeout))?;

        let image_url = match source {
            ImageInput::Url(url) => {
                if url.trim().is_empty() {
                    return Err(ExtractError::MissingImage);
                }
                url
            }
            ImageInput::Path(path) => {
                let upload = ImageUpload::from_path(&path).await?;
                let store = create_store(self.storage.unwrap_or(config.default_storage), &config)?;
                upload_image(store.as_ref(), &upload).await?
            }
            ImageInput::Bytes {
                filename,
                bytes,
                content_type,
            } => {
                let upload = ImageUpload::new(filename, bytes, content_type);
                let store = create_store(self.storage.unwrap_or(config.default_storage), &config)?;
                upload_image(store.as_ref(), &upload).await?
            }
        };

        let items = extract_items(provider.as_ref(), &image_url, analysis).await?;
        Ok(ScanResult { image_url, items })
    }
}

/// Main entry point for the builder API
pub struct MenuScanner;

impl MenuScanner {
    /// Creates a new builder for scanning an image
    ///
    /// # Example
    /// ```
    /// use menu_extract::MenuScanner;
    ///
    /// let builder = MenuScanner::builder();
    /// ```
    pub fn builder() -> MenuScannerBuilder {
        MenuScannerBuilder::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_without_source() {
        let err = MenuScanner::builder()
            .config(AppConfig::default())
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::BuilderError(_)));
    }

    #[tokio::test]
    async fn test_build_with_empty_url() {
        let err = MenuScanner::builder()
            .image_url("  ")
            .api_key("gsk_test")
            .config(AppConfig::default())
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::MissingImage));
    }
}
