pub mod builder;
pub mod config;
pub mod csv_export;
pub mod error;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod providers;
pub mod server;
pub mod session;
pub mod storage;

pub use builder::{ImageInput, MenuScanner, MenuScannerBuilder};
pub use config::AppConfig;
pub use csv_export::{to_csv, write_csv};
pub use error::ExtractError;
pub use model::{ItemUpdate, MenuItem};
pub use parser::{extract_json_array, parse_items};
pub use pipeline::ScanResult;
pub use providers::{AnalysisType, LlmProvider, Provider};
pub use session::{ScanStatus, Session};
pub use storage::StorageBackend;

use std::path::Path;

/// Convenience function to scan a local image with the configured defaults
///
/// # Example
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let items = menu_extract::scan_image("menu.jpg").await?;
/// # Ok(())
/// # }
/// ```
pub async fn scan_image(path: impl AsRef<Path>) -> Result<Vec<MenuItem>, ExtractError> {
    let result = MenuScanner::builder()
        .image_path(path.as_ref())
        .build()
        .await?;
    Ok(result.items)
}

/// Convenience function to scan an image the model can already reach
pub async fn scan_url(url: &str) -> Result<Vec<MenuItem>, ExtractError> {
    let result = MenuScanner::builder().image_url(url).build().await?;
    Ok(result.items)
}
