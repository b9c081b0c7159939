//! Upload → inference → parse, one step at a time.
//!
//! The steps are exposed separately so the HTTP server can update its shared
//! session between them without holding a lock across a request.

use log::{error, info};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ExtractError, Result};
use crate::model::MenuItem;
use crate::parser::extract_json_array;
use crate::providers::{AnalysisType, LlmProvider};
use crate::session::Session;
use crate::storage::{ImageUpload, ObjectStore};

/// Outcome of one successful scan
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub image_url: String,
    pub items: Vec<MenuItem>,
}

pub async fn upload_image(store: &dyn ObjectStore, upload: &ImageUpload) -> Result<String> {
    info!(
        "Uploading {} ({} bytes) to {}",
        upload.filename,
        upload.bytes.len(),
        store.backend()
    );
    store.put(upload).await
}

/// Ask the model about the image and pull the record array out of its answer
pub async fn extract_records(
    provider: &dyn LlmProvider,
    image_url: &str,
    analysis: AnalysisType,
) -> Result<Vec<Value>> {
    info!(
        "Extracting {} data with {}",
        analysis,
        provider.provider_name()
    );
    let answer = provider.extract(image_url, analysis.prompt()).await?;
    let records = extract_json_array(&answer)?;
    info!("Items extracted: {}", records.len());
    Ok(records)
}

pub async fn extract_items(
    provider: &dyn LlmProvider,
    image_url: &str,
    analysis: AnalysisType,
) -> Result<Vec<MenuItem>> {
    let records = extract_records(provider, image_url, analysis).await?;
    MenuItem::from_records(&records)
}

/// Run a whole scan against a session the caller owns exclusively.
///
/// The session's status follows the scan; on failure it is left in
/// `error` with the message recorded and the item list untouched.
pub async fn scan_into(
    session: &mut Session,
    store: &dyn ObjectStore,
    provider: &dyn LlmProvider,
    analysis: AnalysisType,
    upload: &ImageUpload,
) -> Result<ScanResult> {
    session.begin_upload();
    let result = async {
        let image_url = upload_image(store, upload).await?;
        session.begin_parsing();
        let items = extract_items(provider, &image_url, analysis).await?;
        Ok::<_, ExtractError>(ScanResult { image_url, items })
    }
    .await;

    match result {
        Ok(result) => {
            session.append(result.items.clone());
            Ok(result)
        }
        Err(e) => {
            error!("Scan of {} failed: {}", upload.filename, e);
            session.fail(e.to_string());
            Err(e)
        }
    }
}
