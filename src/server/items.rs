//! Session endpoints: scan, list/search, edit, delete, export, settings.

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, Multipart, Path, Query, State,
    },
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::upload::UploadForm;
use super::{ApiError, AppState};
use crate::csv_export::{default_export_filename, to_csv};
use crate::error::{ExtractError, Result};
use crate::model::{ItemUpdate, MenuItem};
use crate::pipeline::{extract_items, upload_image};
use crate::providers::{AnalysisType, Provider, ProviderFactory};
use crate::session::{ScanSettings, ScanStatus};
use crate::storage::{create_store, ImageUpload, StorageBackend};

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub status: ScanStatus,
    pub image_url: String,
    pub last_request_items: usize,
    pub total_items: usize,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsResponse {
    pub status: ScanStatus,
    pub search: String,
    pub last_request_items: usize,
    pub total_items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Deserialize)]
pub struct ItemsQuery {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub provider: Option<Provider>,
    pub analysis_type: Option<AnalysisType>,
    pub storage_provider: Option<StorageBackend>,
}

#[derive(Debug, Serialize)]
pub struct PromptInfo {
    pub key: AnalysisType,
    pub description: &'static str,
}

/// Resolve per-request overrides against the session's current settings
fn scan_options(form: &UploadForm, settings: ScanSettings) -> Result<ScanSettings> {
    Ok(ScanSettings {
        provider: match form.field("provider") {
            Some(name) => name.parse()?,
            None => settings.provider,
        },
        analysis_type: match form.field("analysisType") {
            Some(name) => name.parse()?,
            None => settings.analysis_type,
        },
        storage_provider: match form.field("storage") {
            Some(name) => name.parse()?,
            None => settings.storage_provider,
        },
    })
}

/// `POST /api/scan`: upload, extract and append in one call
pub async fn scan(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ScanResponse>> {
    let form = UploadForm::read(multipart?).await?;
    let file = form
        .file
        .clone()
        .ok_or_else(|| ExtractError::BadRequest("No file provided".to_string()))?;

    let settings = state.session.read().await.settings;
    let options = scan_options(&form, settings)?;

    state.session.write().await.begin_upload();
    match run_scan(&state, options, &file).await {
        Ok((image_url, items)) => {
            let mut session = state.session.write().await;
            session.append(items.clone());
            info!(
                "{} items detected, {} total items",
                session.last_request_items(),
                session.len()
            );
            Ok(Json(ScanResponse {
                status: session.status(),
                image_url,
                last_request_items: session.last_request_items(),
                total_items: session.len(),
                items,
            }))
        }
        Err(e) => {
            error!("Scan of {} failed: {}", file.filename, e);
            state.session.write().await.fail(e.to_string());
            Err(e.into())
        }
    }
}

async fn run_scan(
    state: &AppState,
    options: ScanSettings,
    file: &ImageUpload,
) -> Result<(String, Vec<MenuItem>)> {
    let store = create_store(options.storage_provider, &state.config)?;
    let provider = ProviderFactory::from_config(options.provider, &state.config)?;

    let image_url = upload_image(store.as_ref(), file).await?;
    state.session.write().await.begin_parsing();
    let items = extract_items(provider.as_ref(), &image_url, options.analysis_type).await?;
    Ok((image_url, items))
}

/// `GET /api/items?search=`
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemsQuery>,
) -> Json<ItemsResponse> {
    let mut session = state.session.write().await;
    if let Some(search) = query.search {
        session.set_search(search);
    }

    Json(ItemsResponse {
        status: session.status(),
        search: session.search().to_string(),
        last_request_items: session.last_request_items(),
        total_items: session.len(),
        last_error: session.last_error().map(str::to_string),
        items: session.filtered().into_iter().cloned().collect(),
    })
}

/// `PUT /api/items/:id`
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: std::result::Result<Json<ItemUpdate>, JsonRejection>,
) -> ApiResult<Json<MenuItem>> {
    let Json(update) = payload?;
    let mut session = state.session.write().await;
    let item = session.update(id, update)?;
    Ok(Json(item.clone()))
}

/// `DELETE /api/items/:id`
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MenuItem>> {
    let removed = state.session.write().await.delete(id)?;
    info!("Item successfully deleted: {}", removed.id);
    Ok(Json(removed))
}

/// `POST /api/reset`
pub async fn reset(State(state): State<AppState>) -> Json<ItemsResponse> {
    state.session.write().await.reset();
    list_items(State(state), Query(ItemsQuery { search: None })).await
}

/// `GET /api/export.csv`
pub async fn export_csv(State(state): State<AppState>) -> ApiResult<Response> {
    let csv = {
        let session = state.session.read().await;
        to_csv(session.items())?
    };
    let disposition = format!("attachment; filename=\"{}\"", default_export_filename());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

/// `GET /api/settings`
pub async fn get_settings(State(state): State<AppState>) -> Json<ScanSettings> {
    Json(state.session.read().await.settings)
}

/// `PUT /api/settings`
pub async fn update_settings(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SettingsUpdate>, JsonRejection>,
) -> ApiResult<Json<ScanSettings>> {
    let Json(update) = payload?;
    let mut session = state.session.write().await;
    if let Some(provider) = update.provider {
        session.settings.provider = provider;
    }
    if let Some(analysis_type) = update.analysis_type {
        session.settings.analysis_type = analysis_type;
    }
    if let Some(storage_provider) = update.storage_provider {
        session.settings.storage_provider = storage_provider;
    }
    Ok(Json(session.settings))
}

/// `GET /api/prompts`
pub async fn list_prompts() -> Json<Vec<PromptInfo>> {
    Json(
        AnalysisType::ALL
            .into_iter()
            .map(|key| PromptInfo {
                key,
                description: key.description(),
            })
            .collect(),
    )
}
