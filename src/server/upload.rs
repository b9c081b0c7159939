//! `POST /api/s3-upload-minio` and `POST /api/s3-upload-aws`.

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        Multipart, State,
    },
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{ApiError, AppState, API_KEY_HEADER};
use crate::error::{ExtractError, Result};
use crate::pipeline::upload_image;
use crate::storage::{create_store, ImageUpload, StorageBackend};

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// A multipart form reduced to its `file` part and its text parts
#[derive(Debug, Default)]
pub(crate) struct UploadForm {
    pub file: Option<ImageUpload>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub(crate) async fn read(multipart: Multipart) -> Result<Self> {
        Self::read_checked(multipart, |_, _| Ok(())).await
    }

    /// Read the form, passing every text part to `check` as soon as it
    /// arrives. Reading stops at the first part `check` rejects.
    pub(crate) async fn read_checked<F>(mut multipart: Multipart, check: F) -> Result<Self>
    where
        F: Fn(&str, &str) -> Result<()>,
    {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                form.file = Some(read_file(field).await?);
            } else if !name.is_empty() {
                let value = field.text().await.map_err(bad_multipart)?;
                check(&name, &value)?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    pub(crate) fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

async fn read_file(field: Field<'_>) -> Result<ImageUpload> {
    let filename = field.file_name().unwrap_or("image").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(bad_multipart)?;
    Ok(ImageUpload::new(filename, bytes.to_vec(), content_type))
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> ExtractError {
    ExtractError::BadRequest(format!("Invalid multipart body: {}", err))
}

pub async fn upload_minio(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Json<UploadResponse>, ApiError> {
    Ok(Json(
        upload_to(&state, StorageBackend::Minio, &headers, multipart?).await?,
    ))
}

pub async fn upload_aws(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Json<UploadResponse>, ApiError> {
    Ok(Json(
        upload_to(&state, StorageBackend::Aws, &headers, multipart?).await?,
    ))
}

/// The key comes from the `x-api-key` header when sent, else from the
/// `apiKey` part, which is checked as soon as it is read.
async fn upload_to(
    state: &AppState,
    backend: StorageBackend,
    headers: &HeaderMap,
    multipart: Multipart,
) -> Result<UploadResponse> {
    let header_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if header_key.is_some() {
        state.authorize(header_key)?;
    }

    let form = UploadForm::read_checked(multipart, |name, value| match name {
        "apiKey" if header_key.is_none() => state.authorize(Some(value)),
        _ => Ok(()),
    })
    .await?;
    if header_key.is_none() {
        state.authorize(form.field("apiKey"))?;
    }

    let file = form
        .file
        .ok_or_else(|| ExtractError::BadRequest("No file provided".to_string()))?;

    let store = create_store(backend, &state.config)?;
    let url = upload_image(store.as_ref(), &file).await?;
    Ok(UploadResponse { url })
}
