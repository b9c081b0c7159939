mod inline;
mod s3;
pub mod sigv4;

pub use inline::InlineStore;
pub use s3::{Addressing, S3Store};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ExtractError, Result};

/// Where uploaded images end up before the model is pointed at them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Minio,
    Aws,
    /// No upload; the image travels inside the request as a data URL
    Inline,
}

impl StorageBackend {
    pub const ALL: [StorageBackend; 3] = [
        StorageBackend::Minio,
        StorageBackend::Aws,
        StorageBackend::Inline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Minio => "minio",
            StorageBackend::Aws => "aws",
            StorageBackend::Inline => "inline",
        }
    }

    /// Path of the upload endpoint served for this backend
    pub fn upload_route(&self) -> Option<&'static str> {
        match self {
            StorageBackend::Minio => Some("/api/s3-upload-minio"),
            StorageBackend::Aws => Some("/api/s3-upload-aws"),
            StorageBackend::Inline => None,
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = ExtractError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        StorageBackend::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ExtractError::BadRequest(format!("Unknown storage backend: {}", s)))
    }
}

/// An image waiting to be stored
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Wrap raw bytes; the content type is guessed from the filename when not given
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>, content_type: Option<String>) -> Self {
        let filename = filename.into();
        let content_type = content_type
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| {
                mime_guess::from_path(&filename)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            });
        ImageUpload {
            filename,
            content_type,
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(ImageUpload::new(filename, bytes, None))
    }

    /// Unique object key: `uploads/<uuid>/<sanitised filename>`
    pub fn object_key(&self) -> String {
        format!("uploads/{}/{}", Uuid::new_v4(), sanitize_filename(&self.filename))
    }
}

/// Keep letters, digits, `.`, `-` and `_`; everything else becomes `-`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '-');
    if trimmed.is_empty() {
        "image".to_string()
    } else {
        trimmed.to_string()
    }
}

/// A place images can be put so that a vision model can fetch them
#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn backend(&self) -> StorageBackend;

    /// Store the image and return a URL the model can read it from
    async fn put(&self, upload: &ImageUpload) -> Result<String>;
}

/// Create a store for `backend` from the application config
pub fn create_store(backend: StorageBackend, config: &AppConfig) -> Result<Box<dyn ObjectStore>> {
    match backend {
        StorageBackend::Minio => Ok(Box::new(S3Store::minio(&config.storage.minio)?)),
        StorageBackend::Aws => Ok(Box::new(S3Store::aws(&config.storage.aws)?)),
        StorageBackend::Inline => Ok(Box::new(InlineStore)),
    }
}
