use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;

use super::{ImageUpload, ObjectStore, StorageBackend};
use crate::error::Result;

/// Hands the image to the model as a `data:` URL instead of uploading it
pub struct InlineStore;

#[async_trait]
impl ObjectStore for InlineStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Inline
    }

    async fn put(&self, upload: &ImageUpload) -> Result<String> {
        debug!(
            "Inlining {} ({} bytes) as data URL",
            upload.filename,
            upload.bytes.len()
        );
        Ok(format!(
            "data:{};base64,{}",
            upload.content_type,
            STANDARD.encode(&upload.bytes)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_returns_data_url() {
        let upload = ImageUpload::new("menu.png", b"test data".to_vec(), None);
        let url = InlineStore.put(&upload).await.unwrap();
        assert_eq!(url, "data:image/png;base64,dGVzdCBkYXRh");
    }
}
