use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info};
use reqwest::{Client, Url};
use std::collections::BTreeMap;

use super::sigv4::{self, Credentials, SigningRequest};
use super::{ImageUpload, ObjectStore, StorageBackend};
use crate::config::S3Config;
use crate::error::{ExtractError, Result};

const DEFAULT_REGION: &str = "us-east-1";

/// How the bucket name appears in object URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// `https://endpoint/bucket/key` (MinIO, custom endpoints)
    Path,
    /// `https://bucket.s3.region.amazonaws.com/key`
    VirtualHost,
}

/// Uploads with signed `PutObject` requests against an S3-compatible service
pub struct S3Store {
    client: Client,
    backend: StorageBackend,
    endpoint: Url,
    addressing: Addressing,
    bucket: String,
    region: String,
    credentials: Credentials,
    public_url: Option<String>,
}

fn setting(value: &Option<String>, env_keys: &[&str]) -> Option<String> {
    value
        .clone()
        .or_else(|| env_keys.iter().find_map(|key| std::env::var(key).ok()))
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, what: &str) -> Result<String> {
    value.ok_or_else(|| ExtractError::Storage(format!("{} not found in config or environment", what)))
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    Url::parse(endpoint.trim_end_matches('/'))
        .map_err(|e| ExtractError::Storage(format!("Invalid storage endpoint '{}': {}", endpoint, e)))
}

impl S3Store {
    /// MinIO: path-style requests to a configured endpoint
    ///
    /// Falls back to `MINIO_ENDPOINT`, `MINIO_BUCKET`, `MINIO_ACCESS_KEY`,
    /// `MINIO_SECRET_KEY`, `MINIO_REGION` and `MINIO_PUBLIC_URL`.
    pub fn minio(config: &S3Config) -> Result<Self> {
        let endpoint = required(setting(&config.endpoint, &["MINIO_ENDPOINT"]), "MINIO_ENDPOINT")?;
        let credentials = Credentials {
            access_key_id: required(
                setting(&config.access_key_id, &["MINIO_ACCESS_KEY"]),
                "MINIO_ACCESS_KEY",
            )?,
            secret_access_key: required(
                setting(&config.secret_access_key, &["MINIO_SECRET_KEY"]),
                "MINIO_SECRET_KEY",
            )?,
        };

        Ok(S3Store {
            client: Client::new(),
            backend: StorageBackend::Minio,
            endpoint: parse_endpoint(&endpoint)?,
            addressing: Addressing::Path,
            bucket: required(setting(&config.bucket, &["MINIO_BUCKET"]), "MINIO_BUCKET")?,
            region: setting(&config.region, &["MINIO_REGION"])
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            credentials,
            public_url: setting(&config.public_url, &["MINIO_PUBLIC_URL"]),
        })
    }

    /// AWS S3: virtual-hosted requests, or path-style when an endpoint override is set
    ///
    /// Falls back to the `S3_UPLOAD_*` variables, then the standard `AWS_*` ones.
    pub fn aws(config: &S3Config) -> Result<Self> {
        let region = setting(&config.region, &["S3_UPLOAD_REGION", "AWS_REGION"])
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let bucket = required(setting(&config.bucket, &["S3_UPLOAD_BUCKET"]), "S3_UPLOAD_BUCKET")?;

        let (endpoint, addressing) = match setting(&config.endpoint, &[]) {
            Some(endpoint) => (parse_endpoint(&endpoint)?, Addressing::Path),
            None => (
                parse_endpoint(&format!("https://{}.s3.{}.amazonaws.com", bucket, region))?,
                Addressing::VirtualHost,
            ),
        };

        let credentials = Credentials {
            access_key_id: required(
                setting(&config.access_key_id, &["S3_UPLOAD_KEY", "AWS_ACCESS_KEY_ID"]),
                "S3_UPLOAD_KEY",
            )?,
            secret_access_key: required(
                setting(&config.secret_access_key, &["S3_UPLOAD_SECRET", "AWS_SECRET_ACCESS_KEY"]),
                "S3_UPLOAD_SECRET",
            )?,
        };

        Ok(S3Store {
            client: Client::new(),
            backend: StorageBackend::Aws,
            endpoint,
            addressing,
            bucket,
            region,
            credentials,
            public_url: setting(&config.public_url, &[]),
        })
    }

    #[doc(hidden)]
    pub fn with_endpoint(
        backend: StorageBackend,
        endpoint: &str,
        bucket: &str,
        credentials: Credentials,
    ) -> Result<Self> {
        Ok(S3Store {
            client: Client::new(),
            backend,
            endpoint: parse_endpoint(endpoint)?,
            addressing: Addressing::Path,
            bucket: bucket.to_string(),
            region: DEFAULT_REGION.to_string(),
            credentials,
            public_url: None,
        })
    }

    /// Request path for `key`, already percent-encoded
    fn object_path(&self, key: &str) -> String {
        let raw = match self.addressing {
            Addressing::Path => format!("/{}/{}", self.bucket, key),
            Addressing::VirtualHost => format!("/{}", key),
        };
        sigv4::uri_encode_path(&raw)
    }

    fn host_header(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}://{}{}",
            self.endpoint.scheme(),
            self.host_header(),
            path
        )
    }

    /// URL handed back to clients for a stored key
    pub fn public_url_for(&self, key: &str) -> String {
        match &self.public_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => self.object_url(&self.object_path(key)),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn backend(&self) -> StorageBackend {
        self.backend
    }

    async fn put(&self, upload: &ImageUpload) -> Result<String> {
        let key = upload.object_key();
        let path = self.object_path(&key);
        let payload_hash = sigv4::sha256_hex(&upload.bytes);
        let amz_date = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();

        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), upload.content_type.clone());
        headers.insert("host".to_string(), self.host_header());
        headers.insert("x-amz-content-sha256".to_string(), payload_hash.clone());
        headers.insert("x-amz-date".to_string(), amz_date.clone());

        let authorization = sigv4::authorization(
            &self.credentials,
            &self.region,
            "s3",
            &amz_date,
            &SigningRequest {
                method: "PUT",
                path: &path,
                query: "",
                headers: &headers,
                payload_hash: &payload_hash,
            },
        );

        let url = self.object_url(&path);
        debug!("Uploading {} bytes to {}", upload.bytes.len(), url);

        let response = self
            .client
            .put(&url)
            .header("content-type", &upload.content_type)
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &amz_date)
            .header("authorization", authorization)
            .body(upload.bytes.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} upload failed ({}): {}", self.backend, status, body);
            return Err(ExtractError::Storage(format!(
                "Upload failed ({}): {}",
                status, body
            )));
        }

        let public_url = self.public_url_for(&key);
        info!("Stored {} at {}", upload.filename, public_url);
        Ok(public_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn credentials() -> Credentials {
        Credentials {
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
        }
    }

    #[tokio::test]
    async fn test_put_signs_and_uploads() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", Matcher::Regex(r"^/menus/uploads/[0-9a-f-]{36}/menu\.jpg$".to_string()))
            .match_header("content-type", "image/jpeg")
            .match_header(
                "authorization",
                Matcher::Regex(
                    r"^AWS4-HMAC-SHA256 Credential=minioadmin/\d{8}/us-east-1/s3/aws4_request, SignedHeaders=content-type;host;x-amz-content-sha256;x-amz-date, Signature=[0-9a-f]{64}$"
                        .to_string(),
                ),
            )
            .match_header("x-amz-content-sha256", sigv4::sha256_hex(b"jpeg").as_str())
            .match_body("jpeg")
            .with_status(200)
            .create_async()
            .await;

        let store =
            S3Store::with_endpoint(StorageBackend::Minio, &server.url(), "menus", credentials())
                .unwrap();
        let upload = ImageUpload::new("menu.jpg", b"jpeg".to_vec(), None);

        let url = store.put(&upload).await.unwrap();
        assert!(url.starts_with(&format!("{}/menus/uploads/", server.url())));
        assert!(url.ends_with("/menu.jpg"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_put_surfaces_storage_errors() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("PUT", Matcher::Any)
            .with_status(403)
            .with_body("<Error><Code>AccessDenied</Code></Error>")
            .create_async()
            .await;

        let store =
            S3Store::with_endpoint(StorageBackend::Minio, &server.url(), "menus", credentials())
                .unwrap();
        let upload = ImageUpload::new("menu.jpg", b"jpeg".to_vec(), None);

        let err = store.put(&upload).await.unwrap_err();
        assert!(matches!(err, ExtractError::Storage(_)));
        assert!(err.to_string().contains("AccessDenied"));
    }

    #[test]
    fn test_public_url_override() {
        let config = S3Config {
            endpoint: Some("https://api.storage.example.net".to_string()),
            bucket: Some("menus".to_string()),
            access_key_id: Some("ak".to_string()),
            secret_access_key: Some("sk".to_string()),
            public_url: Some("https://storage.example.net/menus/".to_string()),
            ..Default::default()
        };
        let store = S3Store::minio(&config).unwrap();
        assert_eq!(
            store.public_url_for("uploads/1/a.jpg"),
            "https://storage.example.net/menus/uploads/1/a.jpg"
        );
    }

    #[test]
    fn test_aws_virtual_host_url() {
        let config = S3Config {
            bucket: Some("menus".to_string()),
            region: Some("sa-east-1".to_string()),
            access_key_id: Some("ak".to_string()),
            secret_access_key: Some("sk".to_string()),
            ..Default::default()
        };
        let store = S3Store::aws(&config).unwrap();
        assert_eq!(store.addressing, Addressing::VirtualHost);
        assert_eq!(
            store.public_url_for("uploads/1/a.jpg"),
            "https://menus.s3.sa-east-1.amazonaws.com/uploads/1/a.jpg"
        );
    }

    #[test]
    fn test_minio_requires_endpoint() {
        std::env::remove_var("MINIO_ENDPOINT");
        let err = S3Store::minio(&S3Config::default()).err().unwrap();
        assert!(err.to_string().contains("MINIO_ENDPOINT"));
    }
}
