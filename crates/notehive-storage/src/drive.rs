//! Third-party drive backend.
//!
//! Files live in a provider account reached over its HTTP API with a bearer
//! token. The provider assigns its own file id on upload; that id is the
//! stored locator. The provider exposes no unauthenticated URL, so
//! `public_url` points at this service's streaming proxy route. OAuth token
//! acquisition happens outside the service; the token is configuration.

use crate::traits::{ByteStream, Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// File resource subset returned by the provider.
#[derive(Debug, Deserialize)]
struct DriveFileResource {
    id: String,
}

/// Drive storage implementation over the provider's HTTP API.
#[derive(Clone)]
pub struct DriveStorage {
    client: reqwest::Client,
    api_base_url: String,
    upload_base_url: String,
    access_token: String,
    folder_id: Option<String>,
    public_base_url: String,
}

impl DriveStorage {
    /// Create a new DriveStorage instance.
    ///
    /// # Arguments
    /// * `api_base_url` - Metadata/content API base (e.g. ".../drive/v3")
    /// * `upload_base_url` - Upload API base (e.g. ".../upload/drive/v3")
    /// * `access_token` - Bearer token with file scope
    /// * `folder_id` - Optional parent folder for all uploads
    /// * `public_base_url` - This service's external base URL, used for proxy URLs
    /// * `timeout` - Per-request timeout
    pub fn new(
        api_base_url: String,
        upload_base_url: String,
        access_token: String,
        folder_id: Option<String>,
        public_base_url: String,
        timeout: Duration,
    ) -> StorageResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                StorageError::ConfigError(format!("Failed to create drive HTTP client: {}", e))
            })?;

        Ok(DriveStorage {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            upload_base_url: upload_base_url.trim_end_matches('/').to_string(),
            access_token,
            folder_id,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.api_base_url, urlencoding::encode(file_id))
    }
}

/// Assemble a multipart/related upload body: a JSON metadata part followed
/// by the media part, as the provider's multipart upload protocol requires.
fn build_multipart_related(
    metadata_json: &str,
    content_type: &str,
    data: &[u8],
    boundary: &str,
) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + metadata_json.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata_json}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: {content_type}\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[async_trait::async_trait]
impl Storage for DriveStorage {
    async fn put(
        &self,
        storage_key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<StoredObject> {
        let size = data.len();
        let start = std::time::Instant::now();

        // The provider has no path hierarchy; the full key becomes the file name.
        let metadata = match &self.folder_id {
            Some(folder) => serde_json::json!({ "name": storage_key, "parents": [folder] }),
            None => serde_json::json!({ "name": storage_key }),
        };
        let metadata_json = metadata.to_string();

        let boundary = format!("notehive-{}", Uuid::new_v4().simple());
        let body = build_multipart_related(&metadata_json, content_type, &data, &boundary);

        let url = format!(
            "{}/files?uploadType=multipart&fields=id",
            self.upload_base_url
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .header(
                "Content-Type",
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Drive upload request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Drive upload failed"
            );
            return Err(StorageError::UploadFailed(format!(
                "Drive upload returned {}: {}",
                status, body_text
            )));
        }

        let resource: DriveFileResource = response
            .json()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Invalid drive response: {}", e)))?;

        tracing::info!(
            key = %storage_key,
            file_id = %resource.id,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Drive upload successful"
        );

        let url = self.public_url(&resource.id);
        Ok(StoredObject {
            key: resource.id,
            url,
        })
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let url = format!("{}?alt=media", self.file_url(storage_key));

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                StorageError::DownloadFailed(format!("Drive download request failed: {}", e))
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }
        if !response.status().is_success() {
            return Err(StorageError::DownloadFailed(format!(
                "Drive download returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        let url = format!("{}?alt=media", self.file_url(storage_key));

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                StorageError::DownloadFailed(format!("Drive download request failed: {}", e))
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }
        if !response.status().is_success() {
            return Err(StorageError::DownloadFailed(format!(
                "Drive download returned {}",
                response.status()
            )));
        }

        let key = storage_key.to_string();
        let stream = response.bytes_stream().map(move |res| {
            res.map_err(|e| {
                tracing::error!(key = %key, error = %e, "Drive stream download error");
                StorageError::DownloadFailed(e.to_string())
            })
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let response = self
            .client
            .delete(self.file_url(storage_key))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(format!("Drive delete request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            tracing::info!(key = %storage_key, "Drive delete successful");
            Ok(())
        } else {
            Err(StorageError::DeleteFailed(format!(
                "Drive delete returned {}",
                status
            )))
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let url = format!("{}?fields=id", self.file_url(storage_key));

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| StorageError::BackendError(format!("Drive head request failed: {}", e)))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            status => Err(StorageError::BackendError(format!(
                "Drive metadata lookup returned {}",
                status
            ))),
        }
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!(
            "{}/files/drive/{}",
            self.public_base_url,
            urlencoding::encode(storage_key)
        )
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Drive
    }

    fn serves_publicly(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_storage() -> DriveStorage {
        DriveStorage::new(
            "https://www.googleapis.com/drive/v3".to_string(),
            "https://www.googleapis.com/upload/drive/v3".to_string(),
            "test-token".to_string(),
            Some("folder123".to_string()),
            "http://localhost:3000/".to_string(),
            Duration::from_secs(10),
        )
        .unwrap()
    }

    #[test]
    fn test_public_url_is_a_proxy_path() {
        let storage = test_storage();
        assert_eq!(
            storage.public_url("abc123"),
            "http://localhost:3000/files/drive/abc123"
        );
        assert!(!storage.serves_publicly());
    }

    #[test]
    fn test_multipart_related_body_shape() {
        let body = build_multipart_related(
            r#"{"name":"Basics/1/Math/1-a-notes.pdf"}"#,
            "application/pdf",
            b"%PDF-1.4",
            "boundary42",
        );
        let text = String::from_utf8_lossy(&body);

        assert!(text.starts_with("--boundary42\r\n"));
        assert!(text.contains("Content-Type: application/json; charset=UTF-8"));
        assert!(text.contains(r#""name":"Basics/1/Math/1-a-notes.pdf""#));
        assert!(text.contains("Content-Type: application/pdf"));
        assert!(text.contains("%PDF-1.4"));
        assert!(text.ends_with("--boundary42--\r\n"));
    }

    #[test]
    fn test_file_url_encodes_the_locator() {
        let storage = test_storage();
        assert_eq!(
            storage.file_url("abc 123"),
            "https://www.googleapis.com/drive/v3/files/abc%20123"
        );
    }
}
