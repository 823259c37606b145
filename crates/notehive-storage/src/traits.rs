//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must
//! implement. Adding a backend means adding one variant implementation; the
//! upload router's control flow never changes.

use bytes::Bytes;
use futures::Stream;
use notehive_core::StorageBackend;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A stream of downloaded byte chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Outcome of a successful `put`.
///
/// For path-addressable backends `key` echoes the requested storage key.
/// The drive backend returns the provider-assigned file id instead; that id
/// is what must be persisted as the record's locator.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

/// Storage abstraction trait
///
/// All storage backends (local filesystem, S3, drive) implement this trait.
/// The upload router constructs the storage key; backends only realize it.
///
/// A record's `(backend_type, key)` pair is sufficient to retrieve the
/// bytes, and `public_url` reconstructs the retrieval URL from the key
/// alone.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Write bytes at the given key and return the stored locator plus the
    /// externally resolvable URL.
    async fn put(
        &self,
        storage_key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<StoredObject>;

    /// Download a file by its storage key
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Download a file as a stream of `Bytes` chunks (for large files)
    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Delete a file by its storage key. Deleting an absent object is not an
    /// error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Reconstruct the externally resolvable URL for a storage key.
    ///
    /// For backends without a public address this is a proxy path through
    /// the service.
    fn public_url(&self, storage_key: &str) -> String;

    /// Generate a temporary URL for direct access. Backends without signed
    /// access return the public URL.
    async fn presigned_url(
        &self,
        storage_key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Ok(self.public_url(storage_key))
    }

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Whether `public_url` can be fetched by a browser directly, or must be
    /// dereferenced through this service's streaming proxy.
    fn serves_publicly(&self) -> bool;
}
