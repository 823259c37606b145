use crate::router::StorageRouter;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use notehive_core::Config;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Create the storage router from configuration.
///
/// Builds the default backend plus, when an overflow threshold is set, the
/// overflow backend, and wires the size-based routing rule between them.
pub async fn create_storage_router(config: &Config) -> StorageResult<StorageRouter> {
    let default_backend = config.storage_backend().unwrap_or(StorageBackend::Local);

    let mut backends: HashMap<StorageBackend, Arc<dyn Storage>> = HashMap::new();
    backends.insert(
        default_backend,
        create_backend(config, default_backend).await?,
    );

    let overflow = match (
        config.storage_overflow_threshold_bytes(),
        config.storage_overflow_backend(),
    ) {
        (Some(threshold), Some(backend)) => {
            if backend != default_backend {
                backends.insert(backend, create_backend(config, backend).await?);
            }
            Some((threshold, backend))
        }
        _ => None,
    };

    let router = StorageRouter::new(default_backend, backends)?;
    match overflow {
        Some((threshold, backend)) => router.with_overflow(threshold, backend),
        None => Ok(router),
    }
}

/// Create a single storage backend based on configuration
pub async fn create_backend(
    config: &Config,
    backend: StorageBackend,
) -> StorageResult<Arc<dyn Storage>> {
    match backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region().map(String::from).ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let endpoint = config.s3_endpoint().map(String::from);

            let storage =
                crate::S3Storage::new(bucket, region, endpoint, config.s3_public_bucket()).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .unwrap_or_else(|| format!("{}/uploads", config.public_base_url()));

            let storage = crate::LocalStorage::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-drive")]
        StorageBackend::Drive => {
            let access_token = config
                .drive_access_token()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("DRIVE_ACCESS_TOKEN not configured".to_string())
                })?;

            let storage = crate::DriveStorage::new(
                config.drive_api_base_url().to_string(),
                config.drive_upload_base_url().to_string(),
                access_token,
                config.drive_folder_id().map(String::from),
                config.public_base_url().to_string(),
                Duration::from_secs(30),
            )?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-drive"))]
        StorageBackend::Drive => Err(StorageError::ConfigError(
            "Drive storage backend not available (storage-drive feature not enabled)".to_string(),
        )),
    }
}
