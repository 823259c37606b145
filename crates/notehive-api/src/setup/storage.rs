//! Storage backend setup.

use anyhow::Result;
use notehive_core::Config;
use notehive_storage::{create_storage_router, StorageRouter};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<StorageRouter>> {
    let router = create_storage_router(config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize storage: {}", e))?;

    tracing::info!(
        default_backend = %router.default_backend(),
        overflow_threshold_bytes = ?router.overflow().map(|o| o.threshold_bytes),
        "Storage ready"
    );

    Ok(Arc::new(router))
}
