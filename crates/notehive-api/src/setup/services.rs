//! Service and store wiring.

use anyhow::{Context, Result};
use notehive_core::Config;
use notehive_db::{
    FileRecordStore, PgFileRecordStore, PgSubscriptionStore, SubscriptionStore,
};
use notehive_infra::{PushService, PushServiceConfig};
use notehive_storage::StorageRouter;
use sqlx::PgPool;
use std::sync::Arc;

use crate::services::ingest::IngestService;
use crate::state::{AppState, AuthState, CatalogState, DatabaseConfig, DbState, PushState};

pub async fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<StorageRouter>,
) -> Result<Arc<AppState>> {
    let records: Arc<dyn FileRecordStore> = Arc::new(PgFileRecordStore::new(pool.clone()));
    let subscriptions: Arc<dyn SubscriptionStore> =
        Arc::new(PgSubscriptionStore::new(pool.clone()));

    let push_service = if config.push_enabled() {
        let server_key = config
            .push_server_key()
            .context("PUSH_SERVER_KEY must be set when PUSH_ENABLED is true")?
            .to_string();
        let service = PushService::new(
            subscriptions.clone(),
            PushServiceConfig {
                api_url: config.push_api_url().to_string(),
                server_key,
                timeout_seconds: config.push_timeout_seconds(),
                max_concurrent_deliveries: config.push_max_concurrent_deliveries(),
            },
        )
        .context("Failed to initialize push service")?;
        tracing::info!("Push notifications enabled");
        Some(service)
    } else {
        tracing::info!("Push notifications disabled (PUSH_ENABLED not set to true)");
        None
    };

    let ingest = IngestService::new(records.clone(), storage.clone(), push_service.clone());

    let state = AppState {
        db: DbState {
            pool,
            database: DatabaseConfig {
                max_connections: config.db_max_connections(),
                timeout_seconds: config.db_timeout_seconds(),
            },
        },
        catalog: CatalogState {
            records,
            storage,
            ingest,
            max_file_size: config.max_file_size_bytes(),
            allowed_extensions: config.allowed_extensions().to_vec(),
            allowed_content_types: config.allowed_content_types().to_vec(),
        },
        push: PushState {
            service: push_service,
            subscriptions,
        },
        auth: AuthState {
            require_identity: config.auth_required(),
            tokens: config.auth_tokens().to_vec(),
        },
        config: config.clone(),
        is_production: config.is_production(),
    };

    tracing::debug!(
        is_production = state.is_production,
        "Application state initialized"
    );

    Ok(Arc::new(state))
}
