//! Application state and sub-state extractors.
//!
//! AppState is split into domain sub-states so handlers can extract only what
//! they need via Axum's `FromRef`, and to avoid a single god object.

use notehive_core::Config;
use notehive_db::{FileRecordStore, SubscriptionStore};
use notehive_infra::PushService;
use notehive_storage::StorageRouter;
use sqlx::PgPool;
use std::sync::Arc;

use crate::services::ingest::IngestService;

// ----- Sub-state types -----

#[derive(Clone)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub timeout_seconds: u64,
}

/// Database pool and connection settings.
#[derive(Clone)]
#[allow(dead_code)] // Used via FromRef and in setup::services; not all fields referenced in every build
pub struct DbState {
    pub pool: PgPool,
    pub database: DatabaseConfig,
}

/// The catalogue: record store, storage routing, ingest service, and upload limits.
#[derive(Clone)]
pub struct CatalogState {
    pub records: Arc<dyn FileRecordStore>,
    pub storage: Arc<StorageRouter>,
    pub ingest: IngestService,
    pub max_file_size: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
}

/// Push delivery and the subscription registry.
#[derive(Clone)]
#[allow(dead_code)] // Used via FromRef and in setup::services; not all fields referenced in every build
pub struct PushState {
    pub service: Option<PushService>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
}

/// Static bearer identity table.
#[derive(Clone)]
pub struct AuthState {
    pub require_identity: bool,
    /// (subject, token) pairs.
    pub tokens: Vec<(String, String)>,
}

// ----- AppState -----

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub catalog: CatalogState,
    pub push: PushState,
    pub auth: AuthState,
    pub config: Config,
    pub is_production: bool,
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for CatalogState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.catalog.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for PushState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.push.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for AuthState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.auth.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
