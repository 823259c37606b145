//! Route table and middleware layers.

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post},
    Json, Router,
};
use notehive_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Multipart framing overhead allowed on top of the file size cap.
const UPLOAD_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router> {
    let cors = build_cors_layer(config)?;
    let body_limit = config.max_file_size_bytes() + UPLOAD_OVERHEAD_BYTES;

    let router = Router::new()
        .route("/upload", post(handlers::upload::upload_file))
        .route("/api/metadata", get(handlers::metadata::list_metadata))
        .route("/api/files/{id}/file", get(handlers::files::download_file))
        .route("/api/files/{id}", delete(handlers::files::delete_file))
        .route("/uploads/{*key}", get(handlers::files::serve_upload))
        .route("/files/drive/{key}", get(handlers::files::drive_proxy))
        .route("/save-token", post(handlers::subscriptions::save_token))
        .route("/health", get(handlers::health::health))
        .route("/api/docs/openapi.json", get(openapi_json))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn build_cors_layer(config: &Config) -> Result<CorsLayer> {
    let origins = config.cors_origins();

    if origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", o))
        })
        .collect::<Result<_>>()?;

    Ok(CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(Any)
        .allow_headers(Any))
}
