use crate::auth::OwnerIdentity;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::ingest::Resolved;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, Response, StatusCode},
    response::{IntoResponse, Redirect},
    Json,
};
use futures::StreamExt;
use notehive_core::{AppError, StorageBackend};
use notehive_storage::ByteStream;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
    pub id: Uuid,
}

/// Build a streaming file response with download headers.
fn stream_response(
    stream: ByteStream,
    content_type: &str,
    filename: &str,
) -> Result<Response<Body>, HttpAppError> {
    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    let content_disposition = format!("attachment; filename=\"{}\"", filename.replace('"', ""));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, content_disposition.as_str())
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from_stream(body_stream))
        .map_err(|e| HttpAppError(AppError::Internal(format!("Failed to build response: {}", e))))
}

#[utoipa::path(
    get,
    path = "/api/files/{id}/file",
    tag = "catalogue",
    params(("id" = Uuid, Path, description = "File record ID")),
    responses(
        (status = 200, description = "File bytes", content_type = "application/octet-stream"),
        (status = 307, description = "Redirect to the backend's public or signed URL"),
        (status = 404, description = "Unknown record, or backing object gone", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(record_id = %id, operation = "download_file"))]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, HttpAppError> {
    let (_record, resolved) = state.catalog.ingest.resolve(id).await?;

    match resolved {
        Resolved::Redirect(url) => Ok(Redirect::temporary(&url).into_response()),
        Resolved::Stream {
            stream,
            content_type,
            filename,
        } => Ok(stream_response(stream, &content_type, &filename)?.into_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "catalogue",
    params(("id" = Uuid, Path, description = "File record ID")),
    responses(
        (status = 200, description = "Metadata row removed", body = DeleteResponse),
        (status = 401, description = "Identity required", body = ErrorResponse),
        (status = 404, description = "Unknown record", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _identity), fields(record_id = %id, operation = "delete_file"))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    _identity: OwnerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, HttpAppError> {
    state.catalog.ingest.remove(id).await?;

    Ok(Json(DeleteResponse {
        message: "File record deleted".to_string(),
        id,
    }))
}

/// Serve a local-backend object by its storage key. The storage layer
/// rejects traversal outside the upload directory.
#[tracing::instrument(skip(state), fields(operation = "serve_upload"))]
pub async fn serve_upload(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response<Body>, HttpAppError> {
    let backend = state.catalog.storage.get(StorageBackend::Local)?;
    let stream = backend.download_stream(&key).await?;

    let filename = key.rsplit('/').next().unwrap_or("file").to_string();
    stream_response(stream, content_type_for_key(&key), &filename)
}

/// Stream a drive object through this service. Only objects a catalogued
/// record references are served; the drive requires authenticated access the
/// browser cannot perform itself.
#[tracing::instrument(skip(state), fields(operation = "drive_proxy"))]
pub async fn drive_proxy(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response<Body>, HttpAppError> {
    let record = state
        .catalog
        .records
        .find_by_location(StorageBackend::Drive, &key)
        .await?
        .ok_or_else(|| AppError::NotFound("File record not found".to_string()))?;

    let backend = state.catalog.storage.get(StorageBackend::Drive)?;
    let stream = backend.download_stream(&key).await?;

    stream_response(stream, &record.content_type, &record.filename)
}

/// Content type inferred from the key's extension, for the local serving
/// route where no record lookup happens.
fn content_type_for_key(key: &str) -> &'static str {
    let lower = key.to_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".pptx") {
        "application/vnd.openxmlformats-officedocument.presentationml.presentation"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for_key() {
        assert_eq!(content_type_for_key("Basics/1/Math/1-a-notes.pdf"), "application/pdf");
        assert_eq!(content_type_for_key("a/b/slides.PPTX"), "application/vnd.openxmlformats-officedocument.presentationml.presentation");
        assert_eq!(content_type_for_key("a/b/raw.bin"), "application/octet-stream");
    }
}
