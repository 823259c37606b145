use crate::auth::OwnerIdentity;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::ingest::UploadRequest;
use crate::state::AppState;
use crate::validation::{validate_content_type, validate_file_extension, validate_file_size};
use axum::{
    extract::{Multipart, State},
    Json,
};
use notehive_core::AppError;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub id: Uuid,
    pub url: String,
}

/// One parsed multipart upload form.
struct UploadForm {
    program: String,
    semester: String,
    subject: String,
    data: Vec<u8>,
    filename: String,
    content_type: String,
}

/// Extract classification fields and the file part from a multipart form.
/// Only one field named "file" is accepted; multiple file fields are rejected.
async fn extract_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut program = String::new();
    let mut semester = String::new();
    let mut subject = String::new();
    let mut file: Option<(Vec<u8>, String, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            "program" => {
                program = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read program field: {}", e))
                })?;
            }
            "semester" => {
                semester = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read semester field: {}", e))
                })?;
            }
            "subject" => {
                subject = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read subject field: {}", e))
                })?;
            }
            "file" => {
                if file.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }
                let filename = field
                    .file_name()
                    .map(|s: &str| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let content_type = field
                    .content_type()
                    .map(|s: &str| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read file data: {}", e))
                })?;
                file = Some((data.to_vec(), filename, content_type));
            }
            _ => {}
        }
    }

    let (data, filename, content_type) =
        file.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    Ok(UploadForm {
        program,
        semester,
        subject,
        data,
        filename,
        content_type,
    })
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "catalogue",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File catalogued", body = UploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Identity required", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = ErrorResponse)
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    identity: OwnerIdentity,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let form = extract_upload_form(multipart).await?;

    validate_file_size(form.data.len(), state.catalog.max_file_size)?;
    validate_file_extension(&form.filename, &state.catalog.allowed_extensions)?;
    validate_content_type(&form.content_type, &state.catalog.allowed_content_types)?;

    let record = state
        .catalog
        .ingest
        .ingest(UploadRequest {
            program: form.program,
            semester: form.semester,
            subject: form.subject,
            data: form.data,
            filename: form.filename,
            content_type: form.content_type,
            owner_identity: identity.0,
        })
        .await?;

    Ok(Json(UploadResponse {
        message: "Upload successful".to_string(),
        id: record.id,
        url: record.url,
    }))
}
