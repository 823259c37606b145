use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use notehive_core::models::FileRecordResponse;
use notehive_db::RecordFilter;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, Deserialize, IntoParams)]
pub struct MetadataQuery {
    /// Narrow to records uploaded by this identity.
    pub owner: Option<String>,
    /// Narrow to records with this exact program value.
    pub program: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/metadata",
    tag = "catalogue",
    params(MetadataQuery),
    responses(
        (status = 200, description = "Catalogued records, most recent first", body = [FileRecordResponse]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "list_metadata"))]
pub async fn list_metadata(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MetadataQuery>,
) -> Result<Json<Vec<FileRecordResponse>>, HttpAppError> {
    let filter = RecordFilter {
        owner: query.owner,
        program: query.program,
        limit: query.limit.map(|l| l.clamp(0, MAX_PAGE_SIZE)),
        offset: query.offset.map(|o| o.max(0)),
    };

    let records = state.catalog.ingest.list(&filter).await?;

    Ok(Json(
        records.into_iter().map(FileRecordResponse::from).collect(),
    ))
}
