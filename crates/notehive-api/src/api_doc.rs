//! OpenAPI document assembly.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Notehive API",
        description = "Notes catalogue: classified uploads, recency-ordered metadata, multi-backend retrieval, and push notifications"
    ),
    paths(
        crate::handlers::upload::upload_file,
        crate::handlers::metadata::list_metadata,
        crate::handlers::files::download_file,
        crate::handlers::files::delete_file,
        crate::handlers::subscriptions::save_token,
        crate::handlers::health::health,
    ),
    components(schemas(
        crate::handlers::upload::UploadResponse,
        crate::handlers::files::DeleteResponse,
        crate::handlers::subscriptions::SaveTokenRequest,
        crate::handlers::health::HealthResponse,
        crate::error::ErrorResponse,
        notehive_core::models::FileRecordResponse,
        notehive_core::models::SubscriptionResponse,
    )),
    tags(
        (name = "catalogue", description = "Upload, listing, and retrieval"),
        (name = "notifications", description = "Push subscription registration"),
        (name = "health", description = "Liveness and readiness"),
    )
)]
pub struct ApiDoc;
