use crate::auth::OwnerIdentity;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, Json};
use notehive_core::models::SubscriptionResponse;
use notehive_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveTokenRequest {
    /// Push registration token (delivery endpoint identifier).
    pub token: Option<String>,
}

#[utoipa::path(
    post,
    path = "/save-token",
    tag = "notifications",
    request_body = SaveTokenRequest,
    responses(
        (status = 200, description = "Subscription registered", body = SubscriptionResponse),
        (status = 400, description = "Missing token", body = ErrorResponse),
        (status = 401, description = "Identity required", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, identity, request), fields(operation = "save_token"))]
pub async fn save_token(
    State(state): State<Arc<AppState>>,
    identity: OwnerIdentity,
    Json(request): Json<SaveTokenRequest>,
) -> Result<Json<SubscriptionResponse>, HttpAppError> {
    let token = request
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing token".to_string()))?;

    let subscription = state.push.subscriptions.upsert(&token, identity.0).await?;

    tracing::info!(subscription_id = %subscription.id, "Subscription registered");

    Ok(Json(SubscriptionResponse::from(subscription)))
}
