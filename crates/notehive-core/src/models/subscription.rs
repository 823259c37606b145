use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A registered push delivery endpoint.
///
/// The endpoint identifier is unique within the active set. A subscription
/// is created on client registration and removed when delivery reports the
/// endpoint as permanently invalid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSubscription {
    pub id: Uuid,
    /// Opaque delivery endpoint (push token or subscription descriptor).
    pub endpoint: String,
    pub owner_identity: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// API projection of a subscription registration.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub endpoint: String,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationSubscription> for SubscriptionResponse {
    fn from(sub: NotificationSubscription) -> Self {
        SubscriptionResponse {
            id: sub.id,
            endpoint: sub.endpoint,
            created_at: sub.created_at,
        }
    }
}
