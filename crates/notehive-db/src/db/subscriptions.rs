//! Subscription store: the system of record for push delivery endpoints.
//!
//! Subscriptions live in the metadata store, not process memory, so
//! restarts do not lose registrations and multiple service instances share
//! state.

use chrono::{DateTime, Utc};
use notehive_core::models::NotificationSubscription;
use notehive_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Register an endpoint. Re-registering an existing endpoint updates its
    /// owner instead of duplicating it.
    async fn upsert(
        &self,
        endpoint: &str,
        owner_identity: Option<String>,
    ) -> Result<NotificationSubscription, AppError>;

    async fn list_active(&self) -> Result<Vec<NotificationSubscription>, AppError>;

    /// Remove an endpoint reported permanently invalid by the delivery
    /// provider. Returns whether it was present.
    async fn remove_by_endpoint(&self, endpoint: &str) -> Result<bool, AppError>;
}

/// Row type for the notification_subscriptions table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    endpoint: String,
    owner_identity: Option<String>,
    created_at: DateTime<Utc>,
}

impl SubscriptionRow {
    fn into_subscription(self) -> NotificationSubscription {
        NotificationSubscription {
            id: self.id,
            endpoint: self.endpoint,
            owner_identity: self.owner_identity,
            created_at: self.created_at,
        }
    }
}

/// Postgres-backed subscription store.
#[derive(Clone)]
pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    #[tracing::instrument(skip(self, endpoint), fields(db.table = "notification_subscriptions", db.operation = "upsert"))]
    async fn upsert(
        &self,
        endpoint: &str,
        owner_identity: Option<String>,
    ) -> Result<NotificationSubscription, AppError> {
        let row: SubscriptionRow = sqlx::query_as::<Postgres, SubscriptionRow>(
            r#"
            INSERT INTO notification_subscriptions (id, endpoint, owner_identity, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (endpoint)
            DO UPDATE SET owner_identity = EXCLUDED.owner_identity
            RETURNING id, endpoint, owner_identity, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(endpoint)
        .bind(owner_identity)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_subscription())
    }

    #[tracing::instrument(skip(self), fields(db.table = "notification_subscriptions", db.operation = "select"))]
    async fn list_active(&self) -> Result<Vec<NotificationSubscription>, AppError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as::<Postgres, SubscriptionRow>(
            "SELECT id, endpoint, owner_identity, created_at \
             FROM notification_subscriptions ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(SubscriptionRow::into_subscription)
            .collect())
    }

    #[tracing::instrument(skip(self, endpoint), fields(db.table = "notification_subscriptions", db.operation = "delete"))]
    async fn remove_by_endpoint(&self, endpoint: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM notification_subscriptions WHERE endpoint = $1")
            .bind(endpoint)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
