//! In-memory store implementations.
//!
//! Used by tests and by single-node scratch deployments that do not want a
//! database. Semantics match the Postgres stores: recency-ordered listings,
//! optional owner/program filters, endpoint-unique subscriptions.

use crate::db::file_records::{FileRecordStore, RecordFilter};
use crate::db::subscriptions::SubscriptionStore;
use chrono::Utc;
use notehive_core::models::{FileRecord, NotificationSubscription};
use notehive_core::{AppError, StorageBackend};
use std::sync::Mutex;
use uuid::Uuid;

/// In-memory file record store.
#[derive(Default)]
pub struct InMemoryFileRecordStore {
    records: Mutex<Vec<FileRecord>>,
}

impl InMemoryFileRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl FileRecordStore for InMemoryFileRecordStore {
    async fn insert(&self, record: &FileRecord) -> Result<(), AppError> {
        let mut records = self.records.lock().expect("record store poisoned");
        if records.iter().any(|r| r.id == record.id) {
            return Err(AppError::Internal(format!(
                "Duplicate record id {}",
                record.id
            )));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<FileRecord>, AppError> {
        let records = self.records.lock().expect("record store poisoned");
        let mut matching: Vec<FileRecord> = records
            .iter()
            .filter(|r| {
                filter
                    .owner
                    .as_ref()
                    .map_or(true, |owner| r.owner_identity.as_ref() == Some(owner))
            })
            .filter(|r| filter.program.as_ref().map_or(true, |p| &r.program == p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(a.id.cmp(&b.id)));

        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let mut matching: Vec<FileRecord> = matching.into_iter().skip(offset).collect();
        if let Some(limit) = filter.limit {
            matching.truncate(limit.max(0) as usize);
        }
        Ok(matching)
    }

    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let records = self.records.lock().expect("record store poisoned");
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_location(
        &self,
        backend: StorageBackend,
        storage_key: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        let records = self.records.lock().expect("record store poisoned");
        Ok(records
            .iter()
            .find(|r| r.storage_backend == backend && r.storage_key == storage_key)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut records = self.records.lock().expect("record store poisoned");
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }

    async fn count(&self) -> Result<i64, AppError> {
        let records = self.records.lock().expect("record store poisoned");
        Ok(records.len() as i64)
    }
}

/// In-memory subscription store.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    subscriptions: Mutex<Vec<NotificationSubscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn upsert(
        &self,
        endpoint: &str,
        owner_identity: Option<String>,
    ) -> Result<NotificationSubscription, AppError> {
        let mut subscriptions = self.subscriptions.lock().expect("subscription store poisoned");
        if let Some(existing) = subscriptions.iter_mut().find(|s| s.endpoint == endpoint) {
            existing.owner_identity = owner_identity;
            return Ok(existing.clone());
        }
        let subscription = NotificationSubscription {
            id: Uuid::new_v4(),
            endpoint: endpoint.to_string(),
            owner_identity,
            created_at: Utc::now(),
        };
        subscriptions.push(subscription.clone());
        Ok(subscription)
    }

    async fn list_active(&self) -> Result<Vec<NotificationSubscription>, AppError> {
        let subscriptions = self.subscriptions.lock().expect("subscription store poisoned");
        Ok(subscriptions.clone())
    }

    async fn remove_by_endpoint(&self, endpoint: &str) -> Result<bool, AppError> {
        let mut subscriptions = self.subscriptions.lock().expect("subscription store poisoned");
        let before = subscriptions.len();
        subscriptions.retain(|s| s.endpoint != endpoint);
        Ok(subscriptions.len() < before)
    }
}
