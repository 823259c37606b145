//! Notehive DB Library
//!
//! Metadata store implementations: Postgres repositories behind narrow store
//! traits, plus in-memory twins used by tests and scratch deployments.

pub mod db;

pub use db::file_records::{FileRecordStore, PgFileRecordStore, RecordFilter};
pub use db::memory::{InMemoryFileRecordStore, InMemorySubscriptionStore};
pub use db::subscriptions::{PgSubscriptionStore, SubscriptionStore};
pub use db::MIGRATOR;
