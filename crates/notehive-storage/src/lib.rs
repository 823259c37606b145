//! Notehive Storage Library
//!
//! This crate provides the storage abstraction and backend implementations
//! for Notehive: local filesystem, S3-compatible object storage, and a
//! third-party drive reached over its HTTP API.
//!
//! # Storage key format
//!
//! Keys are hierarchical grouping paths:
//! `{program}/{semester}/{subject}/{millis}-{record_id}-{sanitized_name}`.
//! Collision avoidance is by construction (timestamp + record id), never by
//! existence-checking. Keys must not contain `..` or a leading `/`. Key
//! generation is centralized in the `keys` module.
//!
//! The drive backend is the one exception to "key in = locator out": the
//! provider assigns its own file id on upload, and that id becomes the
//! stored locator.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod router;
#[cfg(feature = "storage-s3")]
pub mod s3;
#[cfg(feature = "storage-drive")]
pub mod drive;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-drive")]
pub use drive::DriveStorage;
pub use factory::create_storage_router;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use notehive_core::StorageBackend;
pub use router::StorageRouter;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult, StoredObject};
