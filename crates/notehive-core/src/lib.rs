//! Notehive Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! classification rules shared across all Notehive components.

pub mod classification;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use classification::{is_valid_program, Classification};
pub use config::{BaseConfig, Config, PortalConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
