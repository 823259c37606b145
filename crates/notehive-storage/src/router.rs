//! Size-based storage routing.
//!
//! One backend is the default for all uploads; optionally, files strictly
//! larger than a threshold route to a higher-capacity overflow backend. The
//! router also dispatches retrieval: a record's backend tag looks up the
//! backend that realized it.

use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use std::collections::HashMap;
use std::sync::Arc;

/// Routes uploads to a backend by size and looks backends up by tag.
pub struct StorageRouter {
    backends: HashMap<StorageBackend, Arc<dyn Storage>>,
    default_backend: StorageBackend,
    overflow: Option<OverflowRoute>,
}

/// Overflow routing rule: files strictly larger than `threshold_bytes` go to
/// `backend`.
#[derive(Debug, Clone, Copy)]
pub struct OverflowRoute {
    pub threshold_bytes: u64,
    pub backend: StorageBackend,
}

impl StorageRouter {
    pub fn new(
        default_backend: StorageBackend,
        backends: HashMap<StorageBackend, Arc<dyn Storage>>,
    ) -> StorageResult<Self> {
        if !backends.contains_key(&default_backend) {
            return Err(StorageError::ConfigError(format!(
                "Default storage backend '{}' is not configured",
                default_backend
            )));
        }
        Ok(StorageRouter {
            backends,
            default_backend,
            overflow: None,
        })
    }

    /// Add an overflow route. The overflow backend must be configured.
    pub fn with_overflow(
        mut self,
        threshold_bytes: u64,
        backend: StorageBackend,
    ) -> StorageResult<Self> {
        if !self.backends.contains_key(&backend) {
            return Err(StorageError::ConfigError(format!(
                "Overflow storage backend '{}' is not configured",
                backend
            )));
        }
        self.overflow = Some(OverflowRoute {
            threshold_bytes,
            backend,
        });
        Ok(self)
    }

    /// Pick the backend for an upload of the given size.
    pub fn select(&self, size_bytes: usize) -> &Arc<dyn Storage> {
        let backend = match self.overflow {
            Some(route) if size_bytes as u64 > route.threshold_bytes => route.backend,
            _ => self.default_backend,
        };
        // Both tags were verified present at construction.
        &self.backends[&backend]
    }

    /// Look up the backend that realized an existing record.
    pub fn get(&self, backend: StorageBackend) -> StorageResult<&Arc<dyn Storage>> {
        self.backends.get(&backend).ok_or_else(|| {
            StorageError::ConfigError(format!(
                "Storage backend '{}' is not configured in this deployment",
                backend
            ))
        })
    }

    pub fn default_backend(&self) -> StorageBackend {
        self.default_backend
    }

    pub fn overflow(&self) -> Option<OverflowRoute> {
        self.overflow
    }
}
