use super::base::{StorageBackend, StorageError};
use crate::profile::ProfileRecord;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

/// Keeps the persisted records in memory; clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    records: Arc<RwLock<Vec<ProfileRecord>>>,
    fail_with: Option<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A storage whose every `persist` fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<ProfileRecord> {
        self.records.read().clone()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn persist(&self, records: &[ProfileRecord]) -> Result<(), StorageError> {
        if let Some(reason) = &self.fail_with {
            return Err(StorageError::OperationError(reason.clone()));
        }
        *self.records.write() = records.to_vec();
        Ok(())
    }
}
