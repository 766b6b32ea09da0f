use super::base::{StorageBackend, StorageError};
use crate::profile::ProfileRecord;
use async_trait::async_trait;
use log::info;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Writes a run's output as one pretty-printed UTF-8 JSON document.
#[derive(Clone, Debug)]
pub struct DiskStorage {
    path: PathBuf,
}

impl DiskStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), StorageError> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        value.serialize(&mut serializer)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, buffer).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for DiskStorage {
    async fn persist(&self, records: &[ProfileRecord]) -> Result<(), StorageError> {
        self.write_json(records).await?;
        info!("Saved {} profiles to {}", records.len(), self.path.display());
        Ok(())
    }
}
