//! # JSON File Storage
//!
//! File-based `KeyValueStorage` keeping every entry in a single JSON object
//! file inside the data directory.
//!
//! ## File Structure
//!
//! ```text
//! data/
//! ├── config.yaml      (optional)
//! ├── storage.json     ← This module manages this file
//! └── exports/
//! ```
//!
//! ## File Format
//!
//! ```json
//! {
//!   "choir_attendance_2024-01-15": "[{\"regNo\":\"001\",...}]",
//!   "choir_member_names": "{\"001\":\"Anna\"}",
//!   "darkMode": "true"
//! }
//! ```
//!
//! Values are stored as opaque strings, exactly as the domain layer wrote
//! them. Every write re-reads the file, so two processes sharing the same
//! directory behave last-write-wins.

use log::{debug, info};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::traits::{entry_size, KeyValueStorage, StorageError};

pub const STORAGE_FILE_NAME: &str = "storage.json";

#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    file_path: PathBuf,
    quota_bytes: Option<usize>,
}

impl JsonFileStorage {
    /// Open (or lazily create) `storage.json` inside `base_directory`
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self, StorageError> {
        let base_path = base_directory.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
            info!("Created data directory: {:?}", base_path);
        }

        Ok(Self {
            file_path: base_path.join(STORAGE_FILE_NAME),
            quota_bytes: None,
        })
    }

    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.file_path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.file_path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            StorageError::Corrupt(format!("{}: {}", self.file_path.display(), e))
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(entries)?;

        // Use atomic write pattern: write to temp file, then rename
        let temp_path = self.file_path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.file_path)?;

        debug!("Saved {} entries to {:?}", entries.len(), self.file_path);
        Ok(())
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());

        if let Some(quota) = self.quota_bytes {
            let required: usize = entries.iter().map(|(k, v)| entry_size(k, v)).sum();
            if required > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    quota,
                });
            }
        }

        self.write_entries(&entries)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.read_entries()?.into_keys().collect())
    }
}
