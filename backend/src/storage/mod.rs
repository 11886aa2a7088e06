//! # Storage Module
//!
//! Handles all data persistence for the attendance tracker.
//!
//! The domain layer only ever sees the `KeyValueStorage` trait: a string-keyed,
//! string-valued store with `get`, `set` and `keys`. Any persistent key/value
//! backend can be swapped in without touching the record logic.
//!
//! ## Current Implementations
//!
//! - **MemoryStorage**: volatile map, optional quota (tests, dry runs)
//! - **JsonFileStorage**: one `storage.json` file in the data directory
//! - **SqliteStorage**: `key_values` table in `attendance.db`

pub mod json_file;
pub mod memory;
pub mod sqlite;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

use log::info;
use std::path::Path;
use std::sync::Arc;

use crate::config::StorageBackend;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
pub use traits::{KeyValueStorage, StorageError};

/// Open the configured storage backend rooted at `data_directory`
pub fn open_storage(
    backend: StorageBackend,
    data_directory: &Path,
    quota_bytes: Option<usize>,
) -> Result<Arc<dyn KeyValueStorage>, StorageError> {
    info!("Opening {:?} storage in {}", backend, data_directory.display());

    let storage: Arc<dyn KeyValueStorage> = match backend {
        StorageBackend::Json => {
            Arc::new(JsonFileStorage::new(data_directory)?.with_quota(quota_bytes))
        }
        StorageBackend::Sqlite => {
            Arc::new(
                SqliteStorage::open(data_directory.join(sqlite::DATABASE_FILE_NAME))?
                    .with_quota(quota_bytes),
            )
        }
        StorageBackend::Memory => match quota_bytes {
            Some(quota) => Arc::new(MemoryStorage::with_quota(quota)),
            None => Arc::new(MemoryStorage::new()),
        },
    };

    Ok(storage)
}
