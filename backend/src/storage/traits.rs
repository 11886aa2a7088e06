//! # Storage Traits
//!
//! This module defines the storage abstraction that allows different
//! key/value backends to be used interchangeably by the domain layer.

use thiserror::Error;

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode storage file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage quota exceeded writing '{key}': {required} bytes needed, quota is {quota}")]
    QuotaExceeded {
        key: String,
        required: usize,
        quota: usize,
    },

    #[error("Storage is corrupt: {0}")]
    Corrupt(String),
}

/// Trait defining a string-keyed, string-valued persistent store
///
/// This mirrors the browser's origin-scoped local storage: values are opaque
/// strings, writes overwrite whatever was stored under the same key, and there
/// is no cross-process coordination (last write wins).
///
/// Note: All operations are synchronous
pub trait KeyValueStorage: Send + Sync {
    /// Retrieve a value by its key
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store a value, replacing any existing value for the same key
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// List all keys, in ascending order
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Bytes a key/value entry occupies for quota accounting
pub(crate) fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}
