//! Error kinds raised by the attendance domain.

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum AttendanceError {
    /// Input rejected before anything was persisted
    #[error("{0}")]
    Validation(String),

    /// Stored JSON under `key` could not be decoded
    #[error("Corrupt data under '{key}': {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read '{key}': {source}")]
    StorageRead {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to write '{key}': {source}")]
    StorageWrite {
        key: String,
        #[source]
        source: StorageError,
    },
}

impl AttendanceError {
    pub fn no_date_selected() -> Self {
        AttendanceError::Validation("no date selected".to_string())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AttendanceError::Validation(_))
    }
}

pub type AttendanceResult<T> = Result<T, AttendanceError>;
