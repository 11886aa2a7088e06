//! # Configuration
//!
//! Explicit configuration passed to every service constructor, replacing the
//! process-wide constants (roster size, storage namespace) of a browser page.
//!
//! Loaded from an optional YAML file; every field has a default so a partial
//! file only overrides what it names.
//!
//! ## YAML Format
//!
//! ```yaml
//! roster_size: 50
//! report_title: "Holy Trinity Church Vellalanvilai - Choir Attendance"
//! storage_backend: json
//! search_debounce_ms: 300
//! data_directory: "/home/me/Documents/Choir Attendance"
//! ```

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::errors::AttendanceError;

pub const CONFIG_FILE_NAME: &str = "config.yaml";
const DEFAULT_DATA_DIRECTORY_NAME: &str = "Choir Attendance";

/// Which `KeyValueStorage` implementation to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Json,
    Sqlite,
    Memory,
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::Json
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    /// Number of members on the roster
    pub roster_size: usize,
    /// First line of exported reports
    pub report_title: String,
    /// Record sets are stored under `{attendance_key_prefix}{date}`
    pub attendance_key_prefix: String,
    pub member_names_key: String,
    pub dark_mode_key: String,
    pub search_debounce_ms: u64,
    pub storage_backend: StorageBackend,
    /// Emulated storage quota in bytes (None = unlimited)
    pub storage_quota_bytes: Option<usize>,
    pub data_directory: Option<PathBuf>,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            roster_size: 50,
            report_title: "Holy Trinity Church Vellalanvilai - Choir Attendance".to_string(),
            attendance_key_prefix: "choir_attendance_".to_string(),
            member_names_key: "choir_member_names".to_string(),
            dark_mode_key: "darkMode".to_string(),
            search_debounce_ms: 300,
            storage_backend: StorageBackend::default(),
            storage_quota_bytes: None,
            data_directory: None,
        }
    }
}

impl AttendanceConfig {
    /// Default configuration with a different roster size
    pub fn with_roster_size(roster_size: usize) -> Self {
        Self {
            roster_size,
            ..Self::default()
        }
    }

    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let yaml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AttendanceConfig = serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.validate()?;

        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Load `path` when given, otherwise `config.yaml` in the default data
    /// directory if it exists, otherwise defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let candidate = default_data_directory().join(CONFIG_FILE_NAME);
        if candidate.exists() {
            Self::load(&candidate)
        } else {
            info!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), AttendanceError> {
        if self.roster_size == 0 {
            return Err(AttendanceError::Validation(
                "roster_size must be at least 1".to_string(),
            ));
        }
        if self.attendance_key_prefix.trim().is_empty() {
            return Err(AttendanceError::Validation(
                "attendance_key_prefix cannot be empty".to_string(),
            ));
        }
        if self.member_names_key.trim().is_empty() || self.dark_mode_key.trim().is_empty() {
            return Err(AttendanceError::Validation(
                "storage keys cannot be empty".to_string(),
            ));
        }
        if self.member_names_key.starts_with(&self.attendance_key_prefix) {
            return Err(AttendanceError::Validation(format!(
                "member_names_key '{}' collides with attendance_key_prefix '{}'",
                self.member_names_key, self.attendance_key_prefix
            )));
        }
        Ok(())
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Storage key holding the record set for `date`
    pub fn attendance_key(&self, date: &str) -> String {
        format!("{}{}", self.attendance_key_prefix, date)
    }

    /// Directory holding storage files: override, then config, then default
    pub fn resolve_data_directory(&self, override_dir: Option<&Path>) -> PathBuf {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.data_directory.clone())
            .unwrap_or_else(default_data_directory)
    }
}

/// `~/Documents/Choir Attendance`, falling back to the home directory and
/// finally the current directory
pub fn default_data_directory() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DATA_DIRECTORY_NAME)
}
