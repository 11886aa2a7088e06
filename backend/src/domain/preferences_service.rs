use log::{info, warn};
use std::sync::Arc;

use crate::config::AttendanceConfig;
use crate::domain::errors::{AttendanceError, AttendanceResult};
use crate::storage::KeyValueStorage;

/// UI preferences stored next to attendance data.
///
/// Dark mode is stored as the strings `"true"` / `"false"`; an unset
/// preference means dark mode and is persisted as such on first read.
#[derive(Clone)]
pub struct PreferencesService {
    dark_mode_key: String,
    storage: Arc<dyn KeyValueStorage>,
}

impl PreferencesService {
    pub fn new(config: &AttendanceConfig, storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            dark_mode_key: config.dark_mode_key.clone(),
            storage,
        }
    }

    pub fn dark_mode(&self) -> AttendanceResult<bool> {
        let stored = self.storage.get(&self.dark_mode_key).map_err(|source| {
            AttendanceError::StorageRead { key: self.dark_mode_key.clone(), source }
        })?;

        match stored {
            Some(value) => Ok(value == "true"),
            None => {
                // Default to dark mode if not set
                if let Err(e) = self.set_dark_mode(true) {
                    warn!("Could not persist default theme: {}", e);
                }
                Ok(true)
            }
        }
    }

    pub fn set_dark_mode(&self, enabled: bool) -> AttendanceResult<()> {
        let value = if enabled { "true" } else { "false" };
        self.storage
            .set(&self.dark_mode_key, value)
            .map_err(|source| AttendanceError::StorageWrite { key: self.dark_mode_key.clone(), source })?;

        info!("{} mode enabled", if enabled { "Dark" } else { "Light" });
        Ok(())
    }

    /// Flip the preference and return the new value
    pub fn toggle_dark_mode(&self) -> AttendanceResult<bool> {
        let enabled = !self.dark_mode()?;
        self.set_dark_mode(enabled)?;
        Ok(enabled)
    }
}
