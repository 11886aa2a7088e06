//! Roster construction and the persistent name registry.
//!
//! Names are the only piece of state kept independently of any date: every
//! save rewrites the whole registry from the displayed names, and every load
//! applies it before date-specific statuses.

use log::{debug, error, info};
use std::sync::Arc;

use crate::config::AttendanceConfig;
use crate::domain::errors::{AttendanceError, AttendanceResult};
use crate::domain::models::{Member, NameRegistry};
use crate::storage::KeyValueStorage;

/// Build `size` members with ids "001".."size" and placeholder names
pub fn initialize_roster(size: usize) -> Vec<Member> {
    (1..=size).map(Member::new).collect()
}

/// Overwrite the name of every member listed in `registry`.
///
/// Members missing from the registry keep their current name. Returns how
/// many names were applied.
pub fn apply_name_registry(members: &mut [Member], registry: &NameRegistry) -> usize {
    let mut applied = 0;
    for member in members.iter_mut() {
        if let Some(name) = registry.get(member.id()) {
            member.name = name.clone();
            applied += 1;
        }
    }
    applied
}

/// Fresh id -> trimmed name mapping for every member
pub fn snapshot_names(members: &[Member]) -> NameRegistry {
    members
        .iter()
        .map(|m| (m.id().to_string(), m.trimmed_name().to_string()))
        .collect()
}

/// Service persisting the name registry
#[derive(Clone)]
pub struct RosterService {
    config: AttendanceConfig,
    storage: Arc<dyn KeyValueStorage>,
}

impl RosterService {
    pub fn new(config: AttendanceConfig, storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { config, storage }
    }

    /// A roster sized by the configuration
    pub fn initialize_roster(&self) -> Vec<Member> {
        info!("Initializing roster with {} members", self.config.roster_size);
        initialize_roster(self.config.roster_size)
    }

    /// Read the registry; `Ok(None)` when nothing has been saved yet.
    ///
    /// Anything that is not a JSON object of strings is a `Parse` error.
    pub fn load_registry(&self) -> AttendanceResult<Option<NameRegistry>> {
        let key = &self.config.member_names_key;
        let raw = self
            .storage
            .get(key)
            .map_err(|source| AttendanceError::StorageRead { key: key.clone(), source })?;

        let Some(raw) = raw else {
            debug!("No member name registry stored under '{}'", key);
            return Ok(None);
        };

        serde_json::from_str::<NameRegistry>(&raw)
            .map(Some)
            .map_err(|source| AttendanceError::Parse { key: key.clone(), source })
    }

    /// Apply the stored registry to `members`, treating unreadable data as
    /// "no registry available" (logged, names untouched).
    pub fn restore_names(&self, members: &mut [Member]) -> (usize, Option<AttendanceError>) {
        match self.load_registry() {
            Ok(Some(registry)) => {
                let applied = apply_name_registry(members, &registry);
                debug!("Applied {} names from registry", applied);
                (applied, None)
            }
            Ok(None) => (0, None),
            Err(e) => {
                error!("❌ LOAD: Error loading member names: {}", e);
                (0, Some(e))
            }
        }
    }

    pub fn save_registry(&self, registry: &NameRegistry) -> AttendanceResult<()> {
        let key = &self.config.member_names_key;
        let json = serde_json::to_string(registry)
            .map_err(|source| AttendanceError::Parse { key: key.clone(), source })?;

        self.storage
            .set(key, &json)
            .map_err(|source| AttendanceError::StorageWrite { key: key.clone(), source })?;

        debug!("Saved {} member names under '{}'", registry.len(), key);
        Ok(())
    }
}
