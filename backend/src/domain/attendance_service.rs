//! Attendance record store: one record set per date.
//!
//! A record set is the complete snapshot of every member's status for one
//! date. Saving replaces the set wholesale; nothing is ever merged field by
//! field and nothing is ever deleted.

use log::{debug, error, info, warn};
use serde::Deserialize;
use shared::{AttendanceRecord, AttendanceStatus};
use std::sync::Arc;

use crate::config::AttendanceConfig;
use crate::domain::date_utils::validate_date;
use crate::domain::errors::{AttendanceError, AttendanceResult};
use crate::domain::models::AttendanceSheet;
use crate::domain::roster_service::{snapshot_names, RosterService};
use crate::storage::KeyValueStorage;

/// Outcome of a save whose date passed validation.
///
/// The record write and the registry write are independent: one failing does
/// not undo or skip the other, so both failures are collected here.
#[derive(Debug)]
pub struct SaveReport {
    pub date: String,
    pub record_count: usize,
    pub write_errors: Vec<AttendanceError>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.write_errors.is_empty()
    }
}

/// One entry of a stored record set as read back.
///
/// Reading is per entry: a missing name or a status outside
/// present/od/absent only affects that member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRecord {
    pub reg_no: String,
    /// `None` when the entry carried no name
    pub name: Option<String>,
    /// `None` when the stored status is missing or not a known value
    pub status: Option<AttendanceStatus>,
}

#[derive(Deserialize)]
struct StoredEntry {
    #[serde(rename = "regNo")]
    reg_no: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl From<StoredEntry> for SavedRecord {
    fn from(entry: StoredEntry) -> Self {
        let status = entry.status.as_deref().and_then(|value| {
            let status = AttendanceStatus::from_wire_value(value);
            if status.is_none() {
                warn!("LOAD: Unknown status '{}' for member {}, leaving unset", value, entry.reg_no);
            }
            status
        });
        Self {
            reg_no: entry.reg_no,
            name: entry.name,
            status,
        }
    }
}

/// Decode a stored record set. Only invalid JSON or a non-array top level is
/// an error; entries that are not records are skipped.
fn decode_record_set(key: &str, raw: &str) -> AttendanceResult<Vec<SavedRecord>> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(raw)
        .map_err(|source| AttendanceError::Parse { key: key.to_string(), source })?;

    let records = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<StoredEntry>(entry) {
            Ok(entry) => Some(SavedRecord::from(entry)),
            Err(e) => {
                warn!("LOAD: Skipping unreadable entry under '{}': {}", key, e);
                None
            }
        })
        .collect();
    Ok(records)
}

/// Outcome of reconciling the sheet with a stored date
#[derive(Debug)]
pub struct LoadReport {
    pub date: String,
    /// A record set exists and was decoded
    pub record_found: bool,
    pub names_restored: usize,
    pub statuses_applied: usize,
    /// Registry could not be read; logged only, names left as they were
    pub registry_error: Option<AttendanceError>,
    /// Record set could not be read; must be surfaced to the user
    pub record_error: Option<AttendanceError>,
}

#[derive(Clone)]
pub struct AttendanceService {
    config: AttendanceConfig,
    storage: Arc<dyn KeyValueStorage>,
    roster_service: RosterService,
}

impl AttendanceService {
    pub fn new(config: AttendanceConfig, storage: Arc<dyn KeyValueStorage>) -> Self {
        let roster_service = RosterService::new(config.clone(), storage.clone());
        Self {
            config,
            storage,
            roster_service,
        }
    }

    pub fn roster_service(&self) -> &RosterService {
        &self.roster_service
    }

    /// One record per member, in roster order, unset statuses saved as Absent
    pub fn build_records(sheet: &AttendanceSheet) -> Vec<AttendanceRecord> {
        sheet
            .rows()
            .map(|row| AttendanceRecord {
                reg_no: row.member.id().to_string(),
                name: row.member.trimmed_name().to_string(),
                status: row.effective_status(),
            })
            .collect()
    }

    /// Persist the sheet for `date` and rewrite the name registry.
    ///
    /// Fails only on validation; storage failures are reported in the
    /// returned `SaveReport`.
    pub fn save(&self, date: &str, sheet: &AttendanceSheet) -> AttendanceResult<SaveReport> {
        let date = validate_date(date)?;
        let key = self.config.attendance_key(&date);
        info!("💾 SAVE: Saving attendance for {} ({} members)", date, sheet.len());

        let records = Self::build_records(sheet);
        let mut write_errors = Vec::new();

        match serde_json::to_string(&records) {
            Ok(json) => {
                if let Err(source) = self.storage.set(&key, &json) {
                    error!("❌ SAVE: Failed to write attendance for {}: {}", date, source);
                    write_errors.push(AttendanceError::StorageWrite { key: key.clone(), source });
                }
            }
            Err(source) => {
                error!("❌ SAVE: Failed to encode attendance for {}: {}", date, source);
                write_errors.push(AttendanceError::Parse { key: key.clone(), source });
            }
        }

        if let Err(e) = self.roster_service.save_registry(&snapshot_names(sheet.members())) {
            error!("❌ SAVE: Failed to write member names: {}", e);
            write_errors.push(e);
        }

        if write_errors.is_empty() {
            info!("✅ SAVE: Attendance saved for {}", date);
        }

        Ok(SaveReport {
            date,
            record_count: records.len(),
            write_errors,
        })
    }

    /// Stored record set for `date`; `Ok(None)` when the date was never saved
    pub fn record_set(&self, date: &str) -> AttendanceResult<Option<Vec<SavedRecord>>> {
        let date = validate_date(date)?;
        let key = self.config.attendance_key(&date);

        let raw = self
            .storage
            .get(&key)
            .map_err(|source| AttendanceError::StorageRead { key: key.clone(), source })?;

        match raw {
            Some(raw) => decode_record_set(&key, &raw).map(Some),
            None => Ok(None),
        }
    }

    pub fn record_exists(&self, date: &str) -> AttendanceResult<bool> {
        let date = validate_date(date)?;
        let key = self.config.attendance_key(&date);
        self.storage
            .get(&key)
            .map(|raw| raw.is_some())
            .map_err(|source| AttendanceError::StorageRead { key, source })
    }

    /// Reconcile `sheet` with what is stored for `date`.
    ///
    /// Names from the registry are applied first. Then, when a record set
    /// exists, each member takes its saved name when non-empty and its saved
    /// status when known; members absent from the set, or every member when
    /// there is no set or it cannot be read, end up unset.
    pub fn load(&self, date: &str, sheet: &mut AttendanceSheet) -> AttendanceResult<LoadReport> {
        let date = validate_date(date)?;
        debug!("📂 LOAD: Loading attendance for {}", date);

        let (names_restored, registry_error) =
            self.roster_service.restore_names(sheet.members_mut());

        let mut report = LoadReport {
            date: date.clone(),
            record_found: false,
            names_restored,
            statuses_applied: 0,
            registry_error,
            record_error: None,
        };

        let records = match self.record_set(&date) {
            Ok(Some(records)) => records,
            Ok(None) => {
                debug!("No attendance saved for {}, clearing statuses", date);
                sheet.clear_all_statuses();
                return Ok(report);
            }
            Err(e) => {
                error!("❌ LOAD: Error loading attendance for {}: {}", date, e);
                sheet.clear_all_statuses();
                report.record_error = Some(e);
                return Ok(report);
            }
        };

        report.record_found = true;
        sheet.clear_all_statuses();

        let member_ids: Vec<String> = sheet.members().iter().map(|m| m.id().to_string()).collect();
        for member_id in member_ids {
            let Some(record) = records.iter().find(|r| r.reg_no == member_id) else {
                continue;
            };
            if let Some(name) = record.name.as_deref().filter(|name| !name.is_empty()) {
                sheet.rename(&member_id, name)?;
            }
            if let Some(status) = record.status {
                sheet.set_status(&member_id, status)?;
                report.statuses_applied += 1;
            }
        }

        if report.statuses_applied < sheet.len() {
            warn!(
                "LOAD: {} of {} members have no saved status for {}",
                sheet.len() - report.statuses_applied,
                sheet.len(),
                date
            );
        }

        info!("✅ LOAD: Loaded attendance for {}", date);
        Ok(report)
    }

    /// True only when nothing is saved for `date` yet and at least one status
    /// is selected. Edits to an already-saved date are not detected; see
    /// `has_diverged_from_saved` for that.
    pub fn has_unsaved_changes(&self, date: &str, sheet: &AttendanceSheet) -> AttendanceResult<bool> {
        if date.trim().is_empty() {
            return Ok(false);
        }
        if self.record_exists(date)? {
            return Ok(false);
        }
        Ok(sheet.has_selections())
    }

    /// True when the sheet differs from what is stored for `date`: any status
    /// or trimmed name that does not match the saved set. With nothing saved
    /// this is the same as `has_unsaved_changes`.
    pub fn has_diverged_from_saved(&self, date: &str, sheet: &AttendanceSheet) -> AttendanceResult<bool> {
        if date.trim().is_empty() {
            return Ok(false);
        }

        let Some(records) = self.record_set(date)? else {
            return Ok(sheet.has_selections());
        };

        let diverged = sheet.rows().any(|row| {
            match records.iter().find(|r| r.reg_no == row.member.id()) {
                Some(record) => {
                    let status_changed = match record.status {
                        Some(saved) => row.effective_status() != saved,
                        None => row.status.is_some(),
                    };
                    let name_changed = record
                        .name
                        .as_deref()
                        .is_some_and(|saved| row.member.trimmed_name() != saved);
                    status_changed || name_changed
                }
                None => row.status.is_some(),
            }
        });
        Ok(diverged)
    }

    /// Every date with a stored record set, ascending
    pub fn saved_dates(&self) -> AttendanceResult<Vec<String>> {
        let prefix = &self.config.attendance_key_prefix;
        let keys = self.storage.keys().map_err(|source| AttendanceError::StorageRead {
            key: format!("{}*", prefix),
            source,
        })?;

        let mut dates: Vec<String> = keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(prefix.as_str()).map(str::to_string))
            .collect();
        dates.sort();
        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::roster_service::initialize_roster;
    use crate::storage::test_utils::memory_storage;
    use crate::storage::MemoryStorage;
    use shared::AttendanceStatus::{self, Absent, OnDuty, Present};

    fn setup(size: usize) -> (AttendanceService, Arc<dyn KeyValueStorage>, AttendanceSheet) {
        let storage = memory_storage();
        let service = AttendanceService::new(AttendanceConfig::with_roster_size(size), storage.clone());
        let sheet = AttendanceSheet::new(initialize_roster(size));
        (service, storage, sheet)
    }

    fn statuses(sheet: &AttendanceSheet) -> Vec<Option<AttendanceStatus>> {
        sheet.rows().map(|row| row.status).collect()
    }

    #[test]
    fn test_save_without_date_is_rejected() {
        let (service, storage, sheet) = setup(3);

        let err = service.save("", &sheet).unwrap_err();
        assert_eq!(err.to_string(), "no date selected");
        assert!(storage.keys().unwrap().is_empty(), "nothing may be persisted");
    }

    #[test]
    fn test_save_writes_records_and_registry() {
        let (service, storage, mut sheet) = setup(3);
        sheet.set_status("001", Present).unwrap();
        sheet.rename("002", "  Bea  ").unwrap();

        let report = service.save("2024-01-15", &sheet).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.record_count, 3);

        let raw = storage.get("choir_attendance_2024-01-15").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "regNo": "001", "name": "Member 1", "status": "present" },
                { "regNo": "002", "name": "Bea", "status": "absent" },
                { "regNo": "003", "name": "Member 3", "status": "absent" },
            ])
        );

        let names = storage.get("choir_member_names").unwrap().unwrap();
        assert_eq!(names, r#"{"001":"Member 1","002":"Bea","003":"Member 3"}"#);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let (service, _storage, mut sheet) = setup(3);
        sheet.set_status("001", Present).unwrap();
        sheet.set_status("002", OnDuty).unwrap();
        sheet.set_status("003", Absent).unwrap();
        sheet.rename("003", "Clara").unwrap();
        service.save("2024-01-15", &sheet).unwrap();

        let mut fresh = AttendanceSheet::new(initialize_roster(3));
        let report = service.load("2024-01-15", &mut fresh).unwrap();

        assert!(report.record_found);
        assert_eq!(report.statuses_applied, 3);
        assert_eq!(statuses(&fresh), vec![Some(Present), Some(OnDuty), Some(Absent)]);
        assert_eq!(fresh.member("003").unwrap().name, "Clara");
    }

    #[test]
    fn test_load_unsaved_date_clears_statuses() {
        let (service, _storage, mut sheet) = setup(3);
        sheet.set_status("001", Present).unwrap();
        sheet.set_status("002", OnDuty).unwrap();
        service.save("2024-01-15", &sheet).unwrap();

        let report = service.load("2024-01-16", &mut sheet).unwrap();

        assert!(!report.record_found);
        assert!(report.record_error.is_none());
        assert_eq!(statuses(&sheet), vec![None, None, None]);
    }

    #[test]
    fn test_names_are_global_statuses_are_not() {
        let (service, _storage, mut sheet) = setup(2);
        sheet.rename("001", "Anna").unwrap();
        sheet.set_status("001", Present).unwrap();
        service.save("2024-03-01", &sheet).unwrap();

        let mut next_session = AttendanceSheet::new(initialize_roster(2));
        service.load("2024-04-01", &mut next_session).unwrap();

        assert_eq!(next_session.member("001").unwrap().name, "Anna");
        assert_eq!(next_session.status("001"), None);
    }

    #[test]
    fn test_roster_grown_since_save() {
        let storage = memory_storage();
        let small = AttendanceService::new(AttendanceConfig::with_roster_size(2), storage.clone());
        let mut sheet = AttendanceSheet::new(initialize_roster(2));
        sheet.set_status("001", OnDuty).unwrap();
        sheet.set_status("002", Present).unwrap();
        small.save("2024-01-15", &sheet).unwrap();

        let large = AttendanceService::new(AttendanceConfig::with_roster_size(4), storage);
        let mut grown = AttendanceSheet::new(initialize_roster(4));
        grown.set_status("004", Present).unwrap();

        let report = large.load("2024-01-15", &mut grown).unwrap();
        assert_eq!(report.statuses_applied, 2);
        assert_eq!(statuses(&grown), vec![Some(OnDuty), Some(Present), None, None]);
        assert_eq!(grown.member("004").unwrap().name, "Member 4");
    }

    #[test]
    fn test_empty_record_name_keeps_current_name() {
        let (service, storage, mut sheet) = setup(1);
        storage
            .set(
                "choir_attendance_2024-01-15",
                r#"[{"regNo":"001","name":"","status":"od"}]"#,
            )
            .unwrap();
        sheet.rename("001", "Anna").unwrap();

        service.load("2024-01-15", &mut sheet).unwrap();
        assert_eq!(sheet.member("001").unwrap().name, "Anna");
        assert_eq!(sheet.status("001"), Some(OnDuty));
    }

    #[test]
    fn test_corrupt_record_set_clears_and_reports() {
        let (service, storage, mut sheet) = setup(2);
        sheet.set_status("001", Present).unwrap();
        storage.set("choir_attendance_2024-01-15", "{broken").unwrap();

        let report = service.load("2024-01-15", &mut sheet).unwrap();

        assert!(!report.record_found);
        assert!(matches!(report.record_error, Some(AttendanceError::Parse { .. })));
        assert_eq!(statuses(&sheet), vec![None, None]);
    }

    #[test]
    fn test_corrupt_registry_keeps_names() {
        let (service, storage, mut sheet) = setup(2);
        sheet.rename("001", "Anna").unwrap();
        storage.set("choir_member_names", "[1,2,3]").unwrap();

        let report = service.load("2024-01-15", &mut sheet).unwrap();

        assert!(report.registry_error.is_some());
        assert!(report.record_error.is_none());
        assert_eq!(sheet.member("001").unwrap().name, "Anna");
    }

    #[test]
    fn test_failed_record_write_still_writes_registry() {
        // Quota fits the small registry but not the record set
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::with_quota(60));
        let service = AttendanceService::new(AttendanceConfig::with_roster_size(2), storage.clone());
        let mut sheet = AttendanceSheet::new(initialize_roster(2));
        sheet.rename("001", "A").unwrap();
        sheet.rename("002", "B").unwrap();

        let report = service.save("2024-01-15", &sheet).unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.write_errors.len(), 1);
        assert!(matches!(
            &report.write_errors[0],
            AttendanceError::StorageWrite { key, .. } if key == "choir_attendance_2024-01-15"
        ));
        assert!(storage.get("choir_attendance_2024-01-15").unwrap().is_none());
        assert_eq!(
            storage.get("choir_member_names").unwrap().as_deref(),
            Some(r#"{"001":"A","002":"B"}"#)
        );
    }

    #[test]
    fn test_has_unsaved_changes() {
        let (service, _storage, mut sheet) = setup(3);
        assert!(!service.has_unsaved_changes("2024-01-15", &sheet).unwrap());

        sheet.set_status("002", OnDuty).unwrap();
        assert!(service.has_unsaved_changes("2024-01-15", &sheet).unwrap());
        assert!(!service.has_unsaved_changes("", &sheet).unwrap());

        service.save("2024-01-15", &sheet).unwrap();
        assert!(!service.has_unsaved_changes("2024-01-15", &sheet).unwrap());

        // Edits to a saved date are not flagged by the weak check
        sheet.set_status("002", Present).unwrap();
        assert!(!service.has_unsaved_changes("2024-01-15", &sheet).unwrap());
        assert!(service.has_diverged_from_saved("2024-01-15", &sheet).unwrap());
    }

    #[test]
    fn test_has_diverged_from_saved() {
        let (service, _storage, mut sheet) = setup(2);
        sheet.set_status("001", Present).unwrap();
        assert!(service.has_diverged_from_saved("2024-01-15", &sheet).unwrap());

        service.save("2024-01-15", &sheet).unwrap();
        assert!(!service.has_diverged_from_saved("2024-01-15", &sheet).unwrap());

        // Explicit Absent equals the saved default
        sheet.set_status("002", Absent).unwrap();
        assert!(!service.has_diverged_from_saved("2024-01-15", &sheet).unwrap());

        sheet.rename("002", "Bea").unwrap();
        assert!(service.has_diverged_from_saved("2024-01-15", &sheet).unwrap());
    }

    #[test]
    fn test_saved_dates() {
        let (service, storage, sheet) = setup(1);
        storage.set("darkMode", "true").unwrap();
        for date in ["2024-02-01", "2023-12-24", "2024-01-15"] {
            service.save(date, &sheet).unwrap();
        }

        assert_eq!(
            service.saved_dates().unwrap(),
            vec!["2023-12-24", "2024-01-15", "2024-02-01"]
        );
    }

    #[test]
    fn test_resave_overwrites_wholesale() {
        let (service, _storage, mut sheet) = setup(2);
        sheet.set_status("001", Present).unwrap();
        sheet.set_status("002", Present).unwrap();
        service.save("2024-01-15", &sheet).unwrap();

        sheet.clear_all_statuses();
        sheet.set_status("001", OnDuty).unwrap();
        service.save("2024-01-15", &sheet).unwrap();

        let records = service.record_set("2024-01-15").unwrap().unwrap();
        let saved: Vec<Option<AttendanceStatus>> = records.iter().map(|r| r.status).collect();
        assert_eq!(saved, vec![Some(OnDuty), Some(Absent)]);
    }

    #[test]
    fn test_unknown_status_only_affects_that_member() {
        let (service, storage, mut sheet) = setup(3);
        sheet.set_status("003", Present).unwrap();
        storage
            .set(
                "choir_attendance_2024-01-15",
                r#"[{"regNo":"001","name":"Anna","status":"present"},{"regNo":"002","name":"Bea","status":"late"},{"regNo":"003","status":"od"}]"#,
            )
            .unwrap();

        let report = service.load("2024-01-15", &mut sheet).unwrap();

        assert!(report.record_found);
        assert!(report.record_error.is_none());
        assert_eq!(report.statuses_applied, 2);
        assert_eq!(statuses(&sheet), vec![Some(Present), None, Some(OnDuty)]);
        assert_eq!(sheet.member("001").unwrap().name, "Anna");
        assert_eq!(sheet.member("002").unwrap().name, "Bea");
        assert_eq!(sheet.member("003").unwrap().name, "Member 3");

        // Loaded view matches what is stored
        assert!(!service.has_diverged_from_saved("2024-01-15", &sheet).unwrap());
    }

    #[test]
    fn test_unreadable_entries_are_skipped() {
        let (service, storage, mut sheet) = setup(2);
        storage
            .set(
                "choir_attendance_2024-01-15",
                r#"[42,{"name":"no id"},{"regNo":"002","name":"Bea","status":"absent"}]"#,
            )
            .unwrap();

        let report = service.load("2024-01-15", &mut sheet).unwrap();

        assert!(report.record_error.is_none());
        assert_eq!(statuses(&sheet), vec![None, Some(Absent)]);
        assert_eq!(sheet.member("002").unwrap().name, "Bea");
    }

    #[test]
    fn test_non_array_record_set_is_corrupt() {
        let (service, storage, mut sheet) = setup(1);
        storage
            .set("choir_attendance_2024-01-15", r#"{"regNo":"001","status":"present"}"#)
            .unwrap();

        let report = service.load("2024-01-15", &mut sheet).unwrap();
        assert!(matches!(report.record_error, Some(AttendanceError::Parse { .. })));
        assert_eq!(statuses(&sheet), vec![None]);
    }
}
