//! # Attendance Session
//!
//! Orchestrates the services behind one front end: the roster sheet being
//! edited, the selected date, and the notification channel every
//! user-visible outcome goes through.
//!
//! The front end owns the session and calls it from a single thread;
//! nothing here is shared between views.

use anyhow::Result;
use log::{info, warn};
use shared::{AttendanceStatus, AttendanceSummary, Notification};
use std::path::Path;
use std::sync::Arc;

use crate::config::AttendanceConfig;
use crate::domain::date_utils::format_date;
use crate::domain::{
    filter_members, AttendanceError, AttendanceResult, AttendanceService, AttendanceSheet,
    Debouncer, ExportResult, ExportService, LoadReport, Notifier, PreferencesService, SaveReport,
    SheetRow,
};
use crate::storage::{open_storage, KeyValueStorage};

pub struct AttendanceSession {
    config: AttendanceConfig,
    attendance_service: AttendanceService,
    export_service: ExportService,
    preferences_service: PreferencesService,
    notifier: Arc<dyn Notifier>,
    sheet: AttendanceSheet,
    current_date: Option<String>,
}

impl AttendanceSession {
    /// Build a session over `storage` with a fresh roster.
    ///
    /// Saved names are applied right away so the roster shows real names
    /// before any date is selected.
    pub fn new(
        config: AttendanceConfig,
        storage: Arc<dyn KeyValueStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> AttendanceResult<Self> {
        config.validate()?;

        let attendance_service = AttendanceService::new(config.clone(), storage.clone());
        let export_service = ExportService::new(&config);
        let preferences_service = PreferencesService::new(&config, storage);

        let roster_service = attendance_service.roster_service();
        let mut members = roster_service.initialize_roster();
        let (restored, registry_error) = roster_service.restore_names(&mut members);
        if registry_error.is_some() {
            warn!("Starting with placeholder names, member registry is unreadable");
        } else {
            info!("Restored {} member names", restored);
        }

        Ok(Self {
            config,
            attendance_service,
            export_service,
            preferences_service,
            notifier,
            sheet: AttendanceSheet::new(members),
            current_date: None,
        })
    }

    /// Open the configured storage backend and build a session on it
    pub fn open(
        config: AttendanceConfig,
        data_directory: Option<&Path>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let data_directory = config.resolve_data_directory(data_directory);
        let storage = open_storage(
            config.storage_backend,
            &data_directory,
            config.storage_quota_bytes,
        )?;
        Ok(Self::new(config, storage, notifier)?)
    }

    pub fn config(&self) -> &AttendanceConfig {
        &self.config
    }

    pub fn sheet(&self) -> &AttendanceSheet {
        &self.sheet
    }

    pub fn current_date(&self) -> Option<&str> {
        self.current_date.as_deref()
    }

    /// Switch the view to `date` and reconcile the sheet with storage
    pub fn select_date(&mut self, date: &str) -> AttendanceResult<LoadReport> {
        let report = match self.attendance_service.load(date, &mut self.sheet) {
            Ok(report) => report,
            Err(e) => {
                self.notifier.notify(Notification::error(e.to_string()));
                return Err(e);
            }
        };

        self.current_date = Some(report.date.clone());
        if report.record_error.is_some() {
            self.notifier
                .notify(Notification::error("Error loading attendance data"));
        } else {
            self.notifier.notify(Notification::info(format!(
                "Loaded attendance for {}",
                format_date(&report.date)
            )));
        }
        Ok(report)
    }

    pub fn set_status(&mut self, member_id: &str, status: AttendanceStatus) -> AttendanceResult<()> {
        self.sheet.set_status(member_id, status)
    }

    pub fn clear_status(&mut self, member_id: &str) -> AttendanceResult<()> {
        self.sheet.clear_status(member_id)
    }

    pub fn rename(&mut self, member_id: &str, name: &str) -> AttendanceResult<()> {
        self.sheet.rename(member_id, name)
    }

    /// Persist the sheet for the selected date.
    ///
    /// Each failed write gets its own error notification; the success
    /// notification is only sent when every write went through.
    pub fn save(&mut self) -> AttendanceResult<SaveReport> {
        let Some(date) = self.current_date.clone() else {
            self.notifier
                .notify(Notification::error("Please select a date first!"));
            return Err(AttendanceError::no_date_selected());
        };

        let report = match self.attendance_service.save(&date, &self.sheet) {
            Ok(report) => report,
            Err(e) => {
                self.notifier.notify(Notification::error(e.to_string()));
                return Err(e);
            }
        };

        for e in &report.write_errors {
            self.notifier
                .notify(Notification::error(format!("Error saving attendance: {}", e)));
        }
        if report.is_complete() {
            self.notifier.notify(Notification::success(format!(
                "Attendance saved for {}!",
                format_date(&report.date)
            )));
        }
        Ok(report)
    }

    /// Write the report for the selected date to `custom_path` (or the
    /// default export directory)
    pub fn export(&self, custom_path: Option<&str>) -> Result<ExportResult> {
        let Some(date) = self.current_date.as_deref() else {
            self.notifier
                .notify(Notification::error("Please select a date first!"));
            return Err(AttendanceError::no_date_selected().into());
        };

        match self.export_service.export_to_path(date, &self.sheet, custom_path) {
            Ok(result) => {
                self.notifier.notify(Notification::success(format!(
                    "Exported attendance to {}",
                    result.filename
                )));
                Ok(result)
            }
            Err(e) => {
                self.notifier
                    .notify(Notification::error(format!("Error exporting attendance: {}", e)));
                Err(e)
            }
        }
    }

    /// Rows matching `query`; tells the user when a non-empty query finds nothing
    pub fn search(&self, query: &str) -> Vec<SheetRow<'_>> {
        let rows = filter_members(&self.sheet, query);
        if rows.is_empty() && !query.trim().is_empty() {
            self.notifier.notify(Notification::info("No members found"));
        }
        rows
    }

    /// A debouncer tuned to the configured search delay, for interactive
    /// front ends that filter as the user types. Needs a tokio runtime; the
    /// CLI runs one search per invocation and calls `search` directly.
    pub fn search_debouncer(&self) -> Debouncer {
        Debouncer::new(self.config.search_debounce())
    }

    pub fn summary(&self) -> AttendanceSummary {
        AttendanceSummary::from_statuses(self.sheet.rows().map(|row| row.effective_status()))
    }

    pub fn has_unsaved_changes(&self) -> AttendanceResult<bool> {
        let date = self.current_date.as_deref().unwrap_or_default();
        self.attendance_service.has_unsaved_changes(date, &self.sheet)
    }

    pub fn has_diverged_from_saved(&self) -> AttendanceResult<bool> {
        let date = self.current_date.as_deref().unwrap_or_default();
        self.attendance_service.has_diverged_from_saved(date, &self.sheet)
    }

    pub fn saved_dates(&self) -> AttendanceResult<Vec<String>> {
        self.attendance_service.saved_dates()
    }

    pub fn dark_mode(&self) -> AttendanceResult<bool> {
        self.preferences_service.dark_mode()
    }

    pub fn set_dark_mode(&self, enabled: bool) -> AttendanceResult<()> {
        self.preferences_service.set_dark_mode(enabled)
    }

    pub fn toggle_dark_mode(&self) -> AttendanceResult<bool> {
        self.preferences_service.toggle_dark_mode()
    }
}
