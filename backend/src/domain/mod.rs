//! # Domain Module
//!
//! Business logic for the attendance tracker. Services take an
//! `AttendanceConfig` and a shared `KeyValueStorage`; none of them know
//! which backend sits behind the trait or which front end drives them.

pub mod attendance_service;
pub mod date_utils;
pub mod errors;
pub mod export_service;
pub mod models;
pub mod notifications;
pub mod preferences_service;
pub mod roster_service;
pub mod search;

pub use attendance_service::{AttendanceService, LoadReport, SaveReport, SavedRecord};
pub use errors::{AttendanceError, AttendanceResult};
pub use export_service::{AttendanceReport, ExportResult, ExportService};
pub use models::{AttendanceSheet, Member, NameRegistry, SheetRow};
pub use notifications::{LogNotifier, MemoryNotifier, Notifier};
pub use preferences_service::PreferencesService;
pub use roster_service::RosterService;
pub use search::{filter_members, Debouncer};
