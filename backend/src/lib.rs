//! # Choir Attendance
//!
//! Core of a per-date attendance tracker for a choir roster.
//!
//! - `storage`: the `KeyValueStorage` abstraction and its backends
//! - `domain`: roster, record store, export, search and preferences services
//! - `session`: one front end's view (selected date, editable sheet, notifications)
//! - `config`: explicit configuration loaded from YAML
//!
//! Every attendance date is saved as a complete, independent snapshot; member
//! names additionally live in a date-independent registry that is applied
//! before any snapshot.

pub mod config;
pub mod domain;
pub mod session;
pub mod storage;

pub use config::{AttendanceConfig, StorageBackend};
pub use domain::{AttendanceError, AttendanceResult};
pub use session::AttendanceSession;
