pub mod member;
pub mod sheet;

pub use member::{Member, NameRegistry};
pub use sheet::{AttendanceSheet, SheetRow};
