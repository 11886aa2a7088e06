use chrono::{Local, NaiveDate};
use log::warn;

use crate::domain::errors::{AttendanceError, AttendanceResult};

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Check that a date is selected and is a real `YYYY-MM-DD` calendar date.
///
/// Returns the trimmed date string used to build storage keys.
pub fn validate_date(date: &str) -> AttendanceResult<String> {
    let trimmed = date.trim();
    if trimmed.is_empty() {
        return Err(AttendanceError::no_date_selected());
    }

    match NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT) {
        // Round-trip so "2024-1-5" is rejected rather than silently keyed differently
        Ok(parsed) if parsed.format(ISO_DATE_FORMAT).to_string() == trimmed => Ok(trimmed.to_string()),
        _ => Err(AttendanceError::Validation(format!(
            "invalid date '{}' (expected YYYY-MM-DD)",
            trimmed
        ))),
    }
}

/// Format a YYYY-MM-DD date for display (e.g., "January 15, 2024").
///
/// Unparseable input is returned unchanged.
pub fn format_date(date: &str) -> String {
    if date.is_empty() {
        return String::new();
    }

    match NaiveDate::parse_from_str(date.trim(), ISO_DATE_FORMAT) {
        Ok(parsed) => parsed.format("%B %-d, %Y").to_string(),
        Err(e) => {
            warn!("Error formatting date '{}': {}", date, e);
            date.to_string()
        }
    }
}

/// Get current local date in YYYY-MM-DD format
pub fn today() -> String {
    Local::now().date_naive().format(ISO_DATE_FORMAT).to_string()
}
