use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Attendance status of a single member on a single date.
///
/// Serialized with the lowercase wire values used in storage
/// (`"present"`, `"od"`, `"absent"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    /// On Duty: excused presence
    #[serde(rename = "od")]
    OnDuty,
    Absent,
}

impl AttendanceStatus {
    /// Every status, in display order
    pub const ALL: [AttendanceStatus; 3] = [
        AttendanceStatus::Present,
        AttendanceStatus::OnDuty,
        AttendanceStatus::Absent,
    ];

    /// Value stored in persisted records
    pub fn wire_value(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::OnDuty => "od",
            AttendanceStatus::Absent => "absent",
        }
    }

    /// Status for an exact stored value; anything else (e.g. a retired
    /// `"late"`) is `None`
    pub fn from_wire_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.wire_value() == value)
    }

    /// Capitalized label used in reports and tables
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::OnDuty => "OD",
            AttendanceStatus::Absent => "Absent",
        }
    }
}

impl Default for AttendanceStatus {
    fn default() -> Self {
        AttendanceStatus::Absent
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for AttendanceStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "present" | "p" => Ok(AttendanceStatus::Present),
            "od" | "on-duty" | "onduty" | "on_duty" => Ok(AttendanceStatus::OnDuty),
            "absent" | "a" => Ok(AttendanceStatus::Absent),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusParseError(pub String);

impl fmt::Display for StatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid attendance status '{}' (expected present, od or absent)",
            self.0
        )
    }
}

impl std::error::Error for StatusParseError {}

/// One member's entry in a saved attendance record set.
///
/// `name` is a snapshot taken at save time, not a live reference to the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Member id this record refers to (e.g. "007")
    #[serde(rename = "regNo")]
    pub reg_no: String,
    pub name: String,
    pub status: AttendanceStatus,
}

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Message surfaced to the user through the notification channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Error, message: message.into() }
    }
}

/// Per-status counts for one date's attendance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub total_members: usize,
    pub present: usize,
    pub on_duty: usize,
    pub absent: usize,
}

impl AttendanceSummary {
    /// Tally effective statuses; every status counts exactly once.
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = AttendanceStatus>,
    {
        let mut summary = Self::default();
        for status in statuses {
            summary.total_members += 1;
            match status {
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::OnDuty => summary.on_duty += 1,
                AttendanceStatus::Absent => summary.absent += 1,
            }
        }
        summary
    }

    pub fn count(&self, status: AttendanceStatus) -> usize {
        match status {
            AttendanceStatus::Present => self.present,
            AttendanceStatus::OnDuty => self.on_duty,
            AttendanceStatus::Absent => self.absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&AttendanceStatus::Present).unwrap(), "\"present\"");
        assert_eq!(serde_json::to_string(&AttendanceStatus::OnDuty).unwrap(), "\"od\"");
        assert_eq!(serde_json::to_string(&AttendanceStatus::Absent).unwrap(), "\"absent\"");

        let parsed: AttendanceStatus = serde_json::from_str("\"od\"").unwrap();
        assert_eq!(parsed, AttendanceStatus::OnDuty);

        // Labels are not accepted on the wire
        assert!(serde_json::from_str::<AttendanceStatus>("\"OD\"").is_err());
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("present".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Present);
        assert_eq!(" OD ".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::OnDuty);
        assert_eq!("on-duty".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::OnDuty);
        assert_eq!("Absent".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Absent);

        let err = "late".parse::<AttendanceStatus>().unwrap_err();
        assert_eq!(err, StatusParseError("late".to_string()));
    }

    #[test]
    fn test_status_from_wire_value() {
        assert_eq!(AttendanceStatus::from_wire_value("od"), Some(AttendanceStatus::OnDuty));
        assert_eq!(AttendanceStatus::from_wire_value("late"), None);
        // Exact match only, unlike FromStr
        assert_eq!(AttendanceStatus::from_wire_value("Present"), None);
    }

    #[test]
    fn test_status_default_is_absent() {
        assert_eq!(AttendanceStatus::default(), AttendanceStatus::Absent);
    }

    #[test]
    fn test_record_json_shape() {
        let record = AttendanceRecord {
            reg_no: "001".to_string(),
            name: "Anna".to_string(),
            status: AttendanceStatus::OnDuty,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "regNo": "001", "name": "Anna", "status": "od" })
        );
    }

    #[test]
    fn test_summary_counts_sum_to_total() {
        let summary = AttendanceSummary::from_statuses([
            AttendanceStatus::Present,
            AttendanceStatus::OnDuty,
            AttendanceStatus::Absent,
            AttendanceStatus::Present,
        ]);

        assert_eq!(summary.total_members, 4);
        assert_eq!(summary.count(AttendanceStatus::Present), 2);
        assert_eq!(summary.present + summary.on_duty + summary.absent, summary.total_members);
    }
}
