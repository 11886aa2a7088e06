//! Export service domain logic for the attendance tracker.
//!
//! Builds the tabular attendance report for the current view (header rows,
//! one row per member, summary block) and writes it as a CSV spreadsheet.
//! Front ends only choose where the file goes.

use anyhow::Result;
use log::{error, info};
use shared::{AttendanceStatus, AttendanceSummary};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::AttendanceConfig;
use crate::domain::date_utils::{format_date, validate_date};
use crate::domain::errors::AttendanceResult;
use crate::domain::models::AttendanceSheet;

/// One member line of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub member_id: String,
    pub name: String,
    pub status: AttendanceStatus,
}

/// Attendance report for one date, ready to be laid out as a sheet
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceReport {
    pub title: String,
    pub date: String,
    pub rows: Vec<ReportRow>,
    pub summary: AttendanceSummary,
}

impl AttendanceReport {
    /// Spreadsheet layout: title, date, column headers, member rows, summary
    pub fn to_table(&self) -> Vec<Vec<String>> {
        let mut table: Vec<Vec<String>> = vec![
            vec![self.title.clone()],
            vec![format!("Date: {}", format_date(&self.date))],
            vec![],
            vec!["Member No.".into(), "Member Name".into(), "Status".into()],
        ];

        for row in &self.rows {
            table.push(vec![
                row.member_id.clone(),
                row.name.clone(),
                row.status.label().to_string(),
            ]);
        }

        table.push(vec![]);
        table.push(vec!["Summary".into()]);
        table.push(vec!["Total Members".into(), self.summary.total_members.to_string()]);
        table.push(vec!["Present".into(), self.summary.present.to_string()]);
        table.push(vec!["OD (On Duty)".into(), self.summary.on_duty.to_string()]);
        table.push(vec!["Absent".into(), self.summary.absent.to_string()]);
        table
    }

    pub fn filename(&self) -> String {
        format!("Choir_Attendance_{}.csv", self.date)
    }
}

/// Result of writing a report to disk
#[derive(Debug, Clone, PartialEq)]
pub struct ExportResult {
    pub file_path: PathBuf,
    pub filename: String,
    pub summary: AttendanceSummary,
}

/// Export service that handles all export-related business logic
#[derive(Clone)]
pub struct ExportService {
    report_title: String,
}

impl ExportService {
    pub fn new(config: &AttendanceConfig) -> Self {
        Self {
            report_title: config.report_title.clone(),
        }
    }

    /// Build the report for `date` from the live sheet.
    ///
    /// Unset statuses count as Absent, so the summary always adds up to the
    /// roster size.
    pub fn build_report(&self, date: &str, sheet: &AttendanceSheet) -> AttendanceResult<AttendanceReport> {
        let date = validate_date(date)?;

        let rows: Vec<ReportRow> = sheet
            .rows()
            .map(|row| ReportRow {
                member_id: row.member.id().to_string(),
                name: row.member.trimmed_name().to_string(),
                status: row.effective_status(),
            })
            .collect();
        let summary = AttendanceSummary::from_statuses(rows.iter().map(|r| r.status));

        Ok(AttendanceReport {
            title: self.report_title.clone(),
            date,
            rows,
            summary,
        })
    }

    /// Render the report as CSV text
    pub fn render_csv(&self, report: &AttendanceReport) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        for record in report.to_table() {
            if record.is_empty() {
                // csv refuses zero-field records; one empty field stands in for a blank row
                writer.write_record([""])?;
            } else {
                writer.write_record(&record)?;
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Write the report for `date` into `custom_path`, or the default export
    /// directory when none is given.
    pub fn export_to_path(
        &self,
        date: &str,
        sheet: &AttendanceSheet,
        custom_path: Option<&str>,
    ) -> Result<ExportResult> {
        info!("📁 EXPORT: Exporting attendance for {} - custom_path: {:?}", date, custom_path);

        let report = self.build_report(date, sheet)?;
        let content = self.render_csv(&report)?;

        let export_dir = match custom_path {
            Some(path) if !path.trim().is_empty() => PathBuf::from(self.sanitize_path(path)),
            _ => default_export_directory()
                .ok_or_else(|| anyhow::anyhow!("Failed to determine export directory"))?,
        };

        fs::create_dir_all(&export_dir).map_err(|e| {
            error!("❌ EXPORT: Failed to create export directory {:?}: {}", export_dir, e);
            anyhow::anyhow!("Failed to create export directory {}: {}", export_dir.display(), e)
        })?;

        let filename = report.filename();
        let file_path = export_dir.join(&filename);
        write_file(&file_path, &content)?;

        info!(
            "✅ EXPORT: Exported {} members for {} to {}",
            report.summary.total_members,
            report.date,
            file_path.display()
        );

        Ok(ExportResult {
            file_path,
            filename,
            summary: report.summary,
        })
    }

    /// Basic path sanitization to handle common user input issues
    fn sanitize_path(&self, path: &str) -> String {
        let mut cleaned = path.trim().to_string();

        // Remove surrounding quotes (single or double)
        if cleaned.len() >= 2
            && ((cleaned.starts_with('"') && cleaned.ends_with('"'))
                || (cleaned.starts_with('\'') && cleaned.ends_with('\'')))
        {
            cleaned = cleaned[1..cleaned.len() - 1].trim().to_string();
        }

        // Handle escaped spaces (common on some systems)
        cleaned = cleaned.replace("\\ ", " ");

        // Remove any trailing slashes/backslashes, keeping a bare root
        while cleaned.len() > 1 && (cleaned.ends_with('/') || cleaned.ends_with('\\')) {
            cleaned.pop();
        }

        // Handle tilde expansion for home directory
        if cleaned.starts_with('~') {
            if let Some(home) = dirs::home_dir() {
                if cleaned == "~" {
                    cleaned = home.to_string_lossy().to_string();
                } else if cleaned.starts_with("~/") || cleaned.starts_with("~\\") {
                    cleaned = home.join(&cleaned[2..]).to_string_lossy().to_string();
                }
            }
        }

        cleaned
    }
}

/// Documents folder, falling back to the home directory
fn default_export_directory() -> Option<PathBuf> {
    dirs::document_dir().or_else(dirs::home_dir)
}

fn write_file(file_path: &Path, content: &str) -> Result<()> {
    fs::write(file_path, content).map_err(|e| {
        error!("❌ EXPORT: Failed to write export file to {:?}: {}", file_path, e);
        anyhow::anyhow!("Failed to write export file {}: {}", file_path.display(), e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::roster_service::initialize_roster;
    use crate::storage::test_utils::TestEnvironment;
    use shared::AttendanceStatus::{OnDuty, Present};

    fn sample_sheet() -> AttendanceSheet {
        let mut sheet = AttendanceSheet::new(initialize_roster(4));
        sheet.set_status("001", Present).unwrap();
        sheet.set_status("002", OnDuty).unwrap();
        sheet.set_status("003", AttendanceStatus::Absent).unwrap();
        sheet.rename("004", "  Dan ").unwrap();
        sheet
    }

    #[test]
    fn test_summary_counts_unset_as_absent() {
        let service = ExportService::new(&AttendanceConfig::default());
        let report = service.build_report("2024-01-15", &sample_sheet()).unwrap();

        assert_eq!(report.summary.total_members, 4);
        assert_eq!(report.summary.present, 1);
        assert_eq!(report.summary.on_duty, 1);
        assert_eq!(report.summary.absent, 2);
        assert_eq!(
            report.summary.present + report.summary.on_duty + report.summary.absent,
            report.summary.total_members
        );
        assert_eq!(report.rows[3].name, "Dan");
    }

    #[test]
    fn test_report_requires_date() {
        let service = ExportService::new(&AttendanceConfig::default());
        let err = service.build_report("", &sample_sheet()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_table_layout() {
        let service = ExportService::new(&AttendanceConfig::default());
        let table = service.build_report("2024-01-15", &sample_sheet()).unwrap().to_table();

        assert_eq!(table[0], vec!["Holy Trinity Church Vellalanvilai - Choir Attendance"]);
        assert_eq!(table[1], vec!["Date: January 15, 2024"]);
        assert!(table[2].is_empty());
        assert_eq!(table[3], vec!["Member No.", "Member Name", "Status"]);
        assert_eq!(table[4], vec!["001", "Member 1", "Present"]);
        assert_eq!(table[5], vec!["002", "Member 2", "OD"]);
        assert_eq!(table[7], vec!["004", "Dan", "Absent"]);
        assert_eq!(table[9], vec!["Summary"]);
        assert_eq!(table[10], vec!["Total Members", "4"]);
        assert_eq!(table[12], vec!["OD (On Duty)", "1"]);
        assert_eq!(table.len(), 14);
    }

    #[test]
    fn test_export_to_path_writes_csv() {
        let env = TestEnvironment::new().unwrap();
        let service = ExportService::new(&AttendanceConfig::default());
        let out_dir = env.base_path.join("exports");

        let result = service
            .export_to_path("2024-01-15", &sample_sheet(), out_dir.to_str())
            .unwrap();

        assert_eq!(result.filename, "Choir_Attendance_2024-01-15.csv");
        assert_eq!(result.file_path, out_dir.join("Choir_Attendance_2024-01-15.csv"));

        let content = fs::read_to_string(&result.file_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Holy Trinity Church Vellalanvilai - Choir Attendance");
        assert_eq!(lines[1], "\"Date: January 15, 2024\"");
        assert_eq!(lines[3], "Member No.,Member Name,Status");
        assert_eq!(lines[4], "001,Member 1,Present");
        assert!(lines.contains(&"Absent,2"));
    }

    #[test]
    fn test_sanitize_path() {
        let service = ExportService::new(&AttendanceConfig::default());

        // Test quote removal and tilde expansion
        let home_dir = dirs::home_dir().unwrap().to_string_lossy().to_string();
        let expected_documents = PathBuf::from(&home_dir)
            .join("Documents")
            .to_string_lossy()
            .to_string();

        assert_eq!(service.sanitize_path("\"~/Documents\""), expected_documents);
        assert_eq!(service.sanitize_path("'~/Documents'"), expected_documents);

        // Test space handling
        assert_eq!(service.sanitize_path("  /path/to/dir  "), "/path/to/dir");
        assert_eq!(service.sanitize_path("/path\\ to\\ dir"), "/path to dir");

        // Test trailing slash removal
        assert_eq!(service.sanitize_path("/path/to/dir/"), "/path/to/dir");
        assert_eq!(service.sanitize_path("/path/to/dir\\"), "/path/to/dir");
        assert_eq!(service.sanitize_path("/"), "/");
    }
}
