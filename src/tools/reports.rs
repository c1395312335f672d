//! Report export tools
//!
//! Assembles the report inputs (subject profile, period, statistics,
//! charts, reading history) and renders them to CSV, JSON, or the
//! paginated PDF document. Any upstream failure aborts the export with no
//! file produced; empty data still renders.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::analytics::aggregate::summarize;
use crate::analytics::history::build_history;
use crate::analytics::trend::build_charts;
use crate::analytics::window::{
    chart_window, resolve_window, RangeSelector, ReportingZone, TIMESTAMP_FORMAT,
};
use crate::db::Database;
use crate::models::{HealthRecord, PatientInfo};
use crate::report::{
    render, suggested_filename, PeriodInfo, ReportFormat, ReportInputs, SubjectInfo,
};

use super::summary::{fetch_records, fetch_records_for_comparison};
use super::ToolError;

/// Response for export_report
#[derive(Debug, Serialize)]
pub struct ExportReportResponse {
    pub success: bool,
    pub format: String,
    pub file_path: String,
    pub filename: String,
    pub bytes_written: usize,
    pub date_range: String,
    pub message: String,
}

/// Resolve the subject profile for the report preamble
///
/// A missing profile is a degraded lookup, not a failure: the report gets a
/// placeholder subject and a warning is logged. Height comes from the most
/// recent record that carries one.
pub fn fetch_subject_profile(db: &Database, zone: ReportingZone) -> Result<SubjectInfo, ToolError> {
    let conn = db.get_conn()?;

    let patient = PatientInfo::get(&conn)?;
    let height_cm = HealthRecord::latest_with_height(&conn)?.and_then(|r| r.height);

    match patient {
        Some(info) => Ok(SubjectInfo {
            age: info.age_on(zone.today()),
            name: info.name,
            height_cm,
        }),
        None => {
            warn!("patient profile not set; exporting with placeholder subject");
            Ok(SubjectInfo {
                name: "Not set".to_string(),
                age: None,
                height_cm,
            })
        }
    }
}

/// Assemble everything a renderer needs for the given window selector
pub fn build_report_inputs(
    db: &Database,
    zone: ReportingZone,
    selector: RangeSelector,
    custom_start: Option<NaiveDate>,
    custom_end: Option<NaiveDate>,
) -> Result<ReportInputs, ToolError> {
    let today = zone.today();
    let window = resolve_window(selector, custom_start, custom_end, today)?;

    let subject = fetch_subject_profile(db, zone)?;
    let current_records = fetch_records(db, &window)?;
    let prior_records = fetch_records_for_comparison(db, &window)?;
    let chart_records = fetch_records(db, &chart_window(today))?;

    Ok(ReportInputs {
        subject,
        period: PeriodInfo {
            range: selector.as_str().to_string(),
            start_date: window.start_date(),
            end_date: window.end_date(),
        },
        statistics: summarize(&current_records, &prior_records, &[]),
        charts: build_charts(&chart_records, today),
        reading_history: build_history(&current_records),
        generated_at: zone.now().format(TIMESTAMP_FORMAT).to_string(),
    })
}

/// Render a report to bytes plus its suggested filename
pub fn render_report(
    db: &Database,
    zone: ReportingZone,
    selector: RangeSelector,
    custom_start: Option<NaiveDate>,
    custom_end: Option<NaiveDate>,
    format: ReportFormat,
) -> Result<(Vec<u8>, String), ToolError> {
    let inputs = build_report_inputs(db, zone, selector, custom_start, custom_end)?;
    let filename = suggested_filename(&inputs.period, format);
    let bytes = render(&inputs, format).map_err(ToolError::Internal)?;
    Ok((bytes, filename))
}

/// Render a report and write it under the output directory
pub fn export_report(
    db: &Database,
    zone: ReportingZone,
    selector: RangeSelector,
    custom_start: Option<NaiveDate>,
    custom_end: Option<NaiveDate>,
    format: ReportFormat,
    output_dir: &str,
) -> Result<ExportReportResponse, ToolError> {
    let (bytes, filename) = render_report(db, zone, selector, custom_start, custom_end, format)?;

    let dir = Path::new(output_dir);
    fs::create_dir_all(dir)
        .map_err(|e| ToolError::Internal(format!("Failed to create output directory: {}", e)))?;
    let path = dir.join(&filename);
    fs::write(&path, &bytes)
        .map_err(|e| ToolError::Internal(format!("Failed to write report: {}", e)))?;

    // Filename embeds the resolved bounds: health_history_<start>_to_<end>.<ext>
    let date_range = filename
        .trim_start_matches("health_history_")
        .trim_end_matches(&format!(".{}", format.extension()))
        .replace("_to_", " to ");

    Ok(ExportReportResponse {
        success: true,
        format: format.extension().to_string(),
        file_path: path.display().to_string(),
        filename: filename.clone(),
        bytes_written: bytes.len(),
        date_range,
        message: format!("Report written to {}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HealthRecordCreate;
    use chrono::Duration;

    fn test_db() -> Database {
        Database::open_in_memory().expect("in-memory database")
    }

    fn seed(db: &Database) {
        let conn = db.get_conn().unwrap();
        PatientInfo::set(&conn, "Test Subject", Some("1961-10-22")).unwrap();

        let zone = ReportingZone::utc();
        let today = zone.today();
        for offset in 0..5 {
            HealthRecord::create(
                &conn,
                &HealthRecordCreate {
                    timestamp: Some(format!("{}T08:00:00", today - Duration::days(offset))),
                    systolic: Some(120 + offset as i32),
                    diastolic: Some(80),
                    weight: Some(70.0),
                    height: Some(175),
                    ..Default::default()
                },
            )
            .unwrap();
        }
    }

    #[test]
    fn test_render_report_filename_embeds_window() {
        let db = test_db();
        seed(&db);
        let zone = ReportingZone::utc();
        let today = zone.today();

        let (bytes, filename) =
            render_report(&db, zone, RangeSelector::Week, None, None, ReportFormat::Csv).unwrap();

        let expected = format!(
            "health_history_{}_to_{}.csv",
            today - Duration::days(6),
            today
        );
        assert_eq!(filename, expected);
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_json_report_parses() {
        let db = test_db();
        seed(&db);
        let zone = ReportingZone::utc();

        let (bytes, _) =
            render_report(&db, zone, RangeSelector::Week, None, None, ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["patient"]["name"], "Test Subject");
        assert_eq!(value["patient"]["height_cm"], 175);
        assert!(value["statistics"]["blood_pressure"].is_object());
    }

    #[test]
    fn test_missing_profile_degrades_to_placeholder() {
        let db = test_db();
        let zone = ReportingZone::utc();

        let subject = fetch_subject_profile(&db, zone).unwrap();
        assert_eq!(subject.name, "Not set");
        assert_eq!(subject.age, None);
    }

    #[test]
    fn test_custom_export_without_bounds_aborts() {
        let db = test_db();
        seed(&db);
        let zone = ReportingZone::utc();

        let err = render_report(&db, zone, RangeSelector::Custom, None, None, ReportFormat::Csv);
        assert!(matches!(err, Err(ToolError::InvalidRequest(_))));
    }

    #[test]
    fn test_pdf_export_on_empty_database_still_renders() {
        let db = test_db();
        let zone = ReportingZone::utc();

        let (bytes, _) =
            render_report(&db, zone, RangeSelector::Week, None, None, ReportFormat::Pdf).unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
    }
}
