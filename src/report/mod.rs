//! Report rendering
//!
//! Three independent serializations of the same inputs: CSV, JSON, and a
//! paginated PDF document. Rendering never fails on empty input; empty
//! sections come out as placeholders.

pub mod chart;
pub mod csv;
pub mod document;
pub mod json;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analytics::aggregate::MetricSummary;
use crate::analytics::history::ReadingEntry;
use crate::analytics::trend::TrendCharts;

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Csv,
    Json,
    Pdf,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(ReportFormat::Csv),
            "json" => Some(ReportFormat::Json),
            "pdf" | "document" => Some(ReportFormat::Pdf),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
            ReportFormat::Pdf => "pdf",
        }
    }
}

/// Resolved subject profile for the report preamble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<i32>,
}

/// The reporting period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodInfo {
    pub range: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Everything a renderer needs, assembled once per export request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInputs {
    #[serde(rename = "patient")]
    pub subject: SubjectInfo,
    pub period: PeriodInfo,
    pub statistics: MetricSummary,
    pub charts: TrendCharts,
    pub reading_history: Vec<ReadingEntry>,
    pub generated_at: String,
}

/// Suggested filename embedding the resolved bounds
pub fn suggested_filename(period: &PeriodInfo, format: ReportFormat) -> String {
    format!(
        "health_history_{}_to_{}.{}",
        period.start_date, period.end_date, format.extension()
    )
}

/// Render the inputs into the requested format
pub fn render(inputs: &ReportInputs, format: ReportFormat) -> Result<Vec<u8>, String> {
    match format {
        ReportFormat::Csv => Ok(csv::render_csv(inputs).into_bytes()),
        ReportFormat::Json => json::render_json(inputs).map(String::into_bytes),
        ReportFormat::Pdf => document::render_document(inputs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::trend::TrendSeries;

    pub(crate) fn empty_inputs() -> ReportInputs {
        ReportInputs {
            subject: SubjectInfo {
                name: "Test Subject".to_string(),
                age: Some(64),
                height_cm: Some(175),
            },
            period: PeriodInfo {
                range: "week".to_string(),
                start_date: NaiveDate::from_ymd_opt(2026, 3, 8).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            },
            statistics: MetricSummary::default(),
            charts: TrendCharts {
                week: TrendSeries::default(),
                month: TrendSeries::default(),
                quarter: TrendSeries::default(),
            },
            reading_history: Vec::new(),
            generated_at: "2026-03-14T12:00:00".to_string(),
        }
    }

    #[test]
    fn test_suggested_filename_embeds_bounds() {
        let inputs = empty_inputs();
        assert_eq!(
            suggested_filename(&inputs.period, ReportFormat::Csv),
            "health_history_2026-03-08_to_2026-03-14.csv"
        );
        assert_eq!(
            suggested_filename(&inputs.period, ReportFormat::Pdf),
            "health_history_2026-03-08_to_2026-03-14.pdf"
        );
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(ReportFormat::from_str("CSV"), Some(ReportFormat::Csv));
        assert_eq!(ReportFormat::from_str("document"), Some(ReportFormat::Pdf));
        assert_eq!(ReportFormat::from_str("xml"), None);
    }
}
