//! HMT MCP Server Implementation
//!
//! Implements the MCP server with all HMT tools.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::analytics::window::{RangeSelector, ReportingZone};
use crate::db::Database;
use crate::models::{HealthRecord, HealthRecordCreate, HealthRecordUpdate, MetricFamily, PatientInfo};
use crate::report::ReportFormat;
use crate::tools::records;
use crate::tools::reports;
use crate::tools::status::{StatusTracker, USAGE_INSTRUCTIONS};
use crate::tools::summary;
use crate::tools::ToolError;

/// HMT MCP Service
#[derive(Clone)]
pub struct HmtService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    zone: ReportingZone,
    tool_router: ToolRouter<HmtService>,
}

impl HmtService {
    pub fn new(database_path: PathBuf, database: Database, zone: ReportingZone) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            zone,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_mcp_error(err: ToolError) -> McpError {
    match err {
        ToolError::InvalidRequest(msg) => McpError::invalid_params(msg, None),
        ToolError::Internal(msg) => McpError::internal_error(msg, None),
    }
}

fn to_json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, McpError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        McpError::invalid_params(
            format!("Invalid {}: '{}'. Expected YYYY-MM-DD", field, value),
            None,
        )
    })
}

fn parse_range(value: &str) -> Result<RangeSelector, McpError> {
    RangeSelector::from_str(value).ok_or_else(|| {
        McpError::invalid_params(
            format!(
                "Invalid range: '{}'. Valid ranges: week (7d), month (30d), quarter (90d), custom",
                value
            ),
            None,
        )
    })
}

// ============================================================================
// Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetPatientInfoParams {
    /// Subject name for report headers
    pub name: String,
    /// Date of birth, YYYY-MM-DD (optional)
    pub dob: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddRecordParams {
    /// Measurement timestamp, YYYY-MM-DDTHH:MM:SS (defaults to now)
    pub timestamp: Option<String>,
    /// Systolic blood pressure in mmHg (requires diastolic)
    pub systolic: Option<i32>,
    /// Diastolic blood pressure in mmHg (requires systolic)
    pub diastolic: Option<i32>,
    /// Blood sugar in mg/dL
    pub blood_sugar: Option<i32>,
    /// Weight in kg
    pub weight: Option<f64>,
    /// Height in cm
    pub height: Option<i32>,
    /// Heart rate in bpm
    pub heart_rate: Option<i32>,
    /// Activity description, e.g. "30 min walk"
    pub activity: Option<String>,
    /// Context notes for the reading
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetRecordParams {
    /// Record ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRecordsParams {
    /// Start date, YYYY-MM-DD
    pub start_date: String,
    /// End date, YYYY-MM-DD
    pub end_date: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRecentRecordsParams {
    /// Maximum records to return (default 20)
    #[serde(default = "default_recent_limit")]
    pub limit: i64,
}

fn default_recent_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRecordParams {
    /// Record ID to update
    pub id: i64,
    /// New systolic value (mmHg)
    pub systolic: Option<i32>,
    /// New diastolic value (mmHg)
    pub diastolic: Option<i32>,
    /// New blood sugar value (mg/dL)
    pub blood_sugar: Option<i32>,
    /// New weight (kg)
    pub weight: Option<f64>,
    /// New height (cm)
    pub height: Option<i32>,
    /// New heart rate (bpm)
    pub heart_rate: Option<i32>,
    /// New activity description
    pub activity: Option<String>,
    /// New notes
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteRecordParams {
    /// Record ID to delete
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetSummaryParams {
    /// Analysis window: week, month, quarter, or custom
    pub range: String,
    /// Start date for custom range, YYYY-MM-DD
    pub start_date: Option<String>,
    /// End date for custom range, YYYY-MM-DD
    pub end_date: Option<String>,
    /// Metric families to include (empty = all): blood_pressure,
    /// blood_sugar, weight, heart_rate, activity
    #[serde(default)]
    pub metrics: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExportReportParams {
    /// Analysis window: week, month, quarter, or custom
    pub range: String,
    /// Start date for custom range, YYYY-MM-DD
    pub start_date: Option<String>,
    /// End date for custom range, YYYY-MM-DD
    pub end_date: Option<String>,
    /// Output format: csv, json, or pdf
    pub format: String,
    /// Directory to write the report into (default "reports")
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_output_dir() -> String {
    "reports".to_string()
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl HmtService {
    // --- Status ---

    #[tool(description = "Get the current status of the HMT service including build info, database status, and process information")]
    async fn hmt_status(&self) -> Result<CallToolResult, McpError> {
        let record_count = self
            .database
            .with_conn(HealthRecord::count)
            .ok();
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(record_count);
        to_json_result(&status)
    }

    #[tool(description = "Get usage instructions for recording health metrics and producing summaries and reports. Call this when starting a session or when unsure how to use the tools.")]
    fn usage_instructions(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(
            USAGE_INSTRUCTIONS,
        )]))
    }

    // --- Patient Profile ---

    #[tool(description = "Set or update the subject profile used in report headers")]
    fn set_patient_info(
        &self,
        Parameters(p): Parameters<SetPatientInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        if let Some(ref dob) = p.dob {
            parse_date(dob, "dob")?;
        }
        let patient = self
            .database
            .with_conn(|conn| PatientInfo::set(conn, &p.name, p.dob.as_deref()))
            .map_err(|e| McpError::internal_error(format!("Database error: {}", e), None))?;
        to_json_result(&patient)
    }

    #[tool(description = "Get the subject profile")]
    fn get_patient_info(&self) -> Result<CallToolResult, McpError> {
        let patient = self
            .database
            .with_conn(PatientInfo::get)
            .map_err(|e| McpError::internal_error(format!("Database error: {}", e), None))?;
        match patient {
            Some(info) => to_json_result(&info),
            None => Ok(CallToolResult::success(vec![Content::text(
                r#"{"error": "Patient info not set. Call set_patient_info first."}"#,
            )])),
        }
    }

    // --- Records ---

    #[tool(description = "Record a health measurement. All metric fields are optional; provide whatever was measured. Blood pressure requires both systolic and diastolic.")]
    fn add_record(
        &self,
        Parameters(p): Parameters<AddRecordParams>,
    ) -> Result<CallToolResult, McpError> {
        let data = HealthRecordCreate {
            timestamp: p.timestamp,
            systolic: p.systolic,
            diastolic: p.diastolic,
            blood_sugar: p.blood_sugar,
            weight: p.weight,
            height: p.height,
            heart_rate: p.heart_rate,
            activity: p.activity,
            notes: p.notes,
        };
        let result = records::add_record(&self.database, data).map_err(to_mcp_error)?;
        to_json_result(&result)
    }

    #[tool(description = "Get a health record by ID")]
    fn get_record(
        &self,
        Parameters(p): Parameters<GetRecordParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = records::get_record(&self.database, p.id).map_err(to_mcp_error)?;
        match result {
            Some(record) => to_json_result(&record),
            None => Ok(CallToolResult::success(vec![Content::text(format!(
                r#"{{"error": "Record not found", "id": {}}}"#,
                p.id
            ))])),
        }
    }

    #[tool(description = "List health records within a date range, newest first")]
    fn list_records(
        &self,
        Parameters(p): Parameters<ListRecordsParams>,
    ) -> Result<CallToolResult, McpError> {
        parse_date(&p.start_date, "start_date")?;
        parse_date(&p.end_date, "end_date")?;
        let result = records::list_records(&self.database, &p.start_date, &p.end_date)
            .map_err(to_mcp_error)?;
        to_json_result(&result)
    }

    #[tool(description = "List the most recent health records across all metrics")]
    fn list_recent_records(
        &self,
        Parameters(p): Parameters<ListRecentRecordsParams>,
    ) -> Result<CallToolResult, McpError> {
        let result =
            records::list_recent_records(&self.database, p.limit).map_err(to_mcp_error)?;
        to_json_result(&result)
    }

    #[tool(description = "Get the most recent health record")]
    fn get_latest_record(&self) -> Result<CallToolResult, McpError> {
        let result = records::get_latest_record(&self.database).map_err(to_mcp_error)?;
        match result {
            Some(record) => to_json_result(&record),
            None => Ok(CallToolResult::success(vec![Content::text(
                r#"{"error": "No records yet"}"#,
            )])),
        }
    }

    #[tool(description = "Update a health record's values")]
    fn update_record(
        &self,
        Parameters(p): Parameters<UpdateRecordParams>,
    ) -> Result<CallToolResult, McpError> {
        let data = HealthRecordUpdate {
            systolic: p.systolic,
            diastolic: p.diastolic,
            blood_sugar: p.blood_sugar,
            weight: p.weight,
            height: p.height,
            heart_rate: p.heart_rate,
            activity: p.activity,
            notes: p.notes,
        };
        let result = records::update_record(&self.database, p.id, data).map_err(to_mcp_error)?;
        to_json_result(&result)
    }

    #[tool(description = "Delete a health record")]
    fn delete_record(
        &self,
        Parameters(p): Parameters<DeleteRecordParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = records::delete_record(&self.database, p.id).map_err(to_mcp_error)?;
        to_json_result(&result)
    }

    // --- Analytics ---

    #[tool(description = "Get the analytical summary for a window: per-metric statistics with prior-period comparison, week-by-week rollups, 7/30/90-day trend chart series, and the chronological reading history")]
    fn get_summary(
        &self,
        Parameters(p): Parameters<GetSummaryParams>,
    ) -> Result<CallToolResult, McpError> {
        let selector = parse_range(&p.range)?;
        let start = p
            .start_date
            .as_deref()
            .map(|d| parse_date(d, "start_date"))
            .transpose()?;
        let end = p
            .end_date
            .as_deref()
            .map(|d| parse_date(d, "end_date"))
            .transpose()?;

        let mut families = Vec::new();
        for name in &p.metrics {
            let family = MetricFamily::from_str(name).ok_or_else(|| {
                McpError::invalid_params(
                    format!(
                        "Invalid metric: '{}'. Valid metrics: blood_pressure, blood_sugar, weight, heart_rate, activity",
                        name
                    ),
                    None,
                )
            })?;
            families.push(family);
        }

        let result = summary::get_summary(&self.database, self.zone, selector, start, end, &families)
            .map_err(to_mcp_error)?;
        to_json_result(&result)
    }

    #[tool(description = "Export a health history report as CSV, JSON, or a paginated PDF document. The file is written to the output directory as health_history_<start>_to_<end>.<ext>")]
    fn export_report(
        &self,
        Parameters(p): Parameters<ExportReportParams>,
    ) -> Result<CallToolResult, McpError> {
        let selector = parse_range(&p.range)?;
        let format = ReportFormat::from_str(&p.format).ok_or_else(|| {
            McpError::invalid_params(
                format!("Invalid format: '{}'. Valid formats: csv, json, pdf", p.format),
                None,
            )
        })?;
        let start = p
            .start_date
            .as_deref()
            .map(|d| parse_date(d, "start_date"))
            .transpose()?;
        let end = p
            .end_date
            .as_deref()
            .map(|d| parse_date(d, "end_date"))
            .transpose()?;

        let result = reports::export_report(
            &self.database,
            self.zone,
            selector,
            start,
            end,
            format,
            &p.output_dir,
        )
        .map_err(to_mcp_error)?;
        to_json_result(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for HmtService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "hmt".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Health Metrics Tracker".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Health Metrics Tracker (HMT) - personal health metric tracking, analytics, and reporting. \
                 IMPORTANT: Call usage_instructions when starting a session. \
                 Records: add/get/update/delete_record, list_records, list_recent_records, get_latest_record. \
                 Profile: set/get_patient_info. \
                 Analytics: get_summary (range = week/month/quarter/custom) returns statistics with \
                 prior-period comparison, week buckets, 7/30/90-day chart series, and reading history. \
                 Reports: export_report (format = csv/json/pdf) writes health_history_<start>_to_<end>.<ext>."
                    .into(),
            ),
        }
    }
}
