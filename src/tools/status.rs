//! HMT status tool
//!
//! Provides runtime status information about the HMT service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Usage guide for AI assistants driving the tools
pub const USAGE_INSTRUCTIONS: &str = r#"
# HMT Usage Instructions

HMT tracks personal health metrics and produces analytical summaries and
exportable reports.

## Recording measurements

Use `add_record`. Every metric field is optional; record whatever was
measured:

- `systolic` + `diastolic` (mmHg) - must be provided together
- `blood_sugar` (mg/dL)
- `weight` (kg)
- `height` (cm)
- `heart_rate` (bpm)
- `activity` - free text, e.g. "30 min walk"
- `notes` - context for the reading

Timestamps default to now; pass `timestamp` as `YYYY-MM-DDTHH:MM:SS` to
backfill. Dates elsewhere use `YYYY-MM-DD`.

## Analysis windows

`get_summary` and `export_report` take a `range`:

- `week` - trailing 7 days, today included
- `month` - trailing 30 days
- `quarter` - trailing 90 days
- `custom` - requires `start_date` and `end_date`

Summaries include per-metric averages, percent change vs. the equivalent
prior period, status classification, week-by-week rollups for windows
longer than 7 days, 7/30/90-day chart series, and the chronological
reading history.

## Reports

`export_report` writes `health_history_<start>_to_<end>.<ext>` for
`format` = `csv`, `json`, or `pdf`. The PDF contains the statistics and
reading-history tables plus 90-day trend charts.

## Patient profile

Set the subject once with `set_patient_info(name, dob)`. The profile
feeds report headers; age is computed from `dob`, height from the most
recent record that includes one.
"#;

/// Runtime status of the HMT service
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub record_count: Option<i64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, record_count: Option<i64>) -> ServiceStatus {
        let build_info = BuildInfo::current();

        // Get database size if it exists
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        // Get process info
        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        ServiceStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            record_count,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
