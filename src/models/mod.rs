//! Data models
//!
//! Rust structs representing database entities.

mod patient;
mod record;

pub use patient::PatientInfo;
pub use record::{HealthRecord, HealthRecordCreate, HealthRecordUpdate, MetricFamily};
