//! Health record tools
//!
//! Create, read, update, and delete measurement records.

use serde::Serialize;

use crate::db::Database;
use crate::models::{HealthRecord, HealthRecordCreate, HealthRecordUpdate, MetricFamily};

use super::ToolError;

/// Response for add_record
#[derive(Debug, Serialize)]
pub struct AddRecordResponse {
    pub id: i64,
    pub timestamp: String,
    pub recorded: Vec<String>,
    pub created_at: String,
}

/// Record summary for listing
#[derive(Debug, Serialize)]
pub struct RecordSummary {
    pub id: i64,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_sugar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&HealthRecord> for RecordSummary {
    fn from(record: &HealthRecord) -> Self {
        Self {
            id: record.id,
            timestamp: record.timestamp.clone(),
            blood_pressure: record.format_family_value(MetricFamily::BloodPressure),
            blood_sugar: record.format_family_value(MetricFamily::BloodSugar),
            weight: record.format_family_value(MetricFamily::Weight),
            heart_rate: record.format_family_value(MetricFamily::HeartRate),
            activity: record.activity.clone(),
            notes: record.notes.clone(),
        }
    }
}

/// Response for list operations
#[derive(Debug, Serialize)]
pub struct ListRecordsResponse {
    pub records: Vec<RecordSummary>,
    pub total: usize,
}

/// Response for update_record
#[derive(Debug, Serialize)]
pub struct UpdateRecordResponse {
    pub success: bool,
    pub updated_at: String,
}

/// Response for delete_record
#[derive(Debug, Serialize)]
pub struct DeleteRecordResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn validate_metric_values(
    systolic: Option<i32>,
    diastolic: Option<i32>,
    blood_sugar: Option<i32>,
    weight: Option<f64>,
    height: Option<i32>,
    heart_rate: Option<i32>,
) -> Result<(), ToolError> {
    // Blood pressure values travel as a pair
    if systolic.is_some() != diastolic.is_some() {
        return Err(ToolError::InvalidRequest(
            "Blood pressure requires both systolic and diastolic values".to_string(),
        ));
    }

    let positives = [
        ("systolic", systolic.map(f64::from)),
        ("diastolic", diastolic.map(f64::from)),
        ("blood_sugar", blood_sugar.map(f64::from)),
        ("weight", weight),
        ("height", height.map(f64::from)),
        ("heart_rate", heart_rate.map(f64::from)),
    ];
    for (name, value) in positives {
        if let Some(v) = value {
            if v <= 0.0 {
                return Err(ToolError::InvalidRequest(format!(
                    "Value for {} must be greater than 0",
                    name
                )));
            }
        }
    }

    Ok(())
}

/// Add a new health record
pub fn add_record(db: &Database, data: HealthRecordCreate) -> Result<AddRecordResponse, ToolError> {
    validate_metric_values(
        data.systolic,
        data.diastolic,
        data.blood_sugar,
        data.weight,
        data.height,
        data.heart_rate,
    )?;

    let has_any_metric = data.systolic.is_some()
        || data.blood_sugar.is_some()
        || data.weight.is_some()
        || data.heart_rate.is_some()
        || data.activity.is_some();
    if !has_any_metric {
        return Err(ToolError::InvalidRequest(
            "Record must include at least one metric value".to_string(),
        ));
    }

    let conn = db.get_conn()?;
    let record = HealthRecord::create(&conn, &data)?;

    let recorded = MetricFamily::ALL
        .iter()
        .filter_map(|family| record.format_family_value(*family))
        .collect();

    Ok(AddRecordResponse {
        id: record.id,
        timestamp: record.timestamp,
        recorded,
        created_at: record.created_at,
    })
}

/// Get a record by ID
pub fn get_record(db: &Database, id: i64) -> Result<Option<HealthRecord>, ToolError> {
    let conn = db.get_conn()?;
    Ok(HealthRecord::get_by_id(&conn, id)?)
}

/// List records within a date range (dates as YYYY-MM-DD)
pub fn list_records(
    db: &Database,
    start_date: &str,
    end_date: &str,
) -> Result<ListRecordsResponse, ToolError> {
    let conn = db.get_conn()?;
    let records = HealthRecord::list_by_date_range(
        &conn,
        &format!("{}T00:00:00", start_date),
        &format!("{}T23:59:59", end_date),
    )?;

    let summaries: Vec<RecordSummary> = records.iter().map(RecordSummary::from).collect();
    let total = summaries.len();

    Ok(ListRecordsResponse {
        records: summaries,
        total,
    })
}

/// List the most recent records
pub fn list_recent_records(db: &Database, limit: i64) -> Result<ListRecordsResponse, ToolError> {
    let conn = db.get_conn()?;
    let records = HealthRecord::list_recent(&conn, limit)?;

    let summaries: Vec<RecordSummary> = records.iter().map(RecordSummary::from).collect();
    let total = summaries.len();

    Ok(ListRecordsResponse {
        records: summaries,
        total,
    })
}

/// Get the most recent record, if any
pub fn get_latest_record(db: &Database) -> Result<Option<HealthRecord>, ToolError> {
    let conn = db.get_conn()?;
    Ok(HealthRecord::latest(&conn)?)
}

/// Update a record
pub fn update_record(
    db: &Database,
    id: i64,
    data: HealthRecordUpdate,
) -> Result<UpdateRecordResponse, ToolError> {
    let conn = db.get_conn()?;

    let existing = HealthRecord::get_by_id(&conn, id)?;
    let Some(existing) = existing else {
        return Err(ToolError::InvalidRequest(format!(
            "Record not found with id: {}",
            id
        )));
    };

    // Validate the record as it will look after the update
    validate_metric_values(
        data.systolic.or(existing.systolic),
        data.diastolic.or(existing.diastolic),
        data.blood_sugar,
        data.weight,
        data.height,
        data.heart_rate,
    )?;

    let updated = HealthRecord::update(&conn, id, &data)?;
    match updated {
        Some(record) => Ok(UpdateRecordResponse {
            success: true,
            updated_at: record.updated_at,
        }),
        None => Err(ToolError::InvalidRequest(format!(
            "Record not found with id: {}",
            id
        ))),
    }
}

/// Delete a record
pub fn delete_record(db: &Database, id: i64) -> Result<DeleteRecordResponse, ToolError> {
    let conn = db.get_conn()?;

    if HealthRecord::get_by_id(&conn, id)?.is_none() {
        return Err(ToolError::InvalidRequest(format!(
            "Record not found with id: {}",
            id
        )));
    }

    HealthRecord::delete(&conn, id)?;

    Ok(DeleteRecordResponse {
        success: true,
        deleted_id: id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("in-memory database")
    }

    #[test]
    fn test_add_and_fetch_record() {
        let db = test_db();
        let response = add_record(
            &db,
            HealthRecordCreate {
                timestamp: Some("2026-03-10T08:00:00".to_string()),
                systolic: Some(120),
                diastolic: Some(80),
                weight: Some(71.5),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(response.recorded, vec!["120/80 mmHg", "71.5 kg"]);

        let record = get_record(&db, response.id).unwrap().unwrap();
        assert_eq!(record.systolic, Some(120));
        assert_eq!(record.weight, Some(71.5));
    }

    #[test]
    fn test_add_record_rejects_lone_bp_value() {
        let db = test_db();
        let err = add_record(
            &db,
            HealthRecordCreate {
                systolic: Some(120),
                ..Default::default()
            },
        );
        assert!(matches!(err, Err(ToolError::InvalidRequest(_))));
    }

    #[test]
    fn test_add_record_rejects_empty_record() {
        let db = test_db();
        let err = add_record(&db, HealthRecordCreate::default());
        assert!(matches!(err, Err(ToolError::InvalidRequest(_))));
    }

    #[test]
    fn test_add_record_rejects_nonpositive_values() {
        let db = test_db();
        let err = add_record(
            &db,
            HealthRecordCreate {
                weight: Some(0.0),
                ..Default::default()
            },
        );
        assert!(matches!(err, Err(ToolError::InvalidRequest(_))));
    }

    #[test]
    fn test_list_records_by_range() {
        let db = test_db();
        for (day, weight) in [(9, 70.0), (10, 71.0), (20, 72.0)] {
            add_record(
                &db,
                HealthRecordCreate {
                    timestamp: Some(format!("2026-03-{:02}T08:00:00", day)),
                    weight: Some(weight),
                    ..Default::default()
                },
            )
            .unwrap();
        }

        let listed = list_records(&db, "2026-03-09", "2026-03-10").unwrap();
        assert_eq!(listed.total, 2);
        // Newest first
        assert_eq!(listed.records[0].timestamp, "2026-03-10T08:00:00");
    }

    #[test]
    fn test_latest_update_delete() {
        let db = test_db();
        let first = add_record(
            &db,
            HealthRecordCreate {
                timestamp: Some("2026-03-09T08:00:00".to_string()),
                heart_rate: Some(70),
                ..Default::default()
            },
        )
        .unwrap();
        let second = add_record(
            &db,
            HealthRecordCreate {
                timestamp: Some("2026-03-10T08:00:00".to_string()),
                heart_rate: Some(75),
                ..Default::default()
            },
        )
        .unwrap();

        let latest = get_latest_record(&db).unwrap().unwrap();
        assert_eq!(latest.id, second.id);

        update_record(
            &db,
            first.id,
            HealthRecordUpdate {
                heart_rate: Some(72),
                ..Default::default()
            },
        )
        .unwrap();
        let updated = get_record(&db, first.id).unwrap().unwrap();
        assert_eq!(updated.heart_rate, Some(72));

        delete_record(&db, first.id).unwrap();
        assert!(get_record(&db, first.id).unwrap().is_none());
        assert!(matches!(
            delete_record(&db, first.id),
            Err(ToolError::InvalidRequest(_))
        ));
    }
}
