//! Health record model
//!
//! Represents one measurement event. Every metric field is independently
//! optional; a record may carry any subset of blood pressure, blood sugar,
//! weight, height, heart rate, and activity.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Metric family enum
///
/// A family groups the fields that are read together (blood pressure is the
/// systolic/diastolic pair). Summaries, charts, and the reading history are
/// all keyed by family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFamily {
    BloodPressure,
    BloodSugar,
    Weight,
    HeartRate,
    Activity,
}

impl MetricFamily {
    /// All families, in the fixed presentation order used by the reading
    /// history and reports.
    pub const ALL: [MetricFamily; 5] = [
        MetricFamily::BloodPressure,
        MetricFamily::BloodSugar,
        MetricFamily::Weight,
        MetricFamily::HeartRate,
        MetricFamily::Activity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricFamily::BloodPressure => "blood_pressure",
            MetricFamily::BloodSugar => "blood_sugar",
            MetricFamily::Weight => "weight",
            MetricFamily::HeartRate => "heart_rate",
            MetricFamily::Activity => "activity",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "blood_pressure" | "bp" => Some(MetricFamily::BloodPressure),
            "blood_sugar" | "glucose" | "sugar" => Some(MetricFamily::BloodSugar),
            "weight" => Some(MetricFamily::Weight),
            "heart_rate" | "hr" | "pulse" => Some(MetricFamily::HeartRate),
            "activity" | "exercise" => Some(MetricFamily::Activity),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MetricFamily::BloodPressure => "Blood Pressure",
            MetricFamily::BloodSugar => "Blood Sugar",
            MetricFamily::Weight => "Weight",
            MetricFamily::HeartRate => "Heart Rate",
            MetricFamily::Activity => "Activity",
        }
    }

    /// Default unit for this family
    pub fn unit(&self) -> &'static str {
        match self {
            MetricFamily::BloodPressure => "mmHg",
            MetricFamily::BloodSugar => "mg/dL",
            MetricFamily::Weight => "kg",
            MetricFamily::HeartRate => "bpm",
            MetricFamily::Activity => "",
        }
    }
}

/// A health measurement record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: i64,
    pub timestamp: String,
    pub systolic: Option<i32>,
    pub diastolic: Option<i32>,
    pub blood_sugar: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<i32>,
    pub heart_rate: Option<i32>,
    pub activity: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new health record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthRecordCreate {
    pub timestamp: Option<String>,
    pub systolic: Option<i32>,
    pub diastolic: Option<i32>,
    pub blood_sugar: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<i32>,
    pub heart_rate: Option<i32>,
    pub activity: Option<String>,
    pub notes: Option<String>,
}

/// Data for updating a health record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthRecordUpdate {
    pub systolic: Option<i32>,
    pub diastolic: Option<i32>,
    pub blood_sugar: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<i32>,
    pub heart_rate: Option<i32>,
    pub activity: Option<String>,
    pub notes: Option<String>,
}

impl HealthRecord {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            timestamp: row.get("timestamp")?,
            systolic: row.get("systolic")?,
            diastolic: row.get("diastolic")?,
            blood_sugar: row.get("blood_sugar")?,
            weight: row.get("weight")?,
            height: row.get("height")?,
            heart_rate: row.get("heart_rate")?,
            activity: row.get("activity")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// The systolic/diastolic pair, present only when both values are.
    ///
    /// Upstream enforces that the pair is recorded together, but a lone
    /// value is still treated as absent here.
    pub fn blood_pressure(&self) -> Option<(i32, i32)> {
        match (self.systolic, self.diastolic) {
            (Some(sys), Some(dia)) => Some((sys, dia)),
            _ => None,
        }
    }

    /// Whether this record carries a value for the given family
    pub fn has_family(&self, family: MetricFamily) -> bool {
        match family {
            MetricFamily::BloodPressure => self.blood_pressure().is_some(),
            MetricFamily::BloodSugar => self.blood_sugar.is_some(),
            MetricFamily::Weight => self.weight.is_some(),
            MetricFamily::HeartRate => self.heart_rate.is_some(),
            MetricFamily::Activity => self.activity.is_some(),
        }
    }

    /// Calendar date portion of the timestamp ("2026-03-14")
    pub fn date(&self) -> &str {
        self.timestamp.split('T').next().unwrap_or(&self.timestamp)
    }

    /// Create a new health record
    pub fn create(conn: &Connection, data: &HealthRecordCreate) -> DbResult<Self> {
        let timestamp = data
            .timestamp
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string());

        conn.execute(
            r#"
            INSERT INTO health_records
                (timestamp, systolic, diastolic, blood_sugar, weight, height, heart_rate, activity, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                timestamp,
                data.systolic,
                data.diastolic,
                data.blood_sugar,
                data.weight,
                data.height,
                data.heart_rate,
                data.activity,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or_else(|| crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a record by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM health_records WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List records within a timestamp range, newest first
    pub fn list_by_date_range(
        conn: &Connection,
        start: &str,
        end: &str,
    ) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM health_records WHERE timestamp >= ?1 AND timestamp <= ?2 ORDER BY timestamp DESC",
        )?;
        let records = stmt
            .query_map(params![start, end], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// List recent records across all metrics
    pub fn list_recent(conn: &Connection, limit: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM health_records ORDER BY timestamp DESC LIMIT ?1")?;
        let records = stmt
            .query_map([limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Get the most recent record, if any
    pub fn latest(conn: &Connection) -> DbResult<Option<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM health_records ORDER BY timestamp DESC LIMIT 1")?;

        let result = stmt.query_row([], Self::from_row);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the most recent record that has a height, if any
    pub fn latest_with_height(conn: &Connection) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM health_records WHERE height IS NOT NULL ORDER BY timestamp DESC LIMIT 1",
        )?;

        let result = stmt.query_row([], Self::from_row);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Update a record
    pub fn update(conn: &Connection, id: i64, data: &HealthRecordUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(v) = data.systolic {
            updates.push(format!("systolic = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(v));
        }
        if let Some(v) = data.diastolic {
            updates.push(format!("diastolic = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(v));
        }
        if let Some(v) = data.blood_sugar {
            updates.push(format!("blood_sugar = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(v));
        }
        if let Some(v) = data.weight {
            updates.push(format!("weight = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(v));
        }
        if let Some(v) = data.height {
            updates.push(format!("height = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(v));
        }
        if let Some(v) = data.heart_rate {
            updates.push(format!("heart_rate = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(v));
        }
        if let Some(ref v) = data.activity {
            updates.push(format!("activity = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(v.clone()));
        }
        if let Some(ref v) = data.notes {
            updates.push(format!("notes = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(v.clone()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE health_records SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a record
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM health_records WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Count all records
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM health_records", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Format one family's value for display
    pub fn format_family_value(&self, family: MetricFamily) -> Option<String> {
        match family {
            MetricFamily::BloodPressure => self
                .blood_pressure()
                .map(|(sys, dia)| format!("{}/{} mmHg", sys, dia)),
            MetricFamily::BloodSugar => self.blood_sugar.map(|v| format!("{} mg/dL", v)),
            MetricFamily::Weight => self.weight.map(|v| format!("{:.1} kg", v)),
            MetricFamily::HeartRate => self.heart_rate.map(|v| format!("{} bpm", v)),
            MetricFamily::Activity => self.activity.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(systolic: Option<i32>, diastolic: Option<i32>) -> HealthRecord {
        HealthRecord {
            id: 1,
            timestamp: "2026-03-14T08:00:00".to_string(),
            systolic,
            diastolic,
            blood_sugar: None,
            weight: None,
            height: None,
            heart_rate: None,
            activity: None,
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_blood_pressure_requires_both_values() {
        assert_eq!(record_with(Some(120), Some(80)).blood_pressure(), Some((120, 80)));
        assert_eq!(record_with(Some(120), None).blood_pressure(), None);
        assert_eq!(record_with(None, Some(80)).blood_pressure(), None);
        assert_eq!(record_with(None, None).blood_pressure(), None);
    }

    #[test]
    fn test_has_family_tracks_lone_bp_value_as_absent() {
        let record = record_with(Some(120), None);
        assert!(!record.has_family(MetricFamily::BloodPressure));
    }

    #[test]
    fn test_date_extracts_day_portion() {
        let record = record_with(None, None);
        assert_eq!(record.date(), "2026-03-14");
    }

    #[test]
    fn test_family_from_str_aliases() {
        assert_eq!(MetricFamily::from_str("bp"), Some(MetricFamily::BloodPressure));
        assert_eq!(MetricFamily::from_str("glucose"), Some(MetricFamily::BloodSugar));
        assert_eq!(MetricFamily::from_str("HR"), Some(MetricFamily::HeartRate));
        assert_eq!(MetricFamily::from_str("steps"), None);
    }

    #[test]
    fn test_format_family_value() {
        let mut record = record_with(Some(150), Some(95));
        record.weight = Some(71.25);
        assert_eq!(
            record.format_family_value(MetricFamily::BloodPressure),
            Some("150/95 mmHg".to_string())
        );
        assert_eq!(
            record.format_family_value(MetricFamily::Weight),
            Some("71.2 kg".to_string())
        );
        assert_eq!(record.format_family_value(MetricFamily::Activity), None);
    }
}
