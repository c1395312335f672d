//! Reading history reconstruction
//!
//! Expands each record into zero-to-many per-metric entries for the
//! chronological history view. One record yields at most one entry per
//! populated family, in the fixed order blood pressure, blood sugar,
//! weight, heart rate, activity.

use serde::{Deserialize, Serialize};

use crate::models::{HealthRecord, MetricFamily};

use super::classify::{
    reading_status_blood_pressure, reading_status_blood_sugar, reading_status_heart_rate,
    ReadingStatus,
};

/// One metric observation extracted from a record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingEntry {
    pub record_id: i64,
    pub timestamp: String,
    pub family: MetricFamily,
    pub value: String,
    pub status: ReadingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn family_status(record: &HealthRecord, family: MetricFamily) -> ReadingStatus {
    match family {
        MetricFamily::BloodPressure => match record.blood_pressure() {
            Some((sys, dia)) => reading_status_blood_pressure(sys as f64, dia as f64),
            None => ReadingStatus::Normal,
        },
        MetricFamily::BloodSugar => match record.blood_sugar {
            Some(v) => reading_status_blood_sugar(v as f64),
            None => ReadingStatus::Normal,
        },
        MetricFamily::HeartRate => match record.heart_rate {
            Some(v) => reading_status_heart_rate(v as f64),
            None => ReadingStatus::Normal,
        },
        // Weight and activity have no abnormal classification in this view
        MetricFamily::Weight | MetricFamily::Activity => ReadingStatus::Normal,
    }
}

/// Expand records into history entries, newest first
///
/// The sort is stable, so entries sharing a source record keep the family
/// order.
pub fn build_history(records: &[HealthRecord]) -> Vec<ReadingEntry> {
    let mut sorted: Vec<&HealthRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut entries = Vec::new();
    for record in sorted {
        for family in MetricFamily::ALL {
            let Some(value) = record.format_family_value(family) else {
                continue;
            };
            entries.push(ReadingEntry {
                record_id: record.id,
                timestamp: record.timestamp.clone(),
                family,
                value,
                status: family_status(record, family),
                notes: record.notes.clone(),
            });
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, timestamp: &str) -> HealthRecord {
        HealthRecord {
            id,
            timestamp: timestamp.to_string(),
            systolic: None,
            diastolic: None,
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
    fn test_full_record_emits_families_in_order() {
        let mut r = record(1, "2026-03-10T08:00:00");
        r.systolic = Some(150);
        r.diastolic = Some(95);
        r.blood_sugar = Some(108);
        r.weight = Some(71.5);
        r.heart_rate = Some(72);
        r.activity = Some("30 min walk".to_string());

        let entries = build_history(&[r]);
        let families: Vec<MetricFamily> = entries.iter().map(|e| e.family).collect();
        assert_eq!(families, MetricFamily::ALL.to_vec());
    }

    #[test]
    fn test_sorted_descending_across_records() {
        let mut early = record(1, "2026-03-10T08:00:00");
        early.weight = Some(70.0);
        let mut late = record(2, "2026-03-11T08:00:00");
        late.weight = Some(72.0);
        late.heart_rate = Some(80);

        let entries = build_history(&[early, late]);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].record_id, 2);
        assert_eq!(entries[0].family, MetricFamily::Weight);
        assert_eq!(entries[1].record_id, 2);
        assert_eq!(entries[1].family, MetricFamily::HeartRate);
        assert_eq!(entries[2].record_id, 1);
    }

    #[test]
    fn test_weight_always_normal() {
        let mut r = record(1, "2026-03-10T08:00:00");
        r.weight = Some(250.0);
        let entries = build_history(&[r]);
        assert_eq!(entries[0].status, ReadingStatus::Normal);
    }

    #[test]
    fn test_lone_bp_value_emits_nothing() {
        let mut r = record(1, "2026-03-10T08:00:00");
        r.systolic = Some(150);
        assert!(build_history(&[r]).is_empty());
    }

    #[test]
    fn test_statuses_attached_per_entry() {
        let mut r = record(1, "2026-03-10T08:00:00");
        r.systolic = Some(165);
        r.diastolic = Some(95);
        r.heart_rate = Some(105);
        let entries = build_history(&[r]);
        assert_eq!(entries[0].family, MetricFamily::BloodPressure);
        assert_eq!(entries[0].status, ReadingStatus::Abnormal);
        assert_eq!(entries[1].family, MetricFamily::HeartRate);
        assert_eq!(entries[1].status, ReadingStatus::Attention);
    }

    #[test]
    fn test_empty_record_emits_nothing() {
        assert!(build_history(&[record(1, "2026-03-10T08:00:00")]).is_empty());
    }
}
