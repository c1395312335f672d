//! JSON report rendering
//!
//! A single pretty-printed object. The serialized shape is the contract:
//! absent metric families are omitted, numerics stay at 2 decimals.

use super::ReportInputs;

/// Render the full JSON report
pub fn render_json(inputs: &ReportInputs) -> Result<String, String> {
    serde_json::to_string_pretty(inputs).map_err(|e| format!("Failed to serialize report: {}", e))
}

#[cfg(test)]
mod tests {
    use super::super::tests::empty_inputs;
    use super::*;
    use crate::analytics::aggregate::summarize;
    use crate::analytics::history::build_history;
    use crate::models::HealthRecord;

    fn record(timestamp: &str, weight: Option<f64>, sugar: Option<i32>) -> HealthRecord {
        HealthRecord {
            id: 1,
            timestamp: timestamp.to_string(),
            systolic: None,
            diastolic: None,
            blood_sugar: sugar,
            weight,
            height: None,
            heart_rate: None,
            activity: None,
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_top_level_keys() {
        let json = render_json(&empty_inputs()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        for key in ["patient", "period", "statistics", "charts", "reading_history", "generated_at"] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
    }

    #[test]
    fn test_round_trip_preserves_presence_and_values() {
        let records = vec![
            record("2026-03-10T08:00:00", Some(70.0), None),
            record("2026-03-11T08:00:00", Some(72.0), Some(108)),
        ];
        let mut inputs = empty_inputs();
        inputs.statistics = summarize(&records, &[], &[]);
        inputs.reading_history = build_history(&records);

        let json = render_json(&inputs).unwrap();
        let parsed: ReportInputs = serde_json::from_str(&json).unwrap();

        assert!(parsed.statistics.blood_pressure.is_none());
        assert!(parsed.statistics.activity.is_none());
        assert_eq!(parsed.statistics.weight.as_ref().unwrap().average, 71.00);
        assert_eq!(parsed.statistics.blood_sugar.as_ref().unwrap().average, 108.00);
        assert_eq!(parsed.reading_history.len(), 3);
        assert_eq!(parsed.period.start_date, inputs.period.start_date);
    }

    #[test]
    fn test_absent_families_omitted_from_json() {
        let records = vec![record("2026-03-10T08:00:00", Some(70.0), None)];
        let mut inputs = empty_inputs();
        inputs.statistics = summarize(&records, &[], &[]);

        let json = render_json(&inputs).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let stats = value.get("statistics").unwrap();
        assert!(stats.get("weight").is_some());
        assert!(stats.get("blood_pressure").is_none());
        assert!(stats.get("blood_sugar").is_none());
    }
}
