//! Summary pipeline
//!
//! Resolves the requested window, fetches the record snapshots, and runs
//! the analytics engine: statistics with prior-period comparison, week
//! buckets, the always-present 7/30/90-day charts, and the reading
//! history. Each call is a fresh pipeline over freshly fetched records.

use chrono::NaiveDate;
use serde::Serialize;

use crate::analytics::aggregate::{summarize, MetricSummary};
use crate::analytics::history::{build_history, ReadingEntry};
use crate::analytics::trend::{build_charts, build_week_buckets, TrendCharts, WeekBucket};
use crate::analytics::window::{
    chart_window, resolve_window, RangeSelector, ReportingZone, TimeWindow, TIMESTAMP_FORMAT,
};
use crate::db::Database;
use crate::models::{HealthRecord, MetricFamily};

use super::ToolError;

/// The resolved reporting period
#[derive(Debug, Clone, Serialize)]
pub struct PeriodSummary {
    pub range: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub prior_start_date: NaiveDate,
    pub prior_end_date: NaiveDate,
}

/// Response for get_summary
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub period: PeriodSummary,
    pub statistics: MetricSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub week_buckets: Vec<WeekBucket>,
    pub charts: TrendCharts,
    pub reading_history: Vec<ReadingEntry>,
    pub generated_at: String,
}

/// Fetch the records covered by a window, newest first
pub fn fetch_records(db: &Database, window: &TimeWindow) -> Result<Vec<HealthRecord>, ToolError> {
    let conn = db.get_conn()?;
    Ok(HealthRecord::list_by_date_range(
        &conn,
        &window.start_str(),
        &window.end_str(),
    )?)
}

/// Fetch the prior-period records for comparison
pub fn fetch_records_for_comparison(
    db: &Database,
    window: &TimeWindow,
) -> Result<Vec<HealthRecord>, ToolError> {
    fetch_records(db, &window.prior())
}

/// Run the full summary pipeline for a window selector
pub fn get_summary(
    db: &Database,
    zone: ReportingZone,
    selector: RangeSelector,
    custom_start: Option<NaiveDate>,
    custom_end: Option<NaiveDate>,
    families: &[MetricFamily],
) -> Result<SummaryResponse, ToolError> {
    let today = zone.today();
    let window = resolve_window(selector, custom_start, custom_end, today)?;
    let prior = window.prior();

    let current_records = fetch_records(db, &window)?;
    let prior_records = fetch_records_for_comparison(db, &window)?;
    // 90-day superset, fetched regardless of the requested selector
    let chart_records = fetch_records(db, &chart_window(today))?;

    let statistics = summarize(&current_records, &prior_records, families);
    let week_buckets = if window.duration_days() > 7 {
        build_week_buckets(&current_records, &window)
    } else {
        Vec::new()
    };
    let charts = build_charts(&chart_records, today);
    let reading_history = build_history(&current_records);

    Ok(SummaryResponse {
        period: PeriodSummary {
            range: selector.as_str().to_string(),
            start_date: window.start_date(),
            end_date: window.end_date(),
            prior_start_date: prior.start_date(),
            prior_end_date: prior.end_date(),
        },
        statistics,
        week_buckets,
        charts,
        reading_history,
        generated_at: zone.now().format(TIMESTAMP_FORMAT).to_string(),
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

    fn insert(db: &Database, timestamp: String, data: HealthRecordCreate) {
        let conn = db.get_conn().unwrap();
        HealthRecord::create(
            &conn,
            &HealthRecordCreate {
                timestamp: Some(timestamp),
                ..data
            },
        )
        .unwrap();
    }

    fn ts(date: NaiveDate, time: &str) -> String {
        format!("{}T{}", date, time)
    }

    #[test]
    fn test_week_summary_pipeline() {
        let db = test_db();
        let zone = ReportingZone::utc();
        let today = zone.today();

        insert(
            &db,
            ts(today, "08:00:00"),
            HealthRecordCreate {
                systolic: Some(150),
                diastolic: Some(95),
                ..Default::default()
            },
        );
        // Prior-period reading, outside the current window
        insert(
            &db,
            ts(today - Duration::days(10), "08:00:00"),
            HealthRecordCreate {
                systolic: Some(140),
                diastolic: Some(90),
                ..Default::default()
            },
        );

        let summary = get_summary(&db, zone, RangeSelector::Week, None, None, &[]).unwrap();

        assert_eq!(summary.period.range, "week");
        assert_eq!(summary.period.end_date, today);
        assert_eq!(summary.period.start_date, today - Duration::days(6));

        let bp = summary.statistics.blood_pressure.as_ref().unwrap();
        assert_eq!(bp.avg_systolic, 150.00);
        // (150 - 140) / 140 * 100
        assert_eq!(bp.change_percent, 7.14);

        // Week window carries no week buckets
        assert!(summary.week_buckets.is_empty());
        assert_eq!(summary.reading_history.len(), 1);
        // Both readings fall inside the 90-day chart superset
        assert_eq!(summary.charts.quarter.blood_pressure.len(), 2);
    }

    #[test]
    fn test_custom_window_requires_bounds() {
        let db = test_db();
        let zone = ReportingZone::utc();
        let start = NaiveDate::from_ymd_opt(2026, 3, 1);

        let err = get_summary(&db, zone, RangeSelector::Custom, start, None, &[]);
        assert!(matches!(err, Err(ToolError::InvalidRequest(_))));
    }

    #[test]
    fn test_month_summary_has_week_buckets() {
        let db = test_db();
        let zone = ReportingZone::utc();
        let today = zone.today();

        for offset in [0, 7, 14] {
            insert(
                &db,
                ts(today - Duration::days(offset), "08:00:00"),
                HealthRecordCreate {
                    weight: Some(70.0 + offset as f64),
                    ..Default::default()
                },
            );
        }

        let summary = get_summary(&db, zone, RangeSelector::Month, None, None, &[]).unwrap();
        assert!(!summary.week_buckets.is_empty());
        assert!(summary.week_buckets.iter().all(|b| b.index >= 1));
        // Indices ascend
        let indices: Vec<i64> = summary.week_buckets.iter().map(|b| b.index).collect();
        let mut sorted = indices.clone();
        sorted.sort();
        assert_eq!(indices, sorted);
    }

    #[test]
    fn test_never_populated_family_is_absent_everywhere() {
        let db = test_db();
        let zone = ReportingZone::utc();
        let today = zone.today();

        for offset in 0..45 {
            insert(
                &db,
                ts(today - Duration::days(offset * 2), "08:00:00"),
                HealthRecordCreate {
                    weight: Some(70.0),
                    ..Default::default()
                },
            );
        }

        let summary = get_summary(&db, zone, RangeSelector::Quarter, None, None, &[]).unwrap();
        assert!(summary.statistics.blood_sugar.is_none());
        assert!(summary.charts.quarter.blood_sugar.is_empty());
        assert!(summary.statistics.weight.is_some());
    }

    #[test]
    fn test_metrics_filter_limits_families() {
        let db = test_db();
        let zone = ReportingZone::utc();
        let today = zone.today();

        insert(
            &db,
            ts(today, "08:00:00"),
            HealthRecordCreate {
                weight: Some(70.0),
                blood_sugar: Some(110),
                ..Default::default()
            },
        );

        let summary = get_summary(
            &db,
            zone,
            RangeSelector::Week,
            None,
            None,
            &[MetricFamily::BloodSugar],
        )
        .unwrap();
        assert!(summary.statistics.blood_sugar.is_some());
        assert!(summary.statistics.weight.is_none());
    }
}
