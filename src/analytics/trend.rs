//! Trend series and week buckets
//!
//! Day-bucketed chart series per metric family, plus week buckets anchored
//! to the requested window's start for sub-period rollups. A record that
//! lacks a family's fields contributes to no bucket for that family.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::HealthRecord;

use super::aggregate::{summarize, MetricSummary};
use super::round2;
use super::window::TimeWindow;

/// One day's aggregated value for a single-valued family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One day's aggregated blood pressure pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodPressurePoint {
    pub date: NaiveDate,
    pub systolic: f64,
    pub diastolic: f64,
}

/// Per-family day series, ascending by date
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendSeries {
    pub blood_pressure: Vec<BloodPressurePoint>,
    pub blood_sugar: Vec<TrendPoint>,
    pub weight: Vec<TrendPoint>,
    pub heart_rate: Vec<TrendPoint>,
}

/// The three chart granularities, all cut from one 90-day record set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendCharts {
    /// Trailing 7 days
    pub week: TrendSeries,
    /// Trailing 30 days
    pub month: TrendSeries,
    /// Trailing 90 days
    pub quarter: TrendSeries,
}

/// A week's rollup within a requested window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekBucket {
    pub index: i64,
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub summary: MetricSummary,
}

fn record_date(record: &HealthRecord) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(record.date(), "%Y-%m-%d").ok()
}

fn day_means<F>(records: &[HealthRecord], value: F) -> Vec<TrendPoint>
where
    F: Fn(&HealthRecord) -> Option<f64>,
{
    let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();

    for record in records {
        let (Some(date), Some(v)) = (record_date(record), value(record)) else {
            continue;
        };
        by_date.entry(date).or_default().push(v);
    }

    by_date
        .into_iter()
        .map(|(date, values)| TrendPoint {
            date,
            value: round2(values.iter().sum::<f64>() / values.len() as f64),
        })
        .collect()
}

/// Build the per-family day series for a record set
pub fn daily_series(records: &[HealthRecord]) -> TrendSeries {
    let mut bp_by_date: BTreeMap<NaiveDate, Vec<(f64, f64)>> = BTreeMap::new();
    for record in records {
        let (Some(date), Some((sys, dia))) = (record_date(record), record.blood_pressure())
        else {
            continue;
        };
        bp_by_date
            .entry(date)
            .or_default()
            .push((sys as f64, dia as f64));
    }

    let blood_pressure = bp_by_date
        .into_iter()
        .map(|(date, pairs)| {
            let count = pairs.len() as f64;
            BloodPressurePoint {
                date,
                systolic: round2(pairs.iter().map(|p| p.0).sum::<f64>() / count),
                diastolic: round2(pairs.iter().map(|p| p.1).sum::<f64>() / count),
            }
        })
        .collect();

    TrendSeries {
        blood_pressure,
        blood_sugar: day_means(records, |r| r.blood_sugar.map(f64::from)),
        weight: day_means(records, |r| r.weight),
        heart_rate: day_means(records, |r| r.heart_rate.map(f64::from)),
    }
}

fn filter_from(records: &[HealthRecord], cutoff: NaiveDate) -> Vec<HealthRecord> {
    records
        .iter()
        .filter(|r| record_date(r).is_some_and(|d| d >= cutoff))
        .cloned()
        .collect()
}

/// Build the 7/30/90-day chart series from the 90-day record superset
pub fn build_charts(records_90d: &[HealthRecord], today: NaiveDate) -> TrendCharts {
    TrendCharts {
        week: daily_series(&filter_from(records_90d, today - Duration::days(6))),
        month: daily_series(&filter_from(records_90d, today - Duration::days(29))),
        quarter: daily_series(records_90d),
    }
}

/// The Monday on or before the given date
pub fn monday_on_or_before(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// 1-based week index of a day relative to the window start
///
/// Week 1 begins on the Monday on/before the window start; weeks are
/// consecutive 7-day spans with no upper cap.
pub fn week_index(day: NaiveDate, window_start: NaiveDate) -> i64 {
    let anchor = monday_on_or_before(window_start);
    let offset = (monday_on_or_before(day) - anchor).num_days();
    (offset.div_euclid(7) + 1).max(1)
}

/// Group a window's records into week buckets with nested summaries
pub fn build_week_buckets(records: &[HealthRecord], window: &TimeWindow) -> Vec<WeekBucket> {
    let anchor = monday_on_or_before(window.start_date());
    let mut by_week: BTreeMap<i64, Vec<HealthRecord>> = BTreeMap::new();

    for record in records {
        let Some(date) = record_date(record) else {
            continue;
        };
        by_week
            .entry(week_index(date, window.start_date()))
            .or_default()
            .push(record.clone());
    }

    by_week
        .into_iter()
        .map(|(index, week_records)| {
            let start = anchor + Duration::days((index - 1) * 7);
            WeekBucket {
                index,
                label: format!("Week {}", index),
                start,
                end: start + Duration::days(6),
                // No prior set at week granularity: changes are zero
                summary: summarize(&week_records, &[], &[]),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(timestamp: &str) -> HealthRecord {
        HealthRecord {
            id: 0,
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

    fn weight_record(timestamp: &str, weight: f64) -> HealthRecord {
        let mut r = record(timestamp);
        r.weight = Some(weight);
        r
    }

    #[test]
    fn test_weight_series_sorted_ascending() {
        // Given newest-first, as the store returns them
        let records = vec![
            weight_record("2026-03-11T08:00:00", 72.0),
            weight_record("2026-03-10T08:00:00", 70.0),
        ];
        let series = daily_series(&records);
        assert_eq!(series.weight.len(), 2);
        assert_eq!(series.weight[0].date, date(2026, 3, 10));
        assert_eq!(series.weight[0].value, 70.00);
        assert_eq!(series.weight[1].date, date(2026, 3, 11));
        assert_eq!(series.weight[1].value, 72.00);
    }

    #[test]
    fn test_day_bucket_averages_multiple_readings() {
        let records = vec![
            weight_record("2026-03-10T08:00:00", 70.0),
            weight_record("2026-03-10T20:00:00", 71.0),
        ];
        let series = daily_series(&records);
        assert_eq!(series.weight.len(), 1);
        assert_eq!(series.weight[0].value, 70.50);
    }

    #[test]
    fn test_missing_family_yields_empty_series() {
        let records: Vec<HealthRecord> = (0..45)
            .map(|i| weight_record(&format!("2026-01-{:02}T08:00:00", (i % 28) + 1), 70.0))
            .collect();
        let series = daily_series(&records);
        assert!(series.blood_sugar.is_empty());
        assert!(series.blood_pressure.is_empty());
        assert!(!series.weight.is_empty());
    }

    #[test]
    fn test_charts_cut_three_granularities() {
        let records = vec![
            weight_record("2026-03-14T08:00:00", 70.0), // today
            weight_record("2026-03-01T08:00:00", 71.0), // within 30d
            weight_record("2026-01-01T08:00:00", 72.0), // within 90d only
        ];
        let charts = build_charts(&records, date(2026, 3, 14));
        assert_eq!(charts.week.weight.len(), 1);
        assert_eq!(charts.month.weight.len(), 2);
        assert_eq!(charts.quarter.weight.len(), 3);
    }

    #[test]
    fn test_monday_anchor() {
        // 2026-03-14 is a Saturday; its Monday is 03-09
        assert_eq!(monday_on_or_before(date(2026, 3, 14)), date(2026, 3, 9));
        assert_eq!(monday_on_or_before(date(2026, 3, 9)), date(2026, 3, 9));
        assert_eq!(monday_on_or_before(date(2026, 3, 8)), date(2026, 3, 2));
    }

    #[test]
    fn test_week_index_anchored_and_floored() {
        let window_start = date(2026, 3, 4); // Wednesday; week 1 Monday = 03-02
        assert_eq!(week_index(date(2026, 3, 4), window_start), 1);
        assert_eq!(week_index(date(2026, 3, 8), window_start), 1); // Sunday same week
        assert_eq!(week_index(date(2026, 3, 9), window_start), 2); // next Monday
        assert_eq!(week_index(date(2026, 3, 23), window_start), 4);
        // Days before the window floor at week 1
        assert_eq!(week_index(date(2026, 2, 20), window_start), 1);
    }

    #[test]
    fn test_week_index_monotonic_over_window() {
        let window_start = date(2026, 1, 7);
        let mut last = 0;
        for offset in 0..60 {
            let idx = week_index(window_start + Duration::days(offset), window_start);
            assert!(idx >= 1);
            assert!(idx >= last);
            last = idx;
        }
    }

    #[test]
    fn test_week_buckets_nest_summaries() {
        let window = TimeWindow::from_dates(date(2026, 3, 2), date(2026, 3, 31));
        let records = vec![
            weight_record("2026-03-03T08:00:00", 70.0),
            weight_record("2026-03-10T08:00:00", 72.0),
            weight_record("2026-03-12T08:00:00", 74.0),
        ];
        let buckets = build_week_buckets(&records, &window);
        assert_eq!(buckets.len(), 2);

        assert_eq!(buckets[0].index, 1);
        assert_eq!(buckets[0].label, "Week 1");
        assert_eq!(buckets[0].start, date(2026, 3, 2));
        assert_eq!(buckets[0].end, date(2026, 3, 8));
        assert_eq!(buckets[0].summary.weight.as_ref().unwrap().average, 70.00);

        assert_eq!(buckets[1].index, 2);
        assert_eq!(buckets[1].summary.weight.as_ref().unwrap().average, 73.00);
    }
}
