//! Nullable-aware aggregation
//!
//! Builds per-family summaries over a record set. A family only counts
//! records that carry every field it needs; a family with no qualifying
//! records is omitted from the summary entirely rather than reported as
//! zero.

use serde::{Deserialize, Serialize};

use crate::models::{HealthRecord, MetricFamily};

use super::activity::{estimate_calories, estimate_steps};
use super::classify::{
    classify_blood_pressure, classify_blood_sugar, normal_range, Band,
};
use super::compare::percent_change;
use super::round2;

/// Blood pressure summary over a period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodPressureSummary {
    pub avg_systolic: f64,
    pub avg_diastolic: f64,
    pub reading_count: usize,
    pub status: Band,
    /// Change vs. the prior period, driven by the systolic average
    pub change_percent: f64,
    pub normal_range: String,
}

/// Blood sugar summary over a period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodSugarSummary {
    pub average: f64,
    pub reading_count: usize,
    pub status: Band,
    pub change_percent: f64,
    pub normal_range: String,
}

/// Weight summary over a period
///
/// BMI is deliberately not computed here: this path has no height join.
/// The alerting path computes BMI from weight+height on a single record;
/// the asymmetry is preserved (see DESIGN.md).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightSummary {
    pub average: f64,
    pub reading_count: usize,
    pub status: Band,
    pub change_percent: f64,
    pub normal_range: String,
}

/// Activity summary over a period
///
/// Step and calorie totals are proxy estimates from the session count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub session_count: usize,
    pub estimated_steps: i64,
    pub estimated_calories: i64,
    pub status: Band,
    pub change_percent: f64,
}

/// Per-family statistics for a period; absent families are omitted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<BloodPressureSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_sugar: Option<BloodSugarSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<WeightSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivitySummary>,
}

impl MetricSummary {
    pub fn is_empty(&self) -> bool {
        self.blood_pressure.is_none()
            && self.blood_sugar.is_none()
            && self.weight.is_none()
            && self.activity.is_none()
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn included(families: &[MetricFamily], family: MetricFamily) -> bool {
    families.is_empty() || families.contains(&family)
}

fn bp_pairs(records: &[HealthRecord]) -> Vec<(f64, f64)> {
    records
        .iter()
        .filter_map(|r| r.blood_pressure())
        .map(|(sys, dia)| (sys as f64, dia as f64))
        .collect()
}

fn sugar_values(records: &[HealthRecord]) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| r.blood_sugar)
        .map(f64::from)
        .collect()
}

fn weight_values(records: &[HealthRecord]) -> Vec<f64> {
    records.iter().filter_map(|r| r.weight).collect()
}

fn activity_count(records: &[HealthRecord]) -> usize {
    records.iter().filter(|r| r.activity.is_some()).count()
}

/// Summarize a record set against its prior-period equivalent
///
/// `families` filters which families to compute; an empty slice means all.
pub fn summarize(
    current: &[HealthRecord],
    prior: &[HealthRecord],
    families: &[MetricFamily],
) -> MetricSummary {
    let mut summary = MetricSummary::default();

    if included(families, MetricFamily::BloodPressure) {
        let pairs = bp_pairs(current);
        if let (Some(avg_sys), Some(avg_dia)) = (
            mean(&pairs.iter().map(|p| p.0).collect::<Vec<_>>()),
            mean(&pairs.iter().map(|p| p.1).collect::<Vec<_>>()),
        ) {
            let prior_pairs = bp_pairs(prior);
            let prior_sys = mean(&prior_pairs.iter().map(|p| p.0).collect::<Vec<_>>());
            summary.blood_pressure = Some(BloodPressureSummary {
                avg_systolic: round2(avg_sys),
                avg_diastolic: round2(avg_dia),
                reading_count: pairs.len(),
                status: classify_blood_pressure(avg_sys, avg_dia),
                change_percent: percent_change(avg_sys, prior_sys),
                normal_range: normal_range(MetricFamily::BloodPressure).to_string(),
            });
        }
    }

    if included(families, MetricFamily::BloodSugar) {
        let values = sugar_values(current);
        if let Some(avg) = mean(&values) {
            summary.blood_sugar = Some(BloodSugarSummary {
                average: round2(avg),
                reading_count: values.len(),
                status: classify_blood_sugar(avg),
                change_percent: percent_change(avg, mean(&sugar_values(prior))),
                normal_range: normal_range(MetricFamily::BloodSugar).to_string(),
            });
        }
    }

    if included(families, MetricFamily::Weight) {
        let values = weight_values(current);
        if let Some(avg) = mean(&values) {
            summary.weight = Some(WeightSummary {
                average: round2(avg),
                reading_count: values.len(),
                // Weight has no band of its own on this path
                status: Band::Normal,
                change_percent: percent_change(avg, mean(&weight_values(prior))),
                normal_range: normal_range(MetricFamily::Weight).to_string(),
            });
        }
    }

    if included(families, MetricFamily::Activity) {
        let count = activity_count(current);
        if count > 0 {
            let prior_count = activity_count(prior);
            let prior_steps = if prior_count > 0 {
                Some(estimate_steps(prior_count) as f64)
            } else {
                None
            };
            summary.activity = Some(ActivitySummary {
                session_count: count,
                estimated_steps: estimate_steps(count),
                estimated_calories: estimate_calories(count),
                status: Band::Normal,
                change_percent: percent_change(estimate_steps(count) as f64, prior_steps),
            });
        }
    }

    summary
}
