//! Metric classification
//!
//! Two separate classifiers live here on purpose. The coarse `Band`
//! (Low/Normal/High) drives summary status and chart reference lines; the
//! finer `ReadingStatus` (Normal/Attention/Abnormal) drives the reading
//! history and status text. Their thresholds differ and the two are kept
//! independent; unifying them would change observable output.

use serde::{Deserialize, Serialize};

use crate::models::MetricFamily;

/// Coarse qualitative band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Low,
    Normal,
    High,
}

impl Band {
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Low => "Low",
            Band::Normal => "Normal",
            Band::High => "High",
        }
    }
}

/// Finer-grained status used by the reading history path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    Normal,
    Attention,
    Abnormal,
}

impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Normal => "Normal",
            ReadingStatus::Attention => "Attention",
            ReadingStatus::Abnormal => "Abnormal",
        }
    }
}

// ============================================================================
// Coarse bands
// ============================================================================

/// Classify blood pressure from the systolic/diastolic pair jointly
pub fn classify_blood_pressure(systolic: f64, diastolic: f64) -> Band {
    if systolic < 90.0 || diastolic < 60.0 {
        Band::Low
    } else if systolic >= 140.0 || diastolic >= 90.0 {
        Band::High
    } else {
        Band::Normal
    }
}

/// Classify blood sugar (mg/dL)
pub fn classify_blood_sugar(mg_dl: f64) -> Band {
    if mg_dl < 70.0 {
        Band::Low
    } else if mg_dl > 140.0 {
        Band::High
    } else {
        Band::Normal
    }
}

/// Classify heart rate (bpm)
pub fn classify_heart_rate(bpm: f64) -> Band {
    if bpm < 60.0 {
        Band::Low
    } else if bpm > 100.0 {
        Band::High
    } else {
        Band::Normal
    }
}

/// Body mass index from weight (kg) and height (cm)
///
/// Zero or negative inputs yield no value rather than a division by zero.
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if weight_kg <= 0.0 || height_cm <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(weight_kg / (height_m * height_m))
}

/// Classify BMI; `None` when weight/height cannot produce one
pub fn classify_bmi(weight_kg: f64, height_cm: f64) -> Option<Band> {
    let value = bmi(weight_kg, height_cm)?;
    Some(if value < 18.5 {
        Band::Low
    } else if value >= 25.0 {
        Band::High
    } else {
        Band::Normal
    })
}

// ============================================================================
// Reading-history statuses
// ============================================================================

/// Reading status for a blood pressure pair
pub fn reading_status_blood_pressure(systolic: f64, diastolic: f64) -> ReadingStatus {
    if systolic >= 160.0 || diastolic >= 100.0 || systolic < 90.0 || diastolic < 60.0 {
        ReadingStatus::Abnormal
    } else if systolic >= 130.0 || diastolic >= 85.0 {
        ReadingStatus::Attention
    } else {
        ReadingStatus::Normal
    }
}

/// Reading status for blood sugar (mg/dL)
pub fn reading_status_blood_sugar(mg_dl: f64) -> ReadingStatus {
    if mg_dl > 180.0 || mg_dl < 60.0 {
        ReadingStatus::Abnormal
    } else if mg_dl > 130.0 || mg_dl < 70.0 {
        ReadingStatus::Attention
    } else {
        ReadingStatus::Normal
    }
}

/// Reading status for heart rate (bpm)
pub fn reading_status_heart_rate(bpm: f64) -> ReadingStatus {
    if bpm > 120.0 || bpm < 50.0 {
        ReadingStatus::Abnormal
    } else if bpm > 100.0 || bpm < 60.0 {
        ReadingStatus::Attention
    } else {
        ReadingStatus::Normal
    }
}

/// Human-readable normal range per family, for summary and report text
pub fn normal_range(family: MetricFamily) -> &'static str {
    match family {
        MetricFamily::BloodPressure => "90-139/60-89 mmHg",
        MetricFamily::BloodSugar => "70-140 mg/dL",
        MetricFamily::HeartRate => "60-100 bpm",
        MetricFamily::Weight => "BMI 18.5-24.9",
        MetricFamily::Activity => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blood_pressure_bands() {
        assert_eq!(classify_blood_pressure(120.0, 80.0), Band::Normal);
        assert_eq!(classify_blood_pressure(89.0, 80.0), Band::Low);
        assert_eq!(classify_blood_pressure(120.0, 59.0), Band::Low);
        assert_eq!(classify_blood_pressure(140.0, 80.0), Band::High);
        assert_eq!(classify_blood_pressure(120.0, 90.0), Band::High);
        // Boundary: 90/60 is the bottom of Normal, 139/89 the top
        assert_eq!(classify_blood_pressure(90.0, 60.0), Band::Normal);
        assert_eq!(classify_blood_pressure(139.0, 89.0), Band::Normal);
    }

    #[test]
    fn test_blood_sugar_bands() {
        assert_eq!(classify_blood_sugar(69.0), Band::Low);
        assert_eq!(classify_blood_sugar(70.0), Band::Normal);
        assert_eq!(classify_blood_sugar(140.0), Band::Normal);
        assert_eq!(classify_blood_sugar(141.0), Band::High);
    }

    #[test]
    fn test_heart_rate_bands() {
        assert_eq!(classify_heart_rate(59.0), Band::Low);
        assert_eq!(classify_heart_rate(60.0), Band::Normal);
        assert_eq!(classify_heart_rate(100.0), Band::Normal);
        assert_eq!(classify_heart_rate(101.0), Band::High);
    }

    #[test]
    fn test_bmi_guards_bad_input() {
        assert_eq!(bmi(70.0, 0.0), None);
        assert_eq!(bmi(0.0, 175.0), None);
        assert_eq!(bmi(-5.0, 175.0), None);
        assert_eq!(classify_bmi(70.0, 0.0), None);

        let value = bmi(70.0, 175.0).unwrap();
        assert!((value - 22.857).abs() < 0.001);
    }

    #[test]
    fn test_bmi_bands() {
        assert_eq!(classify_bmi(50.0, 175.0), Some(Band::Low)); // 16.3
        assert_eq!(classify_bmi(70.0, 175.0), Some(Band::Normal)); // 22.9
        assert_eq!(classify_bmi(80.0, 175.0), Some(Band::High)); // 26.1
    }

    #[test]
    fn test_reading_status_blood_pressure_boundaries() {
        assert_eq!(reading_status_blood_pressure(120.0, 80.0), ReadingStatus::Normal);
        assert_eq!(reading_status_blood_pressure(130.0, 80.0), ReadingStatus::Attention);
        assert_eq!(reading_status_blood_pressure(120.0, 85.0), ReadingStatus::Attention);
        assert_eq!(reading_status_blood_pressure(160.0, 80.0), ReadingStatus::Abnormal);
        assert_eq!(reading_status_blood_pressure(120.0, 100.0), ReadingStatus::Abnormal);
        assert_eq!(reading_status_blood_pressure(89.0, 80.0), ReadingStatus::Abnormal);
        assert_eq!(reading_status_blood_pressure(129.0, 84.0), ReadingStatus::Normal);
    }

    #[test]
    fn test_reading_status_blood_sugar_boundaries() {
        assert_eq!(reading_status_blood_sugar(100.0), ReadingStatus::Normal);
        assert_eq!(reading_status_blood_sugar(130.0), ReadingStatus::Normal);
        assert_eq!(reading_status_blood_sugar(131.0), ReadingStatus::Attention);
        assert_eq!(reading_status_blood_sugar(69.0), ReadingStatus::Attention);
        assert_eq!(reading_status_blood_sugar(181.0), ReadingStatus::Abnormal);
        assert_eq!(reading_status_blood_sugar(59.0), ReadingStatus::Abnormal);
    }

    #[test]
    fn test_reading_status_heart_rate_boundaries() {
        assert_eq!(reading_status_heart_rate(72.0), ReadingStatus::Normal);
        assert_eq!(reading_status_heart_rate(101.0), ReadingStatus::Attention);
        assert_eq!(reading_status_heart_rate(59.0), ReadingStatus::Attention);
        assert_eq!(reading_status_heart_rate(121.0), ReadingStatus::Abnormal);
        assert_eq!(reading_status_heart_rate(49.0), ReadingStatus::Abnormal);
    }

    // The two classifiers intentionally disagree in places.
    #[test]
    fn test_classifiers_stay_divergent() {
        // 135/80: High-side Attention in the reading view, Normal band
        assert_eq!(classify_blood_pressure(135.0, 80.0), Band::Normal);
        assert_eq!(
            reading_status_blood_pressure(135.0, 80.0),
            ReadingStatus::Attention
        );
    }
}
