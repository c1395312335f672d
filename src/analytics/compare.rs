//! Period-over-period comparison
//!
//! Percentage change between a current aggregate and the equivalent
//! prior-period aggregate. Every result is finite: an absent, zero, or
//! non-finite prior yields a defined zero change.

use super::round2;

/// Percent change from `prior` to `current`, rounded to 2 decimals
pub fn percent_change(current: f64, prior: Option<f64>) -> f64 {
    match prior {
        Some(prev) if prev != 0.0 && prev.is_finite() && current.is_finite() => {
            round2((current - prev) / prev * 100.0)
        }
        _ => 0.0,
    }
}
