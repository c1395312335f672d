//! Analytics engine
//!
//! Pure computation over immutable record snapshots: time window
//! resolution, metric classification, nullable-aware aggregation,
//! period-over-period comparison, trend series, and the chronological
//! reading history. Nothing in this module touches the database.

pub mod activity;
pub mod aggregate;
pub mod classify;
pub mod compare;
pub mod history;
pub mod trend;
pub mod window;

use thiserror::Error;

/// Engine error taxonomy
#[derive(Debug, Error)]
pub enum EngineError {
    /// Custom window requested without both bounds (client-correctable)
    #[error("custom range requires both start_date and end_date")]
    MissingRangeBounds,

    /// Storage failure while fetching records (fatal, not retried)
    #[error("failed to fetch records: {0}")]
    UpstreamFetch(#[from] crate::db::DbError),
}

/// Round to 2 decimal places, halves away from zero
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(1.42857), 1.43);
        assert_eq!(round2(70.0), 70.0);
    }
}
