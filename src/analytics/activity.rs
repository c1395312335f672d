//! Activity estimation
//!
//! There is no literal step counter field; activity totals are a proxy
//! estimate derived from the number of recorded activity sessions. The
//! constants are part of the observable output and must not be "improved"
//! in place; replace this module wholesale if a real data source appears.

/// Estimated steps per recorded activity session
pub const STEPS_PER_SESSION: i64 = 1000;

/// Estimated calories burned per recorded activity session
pub const CALORIES_PER_SESSION: i64 = 200;

/// Total estimated steps for a session count
pub fn estimate_steps(session_count: usize) -> i64 {
    session_count as i64 * STEPS_PER_SESSION
}

/// Total estimated calories for a session count
pub fn estimate_calories(session_count: usize) -> i64 {
    session_count as i64 * CALORIES_PER_SESSION
}
