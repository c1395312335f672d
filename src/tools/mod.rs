//! HMT tools module
//!
//! MCP tool implementations for the Health Metrics Tracker.

pub mod records;
pub mod reports;
pub mod status;
pub mod summary;

use thiserror::Error;

use crate::analytics::EngineError;
use crate::db::DbError;

/// Tool-layer error, split by who can fix it
#[derive(Debug, Error)]
pub enum ToolError {
    /// The caller sent something correctable (bad dates, bad format, ...)
    #[error("{0}")]
    InvalidRequest(String),

    /// Storage or rendering failed server-side
    #[error("{0}")]
    Internal(String),
}

impl From<EngineError> for ToolError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::MissingRangeBounds => ToolError::InvalidRequest(err.to_string()),
            EngineError::UpstreamFetch(_) => ToolError::Internal(err.to_string()),
        }
    }
}

impl From<DbError> for ToolError {
    fn from(err: DbError) -> Self {
        ToolError::Internal(format!("Database error: {}", err))
    }
}
