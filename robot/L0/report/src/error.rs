//! Report errors.

use thiserror::Error;

/// Errors that can occur while rendering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for report rendering.
pub type Result<T> = std::result::Result<T, ReportError>;
