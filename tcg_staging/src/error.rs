//! Error types for tcg_staging

use std::path::PathBuf;

/// Unified error type for staging runs.
///
/// Only run-level failures live here. Problems with a single inventory row
/// are logged and counted instead (see [`crate::session::RowOutcome`]).
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    /// Reference catalog could not be opened; nothing can be resolved
    #[error("Reference catalog unavailable at {}: {source}", path.display())]
    ReferenceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Malformed CSV in the reference or inventory file
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// File I/O error (output destination)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to serialize the run report
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The interactive surface failed
    #[error("Prompt error: {0}")]
    Prompt(String),
    /// The operator aborted the run
    #[error("Run cancelled by operator")]
    Cancelled,
}

/// Result alias for tcg_staging operations
pub type Result<T> = std::result::Result<T, StagingError>;
