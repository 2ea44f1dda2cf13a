//! Error types for the comparison service.

use scholar_dispatch::DispatchError;

/// Top-level error type for case loading, experiments and configuration.
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    /// Case metadata could not be retrieved from the judgment repository.
    #[error("case {case_id} not found: {reason}")]
    CaseNotFound { case_id: u64, reason: String },

    /// The judgment export for a case could not be retrieved.
    #[error("judgment export for case {case_id} failed: {reason}")]
    JudgmentFetchFailed { case_id: u64, reason: String },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Registry unusable or every backend failed.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, CompareError>;
