//! Error types for the elspect library.

use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur during signal analysis.
///
/// Every computation validates its input eagerly and fails with one of
/// these kinds instead of producing degenerate output; there are no
/// partial results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Input series is empty.
    #[error("empty input series")]
    EmptySeries,

    /// Input series is malformed (too short, non-finite values, ...).
    #[error("invalid series: {0}")]
    InvalidSeries(String),

    /// Parameter is out of range or infeasible for the given series length.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Not enough samples or periods for the requested operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),
}
