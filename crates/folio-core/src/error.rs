//! Error types for folio-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Refresh gate could not evaluate (offset conversion, status handling).
    /// Always recovered inside the gate and never surfaced to callers.
    #[error("Refresh check error: {0}")]
    GateEvaluation(String),

    #[error("Invalid refresh policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid price history: {0}")]
    InvalidHistory(String),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
