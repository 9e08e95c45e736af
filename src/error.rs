//! Error taxonomy for the scoring engine.

use serde::Serialize;
use thiserror::Error;

/// Failure modes of a scoring run.
///
/// Per-metric `missing_data` is not an error; it is absorbed into coverage
/// and weight redistribution. The engine never panics past its boundary:
/// every public entry point returns `Result<_, ScoreError>`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ScoreError {
    /// Minimal-data validation failed; no computation was performed.
    /// Recoverable by supplying more complete input.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// An unexpected condition during computation. Caught internally; no
    /// partially-built report escapes.
    #[error("calculation failed: {0}")]
    CalculationFailed(String),
}

impl ScoreError {
    /// Stable taxonomy code for the persistence/presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            ScoreError::InsufficientData(_) => "INSUFFICIENT_DATA",
            ScoreError::CalculationFailed(_) => "CALCULATION_FAILED",
        }
    }
}
