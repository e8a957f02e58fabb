//! Error types for the augur-forecast engine.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while preparing data, fitting, or predicting.
///
/// The engine never silently substitutes defaults for missing required data;
/// every failure mode is surfaced through one of these variants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Bad or insufficient input data, or an out-of-range configuration value.
    /// Recoverable by the caller fixing the input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A required regressor has no value for a prediction timestamp.
    /// Recoverable by the caller supplying the missing covariate.
    #[error("missing value for regressor '{name}' at {timestamp}")]
    MissingRegressor {
        name: String,
        timestamp: DateTime<Utc>,
    },

    /// The optimizer failed to converge within its iteration budget, or hit a
    /// numeric failure. Surfaced to the caller, never retried internally.
    #[error("fit error: {0}")]
    Fit(String),

    /// An externally enforced wall-clock deadline was exceeded during fitting.
    #[error("fit exceeded deadline after {elapsed:?}")]
    FitTimeout { elapsed: std::time::Duration },
}
