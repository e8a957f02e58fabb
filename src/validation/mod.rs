//! Rolling-origin cross-validation and accuracy metrics.

mod cross_validation;
mod metrics;

pub use cross_validation::{cross_validate, CvFold};
pub use metrics::{calculate_metrics, performance_metrics, AccuracyMetrics};
