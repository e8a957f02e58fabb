//! Forecast accuracy metrics.

use crate::error::{ForecastError, Result};
use crate::validation::CvFold;
use serde::{Deserialize, Serialize};

/// Point and interval accuracy over a set of forecasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    /// Mean absolute error.
    pub mae: f64,
    /// Mean squared error.
    pub mse: f64,
    /// Root mean squared error.
    pub rmse: f64,
    /// Mean absolute percentage error; `None` when any actual is zero.
    pub mape: Option<f64>,
    /// Symmetric mean absolute percentage error.
    pub smape: f64,
    /// Fraction of actuals inside the prediction interval; `None` when no
    /// interval information is available.
    pub coverage: Option<f64>,
}

/// Point accuracy of predictions against actuals.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return Err(ForecastError::Validation(format!(
            "metrics need equal-length non-empty series, got {} actual and {} predicted",
            actual.len(),
            predicted.len()
        )));
    }
    let n = actual.len() as f64;

    let mae = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n;
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n;

    let mape = if actual.iter().any(|a| *a == 0.0) {
        None
    } else {
        Some(
            actual
                .iter()
                .zip(predicted)
                .map(|(a, p)| ((a - p) / a).abs())
                .sum::<f64>()
                / n,
        )
    };

    let smape = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| {
            let denom = a.abs() + p.abs();
            if denom == 0.0 {
                0.0
            } else {
                2.0 * (a - p).abs() / denom
            }
        })
        .sum::<f64>()
        / n;

    Ok(AccuracyMetrics {
        mae,
        mse,
        rmse: mse.sqrt(),
        mape,
        smape,
        coverage: None,
    })
}

/// Pooled accuracy over cross-validation folds, including interval coverage.
pub fn performance_metrics(folds: &[CvFold]) -> Result<AccuracyMetrics> {
    let mut actual = Vec::new();
    let mut predicted = Vec::new();
    let mut inside = 0usize;
    for fold in folds {
        for (row, &a) in fold.forecast.iter().zip(&fold.actual) {
            actual.push(a);
            predicted.push(row.yhat);
            if a >= row.yhat_lower && a <= row.yhat_upper {
                inside += 1;
            }
        }
    }
    let mut metrics = calculate_metrics(&actual, &predicted)?;
    metrics.coverage = Some(inside as f64 / actual.len() as f64);
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn point_metrics_on_known_errors() {
        let actual = [10.0, 20.0, 30.0];
        let predicted = [12.0, 18.0, 30.0];
        let metrics = calculate_metrics(&actual, &predicted).unwrap();

        assert_relative_eq!(metrics.mae, 4.0 / 3.0);
        assert_relative_eq!(metrics.mse, 8.0 / 3.0);
        assert_relative_eq!(metrics.rmse, (8.0_f64 / 3.0).sqrt());
        assert_relative_eq!(
            metrics.mape.unwrap(),
            (0.2 + 0.1 + 0.0) / 3.0,
            epsilon = 1e-12
        );
        assert!(metrics.coverage.is_none());
    }

    #[test]
    fn mape_is_undefined_at_zero_actuals() {
        let metrics = calculate_metrics(&[0.0, 1.0], &[1.0, 1.0]).unwrap();
        assert!(metrics.mape.is_none());
        // smape stays defined
        assert!(metrics.smape.is_finite());
    }

    #[test]
    fn mismatched_lengths_rejected() {
        assert!(calculate_metrics(&[1.0], &[1.0, 2.0]).is_err());
        assert!(calculate_metrics(&[], &[]).is_err());
    }

    #[test]
    fn perfect_forecast_scores_zero() {
        let actual = [5.0, 6.0, 7.0];
        let metrics = calculate_metrics(&actual, &actual).unwrap();
        assert_relative_eq!(metrics.mae, 0.0);
        assert_relative_eq!(metrics.smape, 0.0);
        assert_relative_eq!(metrics.mape.unwrap(), 0.0);
    }
}
