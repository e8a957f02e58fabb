//! Exogenous regressor features.
//!
//! Regressor columns are standardized to zero mean and unit standard
//! deviation over the training window; the scale is stored with the fitted
//! model so prediction-time values go through the same transform. A constant
//! column keeps a unit scale to avoid dividing by zero.

use crate::core::{FutureFrame, PreparedSeries};
use crate::error::{ForecastError, Result};
use crate::stats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Standardization parameters for one regressor, frozen at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressorScale {
    pub mean: f64,
    pub std: f64,
}

impl RegressorScale {
    fn from_column(column: &[f64]) -> Self {
        let mean = stats::mean(column);
        let std = stats::std_dev(column);
        let std = if std > 0.0 { std } else { 1.0 };
        Self { mean, std }
    }

    fn apply(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }
}

/// Compute standardization scales for every regressor in the training series.
pub fn fit_scales(series: &PreparedSeries) -> BTreeMap<String, RegressorScale> {
    series
        .regressor_names()
        .map(|name| {
            let column = series
                .regressor(name)
                .unwrap_or(&[]);
            (name.to_string(), RegressorScale::from_column(column))
        })
        .collect()
}

/// Standardized training columns, in the order of `names`.
pub fn standardized_columns(
    series: &PreparedSeries,
    names: &[String],
    scales: &BTreeMap<String, RegressorScale>,
) -> Vec<Vec<f64>> {
    names
        .iter()
        .map(|name| {
            let scale = &scales[name];
            series
                .regressor(name)
                .unwrap_or(&[])
                .iter()
                .map(|&v| scale.apply(v))
                .collect()
        })
        .collect()
}

/// Standardized prediction-time columns, in the order of `names`.
///
/// Fails with [`ForecastError::MissingRegressor`] naming the first timestamp
/// for which a value is absent, short, or non-finite.
pub fn standardized_future_columns(
    frame: &FutureFrame,
    names: &[String],
    scales: &BTreeMap<String, RegressorScale>,
) -> Result<Vec<Vec<f64>>> {
    let timestamps = frame.timestamps();
    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        let scale = &scales[name];
        let values = frame.regressor(name).ok_or_else(|| {
            ForecastError::MissingRegressor {
                name: name.clone(),
                timestamp: timestamps[0],
            }
        })?;
        if values.len() < timestamps.len() {
            return Err(ForecastError::MissingRegressor {
                name: name.clone(),
                timestamp: timestamps[values.len()],
            });
        }
        let mut column = Vec::with_capacity(timestamps.len());
        for (i, &v) in values.iter().take(timestamps.len()).enumerate() {
            if !v.is_finite() {
                return Err(ForecastError::MissingRegressor {
                    name: name.clone(),
                    timestamp: timestamps[i],
                });
            }
            column.push(scale.apply(v));
        }
        columns.push(column);
    }
    Ok(columns)
}
