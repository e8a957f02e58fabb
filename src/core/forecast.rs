//! Forecast output rows and prediction-time input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One forecast row: point estimate, interval bounds, and the component
/// breakdown in the original data scale.
///
/// Rows are produced per prediction call and never retained by the engine;
/// persistence is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRow {
    pub timestamp: DateTime<Utc>,
    /// Point estimate.
    pub yhat: f64,
    /// Lower interval bound; equals `yhat` when uncertainty sampling is off.
    pub yhat_lower: f64,
    /// Upper interval bound; equals `yhat` when uncertainty sampling is off.
    pub yhat_upper: f64,
    /// Trend component value.
    pub trend: f64,
    /// Contribution of each named component (seasonalities, holidays,
    /// regressors) to `yhat`, keyed by component name.
    pub components: BTreeMap<String, f64>,
}

impl ForecastRow {
    /// Contribution of a named component, if present.
    pub fn component(&self, name: &str) -> Option<f64> {
        self.components.get(name).copied()
    }
}

/// Prediction-time input: the timestamps to forecast plus whatever those
/// timestamps need — regressor values for every configured regressor, and
/// capacity/floor series under logistic growth.
#[derive(Debug, Clone, Default)]
pub struct FutureFrame {
    timestamps: Vec<DateTime<Utc>>,
    regressors: BTreeMap<String, Vec<f64>>,
    cap: Option<Vec<f64>>,
    floor: Option<Vec<f64>>,
}

impl FutureFrame {
    pub fn new(timestamps: Vec<DateTime<Utc>>) -> Self {
        Self {
            timestamps,
            ..Default::default()
        }
    }

    /// Attach regressor values aligned with the frame's timestamps.
    pub fn with_regressor(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.regressors.insert(name.into(), values);
        self
    }

    /// Attach a capacity series for logistic growth.
    pub fn with_cap(mut self, cap: Vec<f64>) -> Self {
        self.cap = Some(cap);
        self
    }

    /// Attach a floor series for logistic growth.
    pub fn with_floor(mut self, floor: Vec<f64>) -> Self {
        self.floor = Some(floor);
        self
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn regressor(&self, name: &str) -> Option<&[f64]> {
        self.regressors.get(name).map(|v| v.as_slice())
    }

    pub fn cap(&self) -> Option<&[f64]> {
        self.cap.as_deref()
    }

    pub fn floor(&self) -> Option<&[f64]> {
        self.floor.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn future_frame_builder() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let frame = FutureFrame::new(vec![base, base + chrono::Duration::days(1)])
            .with_regressor("temp", vec![20.0, 21.0])
            .with_cap(vec![100.0, 100.0]);

        assert_eq!(frame.len(), 2);
        assert_eq!(frame.regressor("temp").unwrap(), &[20.0, 21.0]);
        assert_eq!(frame.cap().unwrap(), &[100.0, 100.0]);
        assert!(frame.regressor("humidity").is_none());
        assert!(frame.floor().is_none());
    }

    #[test]
    fn forecast_row_component_lookup() {
        let row = ForecastRow {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            yhat: 10.0,
            yhat_lower: 8.0,
            yhat_upper: 12.0,
            trend: 9.0,
            components: [("weekly".to_string(), 1.0)].into_iter().collect(),
        };
        assert_eq!(row.component("weekly"), Some(1.0));
        assert_eq!(row.component("yearly"), None);
    }
}
