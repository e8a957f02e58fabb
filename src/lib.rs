//! Time-series decomposition and forecasting.
//!
//! The model decomposes a series into a piecewise trend (linear or saturating
//! logistic), Fourier seasonal components, holiday effects, and linear
//! regressor effects, fitted by maximum a posteriori optimization.
//! Prediction intervals come from Monte Carlo simulation of future trend
//! changes plus observation noise.
//!
//! # Quick start
//!
//! ```no_run
//! use augur_forecast::{fit, ForecastConfig, RawSample};
//!
//! # fn main() -> augur_forecast::Result<()> {
//! let samples: Vec<RawSample> = (0..120i64)
//!     .map(|i| RawSample::new(1_700_000_000 + i * 86_400, 100.0 + 0.3 * i as f64))
//!     .collect();
//!
//! let config = ForecastConfig::default();
//! let model = fit(&samples, &config)?;
//! let forecast = model.predict(&model.make_future(30))?;
//! for row in &forecast {
//!     println!("{}: {:.2} [{:.2}, {:.2}]", row.timestamp, row.yhat, row.yhat_lower, row.yhat_upper);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod design;
pub mod error;
pub mod fit;
pub mod model;
pub mod stats;
pub mod uncertainty;
pub mod validation;

pub use crate::config::{
    ComponentMode, ForecastConfig, ForecastConfigBuilder, Growth, HolidayWindow, SeasonalitySpec,
    SeasonalityToggle,
};
pub use crate::core::{prepare, ForecastRow, FutureFrame, PreparedSeries, RawSample, RawTimestamp};
pub use crate::error::{ForecastError, Result};
pub use crate::model::{fit, fit_with_timeout, FittedModel};
pub use crate::validation::{
    calculate_metrics, cross_validate, performance_metrics, AccuracyMetrics, CvFold,
};

/// Commonly used items in one import.
pub mod prelude {
    pub use crate::config::{
        ComponentMode, ForecastConfig, Growth, HolidayWindow, SeasonalitySpec, SeasonalityToggle,
    };
    pub use crate::core::{ForecastRow, FutureFrame, RawSample};
    pub use crate::error::{ForecastError, Result};
    pub use crate::model::{fit, fit_with_timeout, FittedModel};
    pub use crate::validation::{cross_validate, performance_metrics};
}
