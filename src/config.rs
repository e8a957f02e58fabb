//! Forecast configuration with bounds checking at construction.
//!
//! All tunables live in a single [`ForecastConfig`] built through
//! [`ForecastConfigBuilder`], which rejects out-of-range values up front so
//! the fit loop never has to re-validate them.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Trend growth mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Growth {
    /// Piecewise-linear trend.
    #[default]
    Linear,
    /// Saturating logistic trend bounded by a caller-supplied capacity series.
    Logistic,
}

/// How a component combines with the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComponentMode {
    /// Effect is added to the trend level.
    #[default]
    Additive,
    /// Effect scales with the trend level.
    Multiplicative,
}

/// Activation policy for a built-in seasonal component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeasonalityToggle {
    /// Decide from training span and sampling granularity.
    #[default]
    Auto,
    /// Always active, with the given Fourier order.
    Enabled(usize),
    /// Never active.
    Disabled,
}

/// A named Fourier seasonal component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalitySpec {
    /// Component name, used in the forecast component breakdown.
    pub name: String,
    /// Period length in days (fractional periods allowed, e.g. 365.25).
    pub period_days: f64,
    /// Number of sine/cosine harmonic pairs.
    pub fourier_order: usize,
    /// Per-component mode; `None` falls back to the global seasonality mode.
    pub mode: Option<ComponentMode>,
}

impl SeasonalitySpec {
    pub fn new(name: impl Into<String>, period_days: f64, fourier_order: usize) -> Self {
        Self {
            name: name.into(),
            period_days,
            fourier_order,
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: ComponentMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// A holiday date with a surrounding effect window.
///
/// The holiday contributes its fitted offset to every timestamp whose date
/// falls within `[date - days_before, date + days_after]`. Windows sharing a
/// name share one coefficient; overlapping windows sum their effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayWindow {
    pub name: String,
    pub date: NaiveDate,
    pub days_before: u32,
    pub days_after: u32,
}

impl HolidayWindow {
    pub fn new(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            date,
            days_before: 0,
            days_after: 0,
        }
    }

    pub fn with_window(mut self, days_before: u32, days_after: u32) -> Self {
        self.days_before = days_before;
        self.days_after = days_after;
        self
    }
}

/// Reserved names for the built-in seasonal components.
pub(crate) const BUILTIN_SEASONALITY_NAMES: [&str; 3] = ["yearly", "weekly", "daily"];

/// Validated forecasting configuration.
///
/// Construct via [`ForecastConfig::builder`]; `Default` gives the standard
/// parameterization (linear growth, additive seasonality, auto-detected
/// yearly/weekly/daily components, 1000 uncertainty samples at 80%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    growth: Growth,
    seasonality_mode: ComponentMode,
    changepoint_prior_scale: f64,
    changepoint_range: f64,
    n_changepoints: usize,
    seasonality_prior_scale: f64,
    holiday_prior_scale: f64,
    uncertainty_samples: usize,
    confidence_interval: f64,
    yearly_seasonality: SeasonalityToggle,
    weekly_seasonality: SeasonalityToggle,
    daily_seasonality: SeasonalityToggle,
    seasonalities: Vec<SeasonalitySpec>,
    holidays: Vec<HolidayWindow>,
    regressors: Vec<String>,
    seed: Option<u64>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            growth: Growth::Linear,
            seasonality_mode: ComponentMode::Additive,
            changepoint_prior_scale: 0.05,
            changepoint_range: 0.8,
            n_changepoints: 25,
            seasonality_prior_scale: 10.0,
            holiday_prior_scale: 10.0,
            uncertainty_samples: 1000,
            confidence_interval: 0.8,
            yearly_seasonality: SeasonalityToggle::Auto,
            weekly_seasonality: SeasonalityToggle::Auto,
            daily_seasonality: SeasonalityToggle::Auto,
            seasonalities: Vec::new(),
            holidays: Vec::new(),
            regressors: Vec::new(),
            seed: None,
        }
    }
}

impl ForecastConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> ForecastConfigBuilder {
        ForecastConfigBuilder::default()
    }

    pub fn growth(&self) -> Growth {
        self.growth
    }

    pub fn seasonality_mode(&self) -> ComponentMode {
        self.seasonality_mode
    }

    pub fn changepoint_prior_scale(&self) -> f64 {
        self.changepoint_prior_scale
    }

    pub fn changepoint_range(&self) -> f64 {
        self.changepoint_range
    }

    pub fn n_changepoints(&self) -> usize {
        self.n_changepoints
    }

    pub fn seasonality_prior_scale(&self) -> f64 {
        self.seasonality_prior_scale
    }

    pub fn holiday_prior_scale(&self) -> f64 {
        self.holiday_prior_scale
    }

    pub fn uncertainty_samples(&self) -> usize {
        self.uncertainty_samples
    }

    pub fn confidence_interval(&self) -> f64 {
        self.confidence_interval
    }

    pub fn yearly_seasonality(&self) -> SeasonalityToggle {
        self.yearly_seasonality
    }

    pub fn weekly_seasonality(&self) -> SeasonalityToggle {
        self.weekly_seasonality
    }

    pub fn daily_seasonality(&self) -> SeasonalityToggle {
        self.daily_seasonality
    }

    pub fn seasonalities(&self) -> &[SeasonalitySpec] {
        &self.seasonalities
    }

    pub fn holidays(&self) -> &[HolidayWindow] {
        &self.holidays
    }

    pub fn regressors(&self) -> &[String] {
        &self.regressors
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// Builder for [`ForecastConfig`]; `build` performs all bounds checking.
#[derive(Debug, Clone, Default)]
pub struct ForecastConfigBuilder {
    config: ForecastConfig,
}

impl ForecastConfigBuilder {
    pub fn growth(mut self, growth: Growth) -> Self {
        self.config.growth = growth;
        self
    }

    pub fn seasonality_mode(mut self, mode: ComponentMode) -> Self {
        self.config.seasonality_mode = mode;
        self
    }

    /// Flexibility of the trend changepoints. Valid range: 0.001 to 0.5.
    pub fn changepoint_prior_scale(mut self, scale: f64) -> Self {
        self.config.changepoint_prior_scale = scale;
        self
    }

    /// Fraction of the training span over which changepoints are placed.
    /// Valid range: (0, 1].
    pub fn changepoint_range(mut self, range: f64) -> Self {
        self.config.changepoint_range = range;
        self
    }

    pub fn n_changepoints(mut self, n: usize) -> Self {
        self.config.n_changepoints = n;
        self
    }

    /// Strength of the seasonal components. Valid range: 0.01 to 100.
    pub fn seasonality_prior_scale(mut self, scale: f64) -> Self {
        self.config.seasonality_prior_scale = scale;
        self
    }

    /// Strength of the holiday effects. Valid range: 0.01 to 100.
    pub fn holiday_prior_scale(mut self, scale: f64) -> Self {
        self.config.holiday_prior_scale = scale;
        self
    }

    /// Number of Monte Carlo draws for prediction intervals, at most 5000.
    /// Zero skips sampling entirely and returns point-estimate-only bounds.
    pub fn uncertainty_samples(mut self, samples: usize) -> Self {
        self.config.uncertainty_samples = samples;
        self
    }

    /// Width of the prediction interval. Valid range: 0.1 to 0.99.
    pub fn confidence_interval(mut self, level: f64) -> Self {
        self.config.confidence_interval = level;
        self
    }

    pub fn yearly_seasonality(mut self, toggle: SeasonalityToggle) -> Self {
        self.config.yearly_seasonality = toggle;
        self
    }

    pub fn weekly_seasonality(mut self, toggle: SeasonalityToggle) -> Self {
        self.config.weekly_seasonality = toggle;
        self
    }

    pub fn daily_seasonality(mut self, toggle: SeasonalityToggle) -> Self {
        self.config.daily_seasonality = toggle;
        self
    }

    pub fn add_seasonality(mut self, spec: SeasonalitySpec) -> Self {
        self.config.seasonalities.push(spec);
        self
    }

    pub fn add_holiday(mut self, holiday: HolidayWindow) -> Self {
        self.config.holidays.push(holiday);
        self
    }

    pub fn add_regressor(mut self, name: impl Into<String>) -> Self {
        self.config.regressors.push(name.into());
        self
    }

    /// Seed for reproducible uncertainty sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Validate all fields and produce the configuration.
    pub fn build(self) -> Result<ForecastConfig> {
        let c = &self.config;

        check_range(
            "changepoint_prior_scale",
            c.changepoint_prior_scale,
            0.001,
            0.5,
        )?;
        if !(c.changepoint_range > 0.0 && c.changepoint_range <= 1.0) {
            return Err(ForecastError::Validation(format!(
                "changepoint_range must be in (0, 1], got {}",
                c.changepoint_range
            )));
        }
        check_range(
            "seasonality_prior_scale",
            c.seasonality_prior_scale,
            0.01,
            100.0,
        )?;
        check_range("holiday_prior_scale", c.holiday_prior_scale, 0.01, 100.0)?;
        if c.uncertainty_samples > 5000 {
            return Err(ForecastError::Validation(format!(
                "uncertainty_samples must be at most 5000, got {}",
                c.uncertainty_samples
            )));
        }
        check_range("confidence_interval", c.confidence_interval, 0.1, 0.99)?;

        for toggle in [
            c.yearly_seasonality,
            c.weekly_seasonality,
            c.daily_seasonality,
        ] {
            if let SeasonalityToggle::Enabled(order) = toggle {
                if order == 0 {
                    return Err(ForecastError::Validation(
                        "fourier_order must be at least 1".to_string(),
                    ));
                }
            }
        }

        let mut seen_names: Vec<&str> = Vec::new();
        for spec in &c.seasonalities {
            if spec.name.is_empty() {
                return Err(ForecastError::Validation(
                    "seasonality name must not be empty".to_string(),
                ));
            }
            if BUILTIN_SEASONALITY_NAMES.contains(&spec.name.as_str()) {
                return Err(ForecastError::Validation(format!(
                    "seasonality name '{}' is reserved; use the built-in toggle instead",
                    spec.name
                )));
            }
            if seen_names.contains(&spec.name.as_str()) {
                return Err(ForecastError::Validation(format!(
                    "duplicate seasonality name '{}'",
                    spec.name
                )));
            }
            seen_names.push(&spec.name);
            if !(spec.period_days.is_finite() && spec.period_days > 0.0) {
                return Err(ForecastError::Validation(format!(
                    "seasonality '{}' period must be a positive number of days",
                    spec.name
                )));
            }
            if spec.fourier_order == 0 {
                return Err(ForecastError::Validation(format!(
                    "seasonality '{}' fourier_order must be at least 1",
                    spec.name
                )));
            }
        }

        for holiday in &c.holidays {
            if holiday.name.is_empty() {
                return Err(ForecastError::Validation(
                    "holiday name must not be empty".to_string(),
                ));
            }
        }

        let mut seen_regressors: Vec<&str> = Vec::new();
        for name in &c.regressors {
            if name.is_empty() {
                return Err(ForecastError::Validation(
                    "regressor name must not be empty".to_string(),
                ));
            }
            if seen_regressors.contains(&name.as_str()) {
                return Err(ForecastError::Validation(format!(
                    "duplicate regressor name '{}'",
                    name
                )));
            }
            seen_regressors.push(name);
        }

        Ok(self.config)
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ForecastError::Validation(format!(
            "{name} must be in [{min}, {max}], got {value}"
        )))
    }
}
