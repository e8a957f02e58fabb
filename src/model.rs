//! Model fitting and prediction.
//!
//! [`FittedModel`] holds everything needed to forecast: the configuration,
//! the scaling frozen at fit time, the trend parameters, and the component
//! coefficients. It is serializable, so a model fitted in one process can be
//! stored and used for prediction in another.

use crate::config::{ComponentMode, ForecastConfig, Growth, SeasonalitySpec};
use crate::core::{prepare, ForecastRow, FutureFrame, PreparedSeries, RawSample};
use crate::design::{
    self, build_blocks, fit_scales, flatten, mode_effects, piecewise_linear, piecewise_logistic,
    place_changepoints, resolve_seasonalities, standardized_columns,
    standardized_future_columns, RegressorScale,
};
use crate::error::{ForecastError, Result};
use crate::fit::{optimize, FitProblem, TrendParams};
use crate::uncertainty::{simulate_intervals, SimulationInput};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::mpsc;
use std::time::Instant;

/// A fitted forecasting model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedModel {
    config: ForecastConfig,
    start: DateTime<Utc>,
    last_timestamp: DateTime<Utc>,
    /// Training span in seconds; scaled time is seconds-since-start over this.
    t_scale_secs: f64,
    /// Data scale: max absolute value of the (floor-shifted) observations.
    y_scale: f64,
    /// Whether a floor series was used for scaling (logistic growth only).
    uses_floor: bool,
    /// Changepoint locations in scaled time.
    changepoints: Vec<f64>,
    trend: TrendParams,
    /// Resolved seasonal components, each with a concrete mode.
    seasonalities: Vec<SeasonalitySpec>,
    holiday_names: Vec<String>,
    regressor_scales: BTreeMap<String, RegressorScale>,
    beta_additive: Vec<f64>,
    beta_multiplicative: Vec<f64>,
    noise_var: f64,
    granularity_secs: i64,
}

impl FittedModel {
    /// Fit a model to a prepared series.
    pub fn fit(series: &PreparedSeries, config: &ForecastConfig) -> Result<Self> {
        let start = series.start();
        let t_scale_secs = duration_secs(series.span());
        let t: Vec<f64> = series
            .timestamps()
            .iter()
            .map(|ts| duration_secs(*ts - start) / t_scale_secs)
            .collect();

        let uses_floor = config.growth() == Growth::Logistic && series.floor().is_some();
        let floor_at = |i: usize| -> f64 {
            if uses_floor {
                series.floor().map(|f| f[i]).unwrap_or(0.0)
            } else {
                0.0
            }
        };
        let y_scale = series
            .values()
            .iter()
            .enumerate()
            .map(|(i, &y)| (y - floor_at(i)).abs())
            .fold(0.0, f64::max)
            .max(1e-12);
        let y_scaled: Vec<f64> = series
            .values()
            .iter()
            .enumerate()
            .map(|(i, &y)| (y - floor_at(i)) / y_scale)
            .collect();
        let cap_scaled: Option<Vec<f64>> = series.cap().map(|cap| {
            cap.iter()
                .enumerate()
                .map(|(i, &c)| (c - floor_at(i)) / y_scale)
                .collect()
        });

        let changepoints = place_changepoints(&t, config.n_changepoints(), config.changepoint_range());
        let seasonalities = resolve_seasonalities(config, series.span(), series.granularity());
        let holiday_names = design::holiday_names(config.holidays());
        let regressor_scales = fit_scales(series);
        let regressor_names: Vec<String> = regressor_scales.keys().cloned().collect();
        let regressor_columns = standardized_columns(series, &regressor_names, &regressor_scales);

        let blocks = build_blocks(
            series.timestamps(),
            &seasonalities,
            config.holidays(),
            &holiday_names,
            &regressor_names,
            regressor_columns,
            config.seasonality_mode(),
            config.seasonality_prior_scale(),
            config.holiday_prior_scale(),
        );
        let (additive_columns, additive_priors) = flatten(&blocks, ComponentMode::Additive);
        let (multiplicative_columns, multiplicative_priors) =
            flatten(&blocks, ComponentMode::Multiplicative);

        let problem = FitProblem {
            t: &t,
            y: &y_scaled,
            cap: cap_scaled.as_deref(),
            changepoints: &changepoints,
            additive_columns: &additive_columns,
            additive_priors: &additive_priors,
            multiplicative_columns: &multiplicative_columns,
            multiplicative_priors: &multiplicative_priors,
            growth: config.growth(),
            changepoint_prior_scale: config.changepoint_prior_scale(),
        };
        let outcome = optimize(&problem)?;
        tracing::info!(
            rows = series.len(),
            changepoints = changepoints.len(),
            iterations = outcome.iterations,
            noise_var = outcome.noise_var,
            "model fitted"
        );

        Ok(Self {
            config: config.clone(),
            start,
            last_timestamp: series.end(),
            t_scale_secs,
            y_scale,
            uses_floor,
            changepoints,
            trend: outcome.trend,
            seasonalities,
            holiday_names,
            regressor_scales,
            beta_additive: outcome.beta_additive,
            beta_multiplicative: outcome.beta_multiplicative,
            noise_var: outcome.noise_var,
            granularity_secs: series.granularity().num_seconds(),
        })
    }

    /// Forecast at the timestamps of `frame`.
    ///
    /// Fails when the frame is empty, when logistic growth is missing its
    /// capacity (or floor, if the model was trained with one), or when a
    /// configured regressor has no value for some timestamp.
    pub fn predict(&self, frame: &FutureFrame) -> Result<Vec<ForecastRow>> {
        if frame.is_empty() {
            return Err(ForecastError::Validation(
                "prediction frame has no timestamps".to_string(),
            ));
        }
        let n = frame.len();
        let t: Vec<f64> = frame
            .timestamps()
            .iter()
            .map(|ts| duration_secs(*ts - self.start) / self.t_scale_secs)
            .collect();

        let (cap_scaled, floor_rows) = self.logistic_bounds(frame)?;

        let regressor_names: Vec<String> = self.regressor_scales.keys().cloned().collect();
        let regressor_columns =
            standardized_future_columns(frame, &regressor_names, &self.regressor_scales)?;
        let blocks = build_blocks(
            frame.timestamps(),
            &self.seasonalities,
            self.config.holidays(),
            &self.holiday_names,
            &regressor_names,
            regressor_columns,
            self.config.seasonality_mode(),
            self.config.seasonality_prior_scale(),
            self.config.holiday_prior_scale(),
        );

        let g = match self.config.growth() {
            Growth::Linear => piecewise_linear(
                &t,
                &self.changepoints,
                self.trend.k,
                self.trend.m,
                &self.trend.deltas,
            ),
            Growth::Logistic => piecewise_logistic(
                &t,
                cap_scaled.as_deref().unwrap_or(&[]),
                &self.changepoints,
                self.trend.k,
                self.trend.m,
                &self.trend.deltas,
            ),
        };

        let (additive_named, additive_total) =
            mode_effects(&blocks, ComponentMode::Additive, &self.beta_additive, n);
        let (multiplicative_named, multiplicative_total) = mode_effects(
            &blocks,
            ComponentMode::Multiplicative,
            &self.beta_multiplicative,
            n,
        );
        let multiplier: Vec<f64> = multiplicative_total.iter().map(|&e| 1.0 + e).collect();
        let yhat_scaled: Vec<f64> = (0..n)
            .map(|i| g[i] * multiplier[i] + additive_total[i])
            .collect();

        let to_data_scale =
            |i: usize, scaled: f64| -> f64 { floor_rows[i] + self.y_scale * scaled };

        let (lower, upper) = if self.config.uncertainty_samples() == 0 {
            let point: Vec<f64> = (0..n).map(|i| to_data_scale(i, yhat_scaled[i])).collect();
            (point.clone(), point)
        } else {
            let input = SimulationInput {
                growth: self.config.growth(),
                trend: &self.trend,
                changepoints: &self.changepoints,
                t: &t,
                cap: cap_scaled.as_deref(),
                multiplier: &multiplier,
                additive_term: &additive_total,
                noise_std: self.noise_var.sqrt(),
                n_samples: self.config.uncertainty_samples(),
                level: self.config.confidence_interval(),
                seed: self.config.seed(),
            };
            let (lower_scaled, upper_scaled) = simulate_intervals(&input)?;
            let lower: Vec<f64> = (0..n).map(|i| to_data_scale(i, lower_scaled[i])).collect();
            let upper: Vec<f64> = (0..n).map(|i| to_data_scale(i, upper_scaled[i])).collect();
            (lower, upper)
        };

        let rows = (0..n)
            .map(|i| {
                let yhat = to_data_scale(i, yhat_scaled[i]);
                let mut components = BTreeMap::new();
                for (name, effect) in &additive_named {
                    components.insert(name.clone(), self.y_scale * effect[i]);
                }
                for (name, effect) in &multiplicative_named {
                    components.insert(name.clone(), self.y_scale * g[i] * effect[i]);
                }
                ForecastRow {
                    timestamp: frame.timestamps()[i],
                    yhat,
                    yhat_lower: lower[i].min(yhat),
                    yhat_upper: upper[i].max(yhat),
                    trend: to_data_scale(i, g[i]),
                    components,
                }
            })
            .collect();
        Ok(rows)
    }

    /// Build a frame of `periods` future timestamps continuing past the
    /// training window at the training granularity.
    pub fn make_future(&self, periods: usize) -> FutureFrame {
        self.make_future_with_step(periods, Duration::seconds(self.granularity_secs.max(1)))
    }

    /// Build a future frame with an explicit step between timestamps.
    pub fn make_future_with_step(&self, periods: usize, step: Duration) -> FutureFrame {
        let timestamps = (1..=periods as i32)
            .map(|i| self.last_timestamp + step * i)
            .collect();
        FutureFrame::new(timestamps)
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// End of the training window.
    pub fn last_timestamp(&self) -> DateTime<Utc> {
        self.last_timestamp
    }

    /// Changepoint locations as instants.
    pub fn changepoint_timestamps(&self) -> Vec<DateTime<Utc>> {
        self.changepoints
            .iter()
            .map(|&s| {
                self.start + Duration::milliseconds((s * self.t_scale_secs * 1000.0) as i64)
            })
            .collect()
    }

    /// Validate and scale the capacity/floor series for logistic growth.
    /// Returns the scaled capacity and the per-row floor in data scale.
    fn logistic_bounds(&self, frame: &FutureFrame) -> Result<(Option<Vec<f64>>, Vec<f64>)> {
        let n = frame.len();
        if self.config.growth() != Growth::Logistic {
            return Ok((None, vec![0.0; n]));
        }

        let cap = frame.cap().ok_or_else(|| {
            ForecastError::Validation(
                "logistic growth requires a capacity series in the prediction frame".to_string(),
            )
        })?;
        if cap.len() != n {
            return Err(ForecastError::Validation(format!(
                "capacity series has {} values for {} timestamps",
                cap.len(),
                n
            )));
        }

        let floor_rows: Vec<f64> = if self.uses_floor {
            let floor = frame.floor().ok_or_else(|| {
                ForecastError::Validation(
                    "model was fitted with a floor; the prediction frame needs one too"
                        .to_string(),
                )
            })?;
            if floor.len() != n {
                return Err(ForecastError::Validation(format!(
                    "floor series has {} values for {} timestamps",
                    floor.len(),
                    n
                )));
            }
            floor.to_vec()
        } else {
            vec![0.0; n]
        };

        let mut cap_scaled = Vec::with_capacity(n);
        for (i, &c) in cap.iter().enumerate() {
            if !c.is_finite() || c <= floor_rows[i] {
                return Err(ForecastError::Validation(format!(
                    "capacity {} at {} must be finite and above the floor {}",
                    c,
                    frame.timestamps()[i],
                    floor_rows[i]
                )));
            }
            cap_scaled.push((c - floor_rows[i]) / self.y_scale);
        }
        Ok((Some(cap_scaled), floor_rows))
    }
}

fn duration_secs(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}

/// Prepare raw samples and fit a model in one step.
pub fn fit(samples: &[RawSample], config: &ForecastConfig) -> Result<FittedModel> {
    let series = prepare(samples, config)?;
    FittedModel::fit(&series, config)
}

/// Fit with an external wall-clock deadline.
///
/// The optimization runs on a worker thread; if it does not finish within
/// `timeout` the call returns [`ForecastError::FitTimeout`] and the worker is
/// left to finish and be discarded in the background.
pub fn fit_with_timeout(
    samples: &[RawSample],
    config: &ForecastConfig,
    timeout: std::time::Duration,
) -> Result<FittedModel> {
    let started = Instant::now();
    let (tx, rx) = mpsc::channel();
    let samples = samples.to_vec();
    let config = config.clone();
    std::thread::spawn(move || {
        let _ = tx.send(fit(&samples, &config));
    });
    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => Err(ForecastError::FitTimeout {
            elapsed: started.elapsed(),
        }),
    }
}
