//! Rolling-origin cross-validation.
//!
//! Cutoffs are spaced `period` apart, working backward from the latest point
//! that still leaves a full `horizon` of held-out data, and never earlier
//! than `initial` past the start of the series. Each fold refits the model on
//! data up to its cutoff and forecasts the held-out window.

use crate::config::ForecastConfig;
use crate::core::{prepare, ForecastRow, FutureFrame, PreparedSeries, RawSample};
use crate::error::{ForecastError, Result};
use crate::model::FittedModel;
use chrono::{DateTime, Duration, Utc};

/// One cross-validation fold: the forecast over the held-out window after the
/// cutoff, with the actual observed values aligned row for row.
#[derive(Debug, Clone)]
pub struct CvFold {
    pub cutoff: DateTime<Utc>,
    pub forecast: Vec<ForecastRow>,
    pub actual: Vec<f64>,
}

/// Run rolling-origin cross-validation.
///
/// Fails when the spans leave no room for a single fold.
pub fn cross_validate(
    samples: &[RawSample],
    config: &ForecastConfig,
    initial: Duration,
    period: Duration,
    horizon: Duration,
) -> Result<Vec<CvFold>> {
    if initial <= Duration::zero() || period <= Duration::zero() || horizon <= Duration::zero() {
        return Err(ForecastError::Validation(
            "initial, period, and horizon must all be positive".to_string(),
        ));
    }

    let series = prepare(samples, config)?;
    let cutoffs = generate_cutoffs(&series, initial, period, horizon)?;
    tracing::debug!(folds = cutoffs.len(), "running cross-validation");

    let mut folds = Vec::with_capacity(cutoffs.len());
    for cutoff in cutoffs {
        let train = series.slice_up_to(cutoff)?;
        let model = FittedModel::fit(&train, config)?;

        let holdout: Vec<usize> = series
            .timestamps()
            .iter()
            .enumerate()
            .filter(|(_, ts)| **ts > cutoff && **ts <= cutoff + horizon)
            .map(|(i, _)| i)
            .collect();
        if holdout.is_empty() {
            continue;
        }

        let frame = holdout_frame(&series, &holdout);
        let forecast = model.predict(&frame)?;
        let actual: Vec<f64> = holdout.iter().map(|&i| series.values()[i]).collect();
        folds.push(CvFold {
            cutoff,
            forecast,
            actual,
        });
    }

    if folds.is_empty() {
        return Err(ForecastError::Validation(
            "no cross-validation folds produced; the series is too short for the given \
             initial/period/horizon"
                .to_string(),
        ));
    }
    Ok(folds)
}

/// Cutoffs in ascending order, spaced `period` apart from the end.
fn generate_cutoffs(
    series: &PreparedSeries,
    initial: Duration,
    period: Duration,
    horizon: Duration,
) -> Result<Vec<DateTime<Utc>>> {
    let earliest = series.start() + initial;
    let mut cutoff = series.end() - horizon;
    let mut cutoffs = Vec::new();
    while cutoff >= earliest {
        cutoffs.push(cutoff);
        cutoff = cutoff - period;
    }
    if cutoffs.is_empty() {
        return Err(ForecastError::Validation(format!(
            "series spanning {} days cannot hold an initial window of {} days plus a horizon \
             of {} days",
            series.span().num_days(),
            initial.num_days(),
            horizon.num_days()
        )));
    }
    cutoffs.reverse();
    Ok(cutoffs)
}

/// Build the prediction frame for a set of held-out row indices, carrying
/// over regressor and capacity values from the observed data.
fn holdout_frame(series: &PreparedSeries, indices: &[usize]) -> FutureFrame {
    let timestamps: Vec<DateTime<Utc>> = indices
        .iter()
        .map(|&i| series.timestamps()[i])
        .collect();
    let mut frame = FutureFrame::new(timestamps);
    for name in series.regressor_names() {
        let column = series.regressor(name).unwrap_or(&[]);
        let values: Vec<f64> = indices.iter().map(|&i| column[i]).collect();
        frame = frame.with_regressor(name, values);
    }
    if let Some(cap) = series.cap() {
        frame = frame.with_cap(indices.iter().map(|&i| cap[i]).collect());
    }
    if let Some(floor) = series.floor() {
        frame = frame.with_floor(indices.iter().map(|&i| floor[i]).collect());
    }
    frame
}
