//! Design matrix construction.
//!
//! The regression features are grouped into named blocks (one per seasonal
//! component, one per holiday name group, one per regressor), each carrying
//! its combination mode and prior scale. Blocks are built in a deterministic
//! order so coefficient vectors stored in a fitted model line up with the
//! features rebuilt at prediction time.

pub mod holiday;
pub mod regressor;
pub mod seasonality;
pub mod trend;

pub use holiday::{holiday_columns, holiday_names};
pub use regressor::{
    fit_scales, standardized_columns, standardized_future_columns, RegressorScale,
};
pub use seasonality::{fourier_columns, resolve_seasonalities};
pub use trend::{
    hinge_columns, linear_growth_init, logistic_growth_init, piecewise_linear,
    piecewise_logistic, place_changepoints,
};

use crate::config::{ComponentMode, HolidayWindow, SeasonalitySpec};
use chrono::{DateTime, Utc};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Regressor effects share one prior strength, matching the default strength
/// of the other components.
const REGRESSOR_PRIOR_SCALE: f64 = 10.0;

/// A named group of feature columns sharing a mode and a prior scale.
#[derive(Debug, Clone)]
pub struct FeatureBlock {
    pub name: String,
    pub mode: ComponentMode,
    pub prior_scale: f64,
    pub columns: Vec<Vec<f64>>,
}

/// Fractional days since the Unix epoch for each timestamp.
pub fn day_of_epoch(timestamps: &[DateTime<Utc>]) -> Vec<f64> {
    timestamps
        .iter()
        .map(|ts| ts.timestamp() as f64 / SECONDS_PER_DAY)
        .collect()
}

/// Build all feature blocks for the given timestamps.
///
/// Order is fixed: seasonal components in their resolved order, then holiday
/// name groups, then regressors. `regressor_columns` must already be
/// standardized and aligned with `regressor_names`.
#[allow(clippy::too_many_arguments)]
pub fn build_blocks(
    timestamps: &[DateTime<Utc>],
    seasonalities: &[SeasonalitySpec],
    holidays: &[HolidayWindow],
    holiday_names: &[String],
    regressor_names: &[String],
    regressor_columns: Vec<Vec<f64>>,
    global_mode: ComponentMode,
    seasonality_prior_scale: f64,
    holiday_prior_scale: f64,
) -> Vec<FeatureBlock> {
    let days = day_of_epoch(timestamps);
    let mut blocks = Vec::new();

    for spec in seasonalities {
        blocks.push(FeatureBlock {
            name: spec.name.clone(),
            mode: spec.mode.unwrap_or(global_mode),
            prior_scale: seasonality_prior_scale,
            columns: fourier_columns(&days, spec.period_days, spec.fourier_order),
        });
    }

    if !holiday_names.is_empty() {
        let columns = holiday_columns(timestamps, holidays, holiday_names);
        for (name, column) in holiday_names.iter().zip(columns) {
            blocks.push(FeatureBlock {
                name: name.clone(),
                mode: global_mode,
                prior_scale: holiday_prior_scale,
                columns: vec![column],
            });
        }
    }

    for (name, column) in regressor_names.iter().zip(regressor_columns) {
        blocks.push(FeatureBlock {
            name: name.clone(),
            mode: global_mode,
            prior_scale: REGRESSOR_PRIOR_SCALE,
            columns: vec![column],
        });
    }

    blocks
}

/// Flatten the blocks of one mode into a column list and per-column priors,
/// preserving block order.
pub fn flatten(blocks: &[FeatureBlock], mode: ComponentMode) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut columns = Vec::new();
    let mut priors = Vec::new();
    for block in blocks.iter().filter(|b| b.mode == mode) {
        for column in &block.columns {
            columns.push(column.clone());
            priors.push(block.prior_scale);
        }
    }
    (columns, priors)
}

/// Per-block effects `X_b * beta_b` for the blocks of one mode, where `beta`
/// is the flattened coefficient vector for that mode. Returns the named
/// per-block effect series and the row-wise total.
pub fn mode_effects(
    blocks: &[FeatureBlock],
    mode: ComponentMode,
    beta: &[f64],
    n_rows: usize,
) -> (Vec<(String, Vec<f64>)>, Vec<f64>) {
    let mut named = Vec::new();
    let mut total = vec![0.0; n_rows];
    let mut offset = 0;
    for block in blocks.iter().filter(|b| b.mode == mode) {
        let mut effect = vec![0.0; n_rows];
        for column in &block.columns {
            let b = beta[offset];
            for (e, &x) in effect.iter_mut().zip(column.iter()) {
                *e += b * x;
            }
            offset += 1;
        }
        for (t, &e) in total.iter_mut().zip(effect.iter()) {
            *t += e;
        }
        named.push((block.name.clone(), effect));
    }
    (named, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn daily_timestamps(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::days(i as i64)).collect()
    }

    fn weekly_spec() -> SeasonalitySpec {
        SeasonalitySpec::new("weekly", 7.0, 2).with_mode(ComponentMode::Additive)
    }

    #[test]
    fn block_order_is_deterministic() {
        let timestamps = daily_timestamps(10);
        let holidays = vec![HolidayWindow::new(
            "launch",
            chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        )];
        let names = holiday_names(&holidays);
        let blocks = build_blocks(
            &timestamps,
            &[weekly_spec()],
            &holidays,
            &names,
            &["temp".to_string()],
            vec![vec![0.0; 10]],
            ComponentMode::Additive,
            10.0,
            5.0,
        );

        let block_names: Vec<&str> = blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(block_names, vec!["weekly", "launch", "temp"]);
        assert_eq!(blocks[0].columns.len(), 4);
        assert_relative_eq!(blocks[1].prior_scale, 5.0);
        assert_relative_eq!(blocks[2].prior_scale, 10.0);
    }

    #[test]
    fn flatten_selects_one_mode() {
        let timestamps = daily_timestamps(5);
        let mut blocks = build_blocks(
            &timestamps,
            &[weekly_spec()],
            &[],
            &[],
            &[],
            Vec::new(),
            ComponentMode::Additive,
            10.0,
            10.0,
        );
        blocks.push(FeatureBlock {
            name: "boost".to_string(),
            mode: ComponentMode::Multiplicative,
            prior_scale: 10.0,
            columns: vec![vec![1.0; 5]],
        });

        let (add_columns, add_priors) = flatten(&blocks, ComponentMode::Additive);
        assert_eq!(add_columns.len(), 4);
        assert_eq!(add_priors, vec![10.0; 4]);

        let (mul_columns, _) = flatten(&blocks, ComponentMode::Multiplicative);
        assert_eq!(mul_columns.len(), 1);
    }

    #[test]
    fn mode_effects_sum_per_block() {
        let blocks = vec![
            FeatureBlock {
                name: "a".to_string(),
                mode: ComponentMode::Additive,
                prior_scale: 10.0,
                columns: vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            },
            FeatureBlock {
                name: "b".to_string(),
                mode: ComponentMode::Additive,
                prior_scale: 10.0,
                columns: vec![vec![10.0, 20.0]],
            },
        ];
        let beta = [1.0, 0.5, 0.1];
        let (named, total) = mode_effects(&blocks, ComponentMode::Additive, &beta, 2);

        assert_eq!(named.len(), 2);
        assert_eq!(named[0].0, "a");
        assert_relative_eq!(named[0].1[0], 2.5); // 1*1 + 0.5*3
        assert_relative_eq!(named[0].1[1], 4.0); // 1*2 + 0.5*4
        assert_relative_eq!(named[1].1[0], 1.0);
        assert_relative_eq!(total[0], 3.5);
        assert_relative_eq!(total[1], 6.0);
    }

    #[test]
    fn day_of_epoch_matches_calendar() {
        let ts = Utc.with_ymd_and_hms(1970, 1, 2, 12, 0, 0).unwrap();
        let days = day_of_epoch(&[ts]);
        assert_relative_eq!(days[0], 1.5);
    }
}
