//! Fourier-series seasonal components.
//!
//! Each component is a finite Fourier series of a configured order over a
//! configured period. Features are evaluated from the timestamp's fractional
//! day count since the Unix epoch, so the phase at any instant is a
//! deterministic function of the calendar, modulo the period.

use crate::config::{ComponentMode, ForecastConfig, SeasonalitySpec, SeasonalityToggle};
use chrono::Duration;
use std::f64::consts::TAU;

const YEARLY_PERIOD_DAYS: f64 = 365.25;
const YEARLY_DEFAULT_ORDER: usize = 10;
const WEEKLY_PERIOD_DAYS: f64 = 7.0;
const WEEKLY_DEFAULT_ORDER: usize = 3;
const DAILY_PERIOD_DAYS: f64 = 1.0;
const DAILY_DEFAULT_ORDER: usize = 4;

/// Fourier feature columns for one seasonal component: `2 * order` columns
/// ordered `[sin_1, cos_1, sin_2, cos_2, ...]`.
pub fn fourier_columns(day_of_epoch: &[f64], period_days: f64, order: usize) -> Vec<Vec<f64>> {
    let mut columns = Vec::with_capacity(2 * order);
    for harmonic in 1..=order {
        let freq = TAU * harmonic as f64 / period_days;
        columns.push(day_of_epoch.iter().map(|&d| (freq * d).sin()).collect());
        columns.push(day_of_epoch.iter().map(|&d| (freq * d).cos()).collect());
    }
    columns
}

/// Resolve the active seasonal components for a training series.
///
/// Built-in components set to `Auto` are activated from the data: yearly
/// requires at least two years of span, weekly at least two weeks of span
/// with sub-monthly sampling, daily requires sub-daily sampling. Custom
/// components are always active. Every returned spec carries a concrete mode.
pub fn resolve_seasonalities(
    config: &ForecastConfig,
    span: Duration,
    granularity: Duration,
) -> Vec<SeasonalitySpec> {
    let mut resolved = Vec::new();
    let global_mode = config.seasonality_mode();

    let yearly_auto = span >= Duration::days(730);
    if let Some(order) = toggle_order(config.yearly_seasonality(), yearly_auto, YEARLY_DEFAULT_ORDER)
    {
        resolved.push(concrete("yearly", YEARLY_PERIOD_DAYS, order, global_mode));
    } else {
        tracing::debug!(span_days = span.num_days(), "yearly seasonality inactive");
    }

    let weekly_auto = span >= Duration::days(14) && granularity < Duration::days(30);
    if let Some(order) = toggle_order(config.weekly_seasonality(), weekly_auto, WEEKLY_DEFAULT_ORDER)
    {
        resolved.push(concrete("weekly", WEEKLY_PERIOD_DAYS, order, global_mode));
    }

    let daily_auto = granularity < Duration::days(1) && span >= Duration::days(2);
    if let Some(order) = toggle_order(config.daily_seasonality(), daily_auto, DAILY_DEFAULT_ORDER) {
        resolved.push(concrete("daily", DAILY_PERIOD_DAYS, order, global_mode));
    }

    for spec in config.seasonalities() {
        let mut spec = spec.clone();
        if spec.mode.is_none() {
            spec.mode = Some(global_mode);
        }
        resolved.push(spec);
    }

    tracing::debug!(
        components = ?resolved.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        "resolved seasonal components"
    );
    resolved
}

fn toggle_order(
    toggle: SeasonalityToggle,
    auto_active: bool,
    default_order: usize,
) -> Option<usize> {
    match toggle {
        SeasonalityToggle::Auto if auto_active => Some(default_order),
        SeasonalityToggle::Auto => None,
        SeasonalityToggle::Enabled(order) => Some(order),
        SeasonalityToggle::Disabled => None,
    }
}

fn concrete(name: &str, period_days: f64, order: usize, mode: ComponentMode) -> SeasonalitySpec {
    SeasonalitySpec::new(name, period_days, order).with_mode(mode)
}
