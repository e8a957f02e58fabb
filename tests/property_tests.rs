//! Property-based checks over the public forecasting API.

use augur_forecast::{fit, ComponentMode, ForecastConfig, RawSample, SeasonalityToggle};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::f64::consts::TAU;

fn base() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn trend_samples(n: usize, intercept: f64, slope: f64) -> Vec<RawSample> {
    (0..n)
        .map(|i| {
            // Deterministic ripple keeps the residual variance positive.
            let ripple = 0.3 * (TAU * i as f64 / 9.0).sin();
            RawSample::new(
                base() + Duration::days(i as i64),
                intercept + slope * i as f64 + ripple,
            )
        })
        .collect()
}

fn config(samples: usize, mode: ComponentMode, seed: u64) -> ForecastConfig {
    ForecastConfig::builder()
        .uncertainty_samples(samples)
        .seasonality_mode(mode)
        .seed(seed)
        .n_changepoints(5)
        .yearly_seasonality(SeasonalityToggle::Disabled)
        .weekly_seasonality(SeasonalityToggle::Disabled)
        .daily_seasonality(SeasonalityToggle::Disabled)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn bounds_always_bracket_point_estimate(
        intercept in -50.0..50.0f64,
        slope in -2.0..2.0f64,
        seed in 0u64..1000,
    ) {
        let samples = trend_samples(60, intercept, slope);
        let model = fit(&samples, &config(100, ComponentMode::Additive, seed)).unwrap();
        let rows = model.predict(&model.make_future(10)).unwrap();

        prop_assert_eq!(rows.len(), 10);
        for row in &rows {
            prop_assert!(row.yhat.is_finite());
            prop_assert!(row.yhat_lower <= row.yhat);
            prop_assert!(row.yhat_upper >= row.yhat);
        }
    }

    #[test]
    fn zero_samples_collapse_the_interval(
        intercept in -50.0..50.0f64,
        slope in -2.0..2.0f64,
    ) {
        let samples = trend_samples(60, intercept, slope);
        let model = fit(&samples, &config(0, ComponentMode::Additive, 0)).unwrap();
        let rows = model.predict(&model.make_future(5)).unwrap();

        for row in &rows {
            prop_assert_eq!(row.yhat_lower, row.yhat);
            prop_assert_eq!(row.yhat_upper, row.yhat);
        }
    }

    #[test]
    fn horizon_length_matches_request(periods in 1usize..40) {
        let samples = trend_samples(50, 10.0, 0.5);
        let model = fit(&samples, &config(0, ComponentMode::Additive, 0)).unwrap();
        let rows = model.predict(&model.make_future(periods)).unwrap();
        prop_assert_eq!(rows.len(), periods);

        // Timestamps continue the daily spacing past the training window.
        prop_assert!(rows[0].timestamp > model.last_timestamp());
        for pair in rows.windows(2) {
            prop_assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::days(1));
        }
    }

    #[test]
    fn seasonal_contribution_follows_component_mode(scale in 2.0..10.0f64) {
        // Additive data: the trend level scales but the weekly amplitude is
        // fixed, so the fitted additive contribution stays put. Multiplicative
        // data: the weekly effect is proportional to the level, so the fitted
        // contribution scales with it.
        let weekly = |i: usize| (TAU * i as f64 / 7.0).sin();
        let additive = |level: f64| -> Vec<RawSample> {
            (0..120)
                .map(|i| RawSample::new(
                    base() + Duration::days(i as i64),
                    level * (50.0 + 0.1 * i as f64) + 5.0 * weekly(i),
                ))
                .collect()
        };
        let multiplicative = |level: f64| -> Vec<RawSample> {
            (0..120)
                .map(|i| RawSample::new(
                    base() + Duration::days(i as i64),
                    level * (50.0 + 0.1 * i as f64) * (1.0 + 0.1 * weekly(i)),
                ))
                .collect()
        };
        let weekly_config = |mode: ComponentMode| {
            ForecastConfig::builder()
                .uncertainty_samples(0)
                .seasonality_mode(mode)
                .n_changepoints(5)
                .yearly_seasonality(SeasonalityToggle::Disabled)
                .weekly_seasonality(SeasonalityToggle::Enabled(3))
                .daily_seasonality(SeasonalityToggle::Disabled)
                .build()
                .unwrap()
        };
        let amplitude = |samples: &[RawSample], mode: ComponentMode| -> f64 {
            let model = fit(samples, &weekly_config(mode)).unwrap();
            let rows = model.predict(&model.make_future(14)).unwrap();
            let effects: Vec<f64> = rows
                .iter()
                .map(|r| r.component("weekly").unwrap())
                .collect();
            effects.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
                - effects.iter().cloned().fold(f64::INFINITY, f64::min)
        };

        let add_unit = amplitude(&additive(1.0), ComponentMode::Additive);
        let add_scaled = amplitude(&additive(scale), ComponentMode::Additive);
        prop_assert!((add_scaled / add_unit - 1.0).abs() < 0.1,
            "additive amplitude moved: {add_unit} -> {add_scaled}");

        let mul_unit = amplitude(&multiplicative(1.0), ComponentMode::Multiplicative);
        let mul_scaled = amplitude(&multiplicative(scale), ComponentMode::Multiplicative);
        prop_assert!((mul_scaled / mul_unit / scale - 1.0).abs() < 0.1,
            "multiplicative amplitude off: {mul_unit} -> {mul_scaled} at scale {scale}");
    }

    #[test]
    fn forecast_scales_with_the_data(scale in 1.0..20.0f64) {
        // Scaling every observation by a constant scales the forecast by the
        // same constant, for either combination mode.
        for mode in [ComponentMode::Additive, ComponentMode::Multiplicative] {
            let unit = trend_samples(60, 20.0, 0.5);
            let scaled: Vec<RawSample> = unit
                .iter()
                .map(|s| RawSample::new(
                    s.timestamp.clone(),
                    s.value * scale,
                ))
                .collect();

            let model_unit = fit(&unit, &config(0, mode, 0)).unwrap();
            let model_scaled = fit(&scaled, &config(0, mode, 0)).unwrap();

            let rows_unit = model_unit.predict(&model_unit.make_future(5)).unwrap();
            let rows_scaled = model_scaled.predict(&model_scaled.make_future(5)).unwrap();
            for (a, b) in rows_unit.iter().zip(&rows_scaled) {
                let relative = (b.yhat - scale * a.yhat).abs() / (scale * a.yhat.abs() + 1.0);
                prop_assert!(
                    relative < 1e-3,
                    "mode {:?}: scaled yhat {} vs {} * {}",
                    mode, b.yhat, scale, a.yhat
                );
            }
        }
    }
}
