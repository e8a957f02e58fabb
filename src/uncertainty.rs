//! Monte Carlo prediction intervals.
//!
//! Forecast uncertainty comes from two sources: future trend changes and
//! observation noise. Each simulated path keeps the fitted changepoints and
//! adds new ones beyond the training window, with locations drawn uniformly
//! over the extrapolated range at the historical changepoint frequency and
//! magnitudes drawn from a Laplace distribution matched to the fitted
//! adjustment magnitudes. Gaussian observation noise is added per row, and
//! the interval bounds are empirical quantiles across paths. All of this
//! happens in the scaled space; the caller maps bounds back to data scale.

use crate::config::Growth;
use crate::design::{piecewise_linear, piecewise_logistic};
use crate::error::{ForecastError, Result};
use crate::fit::TrendParams;
use crate::stats;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::{Laplace, Normal, Poisson};

/// Inputs for one interval simulation, all in the scaled space.
#[derive(Debug)]
pub struct SimulationInput<'a> {
    pub growth: Growth,
    pub trend: &'a TrendParams,
    /// Fitted changepoint locations, sorted ascending.
    pub changepoints: &'a [f64],
    /// Scaled prediction times; may extend past 1.
    pub t: &'a [f64],
    /// Scaled capacity series, required for logistic growth.
    pub cap: Option<&'a [f64]>,
    /// Row multiplier `1 + X_mul beta_mul`.
    pub multiplier: &'a [f64],
    /// Additive term `X_add beta_add`.
    pub additive_term: &'a [f64],
    /// Observation noise standard deviation.
    pub noise_std: f64,
    pub n_samples: usize,
    /// Interval width, e.g. 0.8.
    pub level: f64,
    pub seed: Option<u64>,
}

/// Simulate predictive paths and return `(lower, upper)` quantile bounds per
/// row in the scaled space. `n_samples` must be positive.
pub fn simulate_intervals(input: &SimulationInput) -> Result<(Vec<f64>, Vec<f64>)> {
    let n_rows = input.t.len();
    let mut rng = match input.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let t_max = input.t.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean_abs_delta = if input.trend.deltas.is_empty() {
        0.0
    } else {
        input.trend.deltas.iter().map(|d| d.abs()).sum::<f64>()
            / input.trend.deltas.len() as f64
    };
    let laplace = Laplace::new(0.0, mean_abs_delta + 1e-8)
        .map_err(|e| ForecastError::Fit(format!("invalid Laplace scale: {e}")))?;
    let noise = Normal::new(0.0, input.noise_std.max(1e-12))
        .map_err(|e| ForecastError::Fit(format!("invalid noise scale: {e}")))?;
    // Expected future changepoints continue at the historical rate per unit
    // of scaled time.
    let poisson_rate = input.changepoints.len() as f64 * (t_max - 1.0);
    let poisson = if poisson_rate > 0.0 {
        Some(Poisson::new(poisson_rate).map_err(|e| {
            ForecastError::Fit(format!("invalid changepoint rate: {e}"))
        })?)
    } else {
        None
    };

    let mut per_row: Vec<Vec<f64>> = vec![Vec::with_capacity(input.n_samples); n_rows];
    for _ in 0..input.n_samples {
        let path = sample_path(input, &mut rng, &laplace, poisson.as_ref());
        for (i, value) in path.into_iter().enumerate() {
            let observed = value + rng.sample::<f64, _>(noise);
            per_row[i].push(observed);
        }
    }

    let lower_q = (1.0 - input.level) / 2.0;
    let upper_q = 1.0 - lower_q;
    let mut lower = Vec::with_capacity(n_rows);
    let mut upper = Vec::with_capacity(n_rows);
    for samples in per_row.iter_mut() {
        lower.push(stats::quantile(samples, lower_q));
        upper.push(stats::quantile(samples, upper_q));
    }
    Ok((lower, upper))
}

/// One simulated path without observation noise.
fn sample_path(
    input: &SimulationInput,
    rng: &mut StdRng,
    laplace: &Laplace,
    poisson: Option<&Poisson>,
) -> Vec<f64> {
    let t_max = input.t.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let mut changepoints = input.changepoints.to_vec();
    let mut deltas = input.trend.deltas.clone();
    if let Some(poisson) = poisson {
        let n_new = rng.sample::<f64, _>(*poisson) as usize;
        for _ in 0..n_new {
            changepoints.push(rng.gen_range(1.0..t_max));
            deltas.push(rng.sample::<f64, _>(*laplace));
        }
        // The logistic continuity offsets need ascending changepoints.
        let mut order: Vec<usize> = (0..changepoints.len()).collect();
        order.sort_by(|&a, &b| {
            changepoints[a]
                .partial_cmp(&changepoints[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        changepoints = order.iter().map(|&i| changepoints[i]).collect();
        deltas = order.iter().map(|&i| deltas[i]).collect();
    }

    let g = match input.growth {
        Growth::Linear => piecewise_linear(
            input.t,
            &changepoints,
            input.trend.k,
            input.trend.m,
            &deltas,
        ),
        Growth::Logistic => piecewise_logistic(
            input.t,
            input.cap.unwrap_or(&[]),
            &changepoints,
            input.trend.k,
            input.trend.m,
            &deltas,
        ),
    };

    g.iter()
        .enumerate()
        .map(|(i, &gi)| gi * input.multiplier[i] + input.additive_term[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input<'a>(
        trend: &'a TrendParams,
        t: &'a [f64],
        multiplier: &'a [f64],
        additive_term: &'a [f64],
    ) -> SimulationInput<'a> {
        SimulationInput {
            growth: Growth::Linear,
            trend,
            changepoints: &[],
            t,
            cap: None,
            multiplier,
            additive_term,
            noise_std: 0.1,
            n_samples: 500,
            level: 0.8,
            seed: Some(42),
        }
    }

    #[test]
    fn bounds_bracket_the_point_estimate() {
        let trend = TrendParams {
            k: 1.0,
            m: 0.0,
            deltas: vec![],
        };
        let t = vec![0.5, 1.0, 1.5];
        let multiplier = vec![1.0; 3];
        let additive_term = vec![0.0; 3];
        let input = base_input(&trend, &t, &multiplier, &additive_term);
        let (lower, upper) = simulate_intervals(&input).unwrap();

        for (i, &ti) in t.iter().enumerate() {
            let yhat = ti; // k=1, m=0
            assert!(lower[i] < yhat, "lower bound above point estimate");
            assert!(upper[i] > yhat, "upper bound below point estimate");
        }
    }

    #[test]
    fn width_grows_with_horizon_under_trend_uncertainty() {
        let trend = TrendParams {
            k: 1.0,
            m: 0.0,
            deltas: vec![0.5, -0.3, 0.2],
        };
        let changepoints = [0.2, 0.5, 0.7];
        let t = vec![1.1, 2.0, 4.0];
        let multiplier = vec![1.0; 3];
        let additive_term = vec![0.0; 3];
        let mut input = base_input(&trend, &t, &multiplier, &additive_term);
        input.changepoints = &changepoints;
        input.n_samples = 1000;
        let (lower, upper) = simulate_intervals(&input).unwrap();

        let near = upper[0] - lower[0];
        let far = upper[2] - lower[2];
        assert!(far > near, "interval should widen with horizon");
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let trend = TrendParams {
            k: 0.5,
            m: 0.1,
            deltas: vec![0.2],
        };
        let changepoints = [0.5];
        let t = vec![0.9, 1.2, 1.5];
        let multiplier = vec![1.0; 3];
        let additive_term = vec![0.1; 3];
        let mut input = base_input(&trend, &t, &multiplier, &additive_term);
        input.changepoints = &changepoints;

        let first = simulate_intervals(&input).unwrap();
        let second = simulate_intervals(&input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn wider_level_gives_wider_bounds() {
        let trend = TrendParams {
            k: 1.0,
            m: 0.0,
            deltas: vec![],
        };
        let t = vec![1.5];
        let multiplier = vec![1.0];
        let additive_term = vec![0.0];
        let mut input = base_input(&trend, &t, &multiplier, &additive_term);

        input.level = 0.5;
        let narrow = simulate_intervals(&input).unwrap();
        input.level = 0.95;
        let wide = simulate_intervals(&input).unwrap();
        assert!(wide.1[0] - wide.0[0] > narrow.1[0] - narrow.0[0]);
    }

    #[test]
    fn logistic_paths_respect_capacity_scale() {
        let trend = TrendParams {
            k: 5.0,
            m: 0.4,
            deltas: vec![],
        };
        let t = vec![0.5, 1.0, 1.5];
        let cap = vec![1.2; 3];
        let multiplier = vec![1.0; 3];
        let additive_term = vec![0.0; 3];
        let mut input = base_input(&trend, &t, &multiplier, &additive_term);
        input.growth = Growth::Logistic;
        input.cap = Some(&cap);
        input.noise_std = 1e-9;
        let (lower, upper) = simulate_intervals(&input).unwrap();

        // Without noise or changepoints the path is deterministic and bounded.
        for i in 0..3 {
            assert!(lower[i] >= 0.0);
            assert!(upper[i] <= 1.2 + 1e-6);
        }
    }
}
