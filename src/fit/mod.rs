//! Maximum a posteriori model fitting.
//!
//! The posterior is optimized by block coordinate descent in the scaled
//! space: holding the trend fixed, all component coefficients solve in
//! closed form as a ridge regression; holding the coefficients fixed, the
//! linear trend also solves in closed form, while the logistic trend needs a
//! simplex search. The blocks alternate until the objective stops moving.

pub mod nelder_mead;
pub mod solve;

use crate::config::Growth;
use crate::design::{hinge_columns, linear_growth_init, logistic_growth_init, piecewise_linear, piecewise_logistic};
use crate::error::{ForecastError, Result};
use crate::stats;
use nelder_mead::{minimize, SimplexOptions};
use serde::{Deserialize, Serialize};
use solve::ridge_solve;

const MAX_OUTER_ITERATIONS: usize = 100;
const CONVERGENCE_TOLERANCE: f64 = 1e-8;
const NOISE_VAR_FLOOR: f64 = 1e-12;
/// Effectively flat prior on the base rate and offset.
const FLAT_PRIOR_SCALE: f64 = 1e6;

/// Fitted trend parameters in the scaled space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendParams {
    /// Base growth rate.
    pub k: f64,
    /// Offset.
    pub m: f64,
    /// Rate adjustment at each changepoint.
    pub deltas: Vec<f64>,
}

/// One fitting problem in the scaled space. Feature columns are split by
/// combination mode; priors are per-column standard deviations.
#[derive(Debug)]
pub struct FitProblem<'a> {
    pub t: &'a [f64],
    pub y: &'a [f64],
    /// Scaled capacity series, required for logistic growth.
    pub cap: Option<&'a [f64]>,
    pub changepoints: &'a [f64],
    pub additive_columns: &'a [Vec<f64>],
    pub additive_priors: &'a [f64],
    pub multiplicative_columns: &'a [Vec<f64>],
    pub multiplicative_priors: &'a [f64],
    pub growth: Growth,
    pub changepoint_prior_scale: f64,
}

/// Result of a successful optimization.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub trend: TrendParams,
    pub beta_additive: Vec<f64>,
    pub beta_multiplicative: Vec<f64>,
    pub noise_var: f64,
    pub iterations: usize,
}

/// Optimize the posterior by alternating closed-form blocks.
pub fn optimize(problem: &FitProblem) -> Result<FitOutcome> {
    let n = problem.y.len();
    let hinges = hinge_columns(problem.t, problem.changepoints);

    let (k0, m0) = match problem.growth {
        Growth::Linear => linear_growth_init(problem.t, problem.y),
        Growth::Logistic => {
            let cap = problem.cap.ok_or_else(|| {
                ForecastError::Fit("logistic growth requires a capacity series".to_string())
            })?;
            logistic_growth_init(problem.t, problem.y, cap)
        }
    };
    let mut trend = TrendParams {
        k: k0,
        m: m0,
        deltas: vec![0.0; problem.changepoints.len()],
    };
    let mut beta_additive = vec![0.0; problem.additive_columns.len()];
    let mut beta_multiplicative = vec![0.0; problem.multiplicative_columns.len()];
    let mut noise_var = stats::variance(problem.y).max(NOISE_VAR_FLOOR);

    let mut previous_objective = f64::INFINITY;
    for iteration in 1..=MAX_OUTER_ITERATIONS {
        let g = trend_values(problem, &trend);

        // Coefficient block: one ridge solve over both modes, with the
        // multiplicative columns scaled by the current trend.
        let p_add = problem.additive_columns.len();
        let p_mul = problem.multiplicative_columns.len();
        if p_add + p_mul > 0 {
            let mut columns: Vec<Vec<f64>> = Vec::with_capacity(p_add + p_mul);
            let mut priors: Vec<f64> = Vec::with_capacity(p_add + p_mul);
            for (column, &prior) in problem
                .additive_columns
                .iter()
                .zip(problem.additive_priors)
            {
                columns.push(column.clone());
                priors.push(prior);
            }
            for (column, &prior) in problem
                .multiplicative_columns
                .iter()
                .zip(problem.multiplicative_priors)
            {
                columns.push(column.iter().zip(&g).map(|(&x, &gi)| x * gi).collect());
                priors.push(prior);
            }
            let target: Vec<f64> = problem.y.iter().zip(&g).map(|(&yi, &gi)| yi - gi).collect();
            let beta = ridge_solve(&columns, &target, noise_var, &priors)?;
            beta_additive = beta[..p_add].to_vec();
            beta_multiplicative = beta[p_add..].to_vec();
        }

        // Trend block with coefficients fixed.
        let weight: Vec<f64> = multiplier(problem, &beta_multiplicative, n);
        let additive_term: Vec<f64> = effect(problem.additive_columns, &beta_additive, n);
        match problem.growth {
            Growth::Linear => {
                trend = solve_linear_trend(problem, &hinges, &weight, &additive_term, noise_var)?;
            }
            Growth::Logistic => {
                trend = solve_logistic_trend(problem, &trend, &weight, &additive_term, noise_var);
            }
        }

        let g = trend_values(problem, &trend);
        let residuals: Vec<f64> = problem
            .y
            .iter()
            .enumerate()
            .map(|(i, &yi)| yi - (g[i] * weight[i] + additive_term[i]))
            .collect();
        noise_var = (residuals.iter().map(|r| r * r).sum::<f64>() / n as f64).max(NOISE_VAR_FLOOR);

        let objective = objective_value(
            problem,
            &trend,
            &beta_additive,
            &beta_multiplicative,
            noise_var,
            n,
        );
        if !objective.is_finite() {
            return Err(ForecastError::Fit(
                "objective became non-finite during optimization".to_string(),
            ));
        }
        if (previous_objective - objective).abs()
            <= CONVERGENCE_TOLERANCE * (objective.abs() + 1.0)
        {
            tracing::debug!(iteration, objective, "fit converged");
            return Ok(FitOutcome {
                trend,
                beta_additive,
                beta_multiplicative,
                noise_var,
                iterations: iteration,
            });
        }
        previous_objective = objective;
    }

    Err(ForecastError::Fit(format!(
        "optimizer did not converge within {MAX_OUTER_ITERATIONS} iterations"
    )))
}

fn trend_values(problem: &FitProblem, trend: &TrendParams) -> Vec<f64> {
    match problem.growth {
        Growth::Linear => piecewise_linear(
            problem.t,
            problem.changepoints,
            trend.k,
            trend.m,
            &trend.deltas,
        ),
        Growth::Logistic => piecewise_logistic(
            problem.t,
            problem.cap.unwrap_or(&[]),
            problem.changepoints,
            trend.k,
            trend.m,
            &trend.deltas,
        ),
    }
}

/// Row multiplier `1 + X_mul beta_mul`.
fn multiplier(problem: &FitProblem, beta: &[f64], n: usize) -> Vec<f64> {
    let mut w = vec![1.0; n];
    for (column, &b) in problem.multiplicative_columns.iter().zip(beta) {
        for (wi, &x) in w.iter_mut().zip(column) {
            *wi += b * x;
        }
    }
    w
}

fn effect(columns: &[Vec<f64>], beta: &[f64], n: usize) -> Vec<f64> {
    let mut e = vec![0.0; n];
    for (column, &b) in columns.iter().zip(beta) {
        for (ei, &x) in e.iter_mut().zip(column) {
            *ei += b * x;
        }
    }
    e
}

/// Closed-form trend update for linear growth: with the multiplier fixed, the
/// model is linear in `[k, m, deltas]` with row weights.
fn solve_linear_trend(
    problem: &FitProblem,
    hinges: &[Vec<f64>],
    weight: &[f64],
    additive_term: &[f64],
    noise_var: f64,
) -> Result<TrendParams> {
    let n = problem.y.len();
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(2 + hinges.len());
    columns.push(problem.t.iter().zip(weight).map(|(&t, &w)| t * w).collect());
    columns.push(weight.to_vec());
    for hinge in hinges {
        columns.push(hinge.iter().zip(weight).map(|(&h, &w)| h * w).collect());
    }

    let mut priors = vec![FLAT_PRIOR_SCALE; 2];
    priors.extend(std::iter::repeat(problem.changepoint_prior_scale).take(hinges.len()));

    let target: Vec<f64> = (0..n).map(|i| problem.y[i] - additive_term[i]).collect();
    let solution = ridge_solve(&columns, &target, noise_var, &priors)?;

    Ok(TrendParams {
        k: solution[0],
        m: solution[1],
        deltas: solution[2..].to_vec(),
    })
}

/// Simplex trend update for logistic growth, with an L1 penalty on the rate
/// adjustments matching their Laplace prior.
fn solve_logistic_trend(
    problem: &FitProblem,
    current: &TrendParams,
    weight: &[f64],
    additive_term: &[f64],
    noise_var: f64,
) -> TrendParams {
    let n_deltas = current.deltas.len();
    let mut initial = Vec::with_capacity(2 + n_deltas);
    initial.push(current.k);
    initial.push(current.m);
    initial.extend_from_slice(&current.deltas);

    let objective = |point: &[f64]| {
        let candidate = TrendParams {
            k: point[0],
            m: point[1],
            deltas: point[2..].to_vec(),
        };
        let g = trend_values(problem, &candidate);
        let sse: f64 = problem
            .y
            .iter()
            .enumerate()
            .map(|(i, &yi)| {
                let r = yi - (g[i] * weight[i] + additive_term[i]);
                r * r
            })
            .sum();
        let penalty: f64 = candidate
            .deltas
            .iter()
            .map(|d| d.abs() / problem.changepoint_prior_scale)
            .sum();
        sse / (2.0 * noise_var) + penalty
    };

    let result = minimize(objective, &initial, &SimplexOptions::default());
    TrendParams {
        k: result.point[0],
        m: result.point[1],
        deltas: result.point[2..].to_vec(),
    }
}

/// Negative log posterior up to constants: the profiled Gaussian likelihood
/// plus the changepoint and coefficient penalties.
fn objective_value(
    problem: &FitProblem,
    trend: &TrendParams,
    beta_additive: &[f64],
    beta_multiplicative: &[f64],
    noise_var: f64,
    n: usize,
) -> f64 {
    let likelihood = 0.5 * n as f64 * (1.0 + noise_var.ln());
    let delta_penalty: f64 = trend
        .deltas
        .iter()
        .map(|d| d.abs() / problem.changepoint_prior_scale)
        .sum();
    let beta_penalty: f64 = beta_additive
        .iter()
        .zip(problem.additive_priors)
        .chain(beta_multiplicative.iter().zip(problem.multiplicative_priors))
        .map(|(b, &prior)| 0.5 * (b / prior).powi(2))
        .sum();
    likelihood + delta_penalty + beta_penalty
}
