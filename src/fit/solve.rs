//! Ridge regression via the normal equations.
//!
//! Solves `(X'X + D) beta = X'y` where `D` is the diagonal ridge penalty
//! derived from the per-column prior scales. The Gram matrix is symmetric
//! positive definite once the penalty is applied, so a Cholesky factorization
//! suffices.

use crate::error::{ForecastError, Result};

/// Solve a ridge regression for the given columns.
///
/// `prior_scales[j]` is the prior standard deviation of coefficient `j`; the
/// ridge penalty on that coefficient is `noise_var / prior_scale^2`. A small
/// jitter keeps the factorization stable when columns are collinear.
pub fn ridge_solve(
    columns: &[Vec<f64>],
    target: &[f64],
    noise_var: f64,
    prior_scales: &[f64],
) -> Result<Vec<f64>> {
    let p = columns.len();
    if p == 0 {
        return Ok(Vec::new());
    }
    let n = target.len();
    debug_assert_eq!(prior_scales.len(), p);
    debug_assert!(columns.iter().all(|c| c.len() == n));

    // Gram matrix with the ridge diagonal.
    let mut gram = vec![vec![0.0; p]; p];
    for i in 0..p {
        for j in i..p {
            let dot: f64 = columns[i].iter().zip(&columns[j]).map(|(a, b)| a * b).sum();
            gram[i][j] = dot;
            gram[j][i] = dot;
        }
        gram[i][i] += noise_var / (prior_scales[i] * prior_scales[i]) + 1e-12;
    }

    let mut rhs = vec![0.0; p];
    for (i, column) in columns.iter().enumerate() {
        rhs[i] = column.iter().zip(target).map(|(a, b)| a * b).sum();
    }

    solve_symmetric(&mut gram, &rhs)
}

/// Solve `A x = b` for symmetric positive definite `A` by Cholesky
/// factorization. `a` is overwritten with the factor.
pub fn solve_symmetric(a: &mut [Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    let p = b.len();

    // A = L L'
    for i in 0..p {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= a[i][k] * a[j][k];
            }
            if i == j {
                if sum <= 0.0 {
                    return Err(ForecastError::Fit(
                        "design matrix is not positive definite".to_string(),
                    ));
                }
                a[i][j] = sum.sqrt();
            } else {
                a[i][j] = sum / a[j][j];
            }
        }
    }

    // Forward substitution: L z = b
    let mut z = vec![0.0; p];
    for i in 0..p {
        let mut sum = b[i];
        for k in 0..i {
            sum -= a[i][k] * z[k];
        }
        z[i] = sum / a[i][i];
    }

    // Back substitution: L' x = z
    let mut x = vec![0.0; p];
    for i in (0..p).rev() {
        let mut sum = z[i];
        for k in (i + 1)..p {
            sum -= a[k][i] * x[k];
        }
        x[i] = sum / a[i][i];
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn recovers_coefficients_with_weak_priors() {
        // y = 2*x1 + 3*x2, noiseless
        let x1 = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let x2 = vec![1.0, 0.0, 1.0, 0.0, 1.0];
        let y: Vec<f64> = x1
            .iter()
            .zip(&x2)
            .map(|(a, b)| 2.0 * a + 3.0 * b)
            .collect();

        let beta = ridge_solve(&[x1, x2], &y, 1e-9, &[1e6, 1e6]).unwrap();
        assert_relative_eq!(beta[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(beta[1], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn strong_prior_shrinks_toward_zero() {
        let x = vec![1.0, 1.0, 1.0, 1.0];
        let y = vec![10.0, 10.0, 10.0, 10.0];

        let loose = ridge_solve(&[x.clone()], &y, 1.0, &[100.0]).unwrap();
        let tight = ridge_solve(&[x], &y, 1.0, &[0.01]).unwrap();
        assert!(tight[0].abs() < loose[0].abs());
        assert!(tight[0].abs() < 0.1);
        assert_relative_eq!(loose[0], 10.0, epsilon = 1e-2);
    }

    #[test]
    fn empty_design_yields_empty_solution() {
        let beta = ridge_solve(&[], &[1.0, 2.0], 1.0, &[]).unwrap();
        assert!(beta.is_empty());
    }

    #[test]
    fn collinear_columns_stay_solvable() {
        // Identical columns; the ridge jitter keeps the system invertible.
        let x = vec![1.0, 2.0, 3.0];
        let beta = ridge_solve(&[x.clone(), x], &[2.0, 4.0, 6.0], 0.1, &[10.0, 10.0]).unwrap();
        assert_eq!(beta.len(), 2);
        assert!(beta.iter().all(|b| b.is_finite()));
        // Symmetric problem, symmetric solution.
        assert_relative_eq!(beta[0], beta[1], epsilon = 1e-9);
    }

    #[test]
    fn cholesky_rejects_indefinite_matrix() {
        let mut a = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        assert!(solve_symmetric(&mut a, &[1.0, 1.0]).is_err());
    }
}
