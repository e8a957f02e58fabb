//! Derivative-free simplex minimization.
//!
//! Used for the logistic-growth trend parameters, where the objective is not
//! a least-squares problem and no gradient is available. Standard
//! Nelder-Mead with reflection, expansion, contraction, and shrink steps.

/// Options controlling the simplex search.
#[derive(Debug, Clone)]
pub struct SimplexOptions {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence threshold on the objective spread across the simplex.
    pub tolerance: f64,
    /// Initial displacement applied per coordinate to seed the simplex.
    pub initial_step: f64,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            max_iter: 500,
            tolerance: 1e-10,
            initial_step: 0.05,
        }
    }
}

/// Outcome of a simplex minimization.
#[derive(Debug, Clone)]
pub struct SimplexResult {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimize `f` starting from `initial`.
pub fn minimize<F>(mut f: F, initial: &[f64], options: &SimplexOptions) -> SimplexResult
where
    F: FnMut(&[f64]) -> f64,
{
    let dim = initial.len();
    if dim == 0 {
        let value = f(initial);
        return SimplexResult {
            point: Vec::new(),
            value,
            iterations: 0,
            converged: true,
        };
    }

    // Seed the simplex with one perturbed vertex per coordinate.
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(dim + 1);
    simplex.push(initial.to_vec());
    for i in 0..dim {
        let mut vertex = initial.to_vec();
        let step = if vertex[i].abs() > 1e-8 {
            options.initial_step * vertex[i].abs()
        } else {
            options.initial_step
        };
        vertex[i] += step;
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| f(v)).collect();

    let mut iterations = 0;
    let mut converged = false;
    while iterations < options.max_iter {
        iterations += 1;

        // Order vertices best-first.
        let mut order: Vec<usize> = (0..=dim).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let spread = (values[dim] - values[0]).abs();
        if spread <= options.tolerance * (values[0].abs() + 1.0) {
            converged = true;
            break;
        }

        // Centroid of all but the worst vertex.
        let mut centroid = vec![0.0; dim];
        for vertex in simplex.iter().take(dim) {
            for (c, &x) in centroid.iter_mut().zip(vertex) {
                *c += x / dim as f64;
            }
        }

        let worst = simplex[dim].clone();
        let reflected: Vec<f64> = centroid
            .iter()
            .zip(&worst)
            .map(|(&c, &w)| c + REFLECT * (c - w))
            .collect();
        let reflected_value = f(&reflected);

        if reflected_value < values[0] {
            // Try to go further in the same direction.
            let expanded: Vec<f64> = centroid
                .iter()
                .zip(&worst)
                .map(|(&c, &w)| c + EXPAND * (c - w))
                .collect();
            let expanded_value = f(&expanded);
            if expanded_value < reflected_value {
                simplex[dim] = expanded;
                values[dim] = expanded_value;
            } else {
                simplex[dim] = reflected;
                values[dim] = reflected_value;
            }
        } else if reflected_value < values[dim - 1] {
            simplex[dim] = reflected;
            values[dim] = reflected_value;
        } else {
            let contracted: Vec<f64> = centroid
                .iter()
                .zip(&worst)
                .map(|(&c, &w)| c + CONTRACT * (w - c))
                .collect();
            let contracted_value = f(&contracted);
            if contracted_value < values[dim] {
                simplex[dim] = contracted;
                values[dim] = contracted_value;
            } else {
                // Shrink everything toward the best vertex.
                let best = simplex[0].clone();
                for i in 1..=dim {
                    for (x, &b) in simplex[i].iter_mut().zip(&best) {
                        *x = b + SHRINK * (*x - b);
                    }
                    values[i] = f(&simplex[i]);
                }
            }
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    SimplexResult {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn minimizes_quadratic_bowl() {
        let f = |x: &[f64]| (x[0] - 3.0).powi(2) + (x[1] + 1.0).powi(2);
        let result = minimize(f, &[0.0, 0.0], &SimplexOptions::default());
        assert!(result.converged);
        assert_relative_eq!(result.point[0], 3.0, epsilon = 1e-4);
        assert_relative_eq!(result.point[1], -1.0, epsilon = 1e-4);
        assert!(result.value < 1e-8);
    }

    #[test]
    fn minimizes_rosenbrock() {
        let f = |x: &[f64]| {
            100.0 * (x[1] - x[0] * x[0]).powi(2) + (1.0 - x[0]).powi(2)
        };
        let options = SimplexOptions {
            max_iter: 5000,
            ..Default::default()
        };
        let result = minimize(f, &[-1.2, 1.0], &options);
        assert_relative_eq!(result.point[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(result.point[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn handles_nonsmooth_objective() {
        // L1-type kink at the optimum.
        let f = |x: &[f64]| x[0].abs() + 2.0 * (x[1] - 1.0).abs();
        let result = minimize(f, &[3.0, -2.0], &SimplexOptions::default());
        assert!(result.point[0].abs() < 1e-3);
        assert_relative_eq!(result.point[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn zero_dimensional_input() {
        let result = minimize(|_| 7.0, &[], &SimplexOptions::default());
        assert!(result.converged);
        assert_relative_eq!(result.value, 7.0);
    }

    #[test]
    fn stops_at_iteration_budget() {
        let f = |x: &[f64]| x[0] * x[0];
        let options = SimplexOptions {
            max_iter: 3,
            tolerance: 0.0,
            ..Default::default()
        };
        let result = minimize(f, &[10.0], &options);
        assert_eq!(result.iterations, 3);
        assert!(!result.converged);
    }
}
