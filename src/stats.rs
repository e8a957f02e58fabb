//! Small statistical helpers shared across the engine.

/// Mean of a slice; NaN when empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance of a slice; NaN when empty.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation of a slice.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Empirical quantile with linear interpolation between order statistics.
///
/// `values` is sorted in place; `q` is clamped to [0, 1].
pub fn quantile(values: &mut [f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let q = q.clamp(0.0, 1.0);
    let pos = q * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        values[lo]
    } else {
        let frac = pos - lo as f64;
        values[lo] * (1.0 - frac) + values[hi] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_and_variance() {
        let values = [2.0, 4.0, 6.0, 8.0];
        assert_relative_eq!(mean(&values), 5.0);
        assert_relative_eq!(variance(&values), 5.0);
        assert_relative_eq!(std_dev(&values), 5.0_f64.sqrt());
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn quantile_interpolates() {
        let mut values = vec![4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(quantile(&mut values, 0.0), 1.0);
        assert_relative_eq!(quantile(&mut values, 1.0), 4.0);
        assert_relative_eq!(quantile(&mut values, 0.5), 2.5);
        assert_relative_eq!(quantile(&mut values, 0.25), 1.75);
    }

    #[test]
    fn quantile_single_value() {
        let mut values = vec![7.0];
        assert_relative_eq!(quantile(&mut values, 0.1), 7.0);
        assert_relative_eq!(quantile(&mut values, 0.9), 7.0);
    }
}
