//! Piecewise trend with changepoints.
//!
//! Trend time is scaled so the training span covers [0, 1]. Changepoints are
//! placed at evenly spaced observation indices over the first
//! `changepoint_range` fraction of the span, and every hinge adjustment is
//! frozen outside the training range: beyond the last changepoint the linear
//! trend extrapolates with its final slope, and the logistic trend approaches
//! its capacity asymptotically.

/// Place changepoints at evenly spaced observation indices.
///
/// `t` must be sorted ascending in scaled time. Returns the scaled-time
/// locations, strictly after `t[0]`, deduplicated. The count is reduced when
/// the eligible window holds fewer observations than requested.
pub fn place_changepoints(t: &[f64], n_changepoints: usize, changepoint_range: f64) -> Vec<f64> {
    let n = t.len();
    if n_changepoints == 0 || n < 3 {
        return Vec::new();
    }
    let last = ((n - 1) as f64 * changepoint_range).floor() as usize;
    if last < 1 {
        return Vec::new();
    }
    let count = n_changepoints.min(last);

    let mut points = Vec::with_capacity(count);
    for j in 1..=count {
        let idx = ((j as f64 / count as f64) * last as f64).round() as usize;
        let value = t[idx.min(n - 1)];
        if value > t[0] && points.last().map_or(true, |&p| value > p) {
            points.push(value);
        }
    }
    points
}

/// Hinge feature columns `max(t - s_j, 0)`, one column per changepoint.
pub fn hinge_columns(t: &[f64], changepoints: &[f64]) -> Vec<Vec<f64>> {
    changepoints
        .iter()
        .map(|&s| t.iter().map(|&ti| (ti - s).max(0.0)).collect())
        .collect()
}

/// Piecewise-linear trend with slope adjustments `deltas` at `changepoints`.
pub fn piecewise_linear(t: &[f64], changepoints: &[f64], k: f64, m: f64, deltas: &[f64]) -> Vec<f64> {
    t.iter()
        .map(|&ti| {
            let mut slope = k;
            let mut offset = m;
            for (j, &s) in changepoints.iter().enumerate() {
                if ti >= s {
                    slope += deltas[j];
                    offset -= s * deltas[j];
                }
            }
            slope * ti + offset
        })
        .collect()
}

/// Piecewise-logistic trend bounded by the (scaled) capacity series.
///
/// Offset adjustments are chosen so the curve stays continuous across each
/// changepoint. `changepoints` must be sorted ascending.
pub fn piecewise_logistic(
    t: &[f64],
    cap: &[f64],
    changepoints: &[f64],
    k: f64,
    m: f64,
    deltas: &[f64],
) -> Vec<f64> {
    let gammas = continuity_offsets(changepoints, k, m, deltas);
    t.iter()
        .zip(cap.iter())
        .map(|(&ti, &cap_i)| {
            let mut rate = k;
            let mut offset = m;
            for (j, &s) in changepoints.iter().enumerate() {
                if ti >= s {
                    rate += deltas[j];
                    offset += gammas[j];
                }
            }
            cap_i / (1.0 + (-rate * (ti - offset)).exp())
        })
        .collect()
}

/// Offset adjustments keeping the logistic curve continuous at each
/// changepoint.
fn continuity_offsets(changepoints: &[f64], k: f64, m: f64, deltas: &[f64]) -> Vec<f64> {
    let mut gammas = vec![0.0; changepoints.len()];
    let mut rate = k;
    let mut offset = m;
    for (j, &s) in changepoints.iter().enumerate() {
        let next_rate = rate + deltas[j];
        gammas[j] = if next_rate.abs() < 1e-12 {
            0.0
        } else {
            (s - offset) * (1.0 - rate / next_rate)
        };
        offset += gammas[j];
        rate = next_rate;
    }
    gammas
}

/// Initialize the linear trend rate and offset from the series endpoints.
pub fn linear_growth_init(t: &[f64], y: &[f64]) -> (f64, f64) {
    let n = t.len();
    let span = t[n - 1] - t[0];
    let k = if span.abs() < 1e-12 {
        0.0
    } else {
        (y[n - 1] - y[0]) / span
    };
    let m = y[0] - k * t[0];
    (k, m)
}

/// Initialize the logistic trend rate and offset from the endpoint capacity
/// ratios, forcing valid values when observations fall outside (0, cap).
pub fn logistic_growth_init(t: &[f64], y: &[f64], cap: &[f64]) -> (f64, f64) {
    let n = t.len();
    let span = t[n - 1] - t[0];
    if span.abs() < 1e-12 {
        return (0.0, 0.0);
    }

    let clamp = |value: f64, cap: f64| value.clamp(0.01 * cap, 0.99 * cap);
    let y0 = clamp(y[0], cap[0]);
    let y1 = clamp(y[n - 1], cap[n - 1]);

    let mut r0 = cap[0] / y0;
    let r1 = cap[n - 1] / y1;
    if (r0 - r1).abs() <= 0.01 {
        r0 *= 1.05;
    }

    let l0 = (r0 - 1.0).ln();
    let l1 = (r1 - 1.0).ln();
    let k = (l0 - l1) / span;
    let m = l0 * span / (l0 - l1);
    (k, m)
}
