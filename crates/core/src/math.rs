//! Interpolation and quadrature helpers on sorted abscissae.

/// Locate the bracketing interval `[i, i + 1]` of `x` in sorted `xs`.
///
/// Returns `None` outside `[xs[0], xs[n - 1]]`.
pub fn bracket(xs: &[f64], x: f64) -> Option<usize> {
    let n = xs.len();
    if n < 2 || !(xs[0]..=xs[n - 1]).contains(&x) {
        return None;
    }
    let upper = xs.partition_point(|&v| v <= x);
    Some(upper.saturating_sub(1).min(n - 2))
}

/// Linear interpolation; `None` outside the tabulated range.
pub fn interp_linear(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    let i = bracket(xs, x)?;
    let t = (x - xs[i]) / (xs[i + 1] - xs[i]);
    Some(ys[i] + t * (ys[i + 1] - ys[i]))
}

/// Interpolation linear in `ln y`, suited to exponentially falling densities.
///
/// Falls back to linear interpolation when either neighbour is non-positive.
pub fn interp_log(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    let i = bracket(xs, x)?;
    let (y0, y1) = (ys[i], ys[i + 1]);
    let t = (x - xs[i]) / (xs[i + 1] - xs[i]);
    if y0 > 0.0 && y1 > 0.0 {
        Some((y0.ln() + t * (y1.ln() - y0.ln())).exp())
    } else {
        Some(y0 + t * (y1 - y0))
    }
}

/// Trapezoid rule over paired samples.
pub fn trapezoid(xs: &[f64], ys: &[f64]) -> f64 {
    xs.windows(2)
        .zip(ys.windows(2))
        .map(|(x, y)| 0.5 * (x[1] - x[0]) * (y[0] + y[1]))
        .sum()
}

/// Trapezoid quadrature weights for the abscissae `xs`.
pub fn trapezoid_weights(xs: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let mut weights = vec![0.0; n];
    for i in 0..n.saturating_sub(1) {
        let half = 0.5 * (xs[i + 1] - xs[i]);
        weights[i] += half;
        weights[i + 1] += half;
    }
    weights
}
