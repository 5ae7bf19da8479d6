use crate::types::EPSILON;

/// Least-squares slope of `ys` against their 0-based index.
///
/// Returns `None` when fewer than two points are given or the fit is
/// numerically degenerate.
pub fn least_squares_slope(ys: &[f64]) -> Option<f64> {
    if ys.len() < 2 {
        return None;
    }

    let n = ys.len() as f64;
    let sum_x: f64 = (0..ys.len()).map(|i| i as f64).sum();
    let sum_y: f64 = ys.iter().sum();
    let sum_xy: f64 = ys.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_xx: f64 = (0..ys.len()).map(|i| (i as f64).powi(2)).sum();

    let denominator = n * sum_xx - sum_x.powi(2);
    if denominator.abs() < EPSILON {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    slope.is_finite().then_some(slope)
}

/// Slope of correctness over review order (records already time-sorted)
pub fn learning_trend(outcomes: &[bool]) -> Option<f64> {
    let ys: Vec<f64> = outcomes.iter().map(|&c| if c { 1.0 } else { 0.0 }).collect();
    least_squares_slope(&ys)
}
