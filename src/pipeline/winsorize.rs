//! Percentile capping of a numeric series

use serde::Serialize;

use super::error::ScoreError;
use super::stats::sorted_present;

/// Clipping range computed from a series' tails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WinsorBounds {
    pub lower: f64,
    pub upper: f64,
}

/// Check that a tail probability lies strictly inside (0, 0.5).
pub fn validate_tail_probability(p: f64) -> Result<(), ScoreError> {
    if p > 0.0 && p < 0.5 {
        Ok(())
    } else {
        Err(ScoreError::InvalidTailProbability(p))
    }
}

/// Number of order statistics trimmed from each tail: `ceil((n - 1) * p)`.
///
/// The small offset keeps products such as `10.0 * 0.1` from rounding up past
/// an exact integer.
fn tail_index(n: usize, p: f64) -> usize {
    (((n - 1) as f64 * p) - 1e-9).ceil().max(0.0) as usize
}

/// Compute the winsorization bounds of the non-missing values.
///
/// With `k = ceil((n - 1) * p)` over the sorted values, the bounds are the
/// mirrored order statistics `x[k]` and `x[n - 1 - k]`, so both tails lose the
/// same number of values and `winsor_bounds(-x)` mirrors `winsor_bounds(x)`.
///
/// Returns `None` when winsorization would be a no-op: fewer than two values,
/// or the bounds meet or cross.
pub fn winsor_bounds(values: &[Option<f64>], p: f64) -> Option<WinsorBounds> {
    let sorted = sorted_present(values);
    let n = sorted.len();
    if n < 2 || !(p > 0.0 && p < 0.5) {
        return None;
    }

    let k = tail_index(n, p);
    if k >= n - 1 - k {
        return None;
    }
    let lower = sorted[k];
    let upper = sorted[n - 1 - k];

    (lower < upper).then_some(WinsorBounds { lower, upper })
}

/// Clip every non-missing value to its series' `[p, 1 - p]` quantile range.
///
/// Missing values pass through. Degenerate series come back unchanged.
pub fn winsorize(values: &[Option<f64>], p: f64) -> Vec<Option<f64>> {
    match winsor_bounds(values, p) {
        Some(bounds) => apply_bounds(values, bounds),
        None => values.to_vec(),
    }
}

/// Clip a series to precomputed bounds.
pub fn apply_bounds(values: &[Option<f64>], bounds: WinsorBounds) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|v| v.map(|x| x.clamp(bounds.lower, bounds.upper)))
        .collect()
}
