//! Missing-aware summary statistics shared by every scoring stage
//!
//! All values enter as `Option<f64>`. Non-finite numbers are mapped to `None`
//! on extraction, so nothing downstream ever sees a NaN.

use anyhow::Result;
use polars::prelude::*;

use super::error::ScoreError;

/// Extract a column as `Option<f64>` values, one per row.
///
/// Integer columns are cast to Float64. NaN and infinite values become `None`.
/// A string column is only accepted if every value is null, which is how CSV
/// readers type an entirely empty column.
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name).map_err(|_| ScoreError::MissingColumn {
        column: name.to_string(),
    })?;

    let dtype = column.dtype();
    let all_null = column.null_count() == column.len();
    if !(dtype.is_primitive_numeric() || matches!(dtype, DataType::Null) || all_null) {
        return Err(ScoreError::NonNumericColumn {
            column: name.to_string(),
        }
        .into());
    }

    let float_col = column
        .cast(&DataType::Float64)
        .map_err(|_| ScoreError::NonNumericColumn {
            column: name.to_string(),
        })?;

    Ok(float_col
        .f64()?
        .iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

/// Build a nullable Float64 column. `None` becomes a polars null.
pub fn float_column(name: &str, values: Vec<Option<f64>>) -> Column {
    let values: Vec<Option<f64>> = values
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();
    Column::new(name.into(), values)
}

/// Non-missing values in ascending order.
pub fn sorted_present(values: &[Option<f64>]) -> Vec<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    present.sort_by(|a, b| a.total_cmp(b));
    present
}

/// Quantile of already-sorted values using linear interpolation between
/// order statistics: `h = (n - 1) * q`, interpolating between `x[floor(h)]`
/// and the next order statistic.
///
/// Returns `None` for an empty slice. `q` is clamped to [0, 1].
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 || q.is_nan() {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }

    let h = (n - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = h - lo as f64;

    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Quantile of the non-missing values of a series.
pub fn quantile(values: &[Option<f64>], q: f64) -> Option<f64> {
    quantile_sorted(&sorted_present(values), q)
}

/// Mean of the non-missing values, `None` when there are none.
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(s, c), &v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Sample standard deviation (denominator `n - 1`) of the non-missing values.
///
/// `None` for fewer than two values or a non-finite result.
pub fn sample_std(values: &[Option<f64>]) -> Option<f64> {
    let count = values.iter().flatten().count();
    if count < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().flatten().map(|v| (v - m) * (v - m)).sum();
    let std = (ss / (count - 1) as f64).sqrt();
    std.is_finite().then_some(std)
}

/// Number of non-missing values.
pub fn present_count(values: &[Option<f64>]) -> usize {
    values.iter().filter(|v| v.is_some()).count()
}
