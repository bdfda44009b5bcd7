//! Indicator normalization: winsorize, align direction, pooled z-score
//!
//! Each raw indicator is turned into a z-column where higher always means
//! structurally stronger. Mean and standard deviation are pooled over every
//! entity and period in the panel, not computed per period.

use std::collections::BTreeSet;

use anyhow::Result;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use super::error::ScoreError;
use super::stats::{float_column, mean, numeric_values, present_count, sample_std};
use super::winsorize::{apply_bounds, validate_tail_probability, winsor_bounds, WinsorBounds};

/// Name of the z-column derived from a raw indicator.
pub fn z_column_name(indicator: &str) -> String {
    format!("z_{}", indicator)
}

/// Per-indicator statistics captured during normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorStats {
    pub indicator: String,
    pub z_column: String,
    pub bad_if_high: bool,
    /// Non-missing observations across the whole panel
    pub observations: usize,
    /// Winsorization bounds in raw units, `None` when capping was a no-op
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<WinsorBounds>,
    /// Pooled mean after winsorization and sign alignment
    pub mean: Option<f64>,
    /// Pooled sample standard deviation after winsorization and sign alignment
    pub std_dev: Option<f64>,
    /// True when the z-column is entirely missing for lack of variance
    pub degenerate: bool,
}

/// Normalize a single raw series.
///
/// 1. winsorize at tail probability `p`
/// 2. negate when `bad_if_high`
/// 3. standardize with the pooled mean and sample standard deviation
///
/// A zero or undefined standard deviation yields an all-missing result.
pub fn normalize_series(
    raw: &[Option<f64>],
    p: f64,
    bad_if_high: bool,
) -> (Vec<Option<f64>>, NormalizationStats) {
    let bounds = winsor_bounds(raw, p);
    let capped = match bounds {
        Some(b) => apply_bounds(raw, b),
        None => raw.to_vec(),
    };

    let aligned: Vec<Option<f64>> = if bad_if_high {
        capped.iter().map(|v| v.map(|x| -x)).collect()
    } else {
        capped
    };

    let mu = mean(&aligned);
    let sigma = sample_std(&aligned);

    let z = match (mu, sigma) {
        (Some(m), Some(s)) if s > 0.0 => aligned
            .iter()
            .map(|v| v.map(|x| (x - m) / s).filter(|z| z.is_finite()))
            .collect(),
        _ => vec![None; raw.len()],
    };

    let stats = NormalizationStats {
        observations: present_count(raw),
        bounds,
        mean: mu,
        std_dev: sigma,
        degenerate: !matches!(sigma, Some(s) if s > 0.0),
    };

    (z, stats)
}

/// Statistics of one `normalize_series` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationStats {
    pub observations: usize,
    pub bounds: Option<WinsorBounds>,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub degenerate: bool,
}

/// Append one z-column per raw indicator to a copy of the panel.
///
/// Every requested indicator must exist in the panel; a missing one is a
/// caller error and nothing is computed. Input columns are left untouched.
/// Indicators are processed in parallel; each column's pooled statistics are
/// complete before any of its rows are standardized.
///
/// # Arguments
/// * `df` - The panel
/// * `indicators` - Raw indicator column names, in output order
/// * `bad_if_high` - Indicators where a higher raw value is structurally worse
/// * `tail_probability` - Winsorization tail probability in (0, 0.5)
pub fn normalize_indicators(
    df: &DataFrame,
    indicators: &[String],
    bad_if_high: &BTreeSet<String>,
    tail_probability: f64,
) -> Result<(DataFrame, Vec<IndicatorStats>)> {
    validate_tail_probability(tail_probability)?;

    // Fail before doing any work if a column is absent
    let present: BTreeSet<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    if let Some(missing) = indicators.iter().find(|name| !present.contains(*name)) {
        return Err(ScoreError::MissingIndicator {
            column: missing.clone(),
        }
        .into());
    }

    let results: Vec<(Column, IndicatorStats)> = indicators
        .par_iter()
        .map(|name| -> Result<(Column, IndicatorStats)> {
            let raw = numeric_values(df, name)?;
            let flip = bad_if_high.contains(name);
            let (z, stats) = normalize_series(&raw, tail_probability, flip);

            let z_name = z_column_name(name);
            let column = float_column(&z_name, z);
            Ok((
                column,
                IndicatorStats {
                    indicator: name.clone(),
                    z_column: z_name,
                    bad_if_high: flip,
                    observations: stats.observations,
                    bounds: stats.bounds,
                    mean: stats.mean,
                    std_dev: stats.std_dev,
                    degenerate: stats.degenerate,
                },
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut out = df.clone();
    let mut all_stats = Vec::with_capacity(results.len());
    for (column, stats) in results {
        out.with_column(column)?;
        all_stats.push(stats);
    }

    Ok((out, all_stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_z_scores_have_zero_mean_unit_std() {
        let raw: Vec<Option<f64>> = vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)];
        let (z, stats) = normalize_series(&raw, 0.01, false);
        assert!(!stats.degenerate);
        assert!(mean(&z).unwrap().abs() < 1e-12);
        assert!((sample_std(&z).unwrap() - 1.0).abs() < 1e-12);
        // Ordering preserved
        assert!(z[0].unwrap() < z[4].unwrap());
    }

    #[test]
    fn test_sign_flip_reverses_order() {
        let raw = vec![Some(1.0), Some(2.0), Some(3.0)];
        let (z, _) = normalize_series(&raw, 0.01, true);
        assert!(z[0].unwrap() > z[2].unwrap());
        assert!((z[1].unwrap()).abs() < 1e-12);
    }

    #[test]
    fn test_constant_series_is_all_missing() {
        let raw = vec![Some(7.0), Some(7.0), None, Some(7.0)];
        let (z, stats) = normalize_series(&raw, 0.05, false);
        assert!(z.iter().all(|v| v.is_none()));
        assert!(stats.degenerate);
        assert_eq!(stats.std_dev, Some(0.0));
    }

    #[test]
    fn test_single_observation_is_all_missing() {
        let raw = vec![None, Some(3.0), None];
        let (z, stats) = normalize_series(&raw, 0.05, false);
        assert_eq!(z, vec![None, None, None]);
        assert_eq!(stats.std_dev, None);
        assert_eq!(stats.observations, 1);
    }
}
