//! Composite scoring across pillars under three missing-data policies
//!
//! * **naive** - mean of the available pillar scores
//! * **penalized** - naive scaled by `coverage / total pillars`
//! * **neutral** - missing pillars count as zero, sum divided by total pillars
//!
//! All three are computed independently from the same pillar scores.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::pillars::row_mean;
use super::stats::{float_column, numeric_values};

pub const COVERAGE_COLUMN: &str = "pillars_available";
pub const NAIVE_COLUMN: &str = "composite_naive";
pub const PENALIZED_COLUMN: &str = "composite_penalized";
pub const NEUTRAL_COLUMN: &str = "composite_neutral";

/// Which composite a ranking is based on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeVariant {
    Naive,
    #[default]
    Penalized,
    Neutral,
}

impl CompositeVariant {
    pub fn column(&self) -> &'static str {
        match self {
            CompositeVariant::Naive => NAIVE_COLUMN,
            CompositeVariant::Penalized => PENALIZED_COLUMN,
            CompositeVariant::Neutral => NEUTRAL_COLUMN,
        }
    }
}

impl fmt::Display for CompositeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompositeVariant::Naive => "naive",
            CompositeVariant::Penalized => "penalized",
            CompositeVariant::Neutral => "neutral",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for CompositeVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "naive" => Ok(CompositeVariant::Naive),
            "penalized" => Ok(CompositeVariant::Penalized),
            "neutral" => Ok(CompositeVariant::Neutral),
            _ => Err(format!(
                "Invalid composite variant: '{}'. Use 'naive', 'penalized' or 'neutral'",
                s
            )),
        }
    }
}

/// Composite scores for one row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeScores {
    pub coverage: u32,
    pub naive: Option<f64>,
    pub penalized: Option<f64>,
    /// `None` only when no pillars are configured at all
    pub neutral: Option<f64>,
}

impl CompositeScores {
    pub fn get(&self, variant: CompositeVariant) -> Option<f64> {
        match variant {
            CompositeVariant::Naive => self.naive,
            CompositeVariant::Penalized => self.penalized,
            CompositeVariant::Neutral => self.neutral,
        }
    }
}

/// Combine one row's pillar scores.
pub fn composite_row(pillar_scores: &[Option<f64>]) -> CompositeScores {
    let total = pillar_scores.len();
    let coverage = pillar_scores.iter().filter(|s| s.is_some()).count();

    let naive = row_mean(pillar_scores.iter().copied());
    let penalized = naive.map(|n| n * (coverage as f64 / total as f64));
    let neutral = (total > 0).then(|| pillar_scores.iter().flatten().sum::<f64>() / total as f64);

    CompositeScores {
        coverage: coverage as u32,
        naive,
        penalized,
        neutral,
    }
}

/// Append coverage and the three composite columns to a copy of the panel.
///
/// # Arguments
/// * `df` - Panel carrying one score column per pillar
/// * `pillar_columns` - The full configured set of pillar score columns
pub fn score_composites(df: &DataFrame, pillar_columns: &[String]) -> Result<DataFrame> {
    let pillar_values: Vec<Vec<Option<f64>>> = pillar_columns
        .iter()
        .map(|c| numeric_values(df, c))
        .collect::<Result<_>>()?;

    let rows: Vec<CompositeScores> = (0..df.height())
        .map(|row| {
            let scores: Vec<Option<f64>> = pillar_values.iter().map(|p| p[row]).collect();
            composite_row(&scores)
        })
        .collect();

    let coverage: Vec<u32> = rows.iter().map(|r| r.coverage).collect();

    let mut out = df.clone();
    out.with_column(Column::new(COVERAGE_COLUMN.into(), coverage))?;
    out.with_column(float_column(
        NAIVE_COLUMN,
        rows.iter().map(|r| r.naive).collect(),
    ))?;
    out.with_column(float_column(
        PENALIZED_COLUMN,
        rows.iter().map(|r| r.penalized).collect(),
    ))?;
    out.with_column(float_column(
        NEUTRAL_COLUMN,
        rows.iter().map(|r| r.neutral).collect(),
    ))?;

    Ok(out)
}
