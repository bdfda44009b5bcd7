//! Pillar aggregation: row-wise mean of a pillar's available z-columns

use std::collections::HashSet;

use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::normalize::z_column_name;
use super::stats::{float_column, numeric_values};

/// A named group of indicators scored together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PillarSpec {
    pub name: String,
    /// Raw indicator names; the pillar reads their z-columns
    pub indicators: Vec<String>,
}

impl PillarSpec {
    pub fn new(name: &str, indicators: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            indicators: indicators.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Expected z-column names, in configured order
    pub fn z_columns(&self) -> Vec<String> {
        self.indicators.iter().map(|i| z_column_name(i)).collect()
    }

    pub fn score_column(&self) -> String {
        pillar_column_name(&self.name)
    }
}

/// Name of the score column for a pillar.
pub fn pillar_column_name(pillar: &str) -> String {
    format!("pillar_{}", pillar)
}

/// Which expected z-columns a pillar could and could not find
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PillarComposition {
    pub pillar: String,
    pub score_column: String,
    pub used: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub absent: Vec<String>,
}

/// Mean of the present values in one row, `None` if all are missing.
pub fn row_mean(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        return None;
    }
    let m = sum / count as f64;
    m.is_finite().then_some(m)
}

/// Append one score column per pillar to a copy of the panel.
///
/// Each pillar's expected z-columns are intersected with the columns actually
/// present; absent ones are skipped without error. A row whose present
/// components are all missing gets a missing pillar score, as does every row
/// of a pillar with no present components.
pub fn aggregate_pillars(
    df: &DataFrame,
    pillars: &[PillarSpec],
) -> Result<(DataFrame, Vec<PillarComposition>)> {
    let available: HashSet<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut out = df.clone();
    let mut compositions = Vec::with_capacity(pillars.len());

    for pillar in pillars {
        let (used, absent): (Vec<String>, Vec<String>) = pillar
            .z_columns()
            .into_iter()
            .partition(|c| available.contains(c));

        let components: Vec<Vec<Option<f64>>> = used
            .iter()
            .map(|c| numeric_values(df, c))
            .collect::<Result<_>>()?;

        let scores: Vec<Option<f64>> = (0..df.height())
            .map(|row| row_mean(components.iter().map(|col| col[row])))
            .collect();

        out.with_column(float_column(&pillar.score_column(), scores))?;

        compositions.push(PillarComposition {
            pillar: pillar.name.clone(),
            score_column: pillar.score_column(),
            used,
            absent,
        });
    }

    Ok((out, compositions))
}
