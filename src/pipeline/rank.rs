//! Dense ranking of composite scores within each period

use std::collections::BTreeMap;

use anyhow::Result;
use polars::prelude::*;

use super::composite::{CompositeVariant, COVERAGE_COLUMN};
use super::panel::{key_vectors, PanelKeys};
use super::stats::numeric_values;

pub const RANK_COLUMN: &str = "rank";
pub const RANK_FULL_COLUMN: &str = "rank_full";

/// Dense rank, highest score first.
///
/// Equal scores share a rank and the next distinct score gets the next
/// integer: `[10, 10, 5]` ranks as `[1, 1, 2]`. Missing scores get no rank.
pub fn dense_rank(scores: &[Option<f64>]) -> Vec<Option<u32>> {
    let mut order: Vec<(usize, f64)> = scores
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.map(|v| (i, v)))
        .collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut ranks = vec![None; scores.len()];
    let mut rank = 0u32;
    let mut previous: Option<f64> = None;
    for (idx, value) in order {
        if previous != Some(value) {
            rank += 1;
            previous = Some(value);
        }
        ranks[idx] = Some(rank);
    }
    ranks
}

/// Dense rank computed separately for each group of rows.
pub fn dense_rank_by_group<K: Ord>(groups: &[K], scores: &[Option<f64>]) -> Vec<Option<u32>> {
    let mut members: BTreeMap<&K, Vec<usize>> = BTreeMap::new();
    for (row, key) in groups.iter().enumerate() {
        members.entry(key).or_default().push(row);
    }

    let mut ranks = vec![None; scores.len()];
    for rows in members.values() {
        let group_scores: Vec<Option<f64>> = rows.iter().map(|&r| scores[r]).collect();
        for (&row, rank) in rows.iter().zip(dense_rank(&group_scores)) {
            ranks[row] = rank;
        }
    }
    ranks
}

/// Append `rank` and `rank_full` columns to a copy of the panel.
///
/// Both ranks are computed within each period on the chosen composite.
/// `rank` covers every row with a defined score; `rank_full` only rows whose
/// coverage equals `total_pillars`, leaving the rest unranked.
pub fn add_rank_columns(
    df: &DataFrame,
    keys: &PanelKeys,
    variant: CompositeVariant,
    total_pillars: usize,
) -> Result<DataFrame> {
    let (_, periods) = key_vectors(df, keys)?;
    let scores = numeric_values(df, variant.column())?;
    let coverage = numeric_values(df, COVERAGE_COLUMN)?;

    let full_scores: Vec<Option<f64>> = scores
        .iter()
        .zip(coverage.iter())
        .map(|(s, c)| match c {
            Some(c) if *c as usize == total_pillars => *s,
            _ => None,
        })
        .collect();

    let rank = dense_rank_by_group(&periods, &scores);
    let rank_full = dense_rank_by_group(&periods, &full_scores);

    let mut out = df.clone();
    out.with_column(Column::new(RANK_COLUMN.into(), rank))?;
    out.with_column(Column::new(RANK_FULL_COLUMN.into(), rank_full))?;
    Ok(out)
}
