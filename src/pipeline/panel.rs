//! Entity/period keys of a country-year panel
//!
//! A panel is a `DataFrame` with one row per (entity, period) and one column
//! per indicator. This module reads and checks the two key columns; every
//! other stage works through the row order they establish.

use std::collections::{BTreeSet, HashSet};

use anyhow::Result;
use polars::prelude::*;

use super::error::ScoreError;

/// Names of the entity and period key columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelKeys {
    pub entity: String,
    pub period: String,
}

impl PanelKeys {
    pub fn new(entity: impl Into<String>, period: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            period: period.into(),
        }
    }
}

/// Entity identifiers as strings, one per row.
pub fn entity_ids(df: &DataFrame, keys: &PanelKeys) -> Result<Vec<Option<String>>> {
    let column = df.column(&keys.entity).map_err(|_| ScoreError::MissingColumn {
        column: keys.entity.clone(),
    })?;
    let as_str = column.cast(&DataType::String)?;
    Ok(as_str
        .str()?
        .iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Periods as integers, one per row. Values that cannot be cast become `None`.
pub fn period_values(df: &DataFrame, keys: &PanelKeys) -> Result<Vec<Option<i64>>> {
    let column = df.column(&keys.period).map_err(|_| ScoreError::MissingColumn {
        column: keys.period.clone(),
    })?;
    let as_int = column.cast(&DataType::Int64)?;
    Ok(as_int.i64()?.iter().collect())
}

/// Both key columns with nulls rejected.
pub fn key_vectors(df: &DataFrame, keys: &PanelKeys) -> Result<(Vec<String>, Vec<i64>)> {
    let entities = entity_ids(df, keys)?;
    let periods = period_values(df, keys)?;

    let mut out_entities = Vec::with_capacity(entities.len());
    let mut out_periods = Vec::with_capacity(periods.len());
    for (row, (entity, period)) in entities.into_iter().zip(periods).enumerate() {
        match (entity, period) {
            (Some(e), Some(p)) => {
                out_entities.push(e);
                out_periods.push(p);
            }
            _ => return Err(ScoreError::NullKey { row }.into()),
        }
    }
    Ok((out_entities, out_periods))
}

/// Check that both key columns exist, contain no nulls, and that every
/// (entity, period) pair appears at most once.
pub fn validate_panel(df: &DataFrame, keys: &PanelKeys) -> Result<()> {
    let (entities, periods) = key_vectors(df, keys)?;

    let mut seen: HashSet<(&str, i64)> = HashSet::with_capacity(entities.len());
    for (entity, &period) in entities.iter().zip(periods.iter()) {
        if !seen.insert((entity.as_str(), period)) {
            return Err(ScoreError::DuplicateKey {
                entity: entity.clone(),
                period,
            }
            .into());
        }
    }
    Ok(())
}

/// Keep only rows whose entity belongs to `universe`.
///
/// An empty universe keeps every row.
pub fn filter_universe(
    df: &DataFrame,
    keys: &PanelKeys,
    universe: &BTreeSet<String>,
) -> Result<DataFrame> {
    if universe.is_empty() {
        return Ok(df.clone());
    }

    let mask: BooleanChunked = entity_ids(df, keys)?
        .iter()
        .map(|e| e.as_ref().is_some_and(|e| universe.contains(e)))
        .collect();

    Ok(df.filter(&mask)?)
}

/// Distinct periods in ascending order.
pub fn distinct_periods(df: &DataFrame, keys: &PanelKeys) -> Result<Vec<i64>> {
    let periods: BTreeSet<i64> = period_values(df, keys)?.into_iter().flatten().collect();
    Ok(periods.into_iter().collect())
}

/// Most recent period present, if any.
pub fn latest_period(df: &DataFrame, keys: &PanelKeys) -> Result<Option<i64>> {
    Ok(distinct_periods(df, keys)?.last().copied())
}
