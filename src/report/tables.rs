//! Output tables: ranking, tiers, and missing-pillar diagnostics

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

use crate::pipeline::{
    key_vectors, numeric_values, ScoringConfig, TierResult, COVERAGE_COLUMN, NAIVE_COLUMN,
    NEUTRAL_COLUMN, PENALIZED_COLUMN, RANK_COLUMN, RANK_FULL_COLUMN,
};

/// Ranking table: one row per (entity, period) with coverage, every composite,
/// every pillar score and both ranks. Sorted by period, then rank (unranked
/// rows last), then entity.
pub fn ranking_table(scored: &DataFrame, config: &ScoringConfig) -> Result<DataFrame> {
    let keys = config.keys();

    let mut columns: Vec<String> = vec![
        keys.entity.clone(),
        keys.period.clone(),
        COVERAGE_COLUMN.to_string(),
        NAIVE_COLUMN.to_string(),
        PENALIZED_COLUMN.to_string(),
        NEUTRAL_COLUMN.to_string(),
    ];
    columns.extend(config.pillar_columns());
    columns.push(RANK_COLUMN.to_string());
    columns.push(RANK_FULL_COLUMN.to_string());

    let table = scored.select(columns)?;

    let (entities, periods) = key_vectors(&table, &keys)?;
    let ranks = numeric_values(&table, RANK_COLUMN)?;

    let mut order: Vec<usize> = (0..table.height()).collect();
    order.sort_by(|&a, &b| {
        periods[a]
            .cmp(&periods[b])
            .then_with(|| {
                let ra = ranks[a].unwrap_or(f64::INFINITY);
                let rb = ranks[b].unwrap_or(f64::INFINITY);
                ra.total_cmp(&rb)
            })
            .then_with(|| entities[a].cmp(&entities[b]))
    });

    let idx = IdxCa::from_vec(
        "idx".into(),
        order.into_iter().map(|i| i as IdxSize).collect(),
    );
    Ok(table.take(&idx)?)
}

/// Tier table for one period: entity, period, rank, composite, tier,
/// positive-pillar count and all pillar scores, sorted by rank.
pub fn tier_table(result: &TierResult, config: &ScoringConfig) -> Result<DataFrame> {
    let keys = config.keys();
    let rows = &result.assignments;

    let mut columns = vec![
        Column::new(
            keys.entity.as_str().into(),
            rows.iter().map(|a| a.entity.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            keys.period.as_str().into(),
            rows.iter().map(|a| a.period).collect::<Vec<_>>(),
        ),
        Column::new(
            RANK_COLUMN.into(),
            rows.iter().map(|a| a.rank).collect::<Vec<_>>(),
        ),
        Column::new(
            "composite".into(),
            rows.iter().map(|a| a.composite).collect::<Vec<_>>(),
        ),
        Column::new(
            "tier".into(),
            rows.iter().map(|a| a.tier.label()).collect::<Vec<_>>(),
        ),
        Column::new(
            "positive_pillars".into(),
            rows.iter().map(|a| a.positive_pillars as u32).collect::<Vec<_>>(),
        ),
    ];

    for (i, name) in config.pillar_columns().iter().enumerate() {
        columns.push(Column::new(
            name.as_str().into(),
            rows.iter().map(|a| a.pillar_scores[i]).collect::<Vec<_>>(),
        ));
    }

    Ok(DataFrame::new(columns)?)
}

/// A pillar score missing for a not-fully-covered row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingPillar {
    pub entity: String,
    pub period: i64,
    pub pillar: String,
}

/// Long-form (entity, period, pillar) listing of missing pillar scores,
/// restricted to rows without full coverage and to `periods` when non-empty.
pub fn missing_pillars(
    scored: &DataFrame,
    config: &ScoringConfig,
    periods: &[i64],
) -> Result<Vec<MissingPillar>> {
    let keys = config.keys();
    let (entities, row_periods) = key_vectors(scored, &keys)?;
    let coverage = numeric_values(scored, COVERAGE_COLUMN)?;
    let pillar_values: Vec<Vec<Option<f64>>> = config
        .pillar_columns()
        .iter()
        .map(|c| numeric_values(scored, c))
        .collect::<Result<_>>()?;

    let total = config.pillars.len();
    let mut out = Vec::new();
    for row in 0..scored.height() {
        if !periods.is_empty() && !periods.contains(&row_periods[row]) {
            continue;
        }
        if matches!(coverage[row], Some(c) if c as usize == total) {
            continue;
        }
        for (pillar, values) in config.pillars.iter().zip(pillar_values.iter()) {
            if values[row].is_none() {
                out.push(MissingPillar {
                    entity: entities[row].clone(),
                    period: row_periods[row],
                    pillar: pillar.name.clone(),
                });
            }
        }
    }

    out.sort_by(|a, b| {
        a.period
            .cmp(&b.period)
            .then_with(|| a.entity.cmp(&b.entity))
    });
    Ok(out)
}

/// Missing-pillar listing as a table.
pub fn missing_pillar_table(rows: &[MissingPillar], config: &ScoringConfig) -> Result<DataFrame> {
    let keys = config.keys();
    Ok(DataFrame::new(vec![
        Column::new(
            keys.entity.as_str().into(),
            rows.iter().map(|m| m.entity.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            keys.period.as_str().into(),
            rows.iter().map(|m| m.period).collect::<Vec<_>>(),
        ),
        Column::new(
            "pillar".into(),
            rows.iter().map(|m| m.pillar.clone()).collect::<Vec<_>>(),
        ),
    ])?)
}
