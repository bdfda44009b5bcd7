//! End-to-end scoring of a panel
//!
//! raw panel -> z-columns -> pillar scores -> composites -> ranks.
//! Every stage is a pure function of its input frame and the config, so
//! rerunning on the same panel yields the same result.

use anyhow::{Context, Result};
use polars::prelude::*;

use super::composite::{score_composites, COVERAGE_COLUMN};
use super::config::ScoringConfig;
use super::normalize::{normalize_indicators, IndicatorStats};
use super::panel::{filter_universe, latest_period, validate_panel};
use super::pillars::{aggregate_pillars, PillarComposition};
use super::rank::add_rank_columns;
use super::stats::numeric_values;
use super::tiers::{classify_tiers, TierResult};

/// Scored panel plus the statistics gathered on the way
#[derive(Debug, Clone)]
pub struct ScoredPanel {
    pub frame: DataFrame,
    pub indicator_stats: Vec<IndicatorStats>,
    pub pillar_composition: Vec<PillarComposition>,
}

impl ScoredPanel {
    /// Indicators whose z-column came out entirely missing
    pub fn degenerate_indicators(&self) -> Vec<&str> {
        self.indicator_stats
            .iter()
            .filter(|s| s.degenerate)
            .map(|s| s.indicator.as_str())
            .collect()
    }

    /// Expected z-columns that no pillar could find, as (pillar, column)
    pub fn absent_columns(&self) -> Vec<(&str, &str)> {
        self.pillar_composition
            .iter()
            .flat_map(|c| c.absent.iter().map(move |a| (c.pillar.as_str(), a.as_str())))
            .collect()
    }

    /// Rows with every configured pillar scored
    pub fn full_coverage_rows(&self, total_pillars: usize) -> Result<usize> {
        Ok(numeric_values(&self.frame, COVERAGE_COLUMN)?
            .iter()
            .filter(|c| matches!(c, Some(c) if *c as usize == total_pillars))
            .count())
    }
}

/// Score every row of the panel.
///
/// Validates the config and the panel keys, restricts to the configured
/// universe, then runs each stage in order.
pub fn score_panel(df: &DataFrame, config: &ScoringConfig) -> Result<ScoredPanel> {
    config.validate()?;
    let keys = config.keys();
    validate_panel(df, &keys)?;

    let panel = filter_universe(df, &keys, &config.universe)?;

    let (normalized, indicator_stats) = normalize_indicators(
        &panel,
        &config.indicators,
        &config.bad_if_high,
        config.tail_probability,
    )
    .context("Indicator normalization failed")?;

    let (with_pillars, pillar_composition) = aggregate_pillars(&normalized, &config.pillars)?;

    let with_composites = score_composites(&with_pillars, &config.pillar_columns())?;

    let frame = add_rank_columns(
        &with_composites,
        &keys,
        config.rank_by,
        config.pillars.len(),
    )?;

    Ok(ScoredPanel {
        frame,
        indicator_stats,
        pillar_composition,
    })
}

/// Periods to tier: the configured ones, or the latest period present.
pub fn resolve_target_periods(df: &DataFrame, config: &ScoringConfig) -> Result<Vec<i64>> {
    if !config.target_periods.is_empty() {
        return Ok(config.target_periods.clone());
    }
    Ok(latest_period(df, &config.keys())?.into_iter().collect())
}

/// Classify each target period of a scored panel.
pub fn classify_periods(
    scored: &ScoredPanel,
    config: &ScoringConfig,
    periods: &[i64],
) -> Result<Vec<TierResult>> {
    let keys = config.keys();
    let pillars = config.pillar_names();
    let request = config.tier_request(&keys, &pillars);

    periods
        .iter()
        .map(|&period| classify_tiers(&scored.frame, &request, period))
        .collect()
}
