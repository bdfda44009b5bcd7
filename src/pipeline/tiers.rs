//! Rule-based tier classification within one period's cross-section
//!
//! Eligible rows are those of the target period, not excluded, and with
//! every pillar scored. All thresholds come from that same eligible set.
//! Rules are evaluated in a fixed order and the first match wins:
//!
//! 1. `high_risk` - demographics < 0, fiscal < 0, composite <= lower threshold
//! 2. `leader` - composite >= upper threshold and enough positive pillars
//! 3. `resource_exposed` - commodity <= commodity threshold, not a leader
//! 4. `mixed` - everything else
//!
//! A missing threshold makes every comparison against it false.

use std::collections::BTreeSet;
use std::fmt;

use anyhow::Result;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use super::composite::{CompositeVariant, COVERAGE_COLUMN};
use super::error::ScoreError;
use super::panel::{key_vectors, PanelKeys};
use super::pillars::pillar_column_name;
use super::rank::dense_rank;
use super::stats::{numeric_values, quantile};

/// Tier label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    HighRisk,
    Leader,
    ResourceExposed,
    Mixed,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::HighRisk, Tier::Leader, Tier::ResourceExposed, Tier::Mixed];

    /// Machine label used in exported tables
    pub fn label(&self) -> &'static str {
        match self {
            Tier::HighRisk => "high_risk",
            Tier::Leader => "leader",
            Tier::ResourceExposed => "resource_exposed",
            Tier::Mixed => "mixed",
        }
    }

    /// Human-readable name used on the console
    pub fn display_name(&self) -> &'static str {
        match self {
            Tier::HighRisk => "High-risk",
            Tier::Leader => "Leader",
            Tier::ResourceExposed => "Resource-exposed",
            Tier::Mixed => "Mixed",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Tier classification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    /// Upper composite quantile for leaders
    pub breakout_q: f64,
    /// Lower composite quantile for high-risk
    pub fragile_q: f64,
    /// Lower commodity-pillar quantile for resource exposure
    pub commodity_q: f64,
    /// Minimum number of strictly positive pillars for a leader
    pub min_positive_pillars: usize,
    pub demographics_pillar: String,
    pub fiscal_pillar: String,
    pub commodity_pillar: String,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            breakout_q: 0.75,
            fragile_q: 0.25,
            commodity_q: 0.25,
            min_positive_pillars: 4,
            demographics_pillar: "demographics".to_string(),
            fiscal_pillar: "fiscal".to_string(),
            commodity_pillar: "commodity".to_string(),
        }
    }
}

impl TierConfig {
    /// Check quantiles and that every role names a configured pillar.
    pub fn validate(&self, pillar_names: &[String]) -> Result<(), ScoreError> {
        for (name, value) in [
            ("breakout_q", self.breakout_q),
            ("fragile_q", self.fragile_q),
            ("commodity_q", self.commodity_q),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScoreError::InvalidQuantile {
                    name: name.to_string(),
                    value,
                });
            }
        }

        for role in [
            &self.demographics_pillar,
            &self.fiscal_pillar,
            &self.commodity_pillar,
        ] {
            if !pillar_names.contains(role) {
                return Err(ScoreError::UnknownPillar(role.clone()));
            }
        }

        if self.min_positive_pillars > pillar_names.len() {
            return Err(ScoreError::MinPositiveTooLarge {
                min: self.min_positive_pillars,
                total: pillar_names.len(),
            });
        }
        Ok(())
    }
}

/// Cross-sectional thresholds; `None` when the slice was empty
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TierThresholds {
    pub composite_upper: Option<f64>,
    pub composite_lower: Option<f64>,
    pub commodity_lower: Option<f64>,
}

/// Everything a rule looks at for one row
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TierInputs {
    pub composite: Option<f64>,
    pub demographics: Option<f64>,
    pub fiscal: Option<f64>,
    pub commodity: Option<f64>,
    pub positive_pillars: usize,
}

/// Shared, read-only inputs to every rule
#[derive(Debug, Clone, Copy)]
pub struct RuleContext {
    pub thresholds: TierThresholds,
    pub min_positive_pillars: usize,
}

/// One entry of the ordered rule list
pub struct TierRule {
    pub tier: Tier,
    pub predicate: fn(&TierInputs, &RuleContext) -> bool,
}

fn is_negative(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v < 0.0)
}

fn at_or_below(value: Option<f64>, threshold: Option<f64>) -> bool {
    matches!((value, threshold), (Some(v), Some(t)) if v <= t)
}

fn at_or_above(value: Option<f64>, threshold: Option<f64>) -> bool {
    matches!((value, threshold), (Some(v), Some(t)) if v >= t)
}

fn is_high_risk(row: &TierInputs, ctx: &RuleContext) -> bool {
    is_negative(row.demographics)
        && is_negative(row.fiscal)
        && at_or_below(row.composite, ctx.thresholds.composite_lower)
}

fn is_leader(row: &TierInputs, ctx: &RuleContext) -> bool {
    at_or_above(row.composite, ctx.thresholds.composite_upper)
        && row.positive_pillars >= ctx.min_positive_pillars
}

fn is_resource_exposed(row: &TierInputs, ctx: &RuleContext) -> bool {
    at_or_below(row.commodity, ctx.thresholds.commodity_lower) && !is_leader(row, ctx)
}

fn always(_: &TierInputs, _: &RuleContext) -> bool {
    true
}

/// Rules in priority order; the last one always matches.
pub const TIER_RULES: [TierRule; 4] = [
    TierRule {
        tier: Tier::HighRisk,
        predicate: is_high_risk,
    },
    TierRule {
        tier: Tier::Leader,
        predicate: is_leader,
    },
    TierRule {
        tier: Tier::ResourceExposed,
        predicate: is_resource_exposed,
    },
    TierRule {
        tier: Tier::Mixed,
        predicate: always,
    },
];

/// First matching tier for a row.
pub fn classify(row: &TierInputs, ctx: &RuleContext) -> Tier {
    TIER_RULES
        .iter()
        .find(|rule| (rule.predicate)(row, ctx))
        // Unreachable: the trailing Mixed rule always matches
        .map_or(Tier::Mixed, |rule| rule.tier)
}

/// Thresholds from a cross-section of eligible rows.
pub fn compute_thresholds(rows: &[TierInputs], config: &TierConfig) -> TierThresholds {
    let composites: Vec<Option<f64>> = rows.iter().map(|r| r.composite).collect();
    let commodity: Vec<Option<f64>> = rows.iter().map(|r| r.commodity).collect();

    TierThresholds {
        composite_upper: quantile(&composites, config.breakout_q),
        composite_lower: quantile(&composites, config.fragile_q),
        commodity_lower: quantile(&commodity, config.commodity_q),
    }
}

/// One classified entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierAssignment {
    pub entity: String,
    pub period: i64,
    pub rank: Option<u32>,
    pub composite: Option<f64>,
    pub tier: Tier,
    pub positive_pillars: usize,
    /// Pillar scores in configured pillar order
    pub pillar_scores: Vec<Option<f64>>,
}

/// Outcome of classifying one period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierResult {
    pub period: i64,
    pub thresholds: TierThresholds,
    pub pillars: Vec<String>,
    /// Sorted by rank, then entity
    pub assignments: Vec<TierAssignment>,
}

impl TierResult {
    pub fn count(&self, tier: Tier) -> usize {
        self.assignments.iter().filter(|a| a.tier == tier).count()
    }
}

/// Everything `classify_tiers` needs besides the panel
#[derive(Debug, Clone)]
pub struct TierRequest<'a> {
    pub keys: &'a PanelKeys,
    /// Configured pillar names, in order
    pub pillars: &'a [String],
    pub excluded: &'a BTreeSet<String>,
    pub variant: CompositeVariant,
    pub config: &'a TierConfig,
}

/// Classify the eligible entities of one period.
///
/// Fails if no row survives the period, exclusion, and full-coverage filters.
pub fn classify_tiers(df: &DataFrame, request: &TierRequest<'_>, period: i64) -> Result<TierResult> {
    request.config.validate(request.pillars)?;

    let (entities, periods) = key_vectors(df, request.keys)?;
    let composite = numeric_values(df, request.variant.column())?;
    let coverage = numeric_values(df, COVERAGE_COLUMN)?;
    let pillar_values: Vec<Vec<Option<f64>>> = request
        .pillars
        .iter()
        .map(|p| numeric_values(df, &pillar_column_name(p)))
        .collect::<Result<_>>()?;

    let position = |name: &String| request.pillars.iter().position(|p| p == name);
    // validate() guarantees these exist
    let demo_idx = position(&request.config.demographics_pillar);
    let fiscal_idx = position(&request.config.fiscal_pillar);
    let commodity_idx = position(&request.config.commodity_pillar);

    let total = request.pillars.len();
    let eligible: Vec<usize> = (0..df.height())
        .filter(|&row| periods[row] == period)
        .filter(|&row| !request.excluded.contains(&entities[row]))
        .filter(|&row| matches!(coverage[row], Some(c) if c as usize == total))
        .collect();

    if eligible.is_empty() {
        return Err(ScoreError::EmptyCrossSection { period }.into());
    }

    let pick = |idx: Option<usize>, row: usize| idx.and_then(|i| pillar_values[i][row]);
    let inputs: Vec<TierInputs> = eligible
        .iter()
        .map(|&row| TierInputs {
            composite: composite[row],
            demographics: pick(demo_idx, row),
            fiscal: pick(fiscal_idx, row),
            commodity: pick(commodity_idx, row),
            positive_pillars: pillar_values
                .iter()
                .filter(|p| matches!(p[row], Some(v) if v > 0.0))
                .count(),
        })
        .collect();

    // Barrier: thresholds are final before any row is compared against them
    let thresholds = compute_thresholds(&inputs, request.config);
    let ctx = RuleContext {
        thresholds,
        min_positive_pillars: request.config.min_positive_pillars,
    };

    let ranks = dense_rank(&inputs.iter().map(|i| i.composite).collect::<Vec<_>>());

    let mut assignments: Vec<TierAssignment> = eligible
        .iter()
        .zip(inputs.iter())
        .zip(ranks)
        .map(|((&row, input), rank)| TierAssignment {
            entity: entities[row].clone(),
            period,
            rank,
            composite: input.composite,
            tier: classify(input, &ctx),
            positive_pillars: input.positive_pillars,
            pillar_scores: pillar_values.iter().map(|p| p[row]).collect(),
        })
        .collect();

    assignments.sort_by(|a, b| {
        a.rank
            .unwrap_or(u32::MAX)
            .cmp(&b.rank.unwrap_or(u32::MAX))
            .then_with(|| a.entity.cmp(&b.entity))
    });

    Ok(TierResult {
        period,
        thresholds,
        pillars: request.pillars.to_vec(),
        assignments,
    })
}
