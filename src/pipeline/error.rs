//! Configuration errors raised by the scoring pipeline.
//!
//! Degenerate data (constant indicators, all-missing pillars, empty quantile
//! slices) never produces one of these; it flows downstream as missing values.
//! A `ScoreError` always means the caller asked for something that cannot be
//! answered from the panel it supplied.

use thiserror::Error;

/// Fail-fast errors surfaced at the call that triggers them.
#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    /// A raw indicator requested for normalization is not a panel column.
    #[error("indicator column '{column}' not found in panel")]
    MissingIndicator { column: String },

    /// A required key or score column is not present.
    #[error("required column '{column}' not found in panel")]
    MissingColumn { column: String },

    /// A column that must be numeric could not be cast to Float64.
    #[error("column '{column}' must be numeric (cannot cast to Float64)")]
    NonNumericColumn { column: String },

    /// The panel key (entity, period) is not unique.
    #[error("duplicate panel key: entity '{entity}', period {period}")]
    DuplicateKey { entity: String, period: i64 },

    /// A row is missing its entity or period.
    #[error("panel row {row} has a missing entity or period")]
    NullKey { row: usize },

    /// Nothing is left to classify after filtering.
    #[error("no eligible rows to classify for period {period}")]
    EmptyCrossSection { period: i64 },

    /// Winsorization tail probability outside (0, 0.5).
    #[error("tail probability must be in (0, 0.5), got {0}")]
    InvalidTailProbability(f64),

    /// A quantile probability outside [0, 1].
    #[error("quantile '{name}' must be in [0, 1], got {value}")]
    InvalidQuantile { name: String, value: f64 },

    /// A pillar is referenced by name but never configured.
    #[error("pillar '{0}' is not configured")]
    UnknownPillar(String),

    /// Two pillars share the same name, or a pillar has an empty name.
    #[error("invalid pillar configuration: {0}")]
    InvalidPillars(String),

    /// The positive-pillar minimum exceeds the number of pillars.
    #[error("min_positive_pillars ({min}) exceeds pillar count ({total})")]
    MinPositiveTooLarge { min: usize, total: usize },
}
