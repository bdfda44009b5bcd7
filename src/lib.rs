//! Strata: structural strength scoring
//!
//! Scores entity-period panels (typically countries by year) on a set of
//! structural indicators. Raw indicators are winsorized and standardized,
//! averaged into pillar scores, combined into composite scores under three
//! missing-data policies, ranked within each period and sorted into tiers.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
