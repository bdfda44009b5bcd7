//! Pipeline module - normalization, pillars, composites and tiers

pub mod composite;
pub mod config;
pub mod coverage;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod panel;
pub mod pillars;
pub mod rank;
pub mod scoring;
pub mod stats;
pub mod tiers;
pub mod winsorize;

pub use composite::*;
pub use config::*;
pub use coverage::*;
pub use error::ScoreError;
pub use loader::*;
pub use normalize::*;
pub use panel::*;
pub use pillars::*;
pub use rank::*;
pub use scoring::*;
pub use stats::numeric_values;
pub use tiers::*;
pub use winsorize::*;
