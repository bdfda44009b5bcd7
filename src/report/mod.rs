//! Report module - output tables, run report, console summaries

pub mod score_report;
pub mod summary;
pub mod tables;

pub use score_report::*;
pub use summary::*;
pub use tables::*;
