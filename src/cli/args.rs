//! Command-line argument definitions using clap

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::pipeline::{load_entity_list, CompositeVariant, ScoringConfig};

/// Strata - score and tier country panels on structural strength
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Input panel (CSV or Parquet), one row per entity and period
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// JSON scoring configuration. Defaults to <config dir>/strata/config.json
    /// when present, otherwise the built-in emerging-market baseline.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output directory. Defaults to the input file's directory.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Periods to tier (comma-separated). Defaults to the latest period.
    #[arg(long, value_delimiter = ',')]
    pub period: Vec<i64>,

    /// Winsorization tail probability, strictly between 0 and 0.5
    #[arg(long, value_parser = validate_tail_probability)]
    pub tail_probability: Option<f64>,

    /// Composite quantile above which an entity may be a leader
    #[arg(long, value_parser = validate_quantile)]
    pub breakout_q: Option<f64>,

    /// Composite quantile below which an entity is high risk
    #[arg(long, value_parser = validate_quantile)]
    pub fragile_q: Option<f64>,

    /// Commodity pillar quantile below which an entity is resource exposed
    #[arg(long, value_parser = validate_quantile)]
    pub commodity_q: Option<f64>,

    /// Minimum number of positive pillars for the leader tier
    #[arg(long)]
    pub min_positive_pillars: Option<usize>,

    /// Entities to leave out of tiering (comma-separated). They are still scored.
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// File listing the entities to keep (CSV or Parquet)
    #[arg(long)]
    pub universe: Option<PathBuf>,

    /// Column of the universe file holding entity ids.
    /// Defaults to the configured entity column.
    #[arg(long)]
    pub universe_column: Option<String>,

    /// Composite used for ranks and tiers: "naive", "penalized" or "neutral"
    #[arg(long)]
    pub rank_by: Option<CompositeVariant>,

    /// Output table format: "csv" or "parquet"
    #[arg(long, default_value = "csv")]
    pub format: OutputFormat,

    /// Bundle all outputs into a single zip archive
    #[arg(long, default_value = "false")]
    pub bundle: bool,

    /// Skip interactive confirmation prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan (very slow for large files).
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report per-indicator data coverage of a panel
    Coverage {
        /// Input panel (CSV or Parquet)
        input: PathBuf,

        /// JSON scoring configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file (CSV or Parquet). Defaults to <input>_coverage.csv
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of rows to use for schema inference (CSV only)
        #[arg(long, default_value = "10000")]
        infer_schema_length: usize,
    },
}

/// Format of the output tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            _ => Err(format!(
                "Invalid output format: '{}'. Use 'csv' or 'parquet'",
                s
            )),
        }
    }
}

impl Cli {
    pub fn input(&self) -> Option<&PathBuf> {
        self.input.as_ref()
    }

    /// Output directory, falling back to the input's directory.
    pub fn output_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.output_dir {
            return Some(dir.clone());
        }
        let input = self.input.as_ref()?;
        Some(
            input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf(),
        )
    }

    /// File stem shared by every output file.
    pub fn output_stem(&self) -> String {
        self.input
            .as_ref()
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .unwrap_or("strata")
            .to_string()
    }

    /// Layer command-line settings over the loaded configuration.
    pub fn apply_overrides(&self, config: &mut ScoringConfig) -> Result<()> {
        if !self.period.is_empty() {
            config.target_periods = self.period.clone();
        }
        if let Some(p) = self.tail_probability {
            config.tail_probability = p;
        }
        if let Some(q) = self.breakout_q {
            config.tiers.breakout_q = q;
        }
        if let Some(q) = self.fragile_q {
            config.tiers.fragile_q = q;
        }
        if let Some(q) = self.commodity_q {
            config.tiers.commodity_q = q;
        }
        if let Some(n) = self.min_positive_pillars {
            config.tiers.min_positive_pillars = n;
        }
        if let Some(variant) = self.rank_by {
            config.rank_by = variant;
        }
        config
            .excluded_entities
            .extend(self.exclude.iter().map(|e| e.trim().to_string()));

        if let Some(path) = &self.universe {
            let column = self
                .universe_column
                .clone()
                .unwrap_or_else(|| config.entity_column.clone());
            config.universe = load_entity_list(path, &column)?;
        }

        Ok(())
    }
}

fn parse_f64(s: &str) -> Result<f64, String> {
    s.parse()
        .map_err(|_| format!("'{}' is not a valid number", s))
}

/// Validator for the tail probability
fn validate_tail_probability(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value > 0.0 && value < 0.5 {
        Ok(value)
    } else {
        Err(format!(
            "tail probability must be strictly between 0 and 0.5, got {}",
            value
        ))
    }
}

/// Validator for tier quantiles
fn validate_quantile(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("quantile must be between 0.0 and 1.0, got {}", value))
    }
}
