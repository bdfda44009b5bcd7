//! JSON run report
//!
//! Documents the configuration a scoring run used, what happened to every
//! indicator and pillar, and the tier outcome of each target period.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{
    IndicatorStats, PillarComposition, ScoredPanel, ScoringConfig, Tier, TierResult,
    TierThresholds,
};
use crate::report::ScoringSummary;

/// Report metadata
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub timestamp: String,
    pub strata_version: String,
    pub input_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,
    pub config: ScoringConfig,
}

/// Tier outcome of one period
#[derive(Debug, Clone, Serialize)]
pub struct PeriodTierSummary {
    pub period: i64,
    pub eligible: usize,
    pub thresholds: TierThresholds,
    pub counts: BTreeMap<Tier, usize>,
}

impl PeriodTierSummary {
    pub fn from_result(result: &TierResult) -> Self {
        let counts = Tier::ALL
            .iter()
            .map(|&tier| (tier, result.count(tier)))
            .collect();
        Self {
            period: result.period,
            eligible: result.assignments.len(),
            thresholds: result.thresholds,
            counts,
        }
    }
}

/// Timing information in milliseconds
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimingInfo {
    pub load_ms: u64,
    pub scoring_ms: u64,
    pub tiers_ms: u64,
    pub save_ms: u64,
    pub total_ms: u64,
}

/// Complete run report
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub metadata: ReportMetadata,
    pub rows: usize,
    pub full_coverage_rows: usize,
    pub indicators: Vec<IndicatorStats>,
    pub pillars: Vec<PillarComposition>,
    pub tiers: Vec<PeriodTierSummary>,
    pub timing: TimingInfo,
}

/// Collects report sections while the pipeline runs
pub struct ScoreReportBuilder {
    input_file: String,
    config_file: Option<String>,
    config: ScoringConfig,
    rows: usize,
    full_coverage_rows: usize,
    indicators: Vec<IndicatorStats>,
    pillars: Vec<PillarComposition>,
    tiers: Vec<PeriodTierSummary>,
    timing: TimingInfo,
}

impl ScoreReportBuilder {
    pub fn new(input_file: &Path, config_file: Option<&Path>, config: &ScoringConfig) -> Self {
        Self {
            input_file: input_file.display().to_string(),
            config_file: config_file.map(|p| p.display().to_string()),
            config: config.clone(),
            rows: 0,
            full_coverage_rows: 0,
            indicators: Vec::new(),
            pillars: Vec::new(),
            tiers: Vec::new(),
            timing: TimingInfo::default(),
        }
    }

    pub fn set_scoring(&mut self, scored: &ScoredPanel, full_coverage_rows: usize) {
        self.rows = scored.frame.height();
        self.full_coverage_rows = full_coverage_rows;
        self.indicators = scored.indicator_stats.clone();
        self.pillars = scored.pillar_composition.clone();
    }

    pub fn add_tier_result(&mut self, result: &TierResult) {
        self.tiers.push(PeriodTierSummary::from_result(result));
    }

    pub fn set_timing(&mut self, summary: &ScoringSummary) {
        let ms = |d: std::time::Duration| d.as_millis() as u64;
        self.timing = TimingInfo {
            load_ms: ms(summary.load_time),
            scoring_ms: ms(summary.scoring_time),
            tiers_ms: ms(summary.tiers_time),
            save_ms: ms(summary.save_time),
            total_ms: ms(summary.total_time()),
        };
    }

    pub fn build(self) -> ScoreReport {
        ScoreReport {
            metadata: ReportMetadata {
                timestamp: Utc::now().to_rfc3339(),
                strata_version: env!("CARGO_PKG_VERSION").to_string(),
                input_file: self.input_file,
                config_file: self.config_file,
                config: self.config,
            },
            rows: self.rows,
            full_coverage_rows: self.full_coverage_rows,
            indicators: self.indicators,
            pillars: self.pillars,
            tiers: self.tiers,
            timing: self.timing,
        }
    }
}

/// Export the run report to a JSON file
pub fn export_score_report(report: &ScoreReport, output_path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(report).context("Failed to serialize score report to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write score report to {}", output_path.display()))?;

    Ok(())
}

/// Package output files into a single zip archive and remove the originals.
pub fn package_reports(files: &[&Path], zip_path: &Path) -> Result<()> {
    use std::io::{Read, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    let zip_file = std::fs::File::create(zip_path)
        .with_context(|| format!("Failed to create zip file: {}", zip_path.display()))?;

    let mut zip = ZipWriter::new(zip_file);
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for path in files {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Invalid file name: {}", path.display()))?;
        zip.start_file(filename, options)
            .with_context(|| format!("Failed to add {} to zip", filename))?;
        let mut content = Vec::new();
        std::fs::File::open(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?
            .read_to_end(&mut content)?;
        zip.write_all(&content)?;
    }

    zip.finish().context("Failed to finalize zip file")?;

    for path in files {
        std::fs::remove_file(path).ok();
    }

    Ok(())
}
