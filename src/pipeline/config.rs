//! Scoring configuration
//!
//! Static inputs to every stage: which columns key the panel, which raw
//! indicators to normalize and which of them are bad-if-high, how indicators
//! group into pillars, and the tier settings. Loaded from JSON; any field
//! left out falls back to the emerging-market baseline below.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::composite::CompositeVariant;
use super::coverage::PeriodWindow;
use super::error::ScoreError;
use super::panel::PanelKeys;
use super::pillars::{pillar_column_name, PillarSpec};
use super::tiers::{TierConfig, TierRequest};
use super::winsorize::validate_tail_probability;

/// Default winsorization tail probability
pub const DEFAULT_TAIL_PROBABILITY: f64 = 0.01;

/// Complete scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub entity_column: String,
    pub period_column: String,
    /// Raw indicators to normalize, in output order
    pub indicators: Vec<String>,
    /// Indicators where a higher raw value is structurally worse
    pub bad_if_high: BTreeSet<String>,
    /// Pillars in output order
    pub pillars: Vec<PillarSpec>,
    pub tail_probability: f64,
    pub tiers: TierConfig,
    /// Entities never tiered (still scored and ranked)
    pub excluded_entities: BTreeSet<String>,
    /// When non-empty, rows of any other entity are dropped before scoring
    pub universe: BTreeSet<String>,
    /// Periods to tier; empty means the latest period in the panel
    pub target_periods: Vec<i64>,
    /// Composite used for ranking
    pub rank_by: CompositeVariant,
    /// Period windows for the indicator coverage report
    pub coverage_windows: Vec<PeriodWindow>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let pillars = vec![
            PillarSpec::new("demographics", &["SP.POP.DPND", "SP.POP.1564.TO.ZS", "SP.POP.GROW"]),
            PillarSpec::new("fiscal", &["GGXWDG_NGDP", "GGXCNL_NGDP", "GC.XPN.INTP.RV.ZS"]),
            PillarSpec::new("external", &["BCA_NGDPD", "FI.RES.TOTL.MO", "DT.DOD.DECT.GN.ZS"]),
            PillarSpec::new("monetary", &["PCPIPCH", "FR.INR.RINR"]),
            PillarSpec::new("growth", &["NGDP_RPCH", "NY.GDP.PCAP.KD.ZG", "NE.GDI.TOTL.ZS"]),
            PillarSpec::new("human_capital", &["SE.TER.ENRR", "SP.DYN.LE00.IN"]),
            PillarSpec::new("commodity", &["TX.VAL.FUEL.ZS.UN", "TX.VAL.MMTL.ZS.UN", "NY.GDP.TOTL.RT.ZS"]),
        ];

        let indicators = pillars
            .iter()
            .flat_map(|p| p.indicators.iter().cloned())
            .collect();

        let bad_if_high = strings(&[
            "SP.POP.DPND",
            "GGXWDG_NGDP",
            "GC.XPN.INTP.RV.ZS",
            "DT.DOD.DECT.GN.ZS",
            "PCPIPCH",
            "TX.VAL.FUEL.ZS.UN",
            "TX.VAL.MMTL.ZS.UN",
            "NY.GDP.TOTL.RT.ZS",
        ])
        .into_iter()
        .collect();

        Self {
            entity_column: "iso3".to_string(),
            period_column: "year".to_string(),
            indicators,
            bad_if_high,
            pillars,
            tail_probability: DEFAULT_TAIL_PROBABILITY,
            tiers: TierConfig::default(),
            excluded_entities: BTreeSet::new(),
            universe: BTreeSet::new(),
            target_periods: Vec::new(),
            rank_by: CompositeVariant::default(),
            coverage_windows: vec![PeriodWindow::new(2000, 2024), PeriodWindow::new(2010, 2024)],
        }
    }
}

impl ScoringConfig {
    pub fn keys(&self) -> PanelKeys {
        PanelKeys::new(&self.entity_column, &self.period_column)
    }

    /// Pillar names in configured order
    pub fn pillar_names(&self) -> Vec<String> {
        self.pillars.iter().map(|p| p.name.clone()).collect()
    }

    /// Pillar score column names in configured order
    pub fn pillar_columns(&self) -> Vec<String> {
        self.pillars.iter().map(|p| pillar_column_name(&p.name)).collect()
    }

    /// Pillar an indicator belongs to, if any (first match).
    pub fn pillar_of(&self, indicator: &str) -> Option<&str> {
        self.pillars
            .iter()
            .find(|p| p.indicators.iter().any(|i| i == indicator))
            .map(|p| p.name.as_str())
    }

    /// Check the configuration before any data is touched.
    pub fn validate(&self) -> Result<(), ScoreError> {
        validate_tail_probability(self.tail_probability)?;

        if self.pillars.is_empty() {
            return Err(ScoreError::InvalidPillars(
                "at least one pillar is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for pillar in &self.pillars {
            if pillar.name.trim().is_empty() {
                return Err(ScoreError::InvalidPillars(
                    "pillar names must not be empty".to_string(),
                ));
            }
            if !seen.insert(pillar.name.as_str()) {
                return Err(ScoreError::InvalidPillars(format!(
                    "pillar '{}' is defined more than once",
                    pillar.name
                )));
            }
        }

        self.tiers.validate(&self.pillar_names())
    }

    /// Borrow the pieces of the config the tier classifier needs.
    pub fn tier_request<'a>(
        &'a self,
        keys: &'a PanelKeys,
        pillars: &'a [String],
    ) -> TierRequest<'a> {
        TierRequest {
            keys,
            pillars,
            excluded: &self.excluded_entities,
            variant: self.rank_by,
            config: &self.tiers,
        }
    }
}

/// Read a JSON config file.
pub fn load_config(path: &Path) -> Result<ScoringConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// `<config_dir>/strata/config.json`, if a config directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("strata").join("config.json"))
}

/// Load the explicit config file, else the default one if it exists, else
/// the built-in baseline. Returns the path actually read.
pub fn resolve_config(explicit: Option<&Path>) -> Result<(ScoringConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((load_config(path)?, Some(path.to_path_buf())));
    }
    match default_config_path() {
        Some(path) if path.exists() => Ok((load_config(&path)?, Some(path))),
        _ => Ok((ScoringConfig::default(), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ScoringConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pillars.len(), 7);
        assert_eq!(config.indicators.len(), 19);
        assert!(config
            .bad_if_high
            .iter()
            .all(|b| config.indicators.contains(b)));
        assert_eq!(config.pillar_of("PCPIPCH"), Some("monetary"));
        assert_eq!(config.pillar_of("UNKNOWN"), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "entity_column": "country",
            "pillars": [
                {"name": "demographics", "indicators": ["a"]},
                {"name": "fiscal", "indicators": ["b"]},
                {"name": "commodity", "indicators": ["c"]}
            ],
            "tiers": {"min_positive_pillars": 2},
            "rank_by": "naive"
        }"#;
        let config: ScoringConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.entity_column, "country");
        assert_eq!(config.period_column, "year");
        assert_eq!(config.tiers.breakout_q, 0.75);
        assert_eq!(config.rank_by, CompositeVariant::Naive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_pillar_rejected() {
        let mut config = ScoringConfig::default();
        config.pillars.push(PillarSpec::new("fiscal", &["x"]));
        assert!(matches!(
            config.validate(),
            Err(ScoreError::InvalidPillars(_))
        ));
    }

    #[test]
    fn test_invalid_tail_probability_rejected() {
        let config = ScoringConfig {
            tail_probability: 0.6,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ScoreError::InvalidTailProbability(0.6))
        );
    }
}
