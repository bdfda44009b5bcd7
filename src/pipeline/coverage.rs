//! Indicator coverage over the entity-period grid
//!
//! Coverage is the share of non-missing values among the (entity, period)
//! rows of the panel, overall and within fixed period windows.

use std::cmp::Ordering;
use std::collections::HashSet;

use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::ScoringConfig;
use super::panel::key_vectors;
use super::stats::numeric_values;

/// Inclusive period range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    pub start: i64,
    pub end: i64,
}

impl PeriodWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, period: i64) -> bool {
        period >= self.start && period <= self.end
    }

    pub fn label(&self) -> String {
        format!("{}_{}", self.start, self.end)
    }
}

/// Coverage within one window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowCoverage {
    pub window: String,
    pub grid_n: usize,
    pub coverage_pct: f64,
}

/// Coverage of one indicator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorCoverage {
    pub pillar: String,
    pub indicator: String,
    pub present_in_panel: bool,
    pub non_missing: usize,
    pub grid_n: usize,
    pub coverage_pct: f64,
    pub windows: Vec<WindowCoverage>,
}

fn pct(count: usize, grid: usize) -> f64 {
    if grid == 0 {
        0.0
    } else {
        count as f64 / grid as f64 * 100.0
    }
}

/// Coverage of every configured indicator.
///
/// Indicators missing from the panel report zero coverage. Sorted by pillar,
/// then by coverage in the last window (descending), then overall coverage.
pub fn indicator_coverage(df: &DataFrame, config: &ScoringConfig) -> Result<Vec<IndicatorCoverage>> {
    let (_, periods) = key_vectors(df, &config.keys())?;
    let grid_n = periods.len();

    let window_grids: Vec<usize> = config
        .coverage_windows
        .iter()
        .map(|w| periods.iter().filter(|&&p| w.contains(p)).count())
        .collect();

    let present: HashSet<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut report = Vec::with_capacity(config.indicators.len());
    for indicator in &config.indicators {
        let values = if present.contains(indicator) {
            Some(numeric_values(df, indicator)?)
        } else {
            None
        };

        let count_where = |keep: &dyn Fn(i64) -> bool| -> usize {
            values.as_ref().map_or(0, |vals| {
                vals.iter()
                    .zip(periods.iter())
                    .filter(|(v, p)| v.is_some() && keep(**p))
                    .count()
            })
        };

        let non_missing = count_where(&|_| true);
        let windows = config
            .coverage_windows
            .iter()
            .zip(window_grids.iter())
            .map(|(w, &grid)| WindowCoverage {
                window: w.label(),
                grid_n: grid,
                coverage_pct: pct(count_where(&|p| w.contains(p)), grid),
            })
            .collect();

        report.push(IndicatorCoverage {
            pillar: config.pillar_of(indicator).unwrap_or("unassigned").to_string(),
            indicator: indicator.clone(),
            present_in_panel: values.is_some(),
            non_missing,
            grid_n,
            coverage_pct: pct(non_missing, grid_n),
            windows,
        });
    }

    report.sort_by(|a, b| {
        let recent = |c: &IndicatorCoverage| c.windows.last().map_or(0.0, |w| w.coverage_pct);
        a.pillar
            .cmp(&b.pillar)
            .then_with(|| recent(b).partial_cmp(&recent(a)).unwrap_or(Ordering::Equal))
            .then_with(|| {
                b.coverage_pct
                    .partial_cmp(&a.coverage_pct)
                    .unwrap_or(Ordering::Equal)
            })
    });

    Ok(report)
}

/// Coverage report as a table, one `coverage_<window>_pct` column per window.
pub fn coverage_frame(report: &[IndicatorCoverage]) -> Result<DataFrame> {
    let mut columns = vec![
        Column::new(
            "pillar".into(),
            report.iter().map(|c| c.pillar.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "indicator".into(),
            report.iter().map(|c| c.indicator.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "non_missing".into(),
            report.iter().map(|c| c.non_missing as u64).collect::<Vec<_>>(),
        ),
        Column::new(
            "grid_n".into(),
            report.iter().map(|c| c.grid_n as u64).collect::<Vec<_>>(),
        ),
        Column::new(
            "coverage_pct".into(),
            report.iter().map(|c| c.coverage_pct).collect::<Vec<_>>(),
        ),
    ];

    if let Some(first) = report.first() {
        for (i, window) in first.windows.iter().enumerate() {
            columns.push(Column::new(
                format!("coverage_{}_pct", window.window).into(),
                report
                    .iter()
                    .map(|c| c.windows[i].coverage_pct)
                    .collect::<Vec<_>>(),
            ));
        }
    }

    Ok(DataFrame::new(columns)?)
}
