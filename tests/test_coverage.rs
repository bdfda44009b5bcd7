//! Tests for the indicator coverage report

use strata::pipeline::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn coverage_config() -> ScoringConfig {
    let mut config = small_config();
    config.indicators.push("reserves".to_string());
    config.coverage_windows = vec![PeriodWindow::new(2022, 2022), PeriodWindow::new(2023, 2023)];
    config
}

#[test]
fn test_indicator_coverage_counts() {
    let report = indicator_coverage(&create_test_panel(), &coverage_config()).unwrap();
    assert_eq!(report.len(), 5);

    let exports = report.iter().find(|c| c.indicator == "exports").unwrap();
    assert_eq!(exports.pillar, "commodity");
    assert!(exports.present_in_panel);
    assert_eq!(exports.non_missing, 11);
    assert_eq!(exports.grid_n, 12);
    assert!(approx_eq(exports.coverage_pct, 11.0 / 12.0 * 100.0));
    assert_eq!(exports.windows[0].coverage_pct, 100.0);
    assert!(approx_eq(exports.windows[1].coverage_pct, 5.0 / 6.0 * 100.0));
    assert_eq!(exports.windows[1].window, "2023_2023");
}

#[test]
fn test_absent_indicator_reports_zero() {
    let report = indicator_coverage(&create_test_panel(), &coverage_config()).unwrap();

    let reserves = report.iter().find(|c| c.indicator == "reserves").unwrap();
    assert!(!reserves.present_in_panel);
    assert_eq!(reserves.pillar, "unassigned");
    assert_eq!(reserves.non_missing, 0);
    assert_eq!(reserves.coverage_pct, 0.0);
}

#[test]
fn test_coverage_sorted_by_pillar() {
    let report = indicator_coverage(&create_test_panel(), &coverage_config()).unwrap();
    let order: Vec<(&str, &str)> = report
        .iter()
        .map(|c| (c.pillar.as_str(), c.indicator.as_str()))
        .collect();

    assert_eq!(
        order,
        vec![
            ("commodity", "exports"),
            ("demographics", "pop_growth"),
            ("fiscal", "debt"),
            ("fiscal", "balance"),
            ("unassigned", "reserves"),
        ]
    );
}

#[test]
fn test_coverage_frame_has_window_columns() {
    let report = indicator_coverage(&create_test_panel(), &coverage_config()).unwrap();
    let frame = coverage_frame(&report).unwrap();

    assert_eq!(frame.height(), 5);
    assert_has_columns(
        &frame,
        &[
            "pillar",
            "indicator",
            "non_missing",
            "grid_n",
            "coverage_pct",
            "coverage_2022_2022_pct",
            "coverage_2023_2023_pct",
        ],
    );
}
