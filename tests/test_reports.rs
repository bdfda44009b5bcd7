//! Tests for output tables and the run report

use std::path::Path;

use polars::prelude::*;
use strata::pipeline::*;
use strata::report::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn scored_fixture() -> (ScoredPanel, ScoringConfig) {
    let config = small_config();
    let scored = score_panel(&create_test_panel(), &config).unwrap();
    (scored, config)
}

#[test]
fn test_ranking_table_shape_and_order() {
    let (scored, config) = scored_fixture();
    let table = ranking_table(&scored.frame, &config).unwrap();

    assert_eq!(table.height(), 12);
    let names: Vec<String> = table
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "iso3",
            "year",
            COVERAGE_COLUMN,
            NAIVE_COLUMN,
            PENALIZED_COLUMN,
            NEUTRAL_COLUMN,
            "pillar_demographics",
            "pillar_fiscal",
            "pillar_commodity",
            RANK_COLUMN,
            RANK_FULL_COLUMN,
        ]
    );

    // Period ascending, then rank ascending within each period
    let keys = config.keys();
    let (_, periods) = key_vectors(&table, &keys).unwrap();
    let ranks = floats(&table, RANK_COLUMN);
    for i in 1..table.height() {
        assert!(periods[i - 1] <= periods[i]);
        if periods[i - 1] == periods[i] {
            assert!(ranks[i - 1].unwrap() <= ranks[i].unwrap());
        }
    }
    assert_eq!(ranks[0], Some(1.0));
    assert_eq!(ranks[6], Some(1.0));
}

#[test]
fn test_tier_table_columns() {
    let (scored, config) = scored_fixture();
    let results = classify_periods(&scored, &config, &[2023]).unwrap();
    let table = tier_table(&results[0], &config).unwrap();

    assert_eq!(table.height(), 5);
    assert_has_columns(
        &table,
        &[
            "iso3",
            "year",
            "rank",
            "composite",
            "tier",
            "positive_pillars",
            "pillar_demographics",
            "pillar_fiscal",
            "pillar_commodity",
        ],
    );

    let labels: Vec<String> = table
        .column("tier")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .flatten()
        .map(String::from)
        .collect();
    let valid: Vec<&str> = Tier::ALL.iter().map(|t| t.label()).collect();
    assert!(labels.iter().all(|l| valid.contains(&l.as_str())));
}

#[test]
fn test_missing_pillars_only_lists_partial_rows() {
    let (scored, config) = scored_fixture();

    let all = missing_pillars(&scored.frame, &config, &[]).unwrap();
    assert_eq!(
        all,
        vec![MissingPillar {
            entity: "ZAF".to_string(),
            period: 2023,
            pillar: "commodity".to_string(),
        }]
    );

    let earlier = missing_pillars(&scored.frame, &config, &[2022]).unwrap();
    assert!(earlier.is_empty());

    let table = missing_pillar_table(&all, &config).unwrap();
    assert_eq!(table.shape(), (1, 3));
}

#[test]
fn test_report_round_trip_through_json() {
    let (scored, config) = scored_fixture();
    let results = classify_periods(&scored, &config, &[2023]).unwrap();

    let mut builder = ScoreReportBuilder::new(Path::new("panel.csv"), None, &config);
    builder.set_scoring(&scored, scored.full_coverage_rows(3).unwrap());
    builder.add_tier_result(&results[0]);
    let report = builder.build();

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("report.json");
    export_score_report(&report, &path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["rows"], 12);
    assert_eq!(json["full_coverage_rows"], 11);
    assert_eq!(json["indicators"].as_array().unwrap().len(), 4);
    assert_eq!(json["pillars"].as_array().unwrap().len(), 3);
    assert_eq!(json["tiers"][0]["period"], 2023);
    assert_eq!(json["tiers"][0]["eligible"], 5);
    assert_eq!(json["metadata"]["config"]["entity_column"], "iso3");
}

#[test]
fn test_save_tables_as_parquet() {
    let (scored, config) = scored_fixture();
    let mut table = ranking_table(&scored.frame, &config).unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("ranking.parquet");
    save_dataset(&mut table, &path).unwrap();

    let loaded = load_dataset(&path, 0).unwrap();
    assert!(loaded.equals_missing(&table));
}
