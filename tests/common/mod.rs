//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::PathBuf;

use polars::prelude::*;
use strata::pipeline::{PillarSpec, ScoringConfig, TierConfig};
use tempfile::TempDir;

/// Three-pillar config over the fixture panel:
/// - `demographics`: pop_growth
/// - `fiscal`: debt (bad if high), balance
/// - `commodity`: exports
pub fn small_config() -> ScoringConfig {
    ScoringConfig {
        entity_column: "iso3".to_string(),
        period_column: "year".to_string(),
        indicators: ["pop_growth", "debt", "balance", "exports"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        bad_if_high: BTreeSet::from(["debt".to_string()]),
        pillars: vec![
            PillarSpec::new("demographics", &["pop_growth"]),
            PillarSpec::new("fiscal", &["debt", "balance"]),
            PillarSpec::new("commodity", &["exports"]),
        ],
        tiers: TierConfig {
            min_positive_pillars: 2,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Six entities over 2022-2023 with known gaps:
/// - `ZAF` 2023 has no `exports`, so its commodity pillar is missing
/// - `CHN` has falling population in both years
pub fn create_test_panel() -> DataFrame {
    df! {
        "iso3" => ["BRA", "BRA", "CHN", "CHN", "IND", "IND", "MEX", "MEX", "TUR", "TUR", "ZAF", "ZAF"],
        "year" => [2022i64, 2023, 2022, 2023, 2022, 2023, 2022, 2023, 2022, 2023, 2022, 2023],
        "pop_growth" => [0.5f64, 0.6, -0.1, -0.2, 1.0, 1.1, 0.8, 0.7, 0.9, 0.8, 1.2, 1.3],
        "debt" => [80.0f64, 85.0, 70.0, 75.0, 85.0, 82.0, 55.0, 53.0, 35.0, 33.0, 70.0, 72.0],
        "balance" => [-5.0f64, -6.0, -7.0, -6.0, -9.0, -8.0, -3.0, -2.0, -2.0, -3.0, -4.0, -5.0],
        "exports" => [Some(20.0f64), Some(22.0), Some(25.0), Some(24.0), Some(15.0), Some(16.0), Some(35.0), Some(34.0), Some(30.0), Some(31.0), Some(28.0), None],
    }
    .unwrap()
}

/// Scored cross-section for tier tests: four fully covered entities in 2023
/// with penalized composites [5, 3, 1, -2], one partially covered entity,
/// and one row from another period.
pub fn create_tier_frame() -> DataFrame {
    df! {
        "iso3" => ["AAA", "BBB", "CCC", "DDD", "EEE", "AAA"],
        "year" => [2023i64, 2023, 2023, 2023, 2023, 2022],
        "pillar_demographics" => [Some(1.0f64), Some(0.5), Some(0.1), Some(-1.0), Some(2.0), Some(0.3)],
        "pillar_fiscal" => [Some(1.0f64), Some(0.5), Some(-0.1), Some(-1.0), None, Some(0.3)],
        "pillar_commodity" => [Some(-3.0f64), Some(0.2), Some(1.0), Some(2.0), Some(1.0), Some(0.3)],
        "pillars_available" => [3u32, 3, 3, 3, 2, 3],
        "composite_penalized" => [Some(5.0f64), Some(3.0), Some(1.0), Some(-2.0), Some(9.0), Some(0.3)],
    }
    .unwrap()
}

/// Random panel for property-style tests
pub fn create_random_panel(entities: usize, periods: usize, indicators: &[&str]) -> DataFrame {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    let rows = entities * periods;
    let mut columns: Vec<Column> = Vec::with_capacity(indicators.len() + 2);

    let ids: Vec<String> = (0..rows).map(|r| format!("E{:03}", r / periods)).collect();
    let years: Vec<i64> = (0..rows).map(|r| 2000 + (r % periods) as i64).collect();
    columns.push(Column::new("iso3".into(), ids));
    columns.push(Column::new("year".into(), years));

    for name in indicators {
        let values: Vec<Option<f64>> = (0..rows)
            .map(|_| {
                if rng.gen_bool(0.1) {
                    None
                } else {
                    Some(rng.gen_range(-50.0..50.0))
                }
            })
            .collect();
        columns.push(Column::new((*name).into(), values));
    }

    DataFrame::new(columns).unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("panel.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("panel.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Float column as options
pub fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

/// Assert that a DataFrame has the expected columns
pub fn assert_has_columns(df: &DataFrame, expected: &[&str]) {
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    for col in expected {
        assert!(
            columns.contains(&col.to_string()),
            "Expected column '{}' not found. Available: {:?}",
            col,
            columns
        );
    }
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
