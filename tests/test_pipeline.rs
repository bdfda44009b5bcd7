//! Integration tests for the full scoring pipeline

use std::collections::BTreeSet;

use polars::prelude::*;
use strata::pipeline::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_score_panel_adds_every_derived_column() {
    let panel = create_test_panel();
    let config = small_config();

    let scored = score_panel(&panel, &config).unwrap();

    assert_eq!(scored.frame.height(), panel.height());
    assert_has_columns(
        &scored.frame,
        &[
            "z_pop_growth",
            "z_debt",
            "z_balance",
            "z_exports",
            "pillar_demographics",
            "pillar_fiscal",
            "pillar_commodity",
            COVERAGE_COLUMN,
            NAIVE_COLUMN,
            PENALIZED_COLUMN,
            NEUTRAL_COLUMN,
            RANK_COLUMN,
            RANK_FULL_COLUMN,
        ],
    );
    assert!(scored.degenerate_indicators().is_empty());
    assert!(scored.absent_columns().is_empty());
    assert_eq!(scored.indicator_stats.len(), 4);
    assert_eq!(scored.pillar_composition.len(), 3);
    assert_eq!(scored.full_coverage_rows(3).unwrap(), 11);
}

#[test]
fn test_partial_coverage_row() {
    let panel = create_test_panel();
    let scored = score_panel(&panel, &small_config()).unwrap();

    // ZAF 2023 is the last row and has no commodity pillar
    let last = scored.frame.height() - 1;
    assert_eq!(floats(&scored.frame, "pillar_commodity")[last], None);
    assert_eq!(floats(&scored.frame, COVERAGE_COLUMN)[last], Some(2.0));
    assert!(floats(&scored.frame, RANK_COLUMN)[last].is_some());
    assert_eq!(floats(&scored.frame, RANK_FULL_COLUMN)[last], None);

    let naive = floats(&scored.frame, NAIVE_COLUMN)[last].unwrap();
    let demo = floats(&scored.frame, "pillar_demographics")[last].unwrap();
    let fiscal = floats(&scored.frame, "pillar_fiscal")[last].unwrap();
    assert!(approx_eq(naive, (demo + fiscal) / 2.0));
}

#[test]
fn test_penalized_identity_holds_for_every_row() {
    let panel = create_test_panel();
    let scored = score_panel(&panel, &small_config()).unwrap();

    let naive = floats(&scored.frame, NAIVE_COLUMN);
    let penalized = floats(&scored.frame, PENALIZED_COLUMN);
    let coverage = floats(&scored.frame, COVERAGE_COLUMN);

    for row in 0..scored.frame.height() {
        if let Some(n) = naive[row] {
            let expected = n * (coverage[row].unwrap() / 3.0);
            assert!(approx_eq(penalized[row].unwrap(), expected), "row {}", row);
        }
    }
}

#[test]
fn test_ranks_are_dense_within_period() {
    let panel = create_test_panel();
    let scored = score_panel(&panel, &small_config()).unwrap();
    let keys = PanelKeys::new("iso3", "year");
    let (_, periods) = key_vectors(&scored.frame, &keys).unwrap();
    let ranks = floats(&scored.frame, RANK_COLUMN);

    for period in [2022i64, 2023] {
        let distinct: BTreeSet<u32> = periods
            .iter()
            .zip(ranks.iter())
            .filter(|(p, _)| **p == period)
            .filter_map(|(_, r)| r.map(|r| r as u32))
            .collect();
        let expected: BTreeSet<u32> = (1..=distinct.len() as u32).collect();
        assert_eq!(distinct, expected, "ranks for {} have gaps", period);
    }
}

#[test]
fn test_scoring_is_deterministic() {
    let panel = create_test_panel();
    let config = small_config();

    let first = score_panel(&panel, &config).unwrap();
    let second = score_panel(&panel, &config).unwrap();

    assert!(first.frame.equals_missing(&second.frame));
    assert_eq!(first.indicator_stats, second.indicator_stats);
}

#[test]
fn test_random_panel_properties() {
    let indicators = ["a", "b", "c", "d"];
    let panel = create_random_panel(30, 5, &indicators);
    let config = ScoringConfig {
        indicators: indicators.iter().map(|s| s.to_string()).collect(),
        bad_if_high: BTreeSet::from(["b".to_string()]),
        pillars: vec![
            PillarSpec::new("demographics", &["a"]),
            PillarSpec::new("fiscal", &["b", "c"]),
            PillarSpec::new("commodity", &["d"]),
        ],
        tail_probability: 0.05,
        tiers: TierConfig {
            min_positive_pillars: 2,
            ..Default::default()
        },
        ..small_config()
    };

    let scored = score_panel(&panel, &config).unwrap();
    let naive = floats(&scored.frame, NAIVE_COLUMN);
    let neutral = floats(&scored.frame, NEUTRAL_COLUMN);
    let coverage = floats(&scored.frame, COVERAGE_COLUMN);

    for row in 0..scored.frame.height() {
        match naive[row] {
            Some(n) => {
                let c = coverage[row].unwrap();
                assert!(approx_eq(neutral[row].unwrap(), n * c / 3.0));
            }
            None => {
                assert_eq!(coverage[row], Some(0.0));
                assert_eq!(neutral[row], Some(0.0));
            }
        }
    }
}

#[test]
fn test_constant_indicator_does_not_break_scoring() {
    let mut panel = create_test_panel();
    panel
        .with_column(Column::new("balance".into(), vec![1.0f64; 12]))
        .unwrap();

    let scored = score_panel(&panel, &small_config()).unwrap();

    assert_eq!(scored.degenerate_indicators(), vec!["balance"]);
    assert!(floats(&scored.frame, "z_balance").iter().all(|v| v.is_none()));
    // The fiscal pillar falls back to debt alone
    assert_eq!(
        floats(&scored.frame, "pillar_fiscal"),
        floats(&scored.frame, "z_debt")
    );
}

#[test]
fn test_missing_indicator_column_fails() {
    let panel = create_test_panel().drop("exports").unwrap();
    let err = score_panel(&panel, &small_config()).unwrap_err();

    assert_eq!(
        err.downcast_ref::<ScoreError>(),
        Some(&ScoreError::MissingIndicator {
            column: "exports".to_string()
        })
    );
}

#[test]
fn test_duplicate_keys_rejected() {
    let panel = df! {
        "iso3" => ["BRA", "BRA"],
        "year" => [2022i64, 2022],
        "pop_growth" => [0.1f64, 0.2],
        "debt" => [50.0f64, 60.0],
        "balance" => [-1.0f64, -2.0],
        "exports" => [10.0f64, 11.0],
    }
    .unwrap();

    let err = score_panel(&panel, &small_config()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ScoreError>(),
        Some(&ScoreError::DuplicateKey {
            entity: "BRA".to_string(),
            period: 2022
        })
    );
}

#[test]
fn test_invalid_config_rejected_before_scoring() {
    let config = ScoringConfig {
        tail_probability: 0.0,
        ..small_config()
    };
    let err = score_panel(&create_test_panel(), &config).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ScoreError>(),
        Some(&ScoreError::InvalidTailProbability(0.0))
    );
}

#[test]
fn test_universe_restricts_rows() {
    let config = ScoringConfig {
        universe: BTreeSet::from(["BRA".to_string(), "MEX".to_string()]),
        ..small_config()
    };

    let scored = score_panel(&create_test_panel(), &config).unwrap();
    let keys = config.keys();
    let entities: BTreeSet<String> = entity_ids(&scored.frame, &keys)
        .unwrap()
        .into_iter()
        .flatten()
        .collect();

    assert_eq!(scored.frame.height(), 4);
    assert_eq!(
        entities,
        BTreeSet::from(["BRA".to_string(), "MEX".to_string()])
    );
}

#[test]
fn test_classify_latest_period() {
    let config = ScoringConfig {
        excluded_entities: BTreeSet::from(["CHN".to_string()]),
        ..small_config()
    };
    let scored = score_panel(&create_test_panel(), &config).unwrap();

    let periods = resolve_target_periods(&scored.frame, &config).unwrap();
    assert_eq!(periods, vec![2023]);

    let results = classify_periods(&scored, &config, &periods).unwrap();
    assert_eq!(results.len(), 1);

    let result = &results[0];
    let entities: BTreeSet<&str> = result.assignments.iter().map(|a| a.entity.as_str()).collect();
    // ZAF lacks full coverage, CHN is excluded
    assert_eq!(entities, BTreeSet::from(["BRA", "IND", "MEX", "TUR"]));

    let ranks: Vec<u32> = result.assignments.iter().filter_map(|a| a.rank).collect();
    assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(ranks[0], 1);
}

#[test]
fn test_configured_target_periods() {
    let config = ScoringConfig {
        target_periods: vec![2022, 2023],
        ..small_config()
    };
    let scored = score_panel(&create_test_panel(), &config).unwrap();

    let periods = resolve_target_periods(&scored.frame, &config).unwrap();
    let results = classify_periods(&scored, &config, &periods).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].assignments.len(), 6);
    assert_eq!(results[1].assignments.len(), 5);
}

#[test]
fn test_csv_round_trip_scores_identically() {
    let mut panel = create_test_panel();
    let (_temp_dir, csv_path) = create_temp_csv(&mut panel);

    let loaded = load_dataset(&csv_path, 100).unwrap();
    let config = small_config();

    let from_memory = score_panel(&panel, &config).unwrap();
    let from_disk = score_panel(&loaded, &config).unwrap();

    let a = floats(&from_memory.frame, PENALIZED_COLUMN);
    let b = floats(&from_disk.frame, PENALIZED_COLUMN);
    for (x, y) in a.iter().zip(b.iter()) {
        match (x, y) {
            (Some(x), Some(y)) => assert!(approx_eq(*x, *y)),
            (None, None) => {}
            _ => panic!("missingness differs after CSV round trip"),
        }
    }
}
