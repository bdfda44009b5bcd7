//! Strata: structural strength scoring CLI
//!
//! Loads an entity-period panel, scores it and writes the ranking, tier and
//! missing-pillar tables alongside a JSON run report.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use console::style;

use strata::cli::{confirm_overwrite, coverage::run_coverage, Cli, Commands};
use strata::pipeline::{
    classify_tiers, distinct_periods, entity_ids, load_dataset_with_progress, resolve_config,
    resolve_target_periods, save_dataset, score_panel, ScoreError, TierResult,
};
use strata::report::{
    display_tier_table, export_score_report, missing_pillar_table, missing_pillars,
    package_reports, ranking_table, tier_table, ScoreReportBuilder, ScoringSummary,
};
use strata::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_count, print_info, print_step_header, print_step_time, print_success, print_warning,
};

/// Rows shown per tier table on the console
const TIER_DISPLAY_LIMIT: usize = 25;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle subcommands
    if let Some(command) = &cli.command {
        return match command {
            Commands::Coverage {
                input,
                config,
                output,
                infer_schema_length,
            } => run_coverage(
                input,
                config.as_deref(),
                output.as_deref(),
                *infer_schema_length,
            ),
        };
    }

    let input = cli.input().cloned().ok_or_else(|| {
        anyhow::anyhow!("Input file is required. Use -i/--input to specify a file.")
    })?;
    let output_dir = cli.output_dir().unwrap_or_else(|| PathBuf::from("."));

    let (mut config, config_file) = resolve_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut config)?;
    config.validate()?;
    let keys = config.keys();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&input, &output_dir, config_file.as_deref(), &config);

    let mut report = ScoreReportBuilder::new(&input, config_file.as_deref(), &config);

    // Step 1: Load panel
    print_step_header(1, "Load Panel");

    let step_start = Instant::now();
    let (df, rows, cols, memory_mb) = load_dataset_with_progress(&input, cli.infer_schema_length)?;

    println!("\n    {} Panel Statistics:", style("✧").cyan());
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);
    println!("      Estimated memory: {:.2} MB", memory_mb);

    let load_elapsed = step_start.elapsed();
    print_step_time(load_elapsed);

    // Step 2: Normalize, aggregate, composite, rank
    print_step_header(2, "Score Panel");

    let step_start = Instant::now();
    let spinner = create_spinner("Normalizing indicators and scoring pillars...");
    let scored = score_panel(&df, &config)?;
    finish_with_success(&spinner, "Panel scored");

    let degenerate: Vec<String> = scored
        .degenerate_indicators()
        .into_iter()
        .map(String::from)
        .collect();
    if !degenerate.is_empty() {
        print_warning(&format!(
            "{} indicator(s) have no variance, their z-columns are missing: {}",
            degenerate.len(),
            degenerate.join(", ")
        ));
    }

    let absent: Vec<String> = scored
        .absent_columns()
        .into_iter()
        .map(|(pillar, column)| format!("{}:{}", pillar, column))
        .collect();
    if !absent.is_empty() {
        print_count(
            "pillar component(s) missing from the panel",
            absent.len(),
            Some("(ignored)"),
        );
    }

    let total_pillars = config.pillars.len();
    let full_coverage = scored.full_coverage_rows(total_pillars)?;
    let entity_count = entity_ids(&scored.frame, &keys)?
        .into_iter()
        .flatten()
        .collect::<BTreeSet<_>>()
        .len();
    let period_count = distinct_periods(&scored.frame, &keys)?.len();

    let mut summary = ScoringSummary::new(
        scored.frame.height(),
        entity_count,
        period_count,
        config.indicators.len(),
    );
    summary.set_load_time(load_elapsed);
    summary.full_coverage_rows = full_coverage;
    summary.degenerate_indicators = degenerate;
    summary.absent_columns = absent;
    report.set_scoring(&scored, full_coverage);

    print_info(&format!(
        "{} of {} rows have all {} pillars",
        full_coverage,
        scored.frame.height(),
        total_pillars
    ));
    let scoring_elapsed = step_start.elapsed();
    summary.set_scoring_time(scoring_elapsed);
    print_step_time(scoring_elapsed);

    // Step 3: Tier classification
    print_step_header(3, "Tier Classification");

    let step_start = Instant::now();
    let periods = resolve_target_periods(&scored.frame, &config)?;
    let pillar_names = config.pillar_names();
    let request = config.tier_request(&keys, &pillar_names);

    let mut tier_results: Vec<TierResult> = Vec::new();
    for &period in &periods {
        match classify_tiers(&scored.frame, &request, period) {
            Ok(result) => {
                display_tier_table(&result, TIER_DISPLAY_LIMIT);
                summary.add_tier_result(&result);
                report.add_tier_result(&result);
                tier_results.push(result);
            }
            Err(err) => match err.downcast_ref::<ScoreError>() {
                Some(ScoreError::EmptyCrossSection { .. }) => {
                    print_warning(&err.to_string());
                }
                _ => return Err(err),
            },
        }
    }
    if tier_results.is_empty() {
        print_info("No period could be tiered");
    } else {
        print_success(&format!("Tiered {} period(s)", tier_results.len()));
    }
    let tiers_elapsed = step_start.elapsed();
    summary.set_tiers_time(tiers_elapsed);
    print_step_time(tiers_elapsed);

    // Step 4: Missing-pillar diagnostic
    print_step_header(4, "Missing Pillars");

    let missing = missing_pillars(&scored.frame, &config, &periods)?;
    if missing.is_empty() {
        print_info("Every entity in the tiered periods has all pillars");
    } else {
        let affected = missing
            .iter()
            .map(|m| (&m.entity, m.period))
            .collect::<BTreeSet<_>>()
            .len();
        print_count(
            "missing pillar score(s)",
            missing.len(),
            Some(&format!("across {} entity-period(s)", affected)),
        );
    }

    // Step 5: Save outputs
    print_step_header(5, "Save Results");

    let step_start = Instant::now();
    std::fs::create_dir_all(&output_dir)?;
    let stem = cli.output_stem();
    let ext = cli.format.extension();

    let ranking_path = output_dir.join(format!("{}_ranking.{}", stem, ext));
    let missing_path = output_dir.join(format!("{}_missing_pillars.{}", stem, ext));
    let report_path = output_dir.join(format!("{}_report.json", stem));
    let tier_paths: Vec<PathBuf> = tier_results
        .iter()
        .map(|r| output_dir.join(format!("{}_tiers_{}.{}", stem, r.period, ext)))
        .collect();

    let mut outputs: Vec<&Path> = vec![ranking_path.as_path(), missing_path.as_path()];
    outputs.extend(tier_paths.iter().map(PathBuf::as_path));
    outputs.push(report_path.as_path());

    if !cli.no_confirm && !confirm_overwrite(&outputs)? {
        println!("Cancelled by user.");
        return Ok(());
    }

    let spinner = create_spinner("Writing output files...");
    let mut ranking = ranking_table(&scored.frame, &config)?;
    save_dataset(&mut ranking, &ranking_path)?;

    for (result, path) in tier_results.iter().zip(tier_paths.iter()) {
        let mut table = tier_table(result, &config)?;
        save_dataset(&mut table, path)?;
    }

    let mut missing_table = missing_pillar_table(&missing, &config)?;
    save_dataset(&mut missing_table, &missing_path)?;

    summary.set_save_time(step_start.elapsed());
    report.set_timing(&summary);
    export_score_report(&report.build(), &report_path)?;
    finish_with_success(&spinner, &format!("Saved to {}", output_dir.display()));

    if cli.bundle {
        let zip_path = output_dir.join(format!("{}_strata.zip", stem));
        package_reports(&outputs, &zip_path)?;
        print_success(&format!("Bundled outputs into {}", zip_path.display()));
    }

    let save_elapsed = step_start.elapsed();
    summary.set_save_time(save_elapsed);
    print_step_time(save_elapsed);

    summary.display();

    print_completion();

    Ok(())
}
