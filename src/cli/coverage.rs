//! `coverage` subcommand: per-indicator data coverage of a panel

use std::path::{Path, PathBuf};

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{
    coverage_frame, indicator_coverage, load_dataset, resolve_config, save_dataset,
    IndicatorCoverage,
};
use crate::utils::{create_spinner, finish_with_success};

/// Default output path: `<input stem>_coverage.csv` next to the input.
pub fn coverage_output_path(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("panel");
    parent.join(format!("{}_coverage.csv", stem))
}

/// Compute the coverage report, print it and write it to disk.
pub fn run_coverage(
    input: &Path,
    config_path: Option<&Path>,
    output: Option<&Path>,
    infer_schema_length: usize,
) -> Result<()> {
    let (config, _) = resolve_config(config_path)?;
    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| coverage_output_path(input));

    println!(
        "\n {} Indicator coverage",
        style("◆").cyan().bold()
    );
    println!("   Input:  {}", style(input.display()).dim());
    println!("   Output: {}", style(output_path.display()).dim());
    println!();

    let spinner = create_spinner("Loading panel...");
    let df = load_dataset(input, infer_schema_length)?;
    let report = indicator_coverage(&df, &config)?;
    finish_with_success(
        &spinner,
        &format!("Coverage computed for {} indicators", report.len()),
    );

    display_coverage(&report);

    let mut frame = coverage_frame(&report)?;
    save_dataset(&mut frame, &output_path)?;
    println!(
        "\n   {} Saved to {}",
        style("✓").green(),
        style(output_path.display()).dim()
    );

    Ok(())
}

fn display_coverage(report: &[IndicatorCoverage]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);

    let mut header = vec![
        Cell::new("Pillar").add_attribute(Attribute::Bold),
        Cell::new("Indicator").add_attribute(Attribute::Bold),
        Cell::new("Non-missing").add_attribute(Attribute::Bold),
        Cell::new("Coverage").add_attribute(Attribute::Bold),
    ];
    if let Some(first) = report.first() {
        header.extend(
            first
                .windows
                .iter()
                .map(|w| Cell::new(&w.window).add_attribute(Attribute::Bold)),
        );
    }
    table.set_header(header);

    for row in report {
        let name = if row.present_in_panel {
            Cell::new(&row.indicator)
        } else {
            Cell::new(format!("{} (absent)", row.indicator)).fg(Color::Red)
        };
        let mut cells = vec![
            Cell::new(&row.pillar),
            name,
            Cell::new(row.non_missing).set_alignment(CellAlignment::Right),
            pct_cell(row.coverage_pct),
        ];
        cells.extend(row.windows.iter().map(|w| pct_cell(w.coverage_pct)));
        table.add_row(cells);
    }

    for line in table.to_string().lines() {
        println!("   {}", line);
    }
}

fn pct_cell(pct: f64) -> Cell {
    let color = if pct >= 80.0 {
        Color::Green
    } else if pct >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    };
    Cell::new(format!("{:.1}%", pct))
        .fg(color)
        .set_alignment(CellAlignment::Right)
}
