//! Terminal styling for the scoring run

use std::path::Path;
use std::time::Duration;

use console::{style, Emoji};

use crate::pipeline::ScoringConfig;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("🔧 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
    ███████╗████████╗██████╗  █████╗ ████████╗ █████╗
    ██╔════╝╚══██╔══╝██╔══██╗██╔══██╗╚══██╔══╝██╔══██╗
    ███████╗   ██║   ██████╔╝███████║   ██║   ███████║
    ╚════██║   ██║   ██╔══██╗██╔══██║   ██║   ██╔══██║
    ███████║   ██║   ██║  ██║██║  ██║   ██║   ██║  ██║
    ╚══════╝   ╚═╝   ╚═╝  ╚═╝╚═╝  ╚═╝   ╚═╝   ╚═╝  ╚═╝
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {} {}",
        style("▲").magenta().bold(),
        style("Structural strength scoring for country panels").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print configuration card
pub fn print_config(
    input: &Path,
    output_dir: &Path,
    config_file: Option<&Path>,
    config: &ScoringConfig,
) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);
    let config_label = config_file
        .map(|p| truncate_path(p, 38))
        .unwrap_or_else(|| "built-in defaults".to_string());
    let periods = if config.target_periods.is_empty() {
        "latest".to_string()
    } else {
        config
            .target_periods
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",")
    };

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!("    │  {} Input:  {:<39}│", FOLDER, truncate_path(input, 38));
    println!("    │  {} Output: {:<39}│", SAVE, truncate_path(output_dir, 38));
    println!("    │  {} Config: {:<39}│", GEAR, truncate_string(&config_label, 38));
    println!("    ├{}┤", line);
    println!(
        "    │  {} Pillars / indicators: {:<25}│",
        CHART,
        style(format!("{} / {}", config.pillars.len(), config.indicators.len())).yellow()
    );
    println!(
        "    │  {} Tail probability:     {:<25}│",
        CHART,
        style(format!("{:.3}", config.tail_probability)).yellow()
    );
    println!(
        "    │  {} Rank by:              {:<25}│",
        TARGET,
        style(config.rank_by.to_string()).yellow()
    );
    println!(
        "    │  {} Tier periods:         {:<25}│",
        TARGET,
        style(truncate_string(&periods, 24)).yellow()
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print a warning to stderr
pub fn print_warning(message: &str) {
    eprintln!("    {} {}", WARN, style(message).yellow());
}

/// Print the elapsed time of a step
pub fn print_step_time(elapsed: Duration) {
    println!(
        "    {}",
        style(format!("⏱  {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!("    {} {}", ROCKET, style("Scoring complete!").green().bold());
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    if let Some(info) = detail {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!("      Found {} {}", style(count).yellow().bold(), description);
    }
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}
