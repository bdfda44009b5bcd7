//! Console summaries: run overview and tier tables

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{Tier, TierResult};

/// Summary of a scoring run
#[derive(Debug, Default)]
pub struct ScoringSummary {
    pub rows: usize,
    pub entities: usize,
    pub periods: usize,
    pub indicators: usize,
    pub degenerate_indicators: Vec<String>,
    pub absent_columns: Vec<String>,
    pub full_coverage_rows: usize,
    pub tier_counts: Vec<(i64, [usize; 4])>,
    pub load_time: Duration,
    pub scoring_time: Duration,
    pub tiers_time: Duration,
    pub save_time: Duration,
}

impl ScoringSummary {
    pub fn new(rows: usize, entities: usize, periods: usize, indicators: usize) -> Self {
        Self {
            rows,
            entities,
            periods,
            indicators,
            ..Default::default()
        }
    }

    pub fn set_load_time(&mut self, duration: Duration) {
        self.load_time = duration;
    }

    pub fn set_scoring_time(&mut self, duration: Duration) {
        self.scoring_time = duration;
    }

    pub fn set_tiers_time(&mut self, duration: Duration) {
        self.tiers_time = duration;
    }

    pub fn set_save_time(&mut self, duration: Duration) {
        self.save_time = duration;
    }

    pub fn total_time(&self) -> Duration {
        self.load_time + self.scoring_time + self.tiers_time + self.save_time
    }

    pub fn add_tier_result(&mut self, result: &TierResult) {
        let mut counts = [0usize; 4];
        for (slot, tier) in counts.iter_mut().zip(Tier::ALL.iter()) {
            *slot = result.count(*tier);
        }
        self.tier_counts.push((result.period, counts));
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("SCORING SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("🗂️  Panel Rows"), Cell::new(self.rows)]);
        table.add_row(vec![Cell::new("🌍 Entities"), Cell::new(self.entities)]);
        table.add_row(vec![Cell::new("📅 Periods"), Cell::new(self.periods)]);
        table.add_row(vec![Cell::new("📈 Indicators"), Cell::new(self.indicators)]);

        table.add_row(vec![
            Cell::new("⚠️  Degenerate Indicators"),
            Cell::new(self.degenerate_indicators.len()).fg(
                if self.degenerate_indicators.is_empty() {
                    Color::White
                } else {
                    Color::Yellow
                },
            ),
        ]);

        let coverage_pct = if self.rows > 0 {
            self.full_coverage_rows as f64 / self.rows as f64 * 100.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new("✅ Full Pillar Coverage"),
            Cell::new(format!("{} ({:.1}%)", self.full_coverage_rows, coverage_pct))
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);

        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        if !self.tier_counts.is_empty() {
            println!();
            let mut tiers = Table::new();
            tiers.load_preset(UTF8_FULL_CONDENSED);
            let mut header = vec![Cell::new("Period").add_attribute(Attribute::Bold)];
            header.extend(
                Tier::ALL
                    .iter()
                    .map(|t| Cell::new(t.display_name()).add_attribute(Attribute::Bold)),
            );
            tiers.set_header(header);

            for (period, counts) in &self.tier_counts {
                let mut row = vec![Cell::new(period)];
                row.extend(
                    counts
                        .iter()
                        .zip(Tier::ALL.iter())
                        .map(|(n, t)| Cell::new(n).fg(tier_color(*t))),
                );
                tiers.add_row(row);
            }

            for line in tiers.to_string().lines() {
                println!("    {}", line);
            }
        }

        if !self.degenerate_indicators.is_empty() || !self.absent_columns.is_empty() {
            println!();
            println!(
                "    {} {}",
                style("📝").cyan(),
                style("DATA NOTES").white().bold()
            );
            println!("    {}", style("─".repeat(50)).dim());

            if !self.degenerate_indicators.is_empty() {
                println!();
                println!(
                    "      {} {}:",
                    style("No variance (z-column missing)").yellow(),
                    style(format!("({})", self.degenerate_indicators.len())).dim()
                );
                for indicator in &self.degenerate_indicators {
                    println!("        {} {}", style("•").dim(), indicator);
                }
            }

            if !self.absent_columns.is_empty() {
                println!();
                println!(
                    "      {} {}:",
                    style("Pillar components not in panel").yellow(),
                    style(format!("({})", self.absent_columns.len())).dim()
                );
                for column in &self.absent_columns {
                    println!("        {} {}", style("•").dim(), column);
                }
            }
        }
    }
}

fn tier_color(tier: Tier) -> Color {
    match tier {
        Tier::HighRisk => Color::Red,
        Tier::Leader => Color::Green,
        Tier::ResourceExposed => Color::Yellow,
        Tier::Mixed => Color::White,
    }
}

fn format_score(value: Option<f64>) -> String {
    value.map_or_else(|| "—".to_string(), |v| format!("{:+.3}", v))
}

/// Render a period's tier table, top `limit` rows.
pub fn display_tier_table(result: &TierResult, limit: usize) {
    println!();
    println!(
        "    {} {}",
        style("🏷️").cyan(),
        style(format!("TIERS {}", result.period)).white().bold()
    );
    println!(
        "      {} upper {}  lower {}  commodity {}",
        style("Thresholds:").dim(),
        format_score(result.thresholds.composite_upper),
        format_score(result.thresholds.composite_lower),
        format_score(result.thresholds.commodity_lower),
    );
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    let mut header = vec![
        Cell::new("Rank").add_attribute(Attribute::Bold),
        Cell::new("Entity").add_attribute(Attribute::Bold),
        Cell::new("Composite").add_attribute(Attribute::Bold),
        Cell::new("Tier").add_attribute(Attribute::Bold),
        Cell::new("+Pillars").add_attribute(Attribute::Bold),
    ];
    header.extend(
        result
            .pillars
            .iter()
            .map(|p| Cell::new(p).add_attribute(Attribute::Bold)),
    );
    table.set_header(header);

    for assignment in result.assignments.iter().take(limit) {
        let mut row = vec![
            Cell::new(assignment.rank.map_or_else(|| "—".to_string(), |r| r.to_string()))
                .set_alignment(CellAlignment::Right),
            Cell::new(&assignment.entity),
            Cell::new(format_score(assignment.composite)).set_alignment(CellAlignment::Right),
            Cell::new(assignment.tier.display_name()).fg(tier_color(assignment.tier)),
            Cell::new(assignment.positive_pillars).set_alignment(CellAlignment::Right),
        ];
        row.extend(
            assignment
                .pillar_scores
                .iter()
                .map(|s| Cell::new(format_score(*s)).set_alignment(CellAlignment::Right)),
        );
        table.add_row(row);
    }

    for line in table.to_string().lines() {
        println!("    {}", line);
    }

    if result.assignments.len() > limit {
        println!(
            "      {}",
            style(format!("… {} more", result.assignments.len() - limit)).dim()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_time_sums_steps() {
        let mut summary = ScoringSummary::new(10, 5, 2, 3);
        summary.set_load_time(Duration::from_millis(5));
        summary.set_scoring_time(Duration::from_millis(10));
        summary.set_tiers_time(Duration::from_millis(1));
        summary.set_save_time(Duration::from_millis(4));
        assert_eq!(summary.total_time(), Duration::from_millis(20));
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(Some(0.5)), "+0.500");
        assert_eq!(format_score(Some(-1.25)), "-1.250");
        assert_eq!(format_score(None), "—");
    }
}
