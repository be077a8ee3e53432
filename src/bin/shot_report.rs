use std::io;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use shot_leadup::charts::outcome_summaries;
use shot_leadup::config::AnalysisConfig;
use shot_leadup::involvement::player_involvement;
use shot_leadup::pipeline;

const TOP_PATTERNS: usize = 15;
const TOP_PLAYERS: usize = 10;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cfg = AnalysisConfig::from_env();
    let report = pipeline::run(&cfg)?;

    println!("Team: {}", report.team);
    println!(
        "Matches: {} | Events: {} | Event types: {} | Shots: {} | Leading rows: {}",
        report.matches(),
        report.events.len(),
        report.type_table.len(),
        report.shots(),
        report.leading.len()
    );
    println!(
        "Window: {} (cross-match: {})",
        cfg.window.size, cfg.window.allow_cross_match_window
    );
    println!(
        "Common event (rank {}): {}",
        report.pattern_rank, report.common_event
    );

    println!();
    println!("xG by outcome:");
    for summary in outcome_summaries(&report.events) {
        println!(
            "  {:<14} n={:<4} median={:.3} q1={:.3} q3={:.3}",
            summary.outcome, summary.count, summary.median, summary.q1, summary.q3
        );
    }

    println!();
    println!("Top patterns:");
    for (rank, pattern) in report.patterns.iter().take(TOP_PATTERNS).enumerate() {
        println!("  {rank:>2}. support={:<4} {}", pattern.support, pattern.sequence.join(" -> "));
    }

    println!();
    println!("Most involved players:");
    for row in player_involvement(&report.leading).iter().take(TOP_PLAYERS) {
        let role = row.role.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
        println!("  {:<28} {:<11} {}", row.player, role, row.involvements);
    }

    Ok(())
}
