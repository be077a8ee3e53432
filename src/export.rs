use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::info;

use crate::involvement::{InvolvementPoint, PlayerInvolvement, player_involvement};
use crate::mining::FrequentPattern;
use crate::pipeline::AnalysisReport;
use crate::sequencer::LeadingEvent;

pub struct ExportReport {
    pub leading_rows: usize,
    pub patterns: usize,
    pub players: usize,
}

/// Writes the derived tables of one run to an `.xlsx` workbook. `minutes`
/// fills the minutes column of the involvement sheet when lineups were
/// fetched.
pub fn export_workbook(
    path: &Path,
    report: &AnalysisReport,
    minutes: &[InvolvementPoint],
) -> Result<ExportReport> {
    let mut leading_rows = vec![vec![
        "Match ID".to_string(),
        "Index".to_string(),
        "Type".to_string(),
        "Player ID".to_string(),
        "Player".to_string(),
        "Role".to_string(),
        "Token".to_string(),
        "Shot Row".to_string(),
        "Shot Outcome".to_string(),
        "Shot xG".to_string(),
        "xG Rank".to_string(),
    ]];
    leading_rows.extend(report.leading.iter().map(leading_row));

    let mut pattern_rows = vec![vec![
        "Rank".to_string(),
        "Support".to_string(),
        "Length".to_string(),
        "Sequence".to_string(),
    ]];
    pattern_rows.extend(
        report
            .patterns
            .iter()
            .enumerate()
            .map(|(rank, pattern)| pattern_row(rank, pattern)),
    );

    let involvement = player_involvement(&report.leading);
    let mut involvement_rows = vec![vec![
        "Player ID".to_string(),
        "Player".to_string(),
        "Role".to_string(),
        "Involvements".to_string(),
        "Minutes".to_string(),
        "Per 90".to_string(),
    ]];
    involvement_rows.extend(
        involvement
            .iter()
            .map(|row| involvement_row(row, minutes.iter().find(|m| m.player_id == row.player_id))),
    );

    let summary_rows = vec![
        vec!["Field".to_string(), "Value".to_string()],
        vec!["Team".to_string(), report.team.clone()],
        vec!["Matches".to_string(), report.matches().to_string()],
        vec!["Events".to_string(), report.events.len().to_string()],
        vec!["Event Types".to_string(), report.type_table.len().to_string()],
        vec!["Shots".to_string(), report.shots().to_string()],
        vec!["Leading Rows".to_string(), report.leading.len().to_string()],
        vec!["Pattern Rank".to_string(), report.pattern_rank.to_string()],
        vec!["Common Event".to_string(), report.common_event.clone()],
        vec![
            "Generated".to_string(),
            Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    ];

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("LeadingEvents")?;
        write_rows(sheet, &leading_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Patterns")?;
        write_rows(sheet, &pattern_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Involvement")?;
        write_rows(sheet, &involvement_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary_rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    info!(path = %path.display(), "workbook exported");
    Ok(ExportReport {
        leading_rows: leading_rows.len().saturating_sub(1),
        patterns: pattern_rows.len().saturating_sub(1),
        players: involvement_rows.len().saturating_sub(1),
    })
}

fn leading_row(row: &LeadingEvent) -> Vec<String> {
    let event = &row.source.event;
    vec![
        event.match_id.to_string(),
        event.index.to_string(),
        event.event_type.clone(),
        event.player_id.clone(),
        event.player.clone().unwrap_or_default(),
        opt_to_string(event.role),
        row.token.clone(),
        row.shot_row.to_string(),
        row.shot_outcome.clone().unwrap_or_default(),
        opt_to_string(row.shot_xg),
        opt_to_string(row.xg_rank),
    ]
}

fn pattern_row(rank: usize, pattern: &FrequentPattern) -> Vec<String> {
    vec![
        rank.to_string(),
        pattern.support.to_string(),
        pattern.sequence.len().to_string(),
        pattern.sequence.join(" "),
    ]
}

fn involvement_row(row: &PlayerInvolvement, minutes: Option<&InvolvementPoint>) -> Vec<String> {
    vec![
        row.player_id.clone(),
        row.player.clone(),
        opt_to_string(row.role),
        row.involvements.to_string(),
        opt_to_string(minutes.map(|m| m.minutes)),
        opt_to_string(minutes.and_then(|m| m.per_90()).map(|v| format!("{v:.2}"))),
    ]
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
