use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

use crate::events::RawEvent;

pub const REQUIRED_COLUMNS: [&str; 13] = [
    "match_id",
    "index",
    "type",
    "team",
    "player",
    "player_id",
    "position",
    "shot_statsbomb_xg",
    "shot_outcome",
    "location",
    "pass_end_location",
    "carry_end_location",
    "pass_recipient",
];

pub fn read_events_csv(path: &Path) -> Result<Vec<RawEvent>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to open event table {}", path.display()))?;
    let events = read_records(reader).with_context(|| format!("read {}", path.display()))?;
    info!(rows = events.len(), path = %path.display(), "loaded event table");
    Ok(events)
}

pub fn read_events<R: Read>(input: R) -> Result<Vec<RawEvent>> {
    let reader = csv::ReaderBuilder::new().has_headers(true).from_reader(input);
    read_records(reader)
}

fn read_records<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<RawEvent>> {
    let headers = reader.headers().context("missing header row")?.clone();
    let missing = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .copied()
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(anyhow!("missing required columns: {}", missing.join(", ")));
    }

    let mut out = Vec::new();
    for (row, record) in reader.deserialize::<RawEvent>().enumerate() {
        // +2: header line plus 1-based numbering
        let event = record.with_context(|| format!("line {}", row + 2))?;
        out.push(event);
    }
    Ok(out)
}

/// Rows whose `team` equals `team` exactly. No match is not an error.
pub fn select_team_events(events: &[RawEvent], team: &str) -> Vec<RawEvent> {
    let selected = events
        .iter()
        .filter(|e| e.team == team)
        .cloned()
        .collect::<Vec<_>>();
    debug!(team, selected = selected.len(), total = events.len(), "team filter");
    selected
}
