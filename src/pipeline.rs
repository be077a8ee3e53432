use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::encoding::{EncodingTable, fit_type_table, tokenize};
use crate::events::{RawEvent, TokenizedEvent};
use crate::ingest::{read_events_csv, select_team_events};
use crate::mining::{FrequentPattern, PrefixSpan, common_event, rank_patterns};
use crate::normalize::{normalize_events, remove_event_types};
use crate::sequencer::{LeadingEvent, leading_events, shot_token_windows, sort_events};

/// Everything the charts and the export read from one run.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub team: String,
    /// Team events in `(match_id, index)` order.
    pub events: Vec<TokenizedEvent>,
    pub type_table: EncodingTable,
    pub leading: Vec<LeadingEvent>,
    pub windows: Vec<Vec<String>>,
    pub patterns: Vec<FrequentPattern>,
    pub pattern_rank: usize,
    pub common_event: String,
}

impl AnalysisReport {
    pub fn shots(&self) -> usize {
        self.events.iter().filter(|e| e.event.is_shot()).count()
    }

    pub fn matches(&self) -> usize {
        let mut ids = self.events.iter().map(|e| e.event.match_id).collect::<Vec<_>>();
        ids.dedup();
        ids.len()
    }
}

pub fn run(cfg: &AnalysisConfig) -> Result<AnalysisReport> {
    let raw = read_events_csv(&cfg.events_csv)?;
    analyze(&raw, cfg)
}

pub fn analyze(raw: &[RawEvent], cfg: &AnalysisConfig) -> Result<AnalysisReport> {
    let selected = select_team_events(raw, &cfg.team);
    if selected.is_empty() {
        warn!(team = %cfg.team, "no events for team");
    }

    let events = normalize_events(&selected).context("normalize events")?;
    let events = remove_event_types(events, &cfg.drop_types);
    let type_table = fit_type_table(&events);
    let mut events = tokenize(events, &type_table).context("tokenize events")?;
    sort_events(&mut events);
    info!(
        team = %cfg.team,
        events = events.len(),
        types = type_table.len(),
        "events tokenized"
    );

    let leading = leading_events(&events, cfg.window);
    let windows = shot_token_windows(&events, cfg.window);
    info!(
        shots = windows.len(),
        leading = leading.len(),
        window = cfg.window.size,
        cross_match = cfg.window.allow_cross_match_window,
        "shot windows built"
    );

    let patterns = rank_patterns(&PrefixSpan::default(), &windows, cfg.max_patterns);
    let common_event = common_event(&patterns, cfg.pattern_rank)?;
    info!(
        patterns = patterns.len(),
        rank = cfg.pattern_rank,
        token = %common_event,
        "common event selected"
    );

    Ok(AnalysisReport {
        team: cfg.team.clone(),
        events,
        type_table,
        leading,
        windows,
        patterns,
        pattern_rank: cfg.pattern_rank,
        common_event,
    })
}
