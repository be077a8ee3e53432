use std::ops::Range;

use tracing::{debug, warn};

use crate::events::TokenizedEvent;

pub const DEFAULT_WINDOW_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowOptions {
    /// Number of events taken before each shot.
    pub size: usize,
    /// Let windows reach back past the first event of the shot's match into
    /// the tail of the previous match in the table. Off by default; turning
    /// it on gives plain global-row windows.
    pub allow_cross_match_window: bool,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            size: DEFAULT_WINDOW_SIZE,
            allow_cross_match_window: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotWindow {
    pub shot_row: usize,
    pub rows: Range<usize>,
}

/// One token from a shot's leading window, tagged with that shot's result.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadingEvent {
    pub source: TokenizedEvent,
    pub shot_row: usize,
    pub token: String,
    pub shot_outcome: Option<String>,
    pub shot_xg: Option<f64>,
    pub xg_rank: Option<f64>,
}

/// Orders events by `(match_id, index)`. The sort is stable, and the slice
/// position afterwards is the row index every window refers to.
pub fn sort_events(events: &mut [TokenizedEvent]) {
    events.sort_by_key(|e| (e.event.match_id, e.event.index));
}

pub fn shot_windows(events: &[TokenizedEvent], opts: WindowOptions) -> Vec<ShotWindow> {
    debug_assert!(events.is_sorted_by_key(|e| (e.event.match_id, e.event.index)));

    let mut out = Vec::new();
    let mut match_start = 0usize;
    for (row, item) in events.iter().enumerate() {
        if row > 0 && events[row - 1].event.match_id != item.event.match_id {
            match_start = row;
        }
        if !item.event.is_shot() {
            continue;
        }
        let floor = if opts.allow_cross_match_window {
            0
        } else {
            match_start
        };
        let start = row.saturating_sub(opts.size).max(floor);
        if start < match_start {
            debug!(
                shot_row = row,
                match_id = item.event.match_id,
                leaked = match_start - start,
                "window reaches into previous match"
            );
        }
        out.push(ShotWindow {
            shot_row: row,
            rows: start..row,
        });
    }
    out
}

/// Flattens every shot window into rows, earlier shots first and tokens in
/// event order within a window.
pub fn leading_events(events: &[TokenizedEvent], opts: WindowOptions) -> Vec<LeadingEvent> {
    let windows = shot_windows(events, opts);
    let mut rows = Vec::new();
    for window in &windows {
        let shot = &events[window.shot_row].event;
        if shot.shot_xg.is_none() {
            warn!(match_id = shot.match_id, index = shot.index, "shot without xG value");
        }
        for source in &events[window.rows.clone()] {
            rows.push(LeadingEvent {
                source: source.clone(),
                shot_row: window.shot_row,
                token: source.token.clone(),
                shot_outcome: shot.shot_outcome.clone(),
                shot_xg: shot.shot_xg,
                xg_rank: None,
            });
        }
    }

    let ranked = rows
        .iter()
        .enumerate()
        .filter_map(|(pos, row)| row.shot_xg.map(|xg| (pos, xg)))
        .collect::<Vec<_>>();
    let values = ranked.iter().map(|(_, xg)| *xg).collect::<Vec<_>>();
    for ((pos, _), rank) in ranked.iter().zip(percentile_ranks(&values)) {
        rows[*pos].xg_rank = Some(rank);
    }

    debug!(shots = windows.len(), rows = rows.len(), "leading events");
    rows
}

/// Token lists per shot, in shot order. Windows can be shorter than the
/// configured size (or empty) near the start of a match.
pub fn shot_token_windows(events: &[TokenizedEvent], opts: WindowOptions) -> Vec<Vec<String>> {
    shot_windows(events, opts)
        .into_iter()
        .map(|window| {
            events[window.rows]
                .iter()
                .map(|e| e.token.clone())
                .collect()
        })
        .collect()
}

/// Fractional ranks (ties share the mean of their positions) scaled by
/// `1 / (n + 1)`, so every rank lies strictly inside `(0, 1)`.
pub fn percentile_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order = (0..n).collect::<Vec<_>>();
    order.sort_by(|a, b| values[*a].total_cmp(&values[*b]));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // 1-based positions start+1..=end
        let avg = (start + 1 + end) as f64 / 2.0;
        for idx in &order[start..end] {
            ranks[*idx] = avg / (n as f64 + 1.0);
        }
        start = end;
    }
    ranks
}
