use std::collections::BTreeMap;

use ratatui::Frame;
use ratatui::layout::{Alignment, Direction, Rect};
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine, Points, Rectangle};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph,
};
use tracing::warn;

use crate::events::{BALL_RECEIPT_TYPE, CARRY_TYPE, PASS_TYPE, Point, Role, TokenizedEvent};
use crate::involvement::{InvolvementPoint, PlayerInvolvement};
use crate::sequencer::LeadingEvent;

/// StatsBomb pitch size in provider units.
pub const PITCH_LENGTH: f64 = 120.0;
pub const PITCH_WIDTH: f64 = 80.0;

const PALETTE: [Color; 6] = [
    Color::Green,
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Blue,
    Color::Red,
];

#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeSummary {
    pub outcome: String,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// xG distribution of every shot, grouped by outcome and sorted by outcome
/// name. Shots without xG are skipped.
pub fn outcome_summaries(events: &[TokenizedEvent]) -> Vec<OutcomeSummary> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for e in events.iter().filter(|e| e.event.is_shot()) {
        let Some(xg) = e.event.shot_xg else { continue };
        let outcome = e.event.shot_outcome.clone().unwrap_or_else(|| "Unknown".to_string());
        groups.entry(outcome).or_default().push(xg);
    }

    groups
        .into_iter()
        .filter_map(|(outcome, mut values)| {
            values.sort_by(f64::total_cmp);
            let count = values.len();
            Some(OutcomeSummary {
                outcome,
                count,
                mean: values.iter().sum::<f64>() / count as f64,
                min: *values.first()?,
                q1: quantile(&values, 0.25)?,
                median: quantile(&values, 0.5)?,
                q3: quantile(&values, 0.75)?,
                max: *values.last()?,
            })
        })
        .collect()
}

/// Linear-interpolated quantile of an ascending slice; `None` when empty.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

pub fn render_outcome_box_plot(frame: &mut Frame, area: Rect, summaries: &[OutcomeSummary]) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("xG by shot outcome");
    if summaries.is_empty() {
        frame.render_widget(empty_notice("No shots with an xG value", block), area);
        return;
    }

    let top = summaries
        .iter()
        .map(|s| s.max)
        .fold(0.1_f64, f64::max)
        * 1.15;
    let floor = -top * 0.2;
    let groups = summaries.len() as f64;

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, groups])
        .y_bounds([floor, top])
        .paint(|ctx| {
            for (i, s) in summaries.iter().enumerate() {
                let color = PALETTE[i % PALETTE.len()];
                let center = i as f64 + 0.5;
                let left = center - 0.25;
                ctx.draw(&Rectangle {
                    x: left,
                    y: s.q1,
                    width: 0.5,
                    height: (s.q3 - s.q1).max(f64::EPSILON),
                    color,
                });
                ctx.draw(&CanvasLine::new(left, s.median, left + 0.5, s.median, Color::White));
                ctx.draw(&CanvasLine::new(center, s.min, center, s.q1, color));
                ctx.draw(&CanvasLine::new(center, s.q3, center, s.max, color));
                ctx.draw(&CanvasLine::new(center - 0.1, s.min, center + 0.1, s.min, color));
                ctx.draw(&CanvasLine::new(center - 0.1, s.max, center + 0.1, s.max, color));

                ctx.print(left, s.max + top * 0.05, format!("n={} mean={:.3}", s.count, s.mean));
                ctx.print(left, floor * 0.5, s.outcome.clone());
            }
        });
    frame.render_widget(canvas, area);
}

pub fn render_involvement_bars(frame: &mut Frame, area: Rect, rows: &[PlayerInvolvement]) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Leading-event involvements per player");
    if rows.is_empty() {
        frame.render_widget(empty_notice("No leading events", block), area);
        return;
    }

    // one bar per inner row
    let visible = usize::from(area.height.saturating_sub(2)).max(1);
    let bars = rows
        .iter()
        .take(visible)
        .map(|row| {
            let color = role_color(row.role);
            Bar::default()
                .value(row.involvements as u64)
                .label(Line::from(row.player.clone()))
                .text_value(row.involvements.to_string())
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect::<Vec<_>>();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0);
    frame.render_widget(chart, area);
}

pub fn render_minutes_scatter(frame: &mut Frame, area: Rect, points: &[InvolvementPoint]) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Minutes played vs involvements");
    if points.is_empty() {
        frame.render_widget(
            empty_notice("No minutes loaded (set competition and season ids)", block),
            area,
        );
        return;
    }

    let mut by_role: BTreeMap<Option<Role>, Vec<(f64, f64)>> = BTreeMap::new();
    for p in points {
        by_role
            .entry(p.role)
            .or_default()
            .push((p.minutes, p.involvements as f64));
    }

    let max_minutes = points.iter().map(|p| p.minutes).fold(90.0_f64, f64::max);
    let max_involvements = points
        .iter()
        .map(|p| p.involvements as f64)
        .fold(1.0_f64, f64::max);

    let datasets = by_role
        .iter()
        .map(|(role, data)| {
            Dataset::default()
                .name(role.map_or("Unknown", Role::as_str))
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(role_color(*role)))
                .data(data)
        })
        .collect::<Vec<_>>();

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("minutes")
                .bounds([0.0, max_minutes])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.0}", max_minutes / 2.0)),
                    Span::raw(format!("{max_minutes:.0}")),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("involvements")
                .bounds([0.0, max_involvements])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{max_involvements:.0}")),
                ]),
        );
    frame.render_widget(chart, area);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    Reception,
    Pass,
    Carry,
}

impl MarkKind {
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        match event_type {
            BALL_RECEIPT_TYPE | "Ball Receipt" => Some(MarkKind::Reception),
            PASS_TYPE => Some(MarkKind::Pass),
            CARRY_TYPE => Some(MarkKind::Carry),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventMark {
    pub start: Point,
    pub end: Option<Point>,
    pub shot_xg: Option<f64>,
}

/// Pitch positions of one token's occurrences inside leading windows.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonEventMap {
    pub token: String,
    pub event_type: String,
    pub player: Option<String>,
    pub kind: MarkKind,
    pub marks: Vec<EventMark>,
}

impl CommonEventMap {
    /// Collects the marks to draw for `token`. Returns `None` (with a
    /// warning) when the token never appears or its event type has no pitch
    /// rendering.
    pub fn prepare(leading: &[LeadingEvent], token: &str) -> Option<Self> {
        let rows = leading.iter().filter(|r| r.token == token).collect::<Vec<_>>();
        let Some(first) = rows.first() else {
            warn!(token, "common event does not occur in any leading window");
            return None;
        };
        let event_type = first.source.event.event_type.clone();
        let Some(kind) = MarkKind::from_event_type(&event_type) else {
            warn!(token, event_type, "no pitch map for this event type");
            return None;
        };

        let marks = rows
            .iter()
            .filter_map(|row| {
                let event = &row.source.event;
                let start = event.location?;
                let end = match kind {
                    MarkKind::Reception => None,
                    MarkKind::Pass => event.pass_end_location,
                    MarkKind::Carry => event.carry_end_location,
                };
                Some(EventMark {
                    start,
                    end,
                    shot_xg: row.shot_xg,
                })
            })
            .collect();

        Some(Self {
            token: token.to_string(),
            event_type,
            player: first.source.event.player.clone(),
            kind,
            marks,
        })
    }
}

/// Colour bucket for the xG of the shot an event led to.
pub fn xg_color(xg: Option<f64>) -> Color {
    match xg {
        None => Color::DarkGray,
        Some(v) if v < 0.05 => Color::Blue,
        Some(v) if v < 0.15 => Color::Cyan,
        Some(v) if v < 0.3 => Color::Yellow,
        Some(_) => Color::Red,
    }
}

pub fn render_common_event_map(frame: &mut Frame, area: Rect, map: Option<&CommonEventMap>) {
    let Some(map) = map else {
        let block = Block::default().borders(Borders::ALL).title("Common event");
        frame.render_widget(empty_notice("Nothing to draw for the common event", block), area);
        return;
    };

    let title = format!(
        "Common event {} - {} by {} ({} occurrences)",
        map.token,
        map.event_type,
        map.player.as_deref().unwrap_or("unknown player"),
        map.marks.len()
    );
    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .marker(Marker::Braille)
        .x_bounds([0.0, PITCH_LENGTH])
        .y_bounds([0.0, PITCH_WIDTH])
        .paint(|ctx| {
            draw_pitch(ctx);
            ctx.layer();
            for mark in &map.marks {
                let color = xg_color(mark.shot_xg);
                let start = (mark.start.x, pitch_y(mark.start.y));
                match (map.kind, mark.end) {
                    (MarkKind::Reception, _) | (_, None) => {
                        ctx.draw(&Points {
                            coords: &[start],
                            color,
                        });
                    }
                    (_, Some(end)) => {
                        let end = (end.x, pitch_y(end.y));
                        ctx.draw(&CanvasLine::new(start.0, start.1, end.0, end.1, color));
                        ctx.draw(&Circle {
                            x: end.0,
                            y: end.1,
                            radius: 0.8,
                            color,
                        });
                    }
                }
            }
            ctx.print(
                1.0,
                1.5,
                "xG <.05 blue  <.15 cyan  <.30 yellow  else red",
            );
        });
    frame.render_widget(canvas, area);
}

/// Provider y runs top to bottom; the canvas runs bottom to top.
pub fn pitch_y(y: f64) -> f64 {
    PITCH_WIDTH - y
}

fn draw_pitch(ctx: &mut Context) {
    let c = Color::Gray;
    ctx.draw(&Rectangle {
        x: 0.0,
        y: 0.0,
        width: PITCH_LENGTH,
        height: PITCH_WIDTH,
        color: c,
    });
    ctx.draw(&CanvasLine::new(60.0, 0.0, 60.0, PITCH_WIDTH, c));
    ctx.draw(&Circle {
        x: 60.0,
        y: 40.0,
        radius: 10.0,
        color: c,
    });
    for (x, box_len, six_len) in [(0.0, 18.0, 6.0), (PITCH_LENGTH - 18.0, 18.0, 6.0)] {
        ctx.draw(&Rectangle {
            x,
            y: 18.0,
            width: box_len,
            height: 44.0,
            color: c,
        });
        let six_x = if x == 0.0 { 0.0 } else { PITCH_LENGTH - six_len };
        ctx.draw(&Rectangle {
            x: six_x,
            y: 30.0,
            width: six_len,
            height: 20.0,
            color: c,
        });
    }
}

fn role_color(role: Option<Role>) -> Color {
    match role {
        Some(Role::Goalkeeper) => Color::Yellow,
        Some(Role::Defender) => Color::Blue,
        Some(Role::Midfielder) => Color::Green,
        Some(Role::Attacker) => Color::Red,
        None => Color::Gray,
    }
}

fn empty_notice<'a>(text: &'a str, block: Block<'a>) -> Paragraph<'a> {
    Paragraph::new(text).alignment(Alignment::Center).block(block)
}
