use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::events::Role;
use crate::http_cache::{FetchMode, fetch_json_cached};
use crate::normalize::map_position;

const OPEN_DATA_URL: &str = "https://raw.githubusercontent.com/statsbomb/open-data/master/data";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Spells without an end clock ran to the final whistle.
pub const FULL_MATCH_MINUTES: f64 = 90.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchInfo {
    pub match_id: u64,
    pub match_date: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<u8>,
    pub away_score: Option<u8>,
}

impl MatchInfo {
    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TeamLineup {
    pub team_id: u32,
    pub team_name: String,
    #[serde(default)]
    pub lineup: Vec<LineupPlayer>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LineupPlayer {
    pub player_id: u64,
    pub player_name: String,
    #[serde(default)]
    pub positions: Vec<PositionSpell>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PositionSpell {
    #[serde(default)]
    pub position: Option<String>,
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMinutes {
    pub player_id: String,
    pub player: String,
    pub role: Option<Role>,
    pub minutes: f64,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    match_id: u64,
    #[serde(default)]
    match_date: String,
    home_team: RawHomeTeam,
    away_team: RawAwayTeam,
    #[serde(default)]
    home_score: Option<u8>,
    #[serde(default)]
    away_score: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct RawHomeTeam {
    home_team_name: String,
}

#[derive(Debug, Deserialize)]
struct RawAwayTeam {
    away_team_name: String,
}

/// Blocking client shared by every open-data request. One attempt per
/// call, no retries.
fn open_data_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("shot_leadup/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")
    })
}

fn fetch_open_data(path: &str, mode: FetchMode) -> Result<String> {
    let client = open_data_client()?;
    fetch_json_cached(client, &format!("{OPEN_DATA_URL}/{path}"), mode)
}

pub fn fetch_matches(competition_id: u32, season_id: u32, mode: FetchMode) -> Result<Vec<MatchInfo>> {
    let body = fetch_open_data(&format!("matches/{competition_id}/{season_id}.json"), mode)
        .with_context(|| format!("matches for competition {competition_id} season {season_id}"))?;
    parse_matches_json(&body)
}

pub fn fetch_lineups(match_id: u64, mode: FetchMode) -> Result<Vec<TeamLineup>> {
    let body = fetch_open_data(&format!("lineups/{match_id}.json"), mode)
        .with_context(|| format!("lineups for match {match_id}"))?;
    parse_lineups_json(&body)
}

pub fn parse_matches_json(raw: &str) -> Result<Vec<MatchInfo>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let rows: Vec<RawMatch> = serde_json::from_str(trimmed).context("invalid matches json")?;
    Ok(rows
        .into_iter()
        .map(|m| MatchInfo {
            match_id: m.match_id,
            match_date: m.match_date,
            home_team: m.home_team.home_team_name,
            away_team: m.away_team.away_team_name,
            home_score: m.home_score,
            away_score: m.away_score,
        })
        .collect())
}

pub fn parse_lineups_json(raw: &str) -> Result<Vec<TeamLineup>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).context("invalid lineups json")
}

/// Parses a `MM:SS` match clock into fractional minutes.
pub fn parse_clock(raw: &str) -> Result<f64> {
    let (mins, secs) = raw
        .trim()
        .split_once(':')
        .ok_or_else(|| anyhow!("clock {raw:?} is not MM:SS"))?;
    let mins = mins
        .parse::<u32>()
        .with_context(|| format!("clock {raw:?} minutes"))?;
    let secs = secs
        .parse::<u32>()
        .with_context(|| format!("clock {raw:?} seconds"))?;
    Ok(f64::from(mins) + f64::from(secs) / 60.0)
}

pub fn spell_minutes(spell: &PositionSpell) -> Result<f64> {
    let from = parse_clock(&spell.from)?;
    let to = match spell.to.as_deref() {
        Some(to) => parse_clock(to)?,
        None => FULL_MATCH_MINUTES,
    };
    Ok((to - from).max(0.0))
}

/// Minutes per player of `team` in one match. Unused substitutes (no
/// position spells) are left out.
pub fn lineup_minutes(lineups: &[TeamLineup], team: &str) -> Result<Vec<PlayerMinutes>> {
    let mut out = Vec::new();
    for side in lineups.iter().filter(|l| l.team_name == team) {
        for player in &side.lineup {
            if player.positions.is_empty() {
                continue;
            }
            let mut minutes = 0.0;
            for spell in &player.positions {
                minutes += spell_minutes(spell)
                    .with_context(|| format!("player {} ({})", player.player_name, player.player_id))?;
            }
            let role = player
                .positions
                .first()
                .and_then(|s| s.position.as_deref())
                .and_then(map_position);
            out.push(PlayerMinutes {
                player_id: player.player_id.to_string(),
                player: player.player_name.clone(),
                role,
                minutes,
            });
        }
    }
    Ok(out)
}

/// Adds per-match minutes into season totals keyed by player id.
pub fn accumulate_minutes(totals: &mut BTreeMap<String, PlayerMinutes>, rows: Vec<PlayerMinutes>) {
    for row in rows {
        totals
            .entry(row.player_id.clone())
            .and_modify(|acc| {
                acc.minutes += row.minutes;
                if acc.role.is_none() {
                    acc.role = row.role;
                }
            })
            .or_insert(row);
    }
}

/// Total minutes per player of `team` over every match of the season.
pub fn minutes_played(
    competition_id: u32,
    season_id: u32,
    team: &str,
    mode: FetchMode,
) -> Result<Vec<PlayerMinutes>> {
    let matches = fetch_matches(competition_id, season_id, mode)?;
    let team_matches = matches.iter().filter(|m| m.involves(team)).collect::<Vec<_>>();
    info!(team, matches = team_matches.len(), "fetching lineups");

    let mut totals = BTreeMap::new();
    for info in team_matches {
        let lineups = fetch_lineups(info.match_id, mode)?;
        let rows = lineup_minutes(&lineups, team)
            .with_context(|| format!("minutes for match {}", info.match_id))?;
        debug!(match_id = info.match_id, players = rows.len(), "lineup minutes");
        accumulate_minutes(&mut totals, rows);
    }
    Ok(totals.into_values().collect())
}
