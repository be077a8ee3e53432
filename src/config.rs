use std::path::PathBuf;

use crate::http_cache::FetchMode;
use crate::mining::DEFAULT_MAX_PATTERNS;
use crate::sequencer::{DEFAULT_WINDOW_SIZE, WindowOptions};

pub const DEFAULT_EVENTS_CSV: &str = "data/2_44_1_all_data.csv";
pub const DEFAULT_TEAM: &str = "Arsenal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonRef {
    pub competition_id: u32,
    pub season_id: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub events_csv: PathBuf,
    pub team: String,
    pub window: WindowOptions,
    /// 0 selects the most frequent pattern.
    pub pattern_rank: usize,
    pub max_patterns: usize,
    pub drop_types: Vec<String>,
    /// Needed for minutes played; lineups are skipped when unset.
    pub season: Option<SeasonRef>,
    pub export_path: Option<PathBuf>,
    pub fetch_mode: FetchMode,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            events_csv: PathBuf::from(DEFAULT_EVENTS_CSV),
            team: DEFAULT_TEAM.to_string(),
            window: WindowOptions::default(),
            pattern_rank: 0,
            max_patterns: DEFAULT_MAX_PATTERNS,
            drop_types: Vec::new(),
            season: None,
            export_path: None,
            fetch_mode: FetchMode::Revalidate,
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from `SHOT_LEADUP_*` values. Unparseable numbers
    /// fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let events_csv = get("SHOT_LEADUP_EVENTS_CSV")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EVENTS_CSV));
        let team = get("SHOT_LEADUP_TEAM").unwrap_or_else(|| DEFAULT_TEAM.to_string());
        let size = get("SHOT_LEADUP_WINDOW")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_WINDOW_SIZE)
            .max(1);
        let allow_cross_match_window = get("SHOT_LEADUP_CROSS_MATCH_WINDOW")
            .is_some_and(|v| parse_flag(&v));
        let pattern_rank = get("SHOT_LEADUP_PATTERN_RANK")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        let max_patterns = get("SHOT_LEADUP_MAX_PATTERNS")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_PATTERNS)
            .max(1);
        let drop_types = get("SHOT_LEADUP_DROP_TYPES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let competition_id = get("SHOT_LEADUP_COMPETITION_ID").and_then(|v| v.parse::<u32>().ok());
        let season_id = get("SHOT_LEADUP_SEASON_ID").and_then(|v| v.parse::<u32>().ok());
        let season = match (competition_id, season_id) {
            (Some(competition_id), Some(season_id)) => Some(SeasonRef {
                competition_id,
                season_id,
            }),
            _ => None,
        };
        let export_path = get("SHOT_LEADUP_EXPORT_PATH").map(PathBuf::from);
        let fetch_mode = if get("SHOT_LEADUP_OFFLINE").is_some_and(|v| parse_flag(&v)) {
            FetchMode::Offline
        } else {
            FetchMode::Revalidate
        };

        Self {
            events_csv,
            team,
            window: WindowOptions {
                size,
                allow_cross_match_window,
            },
            pattern_rank,
            max_patterns,
            drop_types,
            season,
            export_path,
            fetch_mode,
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::{AnalysisConfig, SeasonRef};
    use crate::http_cache::FetchMode;

    fn config(pairs: &[(&str, &str)]) -> AnalysisConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AnalysisConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(config(&[]), AnalysisConfig::default());
    }

    #[test]
    fn reads_every_setting() {
        let cfg = config(&[
            ("SHOT_LEADUP_EVENTS_CSV", "/tmp/events.csv"),
            ("SHOT_LEADUP_TEAM", "Chelsea"),
            ("SHOT_LEADUP_WINDOW", "5"),
            ("SHOT_LEADUP_CROSS_MATCH_WINDOW", "TRUE"),
            ("SHOT_LEADUP_PATTERN_RANK", "2"),
            ("SHOT_LEADUP_MAX_PATTERNS", "20"),
            ("SHOT_LEADUP_DROP_TYPES", "Pressure, Duel,,"),
            ("SHOT_LEADUP_COMPETITION_ID", "2"),
            ("SHOT_LEADUP_SEASON_ID", "44"),
            ("SHOT_LEADUP_EXPORT_PATH", "out.xlsx"),
            ("SHOT_LEADUP_OFFLINE", "1"),
        ]);
        assert_eq!(cfg.events_csv, PathBuf::from("/tmp/events.csv"));
        assert_eq!(cfg.team, "Chelsea");
        assert_eq!(cfg.window.size, 5);
        assert!(cfg.window.allow_cross_match_window);
        assert_eq!(cfg.pattern_rank, 2);
        assert_eq!(cfg.max_patterns, 20);
        assert_eq!(cfg.drop_types, vec!["Pressure", "Duel"]);
        assert_eq!(
            cfg.season,
            Some(SeasonRef {
                competition_id: 2,
                season_id: 44
            })
        );
        assert_eq!(cfg.export_path, Some(PathBuf::from("out.xlsx")));
        assert_eq!(cfg.fetch_mode, FetchMode::Offline);
    }

    #[test]
    fn bad_numbers_fall_back() {
        let cfg = config(&[
            ("SHOT_LEADUP_WINDOW", "0"),
            ("SHOT_LEADUP_MAX_PATTERNS", "lots"),
            ("SHOT_LEADUP_COMPETITION_ID", "2"),
        ]);
        assert_eq!(cfg.window.size, 1);
        assert_eq!(cfg.max_patterns, 50);
        assert_eq!(cfg.season, None);
    }
}
