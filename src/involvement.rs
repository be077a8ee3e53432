use std::collections::{BTreeMap, HashMap};

use crate::events::{Role, TokenizedEvent};
use crate::provider::PlayerMinutes;
use crate::sequencer::LeadingEvent;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInvolvement {
    pub player_id: String,
    pub player: String,
    pub role: Option<Role>,
    pub involvements: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvolvementPoint {
    pub player_id: String,
    pub player: String,
    pub role: Option<Role>,
    pub minutes: f64,
    pub involvements: usize,
}

impl InvolvementPoint {
    pub fn per_90(&self) -> Option<f64> {
        (self.minutes > 0.0).then(|| self.involvements as f64 * 90.0 / self.minutes)
    }
}

/// Leading-event rows per player, most involved first. Rows without a
/// named player (kick-offs, half starts) are not counted.
pub fn player_involvement(leading: &[LeadingEvent]) -> Vec<PlayerInvolvement> {
    let mut by_id: HashMap<&str, PlayerInvolvement> = HashMap::new();
    for row in leading {
        let event = &row.source.event;
        let Some(player) = event.player.as_deref() else {
            continue;
        };
        let entry = by_id
            .entry(event.player_id.as_str())
            .or_insert_with(|| PlayerInvolvement {
                player_id: event.player_id.clone(),
                player: player.to_string(),
                role: event.role,
                involvements: 0,
            });
        entry.involvements += 1;
        if entry.role.is_none() {
            entry.role = event.role;
        }
    }

    let mut out = by_id.into_values().collect::<Vec<_>>();
    out.sort_by(|a, b| {
        b.involvements
            .cmp(&a.involvements)
            .then_with(|| a.player.cmp(&b.player))
    });
    out
}

/// Role seen most often for each player id; ties go to the earlier role in
/// `Role` order.
pub fn dominant_roles(events: &[TokenizedEvent]) -> HashMap<String, Role> {
    let mut counts: HashMap<&str, BTreeMap<Role, usize>> = HashMap::new();
    for e in events {
        if let Some(role) = e.event.role {
            *counts
                .entry(e.event.player_id.as_str())
                .or_default()
                .entry(role)
                .or_default() += 1;
        }
    }
    counts
        .into_iter()
        .filter_map(|(id, roles)| {
            let mut best: Option<(Role, usize)> = None;
            for (role, n) in roles {
                if best.is_none_or(|(_, top)| n > top) {
                    best = Some((role, n));
                }
            }
            best.map(|(role, _)| (id.to_string(), role))
        })
        .collect()
}

/// Joins season minutes with leading-event involvement. Every player with
/// minutes gets a point, involved or not.
pub fn minutes_vs_involvement(
    events: &[TokenizedEvent],
    leading: &[LeadingEvent],
    minutes: &[PlayerMinutes],
) -> Vec<InvolvementPoint> {
    let involvement = player_involvement(leading)
        .into_iter()
        .map(|p| (p.player_id.clone(), p.involvements))
        .collect::<HashMap<_, _>>();
    let roles = dominant_roles(events);

    minutes
        .iter()
        .map(|m| InvolvementPoint {
            player_id: m.player_id.clone(),
            player: m.player.clone(),
            role: roles.get(&m.player_id).copied().or(m.role),
            minutes: m.minutes,
            involvements: involvement.get(&m.player_id).copied().unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{dominant_roles, minutes_vs_involvement, player_involvement};
    use crate::events::{Event, Role, TokenizedEvent};
    use crate::provider::PlayerMinutes;
    use crate::sequencer::LeadingEvent;

    fn tokenized(player: Option<&str>, player_id: &str, role: Option<Role>) -> TokenizedEvent {
        TokenizedEvent {
            event: Event {
                match_id: 1,
                index: 1,
                event_type: "Pass".to_string(),
                team: "Arsenal".to_string(),
                player: player.map(str::to_string),
                player_id: player_id.to_string(),
                position: None,
                role,
                shot_xg: None,
                shot_outcome: None,
                location: None,
                pass_end_location: None,
                carry_end_location: None,
                pass_recipient: None,
            },
            type_id: "1".to_string(),
            token: format!("1{player_id}"),
        }
    }

    fn leading(source: TokenizedEvent) -> LeadingEvent {
        LeadingEvent {
            token: source.token.clone(),
            source,
            shot_row: 0,
            shot_outcome: Some("Goal".to_string()),
            shot_xg: Some(0.2),
            xg_rank: Some(0.5),
        }
    }

    #[test]
    fn counts_rows_per_player() {
        let rows = vec![
            leading(tokenized(Some("Saka"), "1", Some(Role::Attacker))),
            leading(tokenized(Some("Rice"), "2", Some(Role::Midfielder))),
            leading(tokenized(Some("Saka"), "1", Some(Role::Attacker))),
            leading(tokenized(None, "00000", None)),
        ];
        let counts = player_involvement(&rows);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].player, "Saka");
        assert_eq!(counts[0].involvements, 2);
        assert_eq!(counts[1].player, "Rice");
    }

    #[test]
    fn dominant_role_prefers_most_frequent() {
        let events = vec![
            tokenized(Some("X"), "9", Some(Role::Defender)),
            tokenized(Some("X"), "9", Some(Role::Midfielder)),
            tokenized(Some("X"), "9", Some(Role::Midfielder)),
            tokenized(Some("Y"), "8", None),
        ];
        let roles = dominant_roles(&events);
        assert_eq!(roles.get("9"), Some(&Role::Midfielder));
        assert!(!roles.contains_key("8"));
    }

    #[test]
    fn joins_minutes_with_involvement() {
        let events = vec![tokenized(Some("Saka"), "1", Some(Role::Attacker))];
        let rows = vec![leading(events[0].clone())];
        let minutes = vec![
            PlayerMinutes {
                player_id: "1".to_string(),
                player: "Saka".to_string(),
                role: Some(Role::Midfielder),
                minutes: 180.0,
            },
            PlayerMinutes {
                player_id: "3".to_string(),
                player: "Raya".to_string(),
                role: Some(Role::Goalkeeper),
                minutes: 90.0,
            },
        ];
        let points = minutes_vs_involvement(&events, &rows, &minutes);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].role, Some(Role::Attacker));
        assert_eq!(points[0].involvements, 1);
        assert_eq!(points[0].per_90(), Some(0.5));
        assert_eq!(points[1].involvements, 0);
        assert_eq!(points[1].role, Some(Role::Goalkeeper));
    }
}
