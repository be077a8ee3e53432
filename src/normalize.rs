use std::collections::HashSet;

use tracing::debug;

use crate::error::AnalysisError;
use crate::events::{Event, MISSING_PLAYER_ID, Point, RawEvent, Role};

/// Fills a missing id with the sentinel, then drops the `.0` suffix left by
/// float storage. The fill has to happen first so the sentinel is also a
/// plain digit string.
pub fn clean_player_id(raw: Option<&str>) -> String {
    let filled = match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => MISSING_PLAYER_ID,
    };
    match filled.split_once('.') {
        Some((head, _)) => head.to_string(),
        None => filled.to_string(),
    }
}

/// Parses a serialized `[x, y]` pair. Blank cells are `None`; anything that
/// is not exactly two numbers is an error for the whole run.
pub fn parse_point(field: &'static str, raw: Option<&str>) -> Result<Option<Point>, AnalysisError> {
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let values: Vec<f64> =
        serde_json::from_str(text).map_err(|err| AnalysisError::Coordinate {
            field,
            raw: text.to_string(),
            reason: err.to_string(),
        })?;
    match values.as_slice() {
        [x, y] => Ok(Some(Point { x: *x, y: *y })),
        other => Err(AnalysisError::Coordinate {
            field,
            raw: text.to_string(),
            reason: format!("expected 2 values, found {}", other.len()),
        }),
    }
}

pub fn map_position(label: &str) -> Option<Role> {
    let role = match label {
        "Goalkeeper" => Role::Goalkeeper,

        "Right Back" | "Left Back" | "Left Center Back" | "Right Center Back" | "Center Back"
        | "Left Wing Back" | "Right Wing Back" => Role::Defender,

        "Left Midfield"
        | "Right Midfield"
        | "Left Defensive Midfield"
        | "Right Defensive Midfield"
        | "Left Center Midfield"
        | "Right Center Midfield"
        | "Center Defensive Midfield"
        | "Center Attacking Midfield"
        | "Right Attacking Midfield"
        | "Left Attacking Midfield"
        | "Center Midfield" => Role::Midfielder,

        "Left Center Forward" | "Right Center Forward" | "Center Forward" | "Right Wing"
        | "Left Wing" => Role::Attacker,

        _ => return None,
    };
    Some(role)
}

pub fn normalize_event(raw: &RawEvent) -> Result<Event, AnalysisError> {
    Ok(Event {
        match_id: raw.match_id,
        index: raw.index,
        event_type: raw.event_type.clone(),
        team: raw.team.clone(),
        player: raw.player.clone(),
        player_id: clean_player_id(raw.player_id.as_deref()),
        position: raw.position.clone(),
        role: raw.position.as_deref().and_then(map_position),
        shot_xg: raw.shot_statsbomb_xg,
        shot_outcome: raw.shot_outcome.clone(),
        location: parse_point("location", raw.location.as_deref())?,
        pass_end_location: parse_point("pass_end_location", raw.pass_end_location.as_deref())?,
        carry_end_location: parse_point("carry_end_location", raw.carry_end_location.as_deref())?,
        pass_recipient: raw.pass_recipient.clone(),
    })
}

pub fn normalize_events(raw: &[RawEvent]) -> Result<Vec<Event>, AnalysisError> {
    raw.iter().map(normalize_event).collect()
}

/// Drops every event whose type is listed in `types`.
pub fn remove_event_types(events: Vec<Event>, types: &[String]) -> Vec<Event> {
    if types.is_empty() {
        return events;
    }
    let drop: HashSet<&str> = types.iter().map(String::as_str).collect();
    let before = events.len();
    let kept = events
        .into_iter()
        .filter(|e| !drop.contains(e.event_type.as_str()))
        .collect::<Vec<_>>();
    debug!(dropped = before - kept.len(), kept = kept.len(), "removed event types");
    kept
}

#[cfg(test)]
mod tests {
    use super::{clean_player_id, map_position, normalize_event, parse_point, remove_event_types};
    use crate::error::AnalysisError;
    use crate::events::{Point, RawEvent, Role};

    fn raw(event_type: &str) -> RawEvent {
        RawEvent {
            match_id: 1,
            index: 1,
            event_type: event_type.to_string(),
            team: "Arsenal".to_string(),
            player: Some("Bukayo Saka".to_string()),
            player_id: Some("22084.0".to_string()),
            position: Some("Right Wing".to_string()),
            shot_statsbomb_xg: None,
            shot_outcome: None,
            location: Some("[60.0, 40.0]".to_string()),
            pass_end_location: None,
            carry_end_location: None,
            pass_recipient: None,
        }
    }

    #[test]
    fn player_id_is_filled_then_stripped() {
        assert_eq!(clean_player_id(None), "00000");
        assert_eq!(clean_player_id(Some("")), "00000");
        assert_eq!(clean_player_id(Some("22084.0")), "22084");
        assert_eq!(clean_player_id(Some("3501")), "3501");
        assert_eq!(clean_player_id(Some("12.5.0")), "12");
    }

    #[test]
    fn cleaned_ids_are_plain_digits() {
        for raw in [None, Some("7.0"), Some("40724"), Some(" 99.000 ")] {
            let id = clean_player_id(raw);
            assert!(!id.is_empty());
            assert!(id.chars().all(|c| c.is_ascii_digit()), "{id}");
        }
    }

    #[test]
    fn parses_coordinate_pairs() {
        assert_eq!(
            parse_point("location", Some("[61.0, 40.1]")).unwrap(),
            Some(Point { x: 61.0, y: 40.1 })
        );
        assert_eq!(parse_point("location", Some("[3, 4]")).unwrap(), Some(Point { x: 3.0, y: 4.0 }));
        assert_eq!(parse_point("location", None).unwrap(), None);
        assert_eq!(parse_point("location", Some("  ")).unwrap(), None);
    }

    #[test]
    fn malformed_coordinates_are_fatal() {
        let err = parse_point("pass_end_location", Some("[61.0, oops]")).unwrap_err();
        assert!(matches!(err, AnalysisError::Coordinate { field: "pass_end_location", .. }));

        let err = parse_point("location", Some("[1.0, 2.0, 3.0]")).unwrap_err();
        assert!(err.to_string().contains("expected 2 values"));
    }

    #[test]
    fn malformed_row_fails_normalization() {
        let mut row = raw("Carry");
        row.carry_end_location = Some("(1.0, 2.0)".to_string());
        assert!(normalize_event(&row).is_err());
    }

    #[test]
    fn maps_positions_to_roles() {
        assert_eq!(map_position("Right Back"), Some(Role::Defender));
        assert_eq!(map_position("Goalkeeper"), Some(Role::Goalkeeper));
        assert_eq!(map_position("Center Attacking Midfield"), Some(Role::Midfielder));
        assert_eq!(map_position("Left Wing"), Some(Role::Attacker));
        assert_eq!(map_position("Sweeper"), None);
        assert_eq!(map_position("right back"), None);
    }

    #[test]
    fn normalizes_a_row() {
        let event = normalize_event(&raw("Pass")).unwrap();
        assert_eq!(event.player_id, "22084");
        assert_eq!(event.role, Some(Role::Attacker));
        assert_eq!(event.location, Some(Point { x: 60.0, y: 40.0 }));
        assert!(event.pass_end_location.is_none());
    }

    #[test]
    fn removes_listed_types_only() {
        let events = ["Pass", "Pressure", "Shot", "Pressure"]
            .iter()
            .map(|t| normalize_event(&raw(t)).unwrap())
            .collect::<Vec<_>>();
        let kept = remove_event_types(events, &["Pressure".to_string()]);
        let types = kept.iter().map(|e| e.event_type.as_str()).collect::<Vec<_>>();
        assert_eq!(types, vec!["Pass", "Shot"]);
    }
}
