use std::fmt;

use serde::{Deserialize, Serialize};

pub const SHOT_TYPE: &str = "Shot";
pub const PASS_TYPE: &str = "Pass";
pub const CARRY_TYPE: &str = "Carry";
pub const BALL_RECEIPT_TYPE: &str = "Ball Receipt*";

/// Player id used when the provider left the column empty.
pub const MISSING_PLAYER_ID: &str = "00000";

/// One row of the provider's flattened event export, restricted to the
/// columns the pipeline reads. Extra columns in the file are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawEvent {
    pub match_id: u64,
    pub index: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub team: String,
    #[serde(default)]
    pub player: Option<String>,
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub shot_statsbomb_xg: Option<f64>,
    #[serde(default)]
    pub shot_outcome: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub pass_end_location: Option<String>,
    #[serde(default)]
    pub carry_end_location: Option<String>,
    #[serde(default)]
    pub pass_recipient: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Goalkeeper,
    Defender,
    Midfielder,
    Attacker,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Goalkeeper,
        Role::Defender,
        Role::Midfielder,
        Role::Attacker,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Goalkeeper => "Goalkeeper",
            Role::Defender => "Defender",
            Role::Midfielder => "Midfielder",
            Role::Attacker => "Attacker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cleaned event: player id filled, coordinates parsed, position mapped.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub match_id: u64,
    pub index: u64,
    pub event_type: String,
    pub team: String,
    pub player: Option<String>,
    pub player_id: String,
    pub position: Option<String>,
    pub role: Option<Role>,
    pub shot_xg: Option<f64>,
    pub shot_outcome: Option<String>,
    pub location: Option<Point>,
    pub pass_end_location: Option<Point>,
    pub carry_end_location: Option<Point>,
    pub pass_recipient: Option<String>,
}

impl Event {
    pub fn is_shot(&self) -> bool {
        self.event_type == SHOT_TYPE
    }
}

/// An event with its encoded type and the `type_id ⧺ player_id` token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizedEvent {
    pub event: Event,
    pub type_id: String,
    pub token: String,
}
