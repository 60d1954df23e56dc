//! Serde models for the platform API.
//!
//! Field names follow the wire format (camelCase); only the fields the
//! engine reads are modeled, unknown fields are ignored by serde.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Millisecond epoch timestamps as the API sends them.
pub fn millis_to_utc(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_else(Utc::now)
}

/// Public user profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Millisecond epoch of account creation
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Millisecond epoch of last activity
    #[serde(default)]
    pub seen_at: Option<i64>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub tos_violation: bool,
    /// Per-speed rating pools ("blitz", "bullet", ...)
    #[serde(default)]
    pub perfs: HashMap<String, Perf>,
}

/// One rating pool of a user.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Perf {
    #[serde(default)]
    pub games: u32,
    #[serde(default)]
    pub rating: i32,
    /// Rating deviation, if published
    #[serde(default)]
    pub rd: Option<i32>,
    /// Recent progression
    #[serde(default)]
    pub prog: i32,
}

/// One perf's rating history: `points` are `[year, month(0-based), day, rating]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RatingHistory {
    pub name: String,
    pub points: Vec<[i32; 4]>,
}

/// A game from the NDJSON export.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedGame {
    pub id: String,
    #[serde(default)]
    pub rated: bool,
    /// "bullet", "blitz", "rapid", "classical", "correspondence"
    #[serde(default)]
    pub speed: String,
    /// Rating pool the game counted toward
    #[serde(default)]
    pub perf: String,
    /// Millisecond epoch of game start
    pub created_at: i64,
    /// Millisecond epoch of last move
    #[serde(default)]
    pub last_move_at: Option<i64>,
    /// "mate", "resign", "outoftime", "draw", "aborted", ...
    #[serde(default)]
    pub status: String,
    /// "white" or "black"; absent on draws and aborts
    #[serde(default)]
    pub winner: Option<String>,
    pub players: GamePlayers,
    /// Space-separated SAN moves, when requested
    #[serde(default)]
    pub moves: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GamePlayers {
    pub white: GameSide,
    pub black: GameSide,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSide {
    #[serde(default)]
    pub user: Option<LightUser>,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub rating_diff: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LightUser {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl ExportedGame {
    pub fn created(&self) -> DateTime<Utc> {
        millis_to_utc(self.created_at)
    }

    /// Total plies, derived from the move list when present.
    pub fn plies(&self) -> u32 {
        self.moves
            .as_deref()
            .map(|m| m.split_ascii_whitespace().count() as u32)
            .unwrap_or(0)
    }

    /// Which side `username` played, if either.
    pub fn side_of(&self, username: &str) -> Option<Color> {
        let is = |side: &GameSide| {
            side.user
                .as_ref()
                .map(|u| u.name.eq_ignore_ascii_case(username))
                .unwrap_or(false)
        };
        if is(&self.players.white) {
            Some(Color::White)
        } else if is(&self.players.black) {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// Did `username` lose this game? Draws and aborts are not losses.
    pub fn lost_by(&self, username: &str) -> bool {
        match (self.side_of(username), self.winner.as_deref()) {
            (Some(Color::White), Some("black")) => true,
            (Some(Color::Black), Some("white")) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

/// Arena tournament summary. `status`: 10 created, 20 started, 30 finished.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    /// Millisecond epoch
    pub starts_at: i64,
    /// Millisecond epoch, absent before the start is scheduled precisely
    #[serde(default)]
    pub finishes_at: Option<i64>,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub nb_players: u32,
}

impl Tournament {
    pub const STATUS_CREATED: i32 = 10;
    pub const STATUS_STARTED: i32 = 20;
    pub const STATUS_FINISHED: i32 = 30;

    pub fn starts(&self) -> DateTime<Utc> {
        millis_to_utc(self.starts_at)
    }

    pub fn finishes(&self) -> Option<DateTime<Utc>> {
        self.finishes_at.map(millis_to_utc)
    }

    pub fn is_finished(&self) -> bool {
        self.status >= Self::STATUS_FINISHED
    }
}

/// The tournament list endpoint groups by status.
#[derive(Debug, Clone, Deserialize)]
pub struct TournamentIndex {
    #[serde(default)]
    pub created: Vec<Tournament>,
    #[serde(default)]
    pub started: Vec<Tournament>,
    #[serde(default)]
    pub finished: Vec<Tournament>,
}

/// One line of tournament chat. Server announcements have no `user`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLine {
    #[serde(default)]
    pub user: Option<String>,
    pub text: String,
    /// Already shadow-muted by the server
    #[serde(default)]
    pub troll: bool,
    #[serde(default)]
    pub deleted: bool,
}
