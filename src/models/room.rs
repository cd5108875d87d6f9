use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One player's answers, keyed by category.
pub type AnswerSheet = HashMap<String, String>;

/// One player's graded answers, keyed by category.
pub type VerdictSheet = HashMap<String, CategoryVerdict>;

/// The judge's ruling for a single category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CategoryVerdict {
    pub valid: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Playing,
    Done,
}

/// The shared record for one online match between two players.
///
/// Created exactly once, by whichever client performed the pairing. In the
/// happy path it is mutated twice afterwards: each player writes only its own
/// `answers[name]` and `validation[name]` entry and never touches the
/// opponent's.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Room {
    pub id: String,
    pub letter: char,
    pub status: RoomStatus,
    /// Display names, existing waiter first, joining caller second. The order
    /// matches `player_ids` and is stable for the life of the room.
    pub players: [String; 2],
    pub player_ids: [String; 2],
    pub answers: HashMap<String, AnswerSheet>,
    pub validation: HashMap<String, VerdictSheet>,
}

impl Room {
    /// `waiter` is the player that was already in the queue, `joiner` the one
    /// whose join created the room.
    pub fn new(letter: char, waiter: (&str, &str), joiner: (&str, &str)) -> Self {
        let (waiter_id, waiter_name) = waiter;
        let (joiner_id, joiner_name) = joiner;
        Room {
            id: Uuid::new_v4().to_string(),
            letter,
            status: RoomStatus::Playing,
            players: [waiter_name.to_string(), joiner_name.to_string()],
            player_ids: [waiter_id.to_string(), joiner_id.to_string()],
            answers: HashMap::new(),
            validation: HashMap::new(),
        }
    }

    pub fn has_player_id(&self, player_id: &str) -> bool {
        self.player_ids.iter().any(|id| id == player_id)
    }

    /// Display name of the other seat, if `my_name` occupies one of them.
    pub fn opponent_of(&self, my_name: &str) -> Option<&str> {
        self.players
            .iter()
            .map(String::as_str)
            .find(|name| *name != my_name)
    }
}
