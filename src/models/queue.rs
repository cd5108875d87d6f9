use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::room::Room;

/// A waiting player's ticket in the shared matchmaking queue.
///
/// Every client racing on the queue reads and rewrites the whole list, so an
/// entry has no single owner; the `id` is the only thing that distinguishes
/// the caller from everyone else.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueEntry {
    pub id: String,
    pub name: String,
    pub joined_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn new(name: &str) -> Self {
        QueueEntry {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            joined_at: Utc::now(),
        }
    }

    /// Age of the entry relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.joined_at
    }
}

/// Result of a single attempt to enter the queue.
#[derive(Debug, Clone)]
pub enum PairingOutcome {
    /// An opponent was already waiting; the caller created the room and both
    /// sides play in it.
    Matched(Room),
    /// Nobody was waiting. The caller's entry is now in the queue and it must
    /// poll until some later joiner matches with it.
    Waiting,
}

impl PairingOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, PairingOutcome::Matched(_))
    }
}
