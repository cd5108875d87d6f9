use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::room::{AnswerSheet, Room, VerdictSheet};
use crate::repositories::room_repository::RoomRepository;
use crate::services::errors::RoomServiceError;

/// Result exchange over the shared per-match room record.
///
/// The store has no atomic read-modify-write, so submitting is a classic
/// last-writer-wins read-then-write. Each player only ever writes its own
/// sub-keys, and the room is re-read immediately before every write so the
/// opponent's already-landed entries are carried along.
#[derive(Clone)]
pub struct RoomService {
    repository: Arc<dyn RoomRepository>,
}

impl RoomService {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        RoomService { repository }
    }

    /// Allocate and persist a fresh room in the `Playing` state.
    pub async fn create_room(
        &self,
        letter: char,
        waiter: (&str, &str),
        joiner: (&str, &str),
    ) -> Result<Room, RoomServiceError> {
        let room = Room::new(letter, waiter, joiner);
        self.repository.put_room(&room).await?;
        Ok(room)
    }

    pub async fn get_room(&self, room_id: &str) -> Result<Option<Room>, RoomServiceError> {
        Ok(self.repository.get_room(room_id).await?)
    }

    /// Write the caller's answers and verdicts under its own name. A room
    /// that no longer exists is logged and dropped, never fatal.
    pub async fn submit_result(
        &self,
        room_id: &str,
        player_name: &str,
        answers: &AnswerSheet,
        verdicts: &VerdictSheet,
    ) -> Result<(), RoomServiceError> {
        let mut room = match self.repository.get_room(room_id).await? {
            Some(room) => room,
            None => {
                warn!(
                    "Room {} no longer exists; dropping {}'s result",
                    room_id, player_name
                );
                return Ok(());
            }
        };

        room.answers.insert(player_name.to_string(), answers.clone());
        room.validation
            .insert(player_name.to_string(), verdicts.clone());
        self.repository.put_room(&room).await?;

        debug!("Stored {}'s result in room {}", player_name, room_id);
        Ok(())
    }

    /// The opponent's result, once both its answers and verdicts are present.
    pub async fn await_opponent_result(
        &self,
        room_id: &str,
        my_name: &str,
    ) -> Result<Option<(AnswerSheet, VerdictSheet)>, RoomServiceError> {
        let room = match self.repository.get_room(room_id).await? {
            Some(room) => room,
            None => return Ok(None),
        };

        Ok(Self::opponent_result(&room, my_name))
    }

    fn opponent_result(room: &Room, my_name: &str) -> Option<(AnswerSheet, VerdictSheet)> {
        let opponent = room.opponent_of(my_name)?;
        let answers = room.answers.get(opponent)?;
        let verdicts = room.validation.get(opponent)?;
        Some((answers.clone(), verdicts.clone()))
    }
}
