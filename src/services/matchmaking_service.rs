use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::models::queue::{PairingOutcome, QueueEntry};
use crate::models::room::{Room, RoomStatus};
use crate::models::round::random_letter;
use crate::repositories::queue_repository::QueueRepository;
use crate::services::errors::MatchmakingServiceError;
use crate::services::room_service::RoomService;

/// Client-driven pairing over the shared queue.
///
/// There is no server, so pairing is performed by whichever client happens to
/// observe an opponent first. The queue is reconciled by always re-reading,
/// filtering and fully rewriting the list; a lost rewrite degrades to "my
/// join didn't happen, so I keep waiting" rather than corrupting state.
#[derive(Clone)]
pub struct MatchmakingService {
    queue_repository: Arc<dyn QueueRepository>,
    rooms: RoomService,
    entry_ttl: chrono::Duration,
}

impl MatchmakingService {
    pub fn new(
        queue_repository: Arc<dyn QueueRepository>,
        rooms: RoomService,
        entry_ttl: chrono::Duration,
    ) -> Self {
        MatchmakingService {
            queue_repository,
            rooms,
            entry_ttl,
        }
    }

    /// One attempt to enter matchmaking. Either pairs with a waiting player
    /// (creating the shared room on their behalf) or appends the caller to
    /// the queue.
    pub async fn join(
        &self,
        entry: &QueueEntry,
    ) -> Result<PairingOutcome, MatchmakingServiceError> {
        let now = Utc::now();
        let mut queue = self.queue_repository.load_queue().await?;
        queue.retain(|waiting| waiting.age(now) < self.entry_ttl);

        // Longest-waiting opponent first, never the caller's own entry.
        let opponent = queue
            .iter()
            .filter(|waiting| waiting.id != entry.id)
            .min_by_key(|waiting| waiting.joined_at)
            .cloned();

        if let Some(opponent) = opponent {
            queue.retain(|waiting| waiting.id != opponent.id);
            self.queue_repository.save_queue(&queue).await?;

            let room = self
                .rooms
                .create_room(
                    random_letter(),
                    (&opponent.id, &opponent.name),
                    (&entry.id, &entry.name),
                )
                .await?;

            // Direct pointers so the removed player (and the caller, if its
            // own view of the match is ever lost) can locate the room.
            self.queue_repository
                .assign_room(&opponent.id, &room.id)
                .await?;
            self.queue_repository.assign_room(&entry.id, &room.id).await?;

            info!(
                "Paired {} with waiting player {} in room {} (letter {})",
                entry.name, opponent.name, room.id, room.letter
            );
            Ok(PairingOutcome::Matched(room))
        } else {
            // Nobody waiting. Drop any stale copy of ourselves, then queue up.
            queue.retain(|waiting| waiting.id != entry.id);
            queue.push(entry.clone());
            self.queue_repository.save_queue(&queue).await?;

            debug!("{} is waiting in the queue ({} total)", entry.name, queue.len());
            Ok(PairingOutcome::Waiting)
        }
    }

    /// Whether the caller is still waiting. Absence means another client
    /// matched with us and created a room on our behalf.
    pub async fn poll(&self, my_id: &str) -> Result<bool, MatchmakingServiceError> {
        let queue = self.queue_repository.load_queue().await?;
        Ok(queue.iter().any(|waiting| waiting.id == my_id))
    }

    /// Locate the room another client created for us, via the direct pointer
    /// written at match time. Stale pointers (wrong player, finished room)
    /// are ignored.
    pub async fn find_room_for(
        &self,
        my_id: &str,
    ) -> Result<Option<Room>, MatchmakingServiceError> {
        let room_id = match self.queue_repository.assigned_room(my_id).await? {
            Some(room_id) => room_id,
            None => return Ok(None),
        };

        let room = self.rooms.get_room(&room_id).await?;
        Ok(room
            .filter(|room| room.has_player_id(my_id))
            .filter(|room| room.status == RoomStatus::Playing))
    }

    /// Remove the caller from the queue. Idempotent; a missing entry is fine.
    pub async fn cancel(&self, my_id: &str) -> Result<(), MatchmakingServiceError> {
        let mut queue = self.queue_repository.load_queue().await?;
        queue.retain(|waiting| waiting.id != my_id);
        self.queue_repository.save_queue(&queue).await?;
        Ok(())
    }
}
