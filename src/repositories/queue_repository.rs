use std::sync::Arc;

use async_trait::async_trait;

use crate::models::queue::QueueEntry;
use crate::repositories::kv_store::{KeyValueStore, KeyValueStoreError};

/// The singleton key every client's queue reads and writes go through.
pub const QUEUE_KEY: &str = "arena:queue:v1";

fn player_room_key(player_id: &str) -> String {
    format!("arena:player-room:{}", player_id)
}

#[derive(Debug)]
pub enum QueueRepositoryError {
    Serialization(String),
    Store(String),
}

impl std::fmt::Display for QueueRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueRepositoryError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            QueueRepositoryError::Store(msg) => write!(f, "Store error: {}", msg),
        }
    }
}

impl std::error::Error for QueueRepositoryError {}

impl From<KeyValueStoreError> for QueueRepositoryError {
    fn from(error: KeyValueStoreError) -> Self {
        match error {
            KeyValueStoreError::Serialization(msg) => QueueRepositoryError::Serialization(msg),
            KeyValueStoreError::Store(msg) => QueueRepositoryError::Store(msg),
        }
    }
}

/// Storage access for the shared waiting list and the per-player room
/// pointer a matcher leaves behind for the opponent it pulled out of the
/// queue.
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// The whole current queue. A missing key is an empty queue.
    async fn load_queue(&self) -> Result<Vec<QueueEntry>, QueueRepositoryError>;

    /// Fully rewrite the queue. Raciness with other writers is accepted:
    /// a lost rewrite degrades to "my change didn't happen".
    async fn save_queue(&self, entries: &[QueueEntry]) -> Result<(), QueueRepositoryError>;

    /// Room id assigned to `player_id` at match time, if any.
    async fn assigned_room(&self, player_id: &str) -> Result<Option<String>, QueueRepositoryError>;

    /// Point `player_id` at its room so a removed-but-unmatched-looking
    /// client can find it on its next poll.
    async fn assign_room(&self, player_id: &str, room_id: &str)
        -> Result<(), QueueRepositoryError>;
}

pub struct KvQueueRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvQueueRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl QueueRepository for KvQueueRepository {
    async fn load_queue(&self) -> Result<Vec<QueueEntry>, QueueRepositoryError> {
        match self.store.get(QUEUE_KEY).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| QueueRepositoryError::Serialization(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    async fn save_queue(&self, entries: &[QueueEntry]) -> Result<(), QueueRepositoryError> {
        let value = serde_json::to_value(entries)
            .map_err(|e| QueueRepositoryError::Serialization(e.to_string()))?;
        self.store.set(QUEUE_KEY, value).await?;
        Ok(())
    }

    async fn assigned_room(&self, player_id: &str) -> Result<Option<String>, QueueRepositoryError> {
        match self.store.get(&player_room_key(player_id)).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| QueueRepositoryError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    async fn assign_room(
        &self,
        player_id: &str,
        room_id: &str,
    ) -> Result<(), QueueRepositoryError> {
        self.store
            .set(&player_room_key(player_id), serde_json::json!(room_id))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::kv_store::tests::InMemoryKeyValueStore;

    #[tokio::test]
    async fn missing_queue_reads_as_empty() {
        let repository = KvQueueRepository::new(Arc::new(InMemoryKeyValueStore::new()));
        assert!(repository.load_queue().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn queue_round_trips() {
        let repository = KvQueueRepository::new(Arc::new(InMemoryKeyValueStore::new()));
        let entry = QueueEntry::new("Alice");

        repository.save_queue(&[entry.clone()]).await.unwrap();

        let loaded = repository.load_queue().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, entry.id);
        assert_eq!(loaded[0].name, "Alice");
    }

    #[tokio::test]
    async fn room_pointer_round_trips() {
        let repository = KvQueueRepository::new(Arc::new(InMemoryKeyValueStore::new()));

        assert!(repository.assigned_room("p1").await.unwrap().is_none());

        repository.assign_room("p1", "room-7").await.unwrap();
        assert_eq!(
            repository.assigned_room("p1").await.unwrap().as_deref(),
            Some("room-7")
        );
        // A different player's pointer is unaffected
        assert!(repository.assigned_room("p2").await.unwrap().is_none());
    }
}
