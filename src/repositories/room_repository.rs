use std::sync::Arc;

use async_trait::async_trait;

use crate::models::room::Room;
use crate::repositories::kv_store::{KeyValueStore, KeyValueStoreError};

fn room_key(room_id: &str) -> String {
    format!("arena:room:{}", room_id)
}

#[derive(Debug)]
pub enum RoomRepositoryError {
    Serialization(String),
    Store(String),
}

impl std::fmt::Display for RoomRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomRepositoryError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            RoomRepositoryError::Store(msg) => write!(f, "Store error: {}", msg),
        }
    }
}

impl std::error::Error for RoomRepositoryError {}

impl From<KeyValueStoreError> for RoomRepositoryError {
    fn from(error: KeyValueStoreError) -> Self {
        match error {
            KeyValueStoreError::Serialization(msg) => RoomRepositoryError::Serialization(msg),
            KeyValueStoreError::Store(msg) => RoomRepositoryError::Store(msg),
        }
    }
}

/// Storage access for the shared per-match room record. Each room lives under
/// its own key and is always read and rewritten whole.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn get_room(&self, room_id: &str) -> Result<Option<Room>, RoomRepositoryError>;
    async fn put_room(&self, room: &Room) -> Result<(), RoomRepositoryError>;
}

pub struct KvRoomRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvRoomRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RoomRepository for KvRoomRepository {
    async fn get_room(&self, room_id: &str) -> Result<Option<Room>, RoomRepositoryError> {
        match self.store.get(&room_key(room_id)).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| RoomRepositoryError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    async fn put_room(&self, room: &Room) -> Result<(), RoomRepositoryError> {
        let value = serde_json::to_value(room)
            .map_err(|e| RoomRepositoryError::Serialization(e.to_string()))?;
        self.store.set(&room_key(&room.id), value).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::kv_store::tests::InMemoryKeyValueStore;

    #[tokio::test]
    async fn missing_room_is_none() {
        let repository = KvRoomRepository::new(Arc::new(InMemoryKeyValueStore::new()));
        assert!(repository.get_room("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn room_round_trips() {
        let repository = KvRoomRepository::new(Arc::new(InMemoryKeyValueStore::new()));
        let room = Room::new('F', ("id-a", "Alice"), ("id-b", "Bob"));

        repository.put_room(&room).await.unwrap();

        let loaded = repository.get_room(&room.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, room.id);
        assert_eq!(loaded.letter, 'F');
        assert_eq!(loaded.players, room.players);
    }
}
