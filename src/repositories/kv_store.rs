use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};

#[derive(Debug)]
pub enum KeyValueStoreError {
    Serialization(String),
    Store(String),
}

impl std::fmt::Display for KeyValueStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyValueStoreError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            KeyValueStoreError::Store(msg) => write!(f, "Store error: {}", msg),
        }
    }
}

impl std::error::Error for KeyValueStoreError {}

/// The only primitive the whole protocol is built on: an asynchronous
/// get/set over string keys holding JSON values.
///
/// The store gives no transactions, no compare-and-swap and no ordering
/// guarantees; concurrent writers are last-write-wins. Everything above this
/// trait copes by fully reading, locally mutating and fully rewriting each
/// shared value.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, KeyValueStoreError>;
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), KeyValueStoreError>;
}

/// One DynamoDB item per key: the key as partition key, the JSON value kept
/// as a string payload.
#[derive(Debug, Deserialize, Serialize)]
struct KvRecord {
    record_key: String,
    payload: String,
}

pub struct DynamoDbKeyValueStore {
    pub client: aws_sdk_dynamodb::Client,
    pub table_name: String,
}

impl DynamoDbKeyValueStore {
    pub fn new(client: aws_sdk_dynamodb::Client) -> Self {
        let table_name =
            std::env::var("GAME_TABLE").expect("GAME_TABLE environment variable must be set");
        Self { client, table_name }
    }

    /// Build a store from the ambient AWS environment.
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(aws_sdk_dynamodb::Client::new(&config))
    }
}

#[async_trait]
impl KeyValueStore for DynamoDbKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, KeyValueStoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(
                "record_key",
                aws_sdk_dynamodb::types::AttributeValue::S(key.to_string()),
            )
            .send()
            .await
            .map_err(|e| KeyValueStoreError::Store(e.to_string()))?;

        if let Some(item) = result.item {
            let record: KvRecord =
                from_item(item).map_err(|e| KeyValueStoreError::Serialization(e.to_string()))?;
            let value = serde_json::from_str(&record.payload)
                .map_err(|e| KeyValueStoreError::Serialization(e.to_string()))?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), KeyValueStoreError> {
        let record = KvRecord {
            record_key: key.to_string(),
            payload: value.to_string(),
        };
        let item = to_item(&record).map_err(|e| KeyValueStoreError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| KeyValueStoreError::Store(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Shared in-memory store. Cloning hands out another handle onto the same
    /// map, so two "clients" in a test see each other's writes exactly as two
    /// browser tabs sharing the real store would.
    #[derive(Clone, Default)]
    pub struct InMemoryKeyValueStore {
        entries: Arc<Mutex<HashMap<String, serde_json::Value>>>,
    }

    impl InMemoryKeyValueStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn key_count(&self) -> usize {
            self.entries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl KeyValueStore for InMemoryKeyValueStore {
        async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, KeyValueStoreError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(
            &self,
            key: &str,
            value: serde_json::Value,
        ) -> Result<(), KeyValueStoreError> {
            self.entries.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }
    }

    /// Store whose every call fails, for exercising the degraded paths.
    pub struct UnreachableKeyValueStore;

    #[async_trait]
    impl KeyValueStore for UnreachableKeyValueStore {
        async fn get(&self, _key: &str) -> Result<Option<serde_json::Value>, KeyValueStoreError> {
            Err(KeyValueStoreError::Store("store unreachable".to_string()))
        }

        async fn set(
            &self,
            _key: &str,
            _value: serde_json::Value,
        ) -> Result<(), KeyValueStoreError> {
            Err(KeyValueStoreError::Store("store unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn reads_back_what_was_written() {
        let store = InMemoryKeyValueStore::new();
        store
            .set("k", serde_json::json!({"n": 1}))
            .await
            .unwrap();
        let value = store.get("k").await.unwrap().unwrap();
        assert_eq!(value["n"], 1);
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn last_write_wins() {
        let store = InMemoryKeyValueStore::new();
        let other_handle = store.clone();
        store.set("k", serde_json::json!(1)).await.unwrap();
        other_handle.set("k", serde_json::json!(2)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().unwrap(), serde_json::json!(2));
    }
}
