//! Key-value persistence behind the live document and the saved versions.
//!
//! Default: `MemoryStore` (process-local, used when no Redis is configured
//! and in tests). `RedisStore` keeps the same two keys in Redis so a restart
//! picks up where the last session left off.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::models::resume::Resume;

/// Key holding the live document.
pub const RESUME_KEY: &str = "resumeData";
/// Key holding the saved-version collection.
pub const VERSIONS_KEY: &str = "resumeVersions";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(client: &redis::Client) -> Result<Self, StorageError> {
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Redis persistence connected");
        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }
}

/// Reads the live document. Anything absent or unreadable yields `None` so
/// the caller can fall back to a fresh document.
pub async fn load_resume(store: &dyn KeyValueStore) -> Result<Option<Resume>, StorageError> {
    let Some(raw) = store.get(RESUME_KEY).await? else {
        return Ok(None);
    };
    let value: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Stored resume is not valid JSON, starting fresh: {e}");
            return Ok(None);
        }
    };
    match Resume::merge_with_defaults(value) {
        Ok(resume) => Ok(Some(resume)),
        Err(e) => {
            warn!("Stored resume is unusable, starting fresh: {e}");
            Ok(None)
        }
    }
}

pub async fn save_resume(store: &dyn KeyValueStore, resume: &Resume) -> Result<(), StorageError> {
    store.set(RESUME_KEY, serde_json::to_string(resume)?).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
        store.set("k", "v".to_string()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_load_resume_tolerates_absent_and_garbage() {
        let store = MemoryStore::new();
        assert!(load_resume(&store).await.unwrap().is_none());

        store.set(RESUME_KEY, "{not json".to_string()).await.unwrap();
        assert!(load_resume(&store).await.unwrap().is_none());

        store.set(RESUME_KEY, "42".to_string()).await.unwrap();
        assert!(load_resume(&store).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_resume_merges_older_documents() {
        let store = MemoryStore::new();
        store
            .set(
                RESUME_KEY,
                r#"{"personalInfo":{"fullName":"Ada"},"skills":["Math"]}"#.to_string(),
            )
            .await
            .unwrap();

        let resume = load_resume(&store).await.unwrap().unwrap();
        assert_eq!(resume.personal_info.full_name, "Ada");
        assert!(resume.languages.is_empty());

        save_resume(&store, &resume).await.unwrap();
        let again = load_resume(&store).await.unwrap().unwrap();
        assert_eq!(again, resume);
    }
}
