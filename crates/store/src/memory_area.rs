//! In-memory storage area: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use rolecast_core::error::StoreError;
use rolecast_core::storage::{StorageArea, StorageChange};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

/// A storage area that keeps values in a map.
///
/// Clones share the same map and change channel, so a clone handed to a
/// second "context" observes the first one's writes.
#[derive(Clone)]
pub struct MemoryArea {
    values: Arc<RwLock<HashMap<String, serde_json::Value>>>,
    changes: broadcast::Sender<StorageChange>,
}

impl MemoryArea {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            values: Arc::new(RwLock::new(HashMap::new())),
            changes,
        }
    }
}

impl Default for MemoryArea {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageArea for MemoryArea {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.clone());
        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            new_value: Some(value),
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let removed = self.values.write().await.remove(key).is_some();
        if removed {
            let _ = self.changes.send(StorageChange {
                key: key.to_string(),
                new_value: None,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
