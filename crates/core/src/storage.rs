//! Storage traits: the extension's key-value area and the role store on top of it.
//!
//! Every execution context of the extension (editor, popup, content script)
//! shares one storage area. A write from any of them is broadcast to all
//! subscribers, which is how the selector UI learns about roles saved
//! elsewhere without polling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::role::{Role, RoleDraft};

/// Notification emitted after a successful write to a storage area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    pub key: String,

    /// The value after the write; `None` when the key was removed
    pub new_value: Option<serde_json::Value>,
}

/// A shared key-value storage area.
///
/// Implementations: in-memory (tests, ephemeral sessions) and JSON file.
#[async_trait]
pub trait StorageArea: Send + Sync {
    /// The backend name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// Read the value under `key`, `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Write `value` under `key` and notify subscribers.
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;

    /// Remove `key` and notify subscribers.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Receive every subsequent change, whichever context made it.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

/// The role persistence contract.
///
/// All operations are asynchronous and may fail transiently. Callers on the
/// injection side treat read failures as "no roles".
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// All roles in stored order. An absent record is an empty sequence.
    async fn get_all(&self) -> Result<Vec<Role>, StoreError>;

    /// A single role by ID.
    async fn get(&self, id: &str) -> Result<Option<Role>, StoreError>;

    /// Create (absent or unknown ID) or fully replace (known ID) a role.
    async fn save(&self, draft: RoleDraft) -> Result<Role, StoreError>;

    /// Delete a role. Returns `false` if no role had that ID.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Overwrite the whole sequence (bulk import).
    async fn replace_all(&self, roles: Vec<Role>) -> Result<(), StoreError>;

    /// Receive the full role sequence after every change.
    fn subscribe(&self) -> RoleSubscription;
}

/// A stream of role sequences, filtered from raw storage changes.
pub struct RoleSubscription {
    key: String,
    receiver: broadcast::Receiver<StorageChange>,
}

impl RoleSubscription {
    pub fn new(key: impl Into<String>, receiver: broadcast::Receiver<StorageChange>) -> Self {
        Self {
            key: key.into(),
            receiver,
        }
    }

    /// Wait for the next change to the roles record.
    ///
    /// Returns `None` once the storage area is gone. Unparsable values are
    /// logged and skipped.
    pub async fn next(&mut self) -> Option<Vec<Role>> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.key == self.key => {
                    let Some(value) = change.new_value else {
                        return Some(Vec::new());
                    };
                    match serde_json::from_value::<Vec<Role>>(value) {
                        Ok(roles) => return Some(roles),
                        Err(e) => {
                            warn!(key = %self.key, error = %e, "Ignoring malformed roles update");
                        }
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Role subscription lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
