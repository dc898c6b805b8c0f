//! Role store over a shared key-value area.
//!
//! The whole role sequence lives under one well-known key. Every operation
//! re-reads that record, so a store in one context always sees what another
//! context saved. Read-modify-write cycles within a context are serialized;
//! across contexts the last write wins.

use async_trait::async_trait;
use chrono::Utc;
use rolecast_core::error::StoreError;
use rolecast_core::role::{Role, RoleDraft};
use rolecast_core::storage::{RoleStore, RoleSubscription, StorageArea};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

pub struct KvRoleStore {
    area: Arc<dyn StorageArea>,
    key: String,
    write_lock: Mutex<()>,
}

impl KvRoleStore {
    pub fn new(area: Arc<dyn StorageArea>, key: impl Into<String>) -> Self {
        Self {
            area,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    async fn read_roles(&self) -> Result<Vec<Role>, StoreError> {
        match self.area.get(&self.key).await? {
            None => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                StoreError::Serialization(format!("roles record under '{}': {e}", self.key))
            }),
        }
    }

    async fn write_roles(&self, roles: &[Role]) -> Result<(), StoreError> {
        let value =
            serde_json::to_value(roles).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.area.set(&self.key, value).await
    }
}

fn fresh_id(existing: &[Role]) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if !existing.iter().any(|r| r.id == id) {
            return id;
        }
    }
}

#[async_trait]
impl RoleStore for KvRoleStore {
    async fn get_all(&self) -> Result<Vec<Role>, StoreError> {
        self.read_roles().await
    }

    async fn get(&self, id: &str) -> Result<Option<Role>, StoreError> {
        Ok(self.read_roles().await?.into_iter().find(|r| r.id == id))
    }

    async fn save(&self, mut draft: RoleDraft) -> Result<Role, StoreError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("name must not be empty".into()));
        }
        draft.name = name.to_string();

        let _guard = self.write_lock.lock().await;
        let mut roles = self.read_roles().await?;
        let now = Utc::now();

        let existing = draft
            .id
            .as_deref()
            .and_then(|id| roles.iter().position(|r| r.id == id));

        let role = match existing {
            Some(index) => {
                let previous = &roles[index];
                let id = previous.id.clone();
                let created_at = previous.created_at;
                let updated_at = now.max(previous.updated_at);
                let role = draft.into_role(id, created_at, updated_at);
                roles[index] = role.clone();
                role
            }
            None => {
                let role = draft.into_role(fresh_id(&roles), now, now);
                roles.push(role.clone());
                role
            }
        };

        self.write_roles(&roles).await?;
        if existing.is_some() {
            debug!(role_id = %role.id, "Role updated");
        } else {
            info!(role_id = %role.id, name = %role.name, "Role created");
        }
        Ok(role)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut roles = self.read_roles().await?;
        let len_before = roles.len();
        roles.retain(|r| r.id != id);
        if roles.len() == len_before {
            return Ok(false);
        }
        self.write_roles(&roles).await?;
        info!(role_id = %id, "Role deleted");
        Ok(true)
    }

    async fn replace_all(&self, roles: Vec<Role>) -> Result<(), StoreError> {
        let mut seen = HashSet::new();
        for role in &roles {
            if role.id.is_empty() {
                return Err(StoreError::Validation("role id must not be empty".into()));
            }
            if role.name.trim().is_empty() {
                return Err(StoreError::Validation(format!(
                    "role '{}' has an empty name",
                    role.id
                )));
            }
            if !seen.insert(role.id.as_str()) {
                return Err(StoreError::Validation(format!(
                    "duplicate role id '{}'",
                    role.id
                )));
            }
        }

        let _guard = self.write_lock.lock().await;
        self.write_roles(&roles).await?;
        info!(count = roles.len(), "Roles replaced");
        Ok(())
    }

    fn subscribe(&self) -> RoleSubscription {
        RoleSubscription::new(self.key.clone(), self.area.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_area::MemoryArea;
    use rolecast_core::storage::StorageChange;
    use serde_json::json;
    use tokio::sync::broadcast;

    fn store() -> KvRoleStore {
        KvRoleStore::new(Arc::new(MemoryArea::new()), "roles")
    }

    /// An area whose writes always fail.
    struct ReadOnlyArea {
        inner: MemoryArea,
    }

    #[async_trait]
    impl StorageArea for ReadOnlyArea {
        fn name(&self) -> &str {
            "read_only"
        }

        async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
            self.inner.get(key).await
        }

        async fn set(&self, _key: &str, _value: serde_json::Value) -> Result<(), StoreError> {
            Err(StoreError::Write("quota exceeded".into()))
        }

        async fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Write("quota exceeded".into()))
        }

        fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
            self.inner.subscribe()
        }
    }

    #[tokio::test]
    async fn absent_record_is_empty() {
        assert!(store().get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_creates_with_fresh_id_and_timestamps() {
        let store = store();
        let role = store.save(RoleDraft::named("Architect")).await.unwrap();

        assert!(!role.id.is_empty());
        assert_eq!(role.created_at, role.updated_at);
        assert_eq!(store.get_all().await.unwrap(), vec![role]);
    }

    #[tokio::test]
    async fn save_with_unknown_id_creates_new_entry() {
        let store = store();
        let draft = RoleDraft {
            id: Some("made-up".into()),
            ..RoleDraft::named("Ghost")
        };
        let role = store.save(draft).await.unwrap();

        assert_ne!(role.id, "made-up");
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_with_known_id_replaces_and_keeps_created_at() {
        let store = store();
        let first = store
            .save(RoleDraft::named("Writer").with_area("Docs"))
            .await
            .unwrap();

        let mut draft = first.to_draft();
        draft.name = "Senior Writer".into();
        draft.area = None;
        let second = store.save(draft).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(second.area, None);

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Senior Writer");
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let store = store();
        let a = store.save(RoleDraft::named("A")).await.unwrap();
        let b = store.save(RoleDraft::named("B")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn blank_name_rejected() {
        let err = store().save(RoleDraft::named("   ")).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_missing_returns_false_and_leaves_sequence() {
        let store = store();
        let kept = store.save(RoleDraft::named("Kept")).await.unwrap();

        assert!(!store.delete("nope").await.unwrap());
        assert_eq!(store.get_all().await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn delete_existing_removes_it() {
        let store = store();
        let role = store.save(RoleDraft::named("Temp")).await.unwrap();
        assert!(store.delete(&role.id).await.unwrap());
        assert!(store.get(&role.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn write_failure_is_surfaced_and_not_committed() {
        let inner = MemoryArea::new();
        inner.set("roles", json!([])).await.unwrap();
        let store = KvRoleStore::new(Arc::new(ReadOnlyArea { inner }), "roles");

        let err = store.save(RoleDraft::named("Lost")).await.unwrap_err();
        assert!(matches!(err, StoreError::Write(_)));
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_record_is_a_read_failure() {
        let area = MemoryArea::new();
        area.set("roles", json!({"not": "a list"})).await.unwrap();
        let store = KvRoleStore::new(Arc::new(area), "roles");

        let err = store.get_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[tokio::test]
    async fn subscribers_in_other_contexts_see_saves() {
        let area = MemoryArea::new();
        let editor = KvRoleStore::new(Arc::new(area.clone()), "roles");
        let content_script = KvRoleStore::new(Arc::new(area), "roles");
        let mut sub = content_script.subscribe();

        editor.save(RoleDraft::named("Analyst")).await.unwrap();

        let roles = sub.next().await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "Analyst");
    }

    #[tokio::test]
    async fn replace_all_rejects_duplicates() {
        let store = store();
        let role = RoleDraft::named("Twin").into_role("same".into(), Utc::now(), Utc::now());
        let err = store
            .replace_all(vec![role.clone(), role])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
        assert!(store.get_all().await.unwrap().is_empty());
    }
}
