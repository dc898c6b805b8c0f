//! File-backed storage area: a single JSON object mapping key to value.
//!
//! Storage location: `~/.rolecast/storage.json` unless configured otherwise.
//!
//! The file is loaded on open and rewritten on every mutation. A mutation is
//! committed to the in-memory copy only after the file write succeeds, so a
//! failed write leaves both disk and memory at the previous state.

use async_trait::async_trait;
use rolecast_core::error::StoreError;
use rolecast_core::storage::{StorageArea, StorageChange};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, warn};

/// The in-memory copy of the file, or why the file could not be read.
type Loaded = Result<Map<String, Value>, StoreError>;

pub struct FileArea {
    path: PathBuf,
    values: Arc<RwLock<Loaded>>,
    changes: broadcast::Sender<StorageChange>,
}

impl FileArea {
    /// Open a file-based area at the given path.
    ///
    /// If the file exists, values are loaded from it.
    /// If it does not exist, starts empty (file created on first write).
    /// An unreadable file is retried on every access and never overwritten.
    pub fn new(path: PathBuf) -> Self {
        let loaded = Self::load_from_disk(&path);
        if let Ok(values) = &loaded {
            debug!(path = %path.display(), keys = values.len(), "File storage area loaded");
        }
        let (changes, _) = broadcast::channel(64);
        Self {
            path,
            values: Arc::new(RwLock::new(loaded)),
            changes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> Loaded {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Storage file could not be read");
                return Err(StoreError::Read(format!("{}: {e}", path.display())));
            }
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Map<String, Value>>(&content) {
            Ok(values) => Ok(values),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Storage file is corrupted, starting empty");
                Ok(Map::new())
            }
        }
    }

    fn reload_if_unreadable(&self, loaded: &mut Loaded) {
        if loaded.is_err() {
            *loaded = Self::load_from_disk(&self.path);
        }
    }

    /// Write a full snapshot to disk.
    fn flush(&self, values: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Write(format!("Failed to create storage directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(values)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        std::fs::write(&self.path, content)
            .map_err(|e| StoreError::Write(format!("Failed to write storage file: {e}")))
    }
}

fn writable(loaded: &mut Loaded) -> Result<&mut Map<String, Value>, StoreError> {
    loaded.as_mut().map_err(|e| {
        StoreError::Write(format!("storage file is unreadable, not overwriting it ({e})"))
    })
}

#[async_trait]
impl StorageArea for FileArea {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut loaded = self.values.write().await;
        self.reload_if_unreadable(&mut loaded);
        match &*loaded {
            Ok(values) => Ok(values.get(key).cloned()),
            Err(e) => Err(e.clone()),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut loaded = self.values.write().await;
        self.reload_if_unreadable(&mut loaded);
        let values = writable(&mut loaded)?;

        let mut next = values.clone();
        next.insert(key.to_string(), value.clone());
        self.flush(&next)?;
        *values = next;
        drop(loaded);

        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            new_value: Some(value),
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut loaded = self.values.write().await;
        self.reload_if_unreadable(&mut loaded);
        let values = writable(&mut loaded)?;
        if !values.contains_key(key) {
            return Ok(());
        }

        let mut next = values.clone();
        next.remove(key);
        self.flush(&next)?;
        *values = next;
        drop(loaded);

        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            new_value: None,
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
