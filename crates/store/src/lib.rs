//! Role storage implementations for Rolecast.
//!
//! - [`MemoryArea`]: ephemeral key-value area (tests, `memory` backend)
//! - [`FileArea`]: JSON file key-value area
//! - [`KvRoleStore`]: the role store, kept under one well-known key
//! - [`spawn_role_responder`]: answers "get roles" requests from other contexts

pub mod file_area;
pub mod memory_area;
pub mod messaging;
pub mod role_store;

pub use file_area::FileArea;
pub use memory_area::MemoryArea;
pub use messaging::{RoleRequester, spawn_role_responder};
pub use role_store::KvRoleStore;

use std::sync::Arc;

use rolecast_config::StorageConfig;
use rolecast_core::storage::StorageArea;

/// Open the storage area selected by configuration.
pub fn open_area(config: &StorageConfig) -> Arc<dyn StorageArea> {
    match config.backend.as_str() {
        "memory" => Arc::new(MemoryArea::new()),
        _ => Arc::new(FileArea::new(config.file_path())),
    }
}

/// Open the role store described by configuration.
pub fn open_role_store(config: &StorageConfig) -> KvRoleStore {
    KvRoleStore::new(open_area(config), config.key.clone())
}
