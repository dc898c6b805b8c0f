pub mod detect;
pub mod format;
pub mod onboard;
pub mod roles;
pub mod simulate;
pub mod status;

use rolecast_config::AppConfig;
use rolecast_core::Error;
use rolecast_core::role::Role;
use rolecast_core::storage::RoleStore;
use rolecast_store::{KvRoleStore, open_role_store};

pub(crate) fn load_config() -> rolecast_core::Result<AppConfig> {
    AppConfig::load().map_err(|e| Error::Config {
        message: format!("Failed to load config: {e}"),
    })
}

/// A role by ID, or `RoleNotFound`.
pub(crate) async fn find_role(store: &dyn RoleStore, id: &str) -> rolecast_core::Result<Role> {
    store
        .get(id)
        .await?
        .ok_or_else(|| Error::RoleNotFound { id: id.to_string() })
}

pub(crate) fn open_store(config: &AppConfig) -> KvRoleStore {
    open_role_store(&config.storage)
}
