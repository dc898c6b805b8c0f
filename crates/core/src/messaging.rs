//! Cross-context messages exchanged between extension contexts.
//!
//! A content script asks the background context for the current roles and
//! gets back the persisted sequence (empty on failure).

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// A request sent from one extension context to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ExtensionRequest {
    /// "Give me the current roles"
    GetRoles,
}

/// The answer to an [`ExtensionRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtensionResponse {
    Roles { roles: Vec<Role> },
}

impl ExtensionResponse {
    pub fn roles(roles: Vec<Role>) -> Self {
        ExtensionResponse::Roles { roles }
    }

    pub fn into_roles(self) -> Vec<Role> {
        match self {
            ExtensionResponse::Roles { roles } => roles,
        }
    }
}
