//! Role records: the reusable "persona" profiles a user injects into chat.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted role profile.
///
/// Serialized in camelCase so the stored record matches what every
/// extension context (popup, editor, content script) reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Opaque unique ID, never empty, never reused
    pub id: String,

    /// Display name (non-empty)
    pub name: String,

    /// Grouping label in the selector menu
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    pub tools: Vec<String>,

    #[serde(default)]
    pub constraints: Vec<String>,

    /// How the assistant should behave when acting as this role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<String>,

    /// Free-form additional information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_info: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// The area label, or `None` when absent or blank.
    pub fn area_label(&self) -> Option<&str> {
        self.area.as_deref().map(str::trim).filter(|a| !a.is_empty())
    }

    /// Build a draft carrying this role's id and content, for editing.
    pub fn to_draft(&self) -> RoleDraft {
        RoleDraft {
            id: Some(self.id.clone()),
            name: self.name.clone(),
            area: self.area.clone(),
            description: self.description.clone(),
            skills: self.skills.clone(),
            tools: self.tools.clone(),
            constraints: self.constraints.clone(),
            behavior: self.behavior.clone(),
            more_info: self.more_info.clone(),
        }
    }
}

/// The editable part of a role, as submitted by an editor on save.
///
/// Saving is always a full replace: every mutable field in the draft
/// overwrites the stored one. Timestamps are owned by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDraft {
    /// Existing role ID to replace; `None` or unknown creates a new role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    pub tools: Vec<String>,

    #[serde(default)]
    pub constraints: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_info: Option<String>,
}

impl RoleDraft {
    /// A draft with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    /// Materialize the draft into a role with the given identity and timestamps.
    pub fn into_role(
        self,
        id: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Role {
        Role {
            id,
            name: self.name,
            area: self.area,
            description: self.description,
            skills: self.skills,
            tools: self.tools,
            constraints: self.constraints,
            behavior: self.behavior,
            more_info: self.more_info,
            created_at,
            updated_at,
        }
    }
}
