//! Connection group model for hierarchical organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named container in the connection hierarchy
///
/// The ordered child lists are owned by the group but are not serialized:
/// they are rebuilt from `parent_id` links and file order when a
/// [`GroupTree`](crate::group::GroupTree) is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionGroup {
    /// Unique identifier for the group
    pub id: Uuid,
    /// Human-readable name for the group (empty for the root)
    pub name: String,
    /// Parent group ID (None only for the root)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    /// Display color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Timestamp when the group was created
    pub created_at: DateTime<Utc>,
    /// Child group IDs in display order
    #[serde(skip)]
    pub(crate) children: Vec<Uuid>,
    /// Connection IDs in display order
    #[serde(skip)]
    pub(crate) connections: Vec<Uuid>,
}

impl ConnectionGroup {
    /// Creates a new detached group
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            parent_id: None,
            color: None,
            description: None,
            created_at: Utc::now(),
            children: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Creates a new group with a parent
    #[must_use]
    pub fn with_parent(name: impl Into<String>, parent_id: Uuid) -> Self {
        let mut group = Self::new(name);
        group.parent_id = Some(parent_id);
        group
    }

    /// Sets the display color
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Child group IDs in display order
    #[must_use]
    pub fn children(&self) -> &[Uuid] {
        &self.children
    }

    /// Connection IDs in display order
    #[must_use]
    pub fn connections(&self) -> &[Uuid] {
        &self.connections
    }

    /// Returns true if the group has neither subgroups nor connections
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.connections.is_empty()
    }
}
