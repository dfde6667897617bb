//! Connection profile model representing a saved database connection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::group::ROOT_GROUP_ID;

/// Provider used when a profile does not name one
pub const DEFAULT_PROVIDER: &str = "MSSQL";

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

const fn default_group_id() -> Uuid {
    ROOT_GROUP_ID
}

/// A saved database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    /// Unique identifier for the profile
    pub id: Uuid,
    /// Optional display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_name: Option<String>,
    /// Server host name or address
    pub server_name: String,
    /// Database to open (None for the server default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    /// Login user name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Data provider name
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Group this profile belongs to
    #[serde(default = "default_group_id")]
    pub group_id: Uuid,
    /// Timestamp when the profile was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the profile was last modified
    pub updated_at: DateTime<Utc>,
}

impl ConnectionProfile {
    /// Creates a new profile in the root group
    #[must_use]
    pub fn new(server_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            connection_name: None,
            server_name: server_name.into(),
            database_name: None,
            user_name: None,
            provider: default_provider(),
            group_id: ROOT_GROUP_ID,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the database name
    #[must_use]
    pub fn with_database(mut self, database_name: impl Into<String>) -> Self {
        self.database_name = Some(database_name.into());
        self
    }

    /// Sets the user name
    #[must_use]
    pub fn with_user(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    /// Sets the display title
    #[must_use]
    pub fn with_connection_name(mut self, connection_name: impl Into<String>) -> Self {
        self.connection_name = Some(connection_name.into());
        self
    }

    /// Sets the provider
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Sets the group for this profile
    #[must_use]
    pub const fn with_group(mut self, group_id: Uuid) -> Self {
        self.group_id = group_id;
        self
    }

    /// Updates the `updated_at` timestamp to now
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Name shown in the tree: the title if set, otherwise `server` or
    /// `server, database`
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(title) = self.connection_name.as_deref().filter(|t| !t.is_empty()) {
            return title.to_string();
        }
        match self.database_name.as_deref().filter(|d| !d.is_empty()) {
            Some(database) => format!("{}, {database}", self.server_name),
            None => self.server_name.clone(),
        }
    }

    /// Identifies the connection target independently of the profile id
    ///
    /// Two profiles with the same key point at the same server, database and
    /// login; a group may hold at most one of them.
    #[must_use]
    pub fn connection_info_id(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.provider.to_lowercase(),
            self.server_name.to_lowercase(),
            self.database_name.as_deref().unwrap_or_default().to_lowercase(),
            self.user_name.as_deref().unwrap_or_default()
        )
    }
}
