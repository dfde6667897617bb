//! Configuration manager for TOML file operations
//!
//! This module provides the `ConfigManager` which handles loading and saving
//! configuration files for connections, groups, the recently used list and
//! application settings.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::error::{ConfigError, ConfigResult};
use crate::group::{is_root, GroupTree};
use crate::models::{ConnectionGroup, ConnectionProfile};

use super::settings::AppSettings;

/// File names for configuration files
const CONNECTIONS_FILE: &str = "connections.toml";
const GROUPS_FILE: &str = "groups.toml";
const RECENT_FILE: &str = "recent.toml";
const CONFIG_FILE: &str = "config.toml";

/// Wrapper for serializing a list of connections
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct ConnectionsFile {
    #[serde(default)]
    connections: Vec<ConnectionProfile>,
}

/// Wrapper for serializing a list of groups
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct GroupsFile {
    #[serde(default)]
    groups: Vec<ConnectionGroup>,
}

/// Wrapper for serializing the recently used connection ids
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct RecentFile {
    #[serde(default)]
    recent: Vec<Uuid>,
}

/// Configuration manager for `DbTree`
///
/// Handles loading and saving configuration files in TOML format.
/// Configuration is stored in `~/.config/dbtree/` by default.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// Base directory for configuration files
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a new `ConfigManager` with the default configuration directory
    ///
    /// The default directory is `~/.config/dbtree/`
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> ConfigResult<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound(PathBuf::from("~/.config")))?
            .join("dbtree");
        Ok(Self { config_dir })
    }

    /// Creates a new `ConfigManager` with a custom configuration directory
    ///
    /// This is useful for testing or non-standard configurations.
    #[must_use]
    pub const fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Returns the configuration directory path
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Ensures the configuration directory exists
    ///
    /// Creates the directory and any parent directories if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_config_dir(&self) -> ConfigResult<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir).map_err(|e| {
                ConfigError::Write(format!(
                    "Failed to create config directory {}: {}",
                    self.config_dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    // ========== Connections ==========

    /// Loads connection profiles from the configuration file
    ///
    /// Returns an empty vector if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_connections(&self) -> ConfigResult<Vec<ConnectionProfile>> {
        let path = self.config_dir.join(CONNECTIONS_FILE);
        Self::load_toml_file::<ConnectionsFile>(&path).map(|f| f.connections)
    }

    /// Saves connection profiles to the configuration file
    ///
    /// Creates the configuration directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_connections(&self, connections: &[ConnectionProfile]) -> ConfigResult<()> {
        self.ensure_config_dir()?;
        let path = self.config_dir.join(CONNECTIONS_FILE);
        let file = ConnectionsFile {
            connections: connections.to_vec(),
        };
        Self::save_toml_file(&path, &file)
    }

    // ========== Groups ==========

    /// Loads connection groups from the configuration file
    ///
    /// Returns an empty vector if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_groups(&self) -> ConfigResult<Vec<ConnectionGroup>> {
        let path = self.config_dir.join(GROUPS_FILE);
        Self::load_toml_file::<GroupsFile>(&path).map(|f| f.groups)
    }

    /// Saves connection groups to the configuration file
    ///
    /// Creates the configuration directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_groups(&self, groups: &[ConnectionGroup]) -> ConfigResult<()> {
        self.ensure_config_dir()?;
        let path = self.config_dir.join(GROUPS_FILE);
        let file = GroupsFile {
            groups: groups.to_vec(),
        };
        Self::save_toml_file(&path, &file)
    }

    // ========== Group Tree ==========

    /// Loads groups and connections and assembles them into a tree
    ///
    /// # Errors
    ///
    /// Returns an error if either file exists but cannot be parsed.
    pub fn load_tree(&self) -> ConfigResult<GroupTree> {
        let groups = self.load_groups()?;
        let connections = self.load_connections()?;
        Ok(GroupTree::from_parts(groups, connections))
    }

    /// Saves the groups and connections of a tree
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written.
    pub fn save_tree(&self, tree: &GroupTree) -> ConfigResult<()> {
        let (groups, connections) = tree.to_parts();
        self.save_groups(&groups)?;
        self.save_connections(&connections)?;
        debug!(
            groups = groups.len(),
            connections = connections.len(),
            "Saved group tree"
        );
        Ok(())
    }

    // ========== Recently Used ==========

    /// Loads the recently used connection ids, most recent first
    ///
    /// Returns an empty list if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_recent(&self) -> ConfigResult<Vec<Uuid>> {
        let path = self.config_dir.join(RECENT_FILE);
        Self::load_toml_file::<RecentFile>(&path).map(|f| f.recent)
    }

    /// Saves the recently used connection ids
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_recent(&self, recent: &[Uuid]) -> ConfigResult<()> {
        self.ensure_config_dir()?;
        let path = self.config_dir.join(RECENT_FILE);
        let file = RecentFile {
            recent: recent.to_vec(),
        };
        Self::save_toml_file(&path, &file)
    }

    // ========== Application Settings ==========

    /// Loads application settings from the configuration file
    ///
    /// Returns default settings if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or holds
    /// invalid values.
    pub fn load_settings(&self) -> ConfigResult<AppSettings> {
        let path = self.config_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(AppSettings::default());
        }
        let settings: AppSettings = Self::load_toml_file(&path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Saves application settings to the configuration file
    ///
    /// Creates the configuration directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the file cannot be
    /// written.
    pub fn save_settings(&self, settings: &AppSettings) -> ConfigResult<()> {
        settings.validate()?;
        self.ensure_config_dir()?;
        let path = self.config_dir.join(CONFIG_FILE);
        Self::save_toml_file(&path, settings)
    }

    // ========== Generic TOML Operations ==========

    /// Loads and parses a TOML file
    ///
    /// Returns the default value if the file doesn't exist.
    fn load_toml_file<T>(path: &Path) -> ConfigResult<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if !path.exists() {
            return Ok(T::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read {}: {}", path.display(), e)))?;

        Self::parse_toml(&content, path)
    }

    /// Parses TOML content
    fn parse_toml<T>(content: &str, path: &Path) -> ConfigResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        toml::from_str(content).map_err(|e| {
            ConfigError::Deserialize(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Saves data to a TOML file
    fn save_toml_file<T>(path: &Path, data: &T) -> ConfigResult<()>
    where
        T: serde::Serialize,
    {
        let content = toml::to_string_pretty(data)
            .map_err(|e| ConfigError::Serialize(format!("Failed to serialize: {e}")))?;

        fs::write(path, content)
            .map_err(|e| ConfigError::Write(format!("Failed to write {}: {}", path.display(), e)))
    }

    // ========== Validation ==========

    /// Validates a connection profile
    ///
    /// # Errors
    ///
    /// Returns an error if the profile is invalid.
    pub fn validate_connection(connection: &ConnectionProfile) -> ConfigResult<()> {
        if connection.server_name.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "server_name".to_string(),
                reason: "Server name cannot be empty".to_string(),
            });
        }

        if connection.provider.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "provider".to_string(),
                reason: "Provider cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Validates a connection group
    ///
    /// # Errors
    ///
    /// Returns an error if the group is invalid.
    pub fn validate_group(group: &ConnectionGroup) -> ConfigResult<()> {
        if group.name.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "name".to_string(),
                reason: "Group name cannot be empty".to_string(),
            });
        }

        if is_root(Some(group.name.trim())) {
            return Err(ConfigError::Validation {
                field: "name".to_string(),
                reason: "Group name is reserved for the root group".to_string(),
            });
        }

        Ok(())
    }

    /// Validates all connections and returns errors for invalid ones
    #[must_use]
    pub fn validate_connections(connections: &[ConnectionProfile]) -> Vec<(usize, ConfigError)> {
        connections
            .iter()
            .enumerate()
            .filter_map(|(i, conn)| Self::validate_connection(conn).err().map(|e| (i, e)))
            .collect()
    }

    /// Validates all groups and returns errors for invalid ones
    #[must_use]
    pub fn validate_groups(groups: &[ConnectionGroup]) -> Vec<(usize, ConfigError)> {
        groups
            .iter()
            .enumerate()
            .filter_map(|(i, group)| Self::validate_group(group).err().map(|e| (i, e)))
            .collect()
    }
}
