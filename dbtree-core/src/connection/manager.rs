//! Connection manager for CRUD operations
//!
//! This module provides the `ConnectionManager` which handles creating, reading,
//! updating, and deleting connection profiles and groups with persistence
//! through `ConfigManager`, and tracks which profiles are connected or were
//! recently used.

use std::collections::HashSet;

use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ConfigManager;
use crate::error::{ConfigResult, GroupError};
use crate::filter::{filter_tree_view, search_connections, ConnectionStatus, TreeView};
use crate::group::GroupTree;
use crate::models::{ConnectionGroup, ConnectionProfile};

/// Manager for connection and group CRUD operations
///
/// Holds the group tree in memory and writes it back after every change.
/// The recently used list is persisted as well; the set of open
/// connections lives only as long as the manager.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Groups and connection profiles
    tree: GroupTree,
    /// Recently used connection ids, most recent first
    recent: Vec<Uuid>,
    /// Currently connected profile ids
    active: HashSet<Uuid>,
    /// Length limit of `recent`
    max_recent: usize,
    /// Configuration manager for persistence
    config_manager: ConfigManager,
}

impl ConnectionManager {
    /// Creates a new `ConnectionManager` with the given `ConfigManager`
    ///
    /// Loads existing groups, connections, the recently used list and the
    /// tree settings from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if loading from storage fails.
    pub fn new(config_manager: ConfigManager) -> ConfigResult<Self> {
        let tree = config_manager.load_tree()?;
        let settings = config_manager.load_settings()?;
        let max_recent = settings.tree.max_recent_connections;

        let mut recent = config_manager.load_recent()?;
        recent.retain(|id| tree.connection(*id).is_some());
        recent.truncate(max_recent);

        debug!(
            groups = tree.group_count(),
            connections = tree.connection_count(),
            recent = recent.len(),
            "Connection manager loaded"
        );
        Ok(Self {
            tree,
            recent,
            active: HashSet::new(),
            max_recent,
            config_manager,
        })
    }

    /// Creates a new ConnectionManager with empty storage (for testing)
    #[cfg(test)]
    pub fn new_empty(config_manager: ConfigManager) -> Self {
        Self {
            tree: GroupTree::new(),
            recent: Vec::new(),
            active: HashSet::new(),
            max_recent: crate::config::TreeSettings::default().max_recent_connections,
            config_manager,
        }
    }

    /// The group tree
    #[must_use]
    pub fn tree(&self) -> &GroupTree {
        &self.tree
    }

    // ========== Connection CRUD Operations ==========

    /// Adds a connection profile to the group named by its `group_id`
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the group is unknown or already
    /// holds a profile for the same target, or persistence fails.
    pub fn create_connection(&mut self, profile: ConnectionProfile) -> ConfigResult<Uuid> {
        ConfigManager::validate_connection(&profile)?;
        let id = self.tree.add_connection(profile)?;
        self.persist_tree()?;
        info!(connection_id = %id, "Connection created");
        Ok(id)
    }

    /// Updates an existing connection
    ///
    /// Preserves the original ID, group and creation timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection doesn't exist, validation fails,
    /// or persistence fails.
    pub fn update_connection(&mut self, id: Uuid, updated: ConnectionProfile) -> ConfigResult<()> {
        ConfigManager::validate_connection(&updated)?;
        self.tree.update_connection(id, updated)?;
        self.persist_tree()
    }

    /// Deletes a connection by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the connection doesn't exist or persistence fails.
    pub fn delete_connection(&mut self, id: Uuid) -> ConfigResult<ConnectionProfile> {
        let removed = self.tree.remove_connection(id)?;
        self.persist_tree()?;
        self.forget(&[id])?;
        info!(connection_id = %id, "Connection deleted");
        Ok(removed)
    }

    /// Moves a connection to a different group
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or group doesn't exist, the group
    /// already holds a profile for the same target, or persistence fails.
    pub fn move_connection(&mut self, connection_id: Uuid, group_id: Uuid) -> ConfigResult<()> {
        self.tree.move_connection(connection_id, group_id)?;
        self.persist_tree()
    }

    /// Gets a connection by ID
    #[must_use]
    pub fn get_connection(&self, id: Uuid) -> Option<&ConnectionProfile> {
        self.tree.connection(id)
    }

    /// Lists all connections in tree order
    #[must_use]
    pub fn list_connections(&self) -> Vec<&ConnectionProfile> {
        self.tree.connections_in_group(self.tree.root_id())
    }

    /// Returns the total number of connections
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.tree.connection_count()
    }

    // ========== Group CRUD Operations ==========

    /// Creates a group under `parent_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the parent doesn't exist, the name is invalid or
    /// already used by a sibling, or persistence fails.
    pub fn create_group(&mut self, name: &str, parent_id: Uuid) -> ConfigResult<Uuid> {
        let id = self.tree.add_group(parent_id, name, None, None)?;
        self.persist_tree()?;
        Ok(id)
    }

    /// Resolves a full group name, creating missing groups along the way
    ///
    /// # Errors
    ///
    /// Returns an error if a segment below the root is root-like, or
    /// persistence fails.
    pub fn save_group(
        &mut self,
        full_name: &str,
        color: Option<&str>,
        description: Option<&str>,
    ) -> ConfigResult<Uuid> {
        let id = self.tree.save_group(full_name, color, description)?;
        self.persist_tree()?;
        Ok(id)
    }

    /// Renames a group and replaces its color and description
    ///
    /// # Errors
    ///
    /// Returns an error if the group doesn't exist or is the root, the name
    /// is invalid or already used by a sibling, or persistence fails.
    pub fn edit_group(
        &mut self,
        id: Uuid,
        name: &str,
        color: Option<String>,
        description: Option<String>,
    ) -> ConfigResult<()> {
        self.tree.edit_group(id, name, color, description)?;
        self.persist_tree()
    }

    /// Deletes a group with its subgroups and connections
    ///
    /// Returns the ids of the deleted connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the group doesn't exist or is the root, or
    /// persistence fails.
    pub fn delete_group(&mut self, id: Uuid) -> ConfigResult<Vec<Uuid>> {
        let removed = self.tree.delete_group(id)?;
        self.persist_tree()?;
        self.forget(&removed)?;
        info!(group_id = %id, connections = removed.len(), "Group deleted");
        Ok(removed)
    }

    /// Moves a group to a new parent
    ///
    /// # Errors
    ///
    /// Returns an error if either group doesn't exist, the move would create
    /// a cycle or a sibling name clash, or persistence fails.
    pub fn move_group(&mut self, group_id: Uuid, new_parent_id: Uuid) -> ConfigResult<()> {
        self.tree.move_group(group_id, new_parent_id)?;
        self.persist_tree()
    }

    /// Gets a group by ID
    #[must_use]
    pub fn get_group(&self, id: Uuid) -> Option<&ConnectionGroup> {
        self.tree.group(id)
    }

    /// Finds a group by its full name
    #[must_use]
    pub fn find_group(&self, full_name: &str) -> Option<&ConnectionGroup> {
        self.tree.find_group_by_full_name(full_name)
    }

    /// Returns the number of groups, excluding the root
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.tree.group_count()
    }

    // ========== Connection Status ==========

    /// Records that a connection was opened
    ///
    /// The connection moves to the front of the recently used list.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection doesn't exist or persistence fails.
    pub fn mark_connected(&mut self, id: Uuid) -> ConfigResult<()> {
        if self.tree.connection(id).is_none() {
            return Err(GroupError::ConnectionNotFound(id).into());
        }
        self.active.insert(id);
        self.recent.retain(|recent| *recent != id);
        self.recent.insert(0, id);
        self.recent.truncate(self.max_recent);
        self.persist_recent()?;
        debug!(connection_id = %id, "Connection marked connected");
        Ok(())
    }

    /// Records that a connection was closed; returns false if it was not open
    pub fn mark_disconnected(&mut self, id: Uuid) -> bool {
        self.active.remove(&id)
    }

    /// Recently used connections, most recent first
    #[must_use]
    pub fn recent_connections(&self) -> Vec<&ConnectionProfile> {
        self.recent
            .iter()
            .filter_map(|id| self.tree.connection(*id))
            .collect()
    }

    /// Empties the recently used list
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn clear_recent(&mut self) -> ConfigResult<()> {
        self.recent.clear();
        self.persist_recent()
    }

    /// Returns true if the connection is open
    #[must_use]
    pub fn is_connected(&self, id: Uuid) -> bool {
        self.active.contains(&id)
    }

    /// Returns true if the connection is in the recently used list
    #[must_use]
    pub fn is_recent(&self, id: Uuid) -> bool {
        self.recent.contains(&id)
    }

    // ========== Views and Search ==========

    /// The tree for a view, or None when the view is empty
    #[must_use]
    pub fn view(&self, view: TreeView) -> Option<GroupTree> {
        filter_tree_view(&self.tree, view, self)
    }

    /// Connections whose server or database name contains `text`
    #[must_use]
    pub fn search(&self, text: &str) -> Vec<&ConnectionProfile> {
        search_connections(&self.tree, text)
    }

    // ========== Persistence ==========

    /// Persists the group tree to storage
    fn persist_tree(&self) -> ConfigResult<()> {
        self.config_manager.save_tree(&self.tree)
    }

    /// Persists the recently used list to storage
    fn persist_recent(&self) -> ConfigResult<()> {
        self.config_manager.save_recent(&self.recent)
    }

    /// Drops deleted connections from the status lists
    fn forget(&mut self, ids: &[Uuid]) -> ConfigResult<()> {
        for id in ids {
            self.active.remove(id);
        }
        let before = self.recent.len();
        self.recent.retain(|id| !ids.contains(id));
        if self.recent.len() != before {
            self.persist_recent()?;
        }
        Ok(())
    }
}

impl ConnectionStatus for ConnectionManager {
    fn is_connected(&self, connection_id: Uuid) -> bool {
        Self::is_connected(self, connection_id)
    }

    fn is_recent(&self, connection_id: Uuid) -> bool {
        Self::is_recent(self, connection_id)
    }
}
