//! Arena of connection groups and connection profiles.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    group_full_name_parts, is_root, normalize_group_name, same_group_name, GROUP_SEPARATOR,
    ROOT_GROUP_ID,
};
use crate::error::{GroupError, GroupResult};
use crate::models::{ConnectionGroup, ConnectionProfile};

/// A tree of connection groups with profiles as leaves
///
/// Groups and profiles live in id-keyed maps; parents are stored as ids and
/// each group keeps ordered lists of its children's ids. Every operation that
/// re-parents a group rejects a target inside the group's own subtree, so the
/// parent chain of any node always ends at the root.
#[derive(Debug, Clone)]
pub struct GroupTree {
    groups: HashMap<Uuid, ConnectionGroup>,
    connections: HashMap<Uuid, ConnectionProfile>,
}

impl Default for GroupTree {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupTree {
    /// Creates a tree holding only the root group
    #[must_use]
    pub fn new() -> Self {
        let mut root = ConnectionGroup::new(String::new());
        root.id = ROOT_GROUP_ID;
        let mut groups = HashMap::new();
        groups.insert(ROOT_GROUP_ID, root);
        Self {
            groups,
            connections: HashMap::new(),
        }
    }

    /// Rebuilds a tree from flat, persisted lists
    ///
    /// Child order follows list order. Groups whose parent is missing, and
    /// groups caught in a parent cycle, are re-attached under the root;
    /// profiles pointing at a missing group land in the root as well. Only a
    /// parentless root-like group stands for the root; any other group with
    /// an empty, root-like or separator-bearing name is renamed to its id.
    #[must_use]
    pub fn from_parts(groups: Vec<ConnectionGroup>, connections: Vec<ConnectionProfile>) -> Self {
        let mut tree = Self::new();
        let mut root_aliases = HashSet::from([ROOT_GROUP_ID]);
        let mut order = Vec::new();

        for mut group in groups {
            if group.id == ROOT_GROUP_ID
                || (group.parent_id.is_none() && is_root(Some(group.name.as_str())))
            {
                root_aliases.insert(group.id);
                continue;
            }
            if tree.groups.contains_key(&group.id) {
                warn!(group_id = %group.id, "Duplicate group id in configuration, keeping first");
                continue;
            }
            if Self::validate_name(&group.name).is_err() {
                let renamed = group.id.to_string();
                warn!(group_id = %group.id, name = %group.name, %renamed, "Invalid group name in configuration, renaming");
                group.name = renamed;
            }
            group.children.clear();
            group.connections.clear();
            order.push(group.id);
            tree.groups.insert(group.id, group);
        }

        for id in &order {
            let requested = tree.groups[id].parent_id;
            let parent = match requested {
                Some(p) if root_aliases.contains(&p) => ROOT_GROUP_ID,
                Some(p) if p != *id && tree.groups.contains_key(&p) => p,
                Some(p) => {
                    warn!(group_id = %id, parent_id = %p, "Group parent not found, moving under root");
                    ROOT_GROUP_ID
                }
                None => ROOT_GROUP_ID,
            };
            if let Some(group) = tree.groups.get_mut(id) {
                group.parent_id = Some(parent);
            }
        }

        for id in &order {
            if tree.chain_revisits(*id) {
                warn!(group_id = %id, "Group hierarchy contains a cycle, moving group under root");
                if let Some(group) = tree.groups.get_mut(id) {
                    group.parent_id = Some(ROOT_GROUP_ID);
                }
            }
        }

        for id in &order {
            let parent = tree.groups[id].parent_id.unwrap_or(ROOT_GROUP_ID);
            if let Some(parent) = tree.groups.get_mut(&parent) {
                parent.children.push(*id);
            }
        }

        for mut profile in connections {
            if tree.connections.contains_key(&profile.id) {
                warn!(connection_id = %profile.id, "Duplicate connection id in configuration, keeping first");
                continue;
            }
            if root_aliases.contains(&profile.group_id) {
                profile.group_id = ROOT_GROUP_ID;
            } else if !tree.groups.contains_key(&profile.group_id) {
                warn!(connection_id = %profile.id, group_id = %profile.group_id, "Connection group not found, moving under root");
                profile.group_id = ROOT_GROUP_ID;
            }
            if let Some(group) = tree.groups.get_mut(&profile.group_id) {
                group.connections.push(profile.id);
            }
            tree.connections.insert(profile.id, profile);
        }

        debug!(
            groups = tree.groups.len() - 1,
            connections = tree.connections.len(),
            "Group tree loaded"
        );
        tree
    }

    /// Flattens the tree for persistence, parents before their children
    ///
    /// The root group is implicit and not included.
    #[must_use]
    pub fn to_parts(&self) -> (Vec<ConnectionGroup>, Vec<ConnectionProfile>) {
        let groups = self.subgroups(ROOT_GROUP_ID).into_iter().cloned().collect();
        let connections = self
            .connections_in_group(ROOT_GROUP_ID)
            .into_iter()
            .cloned()
            .collect();
        (groups, connections)
    }

    // ========== Queries ==========

    /// Id of the root group
    #[must_use]
    pub const fn root_id(&self) -> Uuid {
        ROOT_GROUP_ID
    }

    /// The root group
    #[must_use]
    pub fn root(&self) -> &ConnectionGroup {
        &self.groups[&ROOT_GROUP_ID]
    }

    /// Gets a group by ID
    #[must_use]
    pub fn group(&self, id: Uuid) -> Option<&ConnectionGroup> {
        self.groups.get(&id)
    }

    /// Gets a connection profile by ID
    #[must_use]
    pub fn connection(&self, id: Uuid) -> Option<&ConnectionProfile> {
        self.connections.get(&id)
    }

    /// Number of groups, excluding the root
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len() - 1
    }

    /// Number of connection profiles
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Direct child groups in display order
    #[must_use]
    pub fn child_groups(&self, id: Uuid) -> Vec<&ConnectionGroup> {
        self.groups
            .get(&id)
            .map(|group| {
                group
                    .children
                    .iter()
                    .filter_map(|child| self.groups.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Direct connections in display order
    #[must_use]
    pub fn group_connections(&self, id: Uuid) -> Vec<&ConnectionProfile> {
        self.groups
            .get(&id)
            .map(|group| {
                group
                    .connections
                    .iter()
                    .filter_map(|conn| self.connections.get(conn))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Full name of a group: non-empty names from the top down, joined by `/`
    ///
    /// Returns None for the root group and for unknown ids.
    #[must_use]
    pub fn full_name(&self, id: Uuid) -> Option<String> {
        if id == ROOT_GROUP_ID {
            return None;
        }
        let mut names = Vec::new();
        let mut current = self.groups.get(&id);
        while let Some(group) = current {
            if !group.name.is_empty() {
                names.push(group.name.as_str());
            }
            current = group.parent_id.and_then(|p| self.groups.get(&p));
        }
        if names.is_empty() && !self.groups.contains_key(&id) {
            return None;
        }
        names.reverse();
        Some(names.join(GROUP_SEPARATOR.to_string().as_str()))
    }

    /// Finds a group by full name (`ROOT/Prod/Web`, `Prod/Web`, `/prod/web`)
    #[must_use]
    pub fn find_group_by_full_name(&self, full_name: &str) -> Option<&ConnectionGroup> {
        let parts = group_full_name_parts(Some(full_name));
        let mut current = self.root();
        for part in parts.iter().skip(1) {
            current = self
                .child_groups(current.id)
                .into_iter()
                .find(|child| same_group_name(Some(child.name.as_str()), Some(part.as_str())))?;
        }
        Some(current)
    }

    /// Returns true if `ancestor` appears on the parent chain of `group`
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: Uuid, group: Uuid) -> bool {
        let mut current = self.groups.get(&group).and_then(|g| g.parent_id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.groups.get(&id).and_then(|g| g.parent_id);
        }
        false
    }

    /// Returns true if `ancestor` contains the connection, directly or not
    #[must_use]
    pub fn is_ancestor_of_connection(&self, ancestor: Uuid, connection: Uuid) -> bool {
        self.connections.get(&connection).is_some_and(|profile| {
            profile.group_id == ancestor || self.is_ancestor_of(ancestor, profile.group_id)
        })
    }

    /// All connections in the subtree, in pre-order
    ///
    /// The group's own connections come first, followed by each child
    /// group's connections recursively in child-list order.
    #[must_use]
    pub fn connections_in_group(&self, id: Uuid) -> Vec<&ConnectionProfile> {
        let mut result = self.group_connections(id);
        for child in self.child_groups(id) {
            result.extend(self.connections_in_group(child.id));
        }
        result
    }

    /// All groups in the subtree below `id`, in pre-order
    ///
    /// Direct children come first, followed by each child's subgroups
    /// recursively in child-list order.
    #[must_use]
    pub fn subgroups(&self, id: Uuid) -> Vec<&ConnectionGroup> {
        let children = self.child_groups(id);
        let mut result = children.clone();
        for child in children {
            result.extend(self.subgroups(child.id));
        }
        result
    }

    /// Returns true if the connection could move into `group_id`
    ///
    /// A group holds at most one profile per connection target.
    #[must_use]
    pub fn can_move_connection(&self, connection_id: Uuid, group_id: Uuid) -> bool {
        let Some(profile) = self.connections.get(&connection_id) else {
            return false;
        };
        let key = profile.connection_info_id();
        !self
            .group_connections(group_id)
            .iter()
            .any(|other| other.id != connection_id && other.connection_info_id() == key)
    }

    // ========== Mutations ==========

    /// Upserts groups under `parent`
    ///
    /// A group whose id already exists is detached from its current parent,
    /// keeps its subgroups and connections, takes the incoming name, color and
    /// description, and is appended to `parent`'s children.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is unknown, a group is the root, has a
    /// root-like name, or is `parent` itself or one of its ancestors.
    pub fn add_groups(
        &mut self,
        parent: Uuid,
        groups: impl IntoIterator<Item = ConnectionGroup>,
    ) -> GroupResult<()> {
        let groups: Vec<ConnectionGroup> = groups.into_iter().collect();
        self.require_group(parent)?;
        for group in &groups {
            self.check_attachable(group, parent)?;
        }

        for mut group in groups {
            let id = group.id;
            let (children, connections) = match self.detach_group(id) {
                Some(existing) => (existing.children, existing.connections),
                None => (Vec::new(), Vec::new()),
            };
            group.parent_id = Some(parent);
            group.children = children;
            group.connections = connections;
            self.groups.insert(id, group);
            if let Some(parent) = self.groups.get_mut(&parent) {
                parent.children.push(id);
            }
        }
        Ok(())
    }

    /// Upserts connection profiles under `parent`
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is unknown.
    pub fn add_connections(
        &mut self,
        parent: Uuid,
        profiles: impl IntoIterator<Item = ConnectionProfile>,
    ) -> GroupResult<()> {
        self.require_group(parent)?;
        for mut profile in profiles {
            let id = profile.id;
            self.detach_connection(id);
            profile.group_id = parent;
            self.connections.insert(id, profile);
            if let Some(parent) = self.groups.get_mut(&parent) {
                parent.connections.push(id);
            }
        }
        Ok(())
    }

    /// Adds a profile to the group named by its `group_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the group is unknown or already holds a profile
    /// for the same connection target.
    pub fn add_connection(&mut self, profile: ConnectionProfile) -> GroupResult<Uuid> {
        let id = profile.id;
        let group_id = profile.group_id;
        self.require_group(group_id)?;
        let key = profile.connection_info_id();
        if self
            .group_connections(group_id)
            .iter()
            .any(|other| other.id != id && other.connection_info_id() == key)
        {
            return Err(GroupError::DuplicateConnection { group_id });
        }
        self.add_connections(group_id, [profile])?;
        Ok(id)
    }

    /// Creates a named group under `parent`
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or reserved, or a sibling already
    /// uses it.
    pub fn add_group(
        &mut self,
        parent: Uuid,
        name: &str,
        color: Option<String>,
        description: Option<String>,
    ) -> GroupResult<Uuid> {
        self.require_group(parent)?;
        Self::validate_name(name)?;
        self.require_unique_sibling(parent, name, None)?;

        let mut group = ConnectionGroup::with_parent(name.trim(), parent);
        group.color = color;
        group.description = description;
        let id = group.id;
        self.add_groups(parent, [group])?;
        debug!(group_id = %id, name, "Group created");
        Ok(id)
    }

    /// Resolves a full name, creating the missing groups along the way
    ///
    /// Existing groups are matched case-insensitively. Color and description
    /// apply to the groups this call creates. Returns the id of the last
    /// segment, or the root id for a root-like name.
    ///
    /// # Errors
    ///
    /// Returns an error if a segment below the root is root-like; nothing is
    /// created in that case.
    pub fn save_group(
        &mut self,
        full_name: &str,
        color: Option<&str>,
        description: Option<&str>,
    ) -> GroupResult<Uuid> {
        let parts = group_full_name_parts(Some(full_name));
        for part in parts.iter().skip(1) {
            Self::validate_name(part)?;
        }
        let mut current = ROOT_GROUP_ID;
        for part in parts.iter().skip(1) {
            let existing = self
                .child_groups(current)
                .into_iter()
                .find(|child| same_group_name(Some(child.name.as_str()), Some(part.as_str())))
                .map(|child| child.id);
            current = match existing {
                Some(id) => id,
                None => {
                    let mut group = ConnectionGroup::with_parent(part.as_str(), current);
                    group.color = color.map(str::to_string);
                    group.description = description.map(str::to_string);
                    let id = group.id;
                    self.groups.insert(id, group);
                    if let Some(parent) = self.groups.get_mut(&current) {
                        parent.children.push(id);
                    }
                    debug!(group_id = %id, name = %part, "Group created from path");
                    id
                }
            };
        }
        Ok(current)
    }

    /// Renames a group and replaces its color and description
    ///
    /// # Errors
    ///
    /// Returns an error for the root, an unknown id, an invalid name, or a
    /// name already used by a sibling.
    pub fn edit_group(
        &mut self,
        id: Uuid,
        name: &str,
        color: Option<String>,
        description: Option<String>,
    ) -> GroupResult<()> {
        if id == ROOT_GROUP_ID {
            return Err(GroupError::RootImmutable);
        }
        let parent = self.require_group(id)?.parent_id.unwrap_or(ROOT_GROUP_ID);
        Self::validate_name(name)?;
        self.require_unique_sibling(parent, name, Some(id))?;

        if let Some(group) = self.groups.get_mut(&id) {
            group.name = name.trim().to_string();
            group.color = color;
            group.description = description;
        }
        Ok(())
    }

    /// Deletes a group with all of its subgroups and connections
    ///
    /// Returns the ids of the removed connections.
    ///
    /// # Errors
    ///
    /// Returns an error for the root or an unknown id.
    pub fn delete_group(&mut self, id: Uuid) -> GroupResult<Vec<Uuid>> {
        if id == ROOT_GROUP_ID {
            return Err(GroupError::RootImmutable);
        }
        self.require_group(id)?;

        let removed_connections: Vec<Uuid> = self
            .connections_in_group(id)
            .iter()
            .map(|profile| profile.id)
            .collect();
        let removed_groups: Vec<Uuid> = self.subgroups(id).iter().map(|g| g.id).collect();

        self.detach_group(id);
        for group_id in removed_groups {
            self.groups.remove(&group_id);
        }
        for connection_id in &removed_connections {
            self.connections.remove(connection_id);
        }
        debug!(group_id = %id, connections = removed_connections.len(), "Group deleted");
        Ok(removed_connections)
    }

    /// Moves a group under a new parent, appending it to the parent's children
    ///
    /// # Errors
    ///
    /// Returns an error for the root, unknown ids, a target inside the
    /// group's own subtree, or a name clash under the new parent.
    pub fn move_group(&mut self, id: Uuid, new_parent: Uuid) -> GroupResult<()> {
        if id == ROOT_GROUP_ID {
            return Err(GroupError::RootImmutable);
        }
        let group = self.require_group(id)?.clone();
        self.require_group(new_parent)?;
        self.check_attachable(&group, new_parent)?;
        self.require_unique_sibling(new_parent, &group.name, Some(id))?;
        self.add_groups(new_parent, [group])
    }

    /// Moves a connection into another group
    ///
    /// # Errors
    ///
    /// Returns an error for unknown ids, or if the target group already holds
    /// a profile for the same connection target.
    pub fn move_connection(&mut self, connection_id: Uuid, group_id: Uuid) -> GroupResult<()> {
        self.require_group(group_id)?;
        let mut profile = self
            .connections
            .get(&connection_id)
            .cloned()
            .ok_or(GroupError::ConnectionNotFound(connection_id))?;
        if !self.can_move_connection(connection_id, group_id) {
            return Err(GroupError::DuplicateConnection { group_id });
        }
        profile.touch();
        self.add_connections(group_id, [profile])
    }

    /// Replaces a profile's settings, keeping its id, group and creation time
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is unknown.
    pub fn update_connection(
        &mut self,
        connection_id: Uuid,
        mut updated: ConnectionProfile,
    ) -> GroupResult<()> {
        let existing = self
            .connections
            .get_mut(&connection_id)
            .ok_or(GroupError::ConnectionNotFound(connection_id))?;
        updated.id = existing.id;
        updated.group_id = existing.group_id;
        updated.created_at = existing.created_at;
        updated.touch();
        *existing = updated;
        Ok(())
    }

    /// Removes a connection from the tree
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is unknown.
    pub fn remove_connection(&mut self, connection_id: Uuid) -> GroupResult<ConnectionProfile> {
        self.detach_connection(connection_id)
            .ok_or(GroupError::ConnectionNotFound(connection_id))
    }

    // ========== Internals ==========

    fn require_group(&self, id: Uuid) -> GroupResult<&ConnectionGroup> {
        self.groups.get(&id).ok_or(GroupError::GroupNotFound(id))
    }

    fn validate_name(name: &str) -> GroupResult<()> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(GroupError::InvalidName {
                name: name.to_string(),
                reason: "name cannot be empty".to_string(),
            });
        }
        if is_root(Some(trimmed)) {
            return Err(GroupError::InvalidName {
                name: name.to_string(),
                reason: "name is reserved for the root group".to_string(),
            });
        }
        if trimmed.contains(GROUP_SEPARATOR) {
            return Err(GroupError::InvalidName {
                name: name.to_string(),
                reason: format!("name cannot contain '{GROUP_SEPARATOR}'"),
            });
        }
        Ok(())
    }

    fn require_unique_sibling(
        &self,
        parent: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> GroupResult<()> {
        let name = name.trim();
        let clash = self.child_groups(parent).iter().any(|sibling| {
            Some(sibling.id) != except && same_group_name(Some(sibling.name.as_str()), Some(name))
        });
        if clash {
            return Err(GroupError::DuplicateName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn check_attachable(&self, group: &ConnectionGroup, parent: Uuid) -> GroupResult<()> {
        if group.id == ROOT_GROUP_ID {
            return Err(GroupError::RootImmutable);
        }
        if group.id == parent || self.is_ancestor_of(group.id, parent) {
            return Err(GroupError::Cycle {
                group_id: group.id,
                parent_id: parent,
            });
        }
        if normalize_group_name(&group.name).is_empty() {
            return Err(GroupError::InvalidName {
                name: group.name.clone(),
                reason: "name is reserved for the root group".to_string(),
            });
        }
        Ok(())
    }

    /// Removes a group from the map and from its parent's child list
    fn detach_group(&mut self, id: Uuid) -> Option<ConnectionGroup> {
        let group = self.groups.remove(&id)?;
        if let Some(parent) = group.parent_id.and_then(|p| self.groups.get_mut(&p)) {
            parent.children.retain(|child| *child != id);
        }
        Some(group)
    }

    /// Removes a connection from the map and from its group's list
    fn detach_connection(&mut self, id: Uuid) -> Option<ConnectionProfile> {
        let profile = self.connections.remove(&id)?;
        if let Some(group) = self.groups.get_mut(&profile.group_id) {
            group.connections.retain(|conn| *conn != id);
        }
        Some(profile)
    }

    /// Returns true if following parent links from `id` leads back to `id`
    fn chain_revisits(&self, id: Uuid) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(id);
        while let Some(group_id) = current {
            if !seen.insert(group_id) {
                return group_id == id || seen.len() > self.groups.len();
            }
            if group_id == ROOT_GROUP_ID {
                return false;
            }
            current = self.groups.get(&group_id).and_then(|g| g.parent_id);
        }
        false
    }
}
