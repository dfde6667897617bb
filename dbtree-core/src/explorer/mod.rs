//! Object explorer node storage
//!
//! This module holds the hierarchical database objects loaded under connected
//! profiles, the expansion state a tree view keeps for them, and the
//! [`TreeDataSource`] seam the visibility filter reads the tree through.

mod snapshot;

pub use snapshot::{ExplorerSnapshot, SnapshotConnection, SnapshotNode};

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::group::GroupTree;
use crate::models::{ExplorerNode, NodeId};

/// Read access to everything the visibility filter needs from a tree view
pub trait TreeDataSource {
    /// The connection group hierarchy
    fn groups(&self) -> &GroupTree;

    /// Root explorer node loaded for a profile, if it is connected
    fn hierarchical_root(&self, profile_id: Uuid) -> Option<NodeId>;

    /// Looks up an explorer node
    fn node(&self, id: NodeId) -> Option<&ExplorerNode>;

    /// Nodes the view currently shows expanded
    fn expanded_elements(&self) -> Vec<NodeId>;

    /// Children the view shows under `node`
    ///
    /// These are the loaded children; when none are loaded, the expanded
    /// nodes of the same connection whose parent has `node`'s path stand in.
    fn displayed_children(&self, node: &ExplorerNode) -> Vec<NodeId> {
        if let Some(children) = node.children().filter(|children| !children.is_empty()) {
            return children.to_vec();
        }
        self.expanded_elements()
            .into_iter()
            .filter(|candidate| {
                self.node(*candidate).is_some_and(|expanded| {
                    expanded.connection_id == node.connection_id
                        && expanded
                            .parent
                            .and_then(|parent| self.node(parent))
                            .is_some_and(|parent| parent.node_path == node.node_path)
                })
            })
            .collect()
    }
}

/// Arena of explorer nodes for any number of connections
///
/// Nodes are never removed from the arena while it lives: unloading a node's
/// children only forgets the parent's child list, so ids stay valid for
/// expansion state and caches that still refer to them.
#[derive(Debug, Clone, Default)]
pub struct ExplorerTree {
    nodes: Vec<ExplorerNode>,
    roots: HashMap<Uuid, NodeId>,
    expanded: Vec<NodeId>,
}

impl ExplorerTree {
    /// Creates an empty explorer tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the root node of a connection, replacing any previous root
    pub fn add_root(
        &mut self,
        connection_id: Uuid,
        label: impl Into<String>,
        node_type: impl Into<String>,
    ) -> NodeId {
        let label = label.into();
        let id = self.push(ExplorerNode {
            id: NodeId(self.nodes.len()),
            connection_id,
            node_path: label.clone(),
            label,
            node_type: node_type.into(),
            parent: None,
            children: None,
        });
        if let Some(previous) = self.roots.insert(connection_id, id) {
            debug!(%connection_id, %previous, root = %id, "Replaced explorer root");
        }
        id
    }

    /// Appends a loaded child under `parent`
    ///
    /// Returns None if `parent` is unknown.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        label: impl Into<String>,
        node_type: impl Into<String>,
    ) -> Option<NodeId> {
        let parent_node = self.nodes.get(parent.0)?;
        let label = label.into();
        let node = ExplorerNode {
            id: NodeId(self.nodes.len()),
            connection_id: parent_node.connection_id,
            node_path: format!("{}/{}", parent_node.node_path, label),
            label,
            node_type: node_type.into(),
            parent: Some(parent),
            children: None,
        };
        let id = self.push(node);
        self.nodes[parent.0].children.get_or_insert_with(Vec::new).push(id);
        Some(id)
    }

    /// Marks `parent` as loaded with no children
    pub fn mark_loaded(&mut self, parent: NodeId) {
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.get_or_insert_with(Vec::new);
        }
    }

    /// Forgets the loaded children of a node, as a refresh does
    ///
    /// The child nodes stay in the arena and in the expansion state.
    pub fn unload_children(&mut self, parent: NodeId) {
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children = None;
        }
    }

    /// Drops the root of a disconnected profile
    pub fn disconnect(&mut self, connection_id: Uuid) -> Option<NodeId> {
        let root = self.roots.remove(&connection_id)?;
        self.expanded
            .retain(|id| self.nodes[id.0].connection_id != connection_id);
        Some(root)
    }

    /// Records a node as expanded in the view
    pub fn expand(&mut self, id: NodeId) {
        if id.0 < self.nodes.len() && !self.expanded.contains(&id) {
            self.expanded.push(id);
        }
    }

    /// Records a node as collapsed in the view
    pub fn collapse(&mut self, id: NodeId) {
        self.expanded.retain(|expanded| *expanded != id);
    }

    /// Returns true if the view shows the node expanded
    #[must_use]
    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.contains(&id)
    }

    /// Looks up a node
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&ExplorerNode> {
        self.nodes.get(id.0)
    }

    /// Root node of a connection
    #[must_use]
    pub fn root_for(&self, connection_id: Uuid) -> Option<NodeId> {
        self.roots.get(&connection_id).copied()
    }

    /// Expanded nodes in expansion order
    #[must_use]
    pub fn expanded(&self) -> &[NodeId] {
        &self.expanded
    }

    /// Total number of nodes ever added
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node was ever added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nearest ancestor that is not a folder
    #[must_use]
    pub fn not_folder_parent(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.node(id)?.parent;
        while let Some(parent) = current {
            let node = self.node(parent)?;
            if !node.is_folder() {
                return Some(parent);
            }
            current = node.parent;
        }
        None
    }

    fn push(&mut self, node: ExplorerNode) -> NodeId {
        let id = node.id;
        self.nodes.push(node);
        id
    }
}

/// A group tree paired with the explorer nodes loaded for its profiles
#[derive(Debug, Clone, Copy)]
pub struct ServerTree<'a> {
    groups: &'a GroupTree,
    explorer: &'a ExplorerTree,
}

impl<'a> ServerTree<'a> {
    /// Creates a view over a group tree and an explorer tree
    #[must_use]
    pub const fn new(groups: &'a GroupTree, explorer: &'a ExplorerTree) -> Self {
        Self { groups, explorer }
    }

    /// The explorer nodes
    #[must_use]
    pub const fn explorer(&self) -> &'a ExplorerTree {
        self.explorer
    }
}

impl TreeDataSource for ServerTree<'_> {
    fn groups(&self) -> &GroupTree {
        self.groups
    }

    fn hierarchical_root(&self, profile_id: Uuid) -> Option<NodeId> {
        self.explorer.root_for(profile_id)
    }

    fn node(&self, id: NodeId) -> Option<&ExplorerNode> {
        self.explorer.node(id)
    }

    fn expanded_elements(&self) -> Vec<NodeId> {
        self.explorer.expanded.clone()
    }
}
