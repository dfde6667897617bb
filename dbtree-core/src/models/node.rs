//! Hierarchical object-explorer node model.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Node type of pass-through folder nodes ("Tables", "Views", ...)
pub const FOLDER_NODE_TYPE: &str = "Folder";

/// Index of a node inside an [`ExplorerTree`](crate::explorer::ExplorerTree)
///
/// Ids are never reused while the tree lives, so they are stable keys for
/// per-pass caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A database object loaded under a connected profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerNode {
    /// Arena id
    pub id: NodeId,
    /// Profile this node was loaded for
    pub connection_id: Uuid,
    /// Display label
    pub label: String,
    /// Object type tag ("Server", "Database", "Table", "Folder", ...)
    pub node_type: String,
    /// Path of labels from the connection root, joined by `/`
    pub node_path: String,
    /// Parent node (None for the connection root)
    pub parent: Option<NodeId>,
    /// Loaded children; None until the node has been expanded
    pub(crate) children: Option<Vec<NodeId>>,
}

impl ExplorerNode {
    /// Returns true for pass-through folder nodes
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.node_type == FOLDER_NODE_TYPE
    }

    /// Loaded children, or None if they have not been loaded
    #[must_use]
    pub fn children(&self) -> Option<&[NodeId]> {
        self.children.as_deref()
    }
}
