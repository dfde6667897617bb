//! Serializable description of loaded explorer subtrees.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ExplorerTree;
use crate::error::{ConfigError, ConfigResult};
use crate::models::NodeId;

/// Explorer state for a set of connections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerSnapshot {
    /// Loaded roots, one per connected profile
    #[serde(default)]
    pub connections: Vec<SnapshotConnection>,
}

/// The root loaded for one profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConnection {
    /// Profile id
    pub connection_id: Uuid,
    /// Root node (usually the server)
    pub root: SnapshotNode,
}

/// One node and, if loaded, its children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    /// Display label
    pub label: String,
    /// Object type tag
    pub node_type: String,
    /// Whether the view shows the node expanded
    #[serde(default)]
    pub expanded: bool,
    /// Loaded children; omitted when not loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SnapshotNode>>,
}

impl ExplorerSnapshot {
    /// Parses a snapshot from JSON
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Deserialize` if the text is not a valid snapshot.
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| ConfigError::Deserialize(format!("Invalid explorer snapshot: {e}")))
    }
}

impl ExplorerTree {
    /// Builds an explorer tree from a snapshot
    #[must_use]
    pub fn from_snapshot(snapshot: &ExplorerSnapshot) -> Self {
        let mut tree = Self::new();
        for connection in &snapshot.connections {
            let root = tree.add_root(
                connection.connection_id,
                connection.root.label.as_str(),
                connection.root.node_type.as_str(),
            );
            tree.load_snapshot_node(root, &connection.root);
        }
        tree
    }

    fn load_snapshot_node(&mut self, id: NodeId, node: &SnapshotNode) {
        if node.expanded {
            self.expand(id);
        }
        let Some(children) = &node.children else {
            return;
        };
        self.mark_loaded(id);
        for child in children {
            if let Some(child_id) =
                self.add_child(id, child.label.as_str(), child.node_type.as_str())
            {
                self.load_snapshot_node(child_id, child);
            }
        }
    }
}
