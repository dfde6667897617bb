//! Active/recent tree views and connection search.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::group::{GroupTree, ROOT_GROUP_ID};
use crate::models::ConnectionProfile;

/// Which connections a server tree shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeView {
    /// Every saved connection
    #[default]
    All,
    /// Connections that are currently connected
    Active,
    /// Recently used connections
    Recent,
}

impl fmt::Display for TreeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Active => write!(f, "active"),
            Self::Recent => write!(f, "recent"),
        }
    }
}

impl FromStr for TreeView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "recent" => Ok(Self::Recent),
            other => Err(format!("unknown tree view '{other}'")),
        }
    }
}

/// Connection state a view filter consults
pub trait ConnectionStatus {
    /// Returns true if the connection is open
    fn is_connected(&self, connection_id: Uuid) -> bool;

    /// Returns true if the connection is in the recently used list
    fn is_recent(&self, connection_id: Uuid) -> bool;
}

/// Builds the tree shown for `view`
///
/// Connections outside the view are dropped, then every group left with no
/// connections anywhere below it. Returns None when nothing remains.
#[must_use]
pub fn filter_tree_view(
    tree: &GroupTree,
    view: TreeView,
    status: &impl ConnectionStatus,
) -> Option<GroupTree> {
    let keep = |profile: &ConnectionProfile| match view {
        TreeView::All => true,
        TreeView::Active => status.is_connected(profile.id),
        TreeView::Recent => status.is_recent(profile.id),
    };

    let (groups, connections) = tree.to_parts();
    let connections: Vec<ConnectionProfile> = connections.into_iter().filter(keep).collect();
    if connections.is_empty() {
        debug!(%view, "No connections in view");
        return None;
    }
    let groups = groups
        .into_iter()
        .filter(|group| {
            connections
                .iter()
                .any(|profile| tree.is_ancestor_of_connection(group.id, profile.id))
        })
        .collect();
    Some(GroupTree::from_parts(groups, connections))
}

/// Connections whose server or database name contains `text`, ignoring case
///
/// Results follow tree order. Blank text finds nothing.
#[must_use]
pub fn search_connections<'a>(tree: &'a GroupTree, text: &str) -> Vec<&'a ConnectionProfile> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    tree.connections_in_group(ROOT_GROUP_ID)
        .into_iter()
        .filter(|profile| {
            profile.server_name.to_lowercase().contains(&needle)
                || profile
                    .database_name
                    .as_deref()
                    .is_some_and(|db| db.to_lowercase().contains(&needle))
        })
        .collect()
}

/// A flat tree whose root holds copies of the search matches
#[must_use]
pub fn search_tree(tree: &GroupTree, text: &str) -> GroupTree {
    let matches = search_connections(tree, text)
        .into_iter()
        .map(|profile| profile.clone().with_group(ROOT_GROUP_ID))
        .collect();
    GroupTree::from_parts(Vec::new(), matches)
}
