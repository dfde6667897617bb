//! Server tree filtering
//!
//! [`TreeVisibilityFilter`] answers per-element visibility for the filter box
//! of a server tree: groups, connection profiles and the object-explorer
//! nodes loaded under connected profiles. The [`view`] functions build pruned
//! copies of a [`GroupTree`](crate::group::GroupTree) for the active/recent
//! views and the connection search.

mod expression;
pub mod view;
mod visibility;

pub use expression::{FilterExpression, NodeFilterType};
pub use view::{
    filter_tree_view, search_connections, search_tree, ConnectionStatus, TreeView,
};
pub use visibility::TreeVisibilityFilter;

use uuid::Uuid;

use crate::models::NodeId;

/// Anything a server tree view can display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeElement {
    /// A connection group
    Group(Uuid),
    /// A connection profile
    Profile(Uuid),
    /// An object-explorer node under a connected profile
    Node(NodeId),
}
