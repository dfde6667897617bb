//! Visibility of server tree elements under the filter box text.

use std::collections::HashMap;

use tracing::{debug, trace};
use uuid::Uuid;

use super::{FilterExpression, TreeElement};
use crate::explorer::TreeDataSource;
use crate::models::{ConnectionProfile, ExplorerNode, NodeId};

/// Filter deciding which server tree elements are shown
///
/// An element is visible when it matches the filter itself, when one of its
/// ancestors matches (the contents of a matching container are never
/// hidden), or when any of its descendants is visible. Results for explorer
/// nodes are cached per connection until the filter text changes or
/// [`invalidate`](Self::invalidate) is called.
#[derive(Debug, Clone, Default)]
pub struct TreeVisibilityFilter {
    filter_string: Option<String>,
    expression: Option<FilterExpression>,
    memo: HashMap<Uuid, HashMap<NodeId, bool>>,
}

impl TreeVisibilityFilter {
    /// Creates a filter that shows everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter for the given text
    #[must_use]
    pub fn with_filter(text: &str) -> Self {
        let mut filter = Self::new();
        filter.set_filter_string(text);
        filter
    }

    /// Replaces the filter text, dropping all cached results
    pub fn set_filter_string(&mut self, text: &str) {
        self.expression = FilterExpression::parse(text);
        self.filter_string = self.expression.as_ref().map(|_| text.to_string());
        self.memo.clear();
        debug!(
            filter = text,
            filter_type = ?self.expression.as_ref().and_then(|e| e.filter_type),
            "Tree filter changed"
        );
    }

    /// Removes the filter; every element becomes visible
    pub fn clear(&mut self) {
        self.filter_string = None;
        self.expression = None;
        self.memo.clear();
    }

    /// Drops cached results; call after the tree structure changes
    pub fn invalidate(&mut self) {
        self.memo.clear();
    }

    /// The raw filter text, if a non-blank one is set
    #[must_use]
    pub fn filter_string(&self) -> Option<&str> {
        self.filter_string.as_deref()
    }

    /// The parsed filter, if any
    #[must_use]
    pub fn expression(&self) -> Option<&FilterExpression> {
        self.expression.as_ref()
    }

    /// Returns true if a filter is active
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.expression.is_some()
    }

    /// Cached visibility of an explorer node, if it was computed
    #[must_use]
    pub fn cached(&self, connection_id: Uuid, node: NodeId) -> Option<bool> {
        self.memo.get(&connection_id)?.get(&node).copied()
    }

    /// Decides whether `element` is shown
    ///
    /// Unknown elements are hidden while a filter is active.
    pub fn is_visible<S: TreeDataSource + ?Sized>(
        &mut self,
        source: &S,
        element: TreeElement,
    ) -> bool {
        let Some(expr) = self.expression.as_ref() else {
            return true;
        };
        let mut pass = Pass {
            expr,
            source,
            memo: &mut self.memo,
        };
        let visible = match element {
            TreeElement::Group(id) => pass.group_visible(id),
            TreeElement::Profile(id) => pass.profile_visible(id),
            TreeElement::Node(id) => pass.node_visible(id),
        };
        trace!(?element, visible, "Evaluated tree element");
        visible
    }
}

/// One evaluation against a fixed expression and data source
struct Pass<'a, S: ?Sized> {
    expr: &'a FilterExpression,
    source: &'a S,
    memo: &'a mut HashMap<Uuid, HashMap<NodeId, bool>>,
}

impl<S: TreeDataSource + ?Sized> Pass<'_, S> {
    // ========== Groups ==========

    fn group_visible(&mut self, id: Uuid) -> bool {
        if self.source.groups().group(id).is_none() {
            return false;
        }
        self.group_chain_matches(id) || self.group_matches_down(id)
    }

    /// The group or one of its ancestors matches by name
    fn group_chain_matches(&self, id: Uuid) -> bool {
        let groups = self.source.groups();
        let mut current = groups.group(id);
        while let Some(group) = current {
            if self.expr.matches_group_name(&group.name) {
                return true;
            }
            current = group.parent_id.and_then(|parent| groups.group(parent));
        }
        false
    }

    /// Something inside the group is visible
    ///
    /// Only called when no group on the chain above `id` matches.
    fn group_matches_down(&mut self, id: Uuid) -> bool {
        let source = self.source;
        let groups = source.groups();
        if groups
            .group_connections(id)
            .into_iter()
            .any(|profile| self.profile_matches_itself(profile))
        {
            return true;
        }
        groups.child_groups(id).into_iter().any(|child| {
            self.expr.matches_group_name(&child.name) || self.group_matches_down(child.id)
        })
    }

    // ========== Profiles ==========

    fn profile_visible(&mut self, id: Uuid) -> bool {
        let source = self.source;
        let Some(profile) = source.groups().connection(id) else {
            return false;
        };
        self.group_chain_matches(profile.group_id) || self.profile_matches_itself(profile)
    }

    /// Visibility of a profile ignoring its groups
    fn profile_matches_itself(&mut self, profile: &ConnectionProfile) -> bool {
        match self.source.hierarchical_root(profile.id) {
            Some(root) => {
                self.memo.insert(profile.id, HashMap::new());
                self.node_visible(root)
            }
            None => self.profile_fields_match(profile),
        }
    }

    fn profile_fields_match(&self, profile: &ConnectionProfile) -> bool {
        if self.expr.filter_string.is_empty() {
            return true;
        }
        self.expr.matches_text(&profile.server_name)
            || profile
                .database_name
                .as_deref()
                .is_some_and(|db| self.expr.matches_text(db))
            || profile
                .connection_name
                .as_deref()
                .is_some_and(|name| self.expr.matches_text(name))
    }

    // ========== Explorer nodes ==========

    fn node_visible(&mut self, id: NodeId) -> bool {
        let source = self.source;
        let Some(node) = source.node(id) else {
            return false;
        };
        if let Some(visible) = self.cached(node.connection_id, id) {
            return visible;
        }
        if self.ancestors_match(node) {
            self.remember(node.connection_id, id, true);
            return true;
        }
        self.subtree_visible(id)
    }

    /// A non-folder ancestor node, or a group above the owning profile, matches
    fn ancestors_match(&self, node: &ExplorerNode) -> bool {
        let mut current = node.parent.and_then(|parent| self.source.node(parent));
        while let Some(ancestor) = current {
            if self.matches_itself(ancestor) {
                return true;
            }
            current = ancestor.parent.and_then(|parent| self.source.node(parent));
        }
        self.source
            .groups()
            .connection(node.connection_id)
            .is_some_and(|profile| self.group_chain_matches(profile.group_id))
    }

    /// The node or something below it matches
    ///
    /// Only called when no ancestor of `id` matches, so every result is the
    /// node's final visibility and can be cached.
    fn subtree_visible(&mut self, id: NodeId) -> bool {
        let source = self.source;
        let Some(node) = source.node(id) else {
            return false;
        };
        if let Some(visible) = self.cached(node.connection_id, id) {
            return visible;
        }
        let visible = self.matches_itself(node)
            || source
                .displayed_children(node)
                .into_iter()
                .any(|child| self.subtree_visible(child));
        self.remember(node.connection_id, id, visible);
        visible
    }

    /// Folders are pass-through wrappers and never match on their own
    fn matches_itself(&self, node: &ExplorerNode) -> bool {
        !node.is_folder() && self.expr.matches_node(&node.node_type, &node.label)
    }

    fn cached(&self, connection_id: Uuid, id: NodeId) -> Option<bool> {
        self.memo.get(&connection_id)?.get(&id).copied()
    }

    fn remember(&mut self, connection_id: Uuid, id: NodeId, visible: bool) {
        self.memo
            .entry(connection_id)
            .or_default()
            .insert(id, visible);
    }
}
