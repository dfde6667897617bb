//! Property-based tests for the server tree visibility filter
//!
//! Visibility is checked against a direct recursive definition over random
//! group trees and random explorer trees.

use std::collections::HashMap;

use dbtree_core::{
    ConnectionProfile, ExplorerTree, GroupTree, NodeId, ServerTree, TreeElement,
    TreeVisibilityFilter, ROOT_GROUP_ID,
};
use proptest::prelude::*;
use uuid::Uuid;

const LABELS: &[&str] = &["Sales", "Orders", "Finance", "Audit", "SalesArchive"];
const NODE_TYPES: &[&str] = &[
    "Database",
    "Table",
    "Folder",
    "StoredProcedure",
    "ScalarValuedFunction",
];

// ========== Strategies ==========

/// Strategy for generating group paths from a small vocabulary
fn arb_group_paths() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::collection::vec(
            prop_oneof![
                Just("Prod"),
                Just("Dev"),
                Just("Web"),
                Just("Reporting"),
                Just("Sales"),
            ],
            1..4,
        )
        .prop_map(|segments| segments.join("/")),
        1..6,
    )
}

/// Strategy for generating server names, some of which overlap group names
fn arb_server_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            Just("sql01".to_string()),
            Just("devbox".to_string()),
            Just("web-sql".to_string()),
            Just("sales-db".to_string()),
        ],
        0..6,
    )
}

/// Strategy for untyped filter text
fn arb_plain_filter() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("prod".to_string()),
        Just("dev".to_string()),
        Just("sql".to_string()),
        Just("sales".to_string()),
        Just("web".to_string()),
        Just("nothing".to_string()),
    ]
}

/// Strategy for filter text used against explorer nodes, typed or not
fn arb_node_filter() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("sales".to_string()),
        Just("ord".to_string()),
        Just("fin".to_string()),
        Just("db:".to_string()),
        Just("db:sales".to_string()),
        Just("sp:audit".to_string()),
        Just("fn:".to_string()),
        Just("table".to_string()),
    ]
}

/// Strategy for an explorer shape: `(parent choice, label, type)` per node
/// after the root
fn arb_explorer_shape() -> impl Strategy<Value = Vec<(usize, usize, usize)>> {
    prop::collection::vec(
        (any::<usize>(), 0..LABELS.len(), 0..NODE_TYPES.len()),
        0..24,
    )
}

fn build_groups(paths: &[String], servers: &[String]) -> GroupTree {
    let mut tree = GroupTree::new();
    let mut group_ids = vec![ROOT_GROUP_ID];
    for path in paths {
        group_ids.push(tree.save_group(path, None, None).unwrap());
    }
    for (i, server) in servers.iter().enumerate() {
        let group = group_ids[i % group_ids.len()];
        // Duplicate targets in one group are rejected
        let _ = tree.add_connection(ConnectionProfile::new(server.as_str()).with_group(group));
    }
    tree
}

struct Explorer {
    groups: GroupTree,
    explorer: ExplorerTree,
    nodes: Vec<NodeId>,
    parents: Vec<Option<usize>>,
    labels: Vec<&'static str>,
    types: Vec<&'static str>,
}

/// One connected profile in the root group with a random explorer tree
fn build_explorer(shape: &[(usize, usize, usize)]) -> Explorer {
    let mut groups = GroupTree::new();
    let profile = groups
        .add_connection(ConnectionProfile::new("sql01"))
        .unwrap();

    let mut explorer = ExplorerTree::new();
    let root = explorer.add_root(profile, "sql01", "Server");
    let mut nodes = vec![root];
    let mut parents = vec![None];
    let mut labels = vec!["sql01"];
    let mut types = vec!["Server"];

    for (choice, label, node_type) in shape {
        let parent = choice % nodes.len();
        let id = explorer
            .add_child(nodes[parent], LABELS[*label], NODE_TYPES[*node_type])
            .unwrap();
        nodes.push(id);
        parents.push(Some(parent));
        labels.push(LABELS[*label]);
        types.push(NODE_TYPES[*node_type]);
    }

    Explorer {
        groups,
        explorer,
        nodes,
        parents,
        labels,
        types,
    }
}

/// Reference definition of node self-matching
fn node_matches(filter: &str, label: &str, node_type: &str) -> bool {
    if node_type == "Folder" {
        return false;
    }
    let filter = filter.to_lowercase();
    let (wanted_type, text) = match filter.split_once(':') {
        Some(("db", rest)) => (Some("db"), rest.trim().to_string()),
        Some(("sp", rest)) => (Some("sp"), rest.trim().to_string()),
        Some(("fn", rest)) => (Some("fn"), rest.trim().to_string()),
        _ => (None, filter.clone()),
    };
    let type_ok = match wanted_type {
        Some("db") => node_type == "Database",
        Some("sp") => node_type == "StoredProcedure",
        Some("fn") => node_type.ends_with("Function"),
        _ => true,
    };
    type_ok && (text.is_empty() || label.to_lowercase().contains(&text))
}

/// Reference visibility: a matching ancestor, or a match in the subtree
fn expected_visibility(tree: &Explorer, filter: &str) -> Vec<bool> {
    let count = tree.nodes.len();
    let matches: Vec<bool> = (0..count)
        .map(|i| node_matches(filter, tree.labels[i], tree.types[i]))
        .collect();

    let mut subtree = matches.clone();
    for i in (1..count).rev() {
        if let Some(parent) = tree.parents[i] {
            if subtree[i] {
                subtree[parent] = true;
            }
        }
    }

    (0..count)
        .map(|i| {
            let mut ancestor = tree.parents[i];
            while let Some(a) = ancestor {
                if matches[a] {
                    return true;
                }
                ancestor = tree.parents[a];
            }
            subtree[i]
        })
        .collect()
}

fn group_ids(tree: &GroupTree) -> Vec<Uuid> {
    tree.subgroups(ROOT_GROUP_ID).into_iter().map(|g| g.id).collect()
}

fn connection_ids(tree: &GroupTree) -> Vec<Uuid> {
    tree.connections_in_group(ROOT_GROUP_ID)
        .into_iter()
        .map(|c| c.id)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========== No Filter ==========

    #[test]
    fn everything_visible_without_filter(
        paths in arb_group_paths(),
        servers in arb_server_names(),
        blank in prop_oneof![Just(""), Just("   "), Just("\t")]
    ) {
        let groups = build_groups(&paths, &servers);
        let explorer = ExplorerTree::new();
        let source = ServerTree::new(&groups, &explorer);
        let mut filter = TreeVisibilityFilter::with_filter(blank);

        prop_assert!(!filter.is_active());
        for id in group_ids(&groups) {
            prop_assert!(filter.is_visible(&source, TreeElement::Group(id)));
        }
        for id in connection_ids(&groups) {
            prop_assert!(filter.is_visible(&source, TreeElement::Profile(id)));
        }
    }

    // ========== Group Name Matches ==========
    //
    // A group whose name contains the text is visible, and so is everything
    // below it.

    #[test]
    fn matching_group_shows_its_subtree(
        paths in arb_group_paths(),
        servers in arb_server_names(),
        text in arb_plain_filter()
    ) {
        let groups = build_groups(&paths, &servers);
        let explorer = ExplorerTree::new();
        let source = ServerTree::new(&groups, &explorer);
        let mut filter = TreeVisibilityFilter::with_filter(&text);

        for id in group_ids(&groups) {
            let Some(group) = groups.group(id) else { continue };
            if !group.name.to_lowercase().contains(&text) {
                continue;
            }
            prop_assert!(filter.is_visible(&source, TreeElement::Group(id)));
            for below in groups.subgroups(id) {
                prop_assert!(filter.is_visible(&source, TreeElement::Group(below.id)));
            }
            for profile in groups.connections_in_group(id) {
                prop_assert!(filter.is_visible(&source, TreeElement::Profile(profile.id)));
            }
        }
    }

    // ========== Upward Closure ==========
    //
    // A visible element always has a visible parent group, so the view never
    // shows an element without its path.

    #[test]
    fn visible_elements_have_visible_parents(
        paths in arb_group_paths(),
        servers in arb_server_names(),
        text in arb_plain_filter()
    ) {
        let groups = build_groups(&paths, &servers);
        let explorer = ExplorerTree::new();
        let source = ServerTree::new(&groups, &explorer);
        let mut filter = TreeVisibilityFilter::with_filter(&text);

        for id in group_ids(&groups) {
            let parent = groups.group(id).and_then(|g| g.parent_id).unwrap_or(ROOT_GROUP_ID);
            if parent == ROOT_GROUP_ID {
                continue;
            }
            if filter.is_visible(&source, TreeElement::Group(id)) {
                prop_assert!(filter.is_visible(&source, TreeElement::Group(parent)));
            }
        }
        for id in connection_ids(&groups) {
            let group = groups.connection(id).map_or(ROOT_GROUP_ID, |c| c.group_id);
            if group == ROOT_GROUP_ID {
                continue;
            }
            if filter.is_visible(&source, TreeElement::Profile(id)) {
                prop_assert!(filter.is_visible(&source, TreeElement::Group(group)));
            }
        }
    }

    // ========== Case Insensitivity ==========

    #[test]
    fn filter_ignores_case(
        paths in arb_group_paths(),
        servers in arb_server_names(),
        text in arb_plain_filter()
    ) {
        let groups = build_groups(&paths, &servers);
        let explorer = ExplorerTree::new();
        let source = ServerTree::new(&groups, &explorer);
        let mut lower = TreeVisibilityFilter::with_filter(&text);
        let mut upper = TreeVisibilityFilter::with_filter(&text.to_uppercase());

        for id in group_ids(&groups) {
            prop_assert_eq!(
                lower.is_visible(&source, TreeElement::Group(id)),
                upper.is_visible(&source, TreeElement::Group(id))
            );
        }
        for id in connection_ids(&groups) {
            prop_assert_eq!(
                lower.is_visible(&source, TreeElement::Profile(id)),
                upper.is_visible(&source, TreeElement::Profile(id))
            );
        }
    }

    // ========== Typed Filters ==========
    //
    // Typed filters never match group names, so a tree with no connections
    // shows nothing.

    #[test]
    fn typed_filter_hides_empty_groups(
        paths in arb_group_paths(),
        prefix in prop_oneof![Just("db"), Just("sp"), Just("fn")],
        text in arb_plain_filter()
    ) {
        let groups = build_groups(&paths, &[]);
        let explorer = ExplorerTree::new();
        let source = ServerTree::new(&groups, &explorer);
        let mut filter = TreeVisibilityFilter::with_filter(&format!("{prefix}:{text}"));

        for id in group_ids(&groups) {
            prop_assert!(!filter.is_visible(&source, TreeElement::Group(id)));
        }
    }

    // ========== Explorer Nodes ==========
    //
    // A node is visible exactly when a non-folder ancestor matches or a
    // non-folder node in its own subtree matches, in any query order.

    #[test]
    fn node_visibility_matches_reference(
        shape in arb_explorer_shape(),
        text in arb_node_filter()
    ) {
        let tree = build_explorer(&shape);
        let source = ServerTree::new(&tree.groups, &tree.explorer);
        let expected = expected_visibility(&tree, &text);

        let mut forward = TreeVisibilityFilter::with_filter(&text);
        let forward_results: Vec<bool> = tree
            .nodes
            .iter()
            .map(|id| forward.is_visible(&source, TreeElement::Node(*id)))
            .collect();
        prop_assert_eq!(&forward_results, &expected);

        let mut backward = TreeVisibilityFilter::with_filter(&text);
        let mut backward_results: Vec<bool> = tree
            .nodes
            .iter()
            .rev()
            .map(|id| backward.is_visible(&source, TreeElement::Node(*id)))
            .collect();
        backward_results.reverse();
        prop_assert_eq!(&backward_results, &expected);
    }

    #[test]
    fn connected_profile_follows_its_root_node(
        shape in arb_explorer_shape(),
        text in arb_node_filter()
    ) {
        let tree = build_explorer(&shape);
        let source = ServerTree::new(&tree.groups, &tree.explorer);
        let expected = expected_visibility(&tree, &text);
        let profile = connection_ids(&tree.groups)[0];

        let mut filter = TreeVisibilityFilter::with_filter(&text);
        prop_assert_eq!(
            filter.is_visible(&source, TreeElement::Profile(profile)),
            expected[0]
        );
    }

    // ========== Cache Invalidation ==========
    //
    // Changing the filter text never reuses results computed for the old
    // text.

    #[test]
    fn changing_filter_discards_cached_results(
        shape in arb_explorer_shape(),
        first in arb_node_filter(),
        second in arb_node_filter()
    ) {
        let tree = build_explorer(&shape);
        let source = ServerTree::new(&tree.groups, &tree.explorer);
        let expected = expected_visibility(&tree, &second);

        let mut filter = TreeVisibilityFilter::with_filter(&first);
        for id in &tree.nodes {
            filter.is_visible(&source, TreeElement::Node(*id));
        }
        filter.set_filter_string(&second);

        let mut results = HashMap::new();
        for (i, id) in tree.nodes.iter().enumerate() {
            results.insert(i, filter.is_visible(&source, TreeElement::Node(*id)));
        }
        for (i, visible) in expected.iter().enumerate() {
            prop_assert_eq!(results[&i], *visible);
        }
    }
}
