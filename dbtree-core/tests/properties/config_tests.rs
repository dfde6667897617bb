//! Property-based tests for configuration persistence
//!
//! Saving and reloading through `ConfigManager` must keep the group
//! hierarchy, connection placement and settings intact.

use dbtree_core::{
    AppSettings, ConfigManager, ConnectionProfile, GroupTree, LoggingSettings, TreeSettings,
    TreeView, ROOT_GROUP_ID,
};
use proptest::prelude::*;
use tempfile::TempDir;

// ========== Strategies ==========

/// Strategy for generating group full names
fn arb_group_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[A-Z][a-z]{2,6}", 1..4)
        .prop_filter("root is reserved", |segments| {
            segments.iter().all(|s| !s.eq_ignore_ascii_case("root"))
        })
        .prop_map(|segments| segments.join("/"))
}

/// Strategy for generating a connection as `(server, database, title)`
fn arb_connection() -> impl Strategy<Value = (String, Option<String>, Option<String>)> {
    (
        "[a-z][a-z0-9-]{2,10}",
        prop::option::of("[A-Za-z][A-Za-z0-9_]{0,10}"),
        prop::option::of("[A-Za-z][A-Za-z0-9 ]{0,15}"),
    )
}

/// Strategy for generating tree views
fn arb_view() -> impl Strategy<Value = TreeView> {
    prop_oneof![
        Just(TreeView::All),
        Just(TreeView::Active),
        Just(TreeView::Recent),
    ]
}

fn build_tree(
    paths: &[String],
    connections: Vec<(String, Option<String>, Option<String>)>,
) -> GroupTree {
    let mut tree = GroupTree::new();
    let mut groups = vec![ROOT_GROUP_ID];
    for path in paths {
        groups.push(tree.save_group(path, None, None).unwrap());
    }
    for (i, (server, database, title)) in connections.into_iter().enumerate() {
        let mut profile = ConnectionProfile::new(server).with_group(groups[i % groups.len()]);
        profile.database_name = database;
        profile.connection_name = title;
        let _ = tree.add_connection(profile);
    }
    tree
}

/// Every group as its full name, sorted
fn group_names(tree: &GroupTree) -> Vec<String> {
    let mut names: Vec<String> = tree
        .subgroups(ROOT_GROUP_ID)
        .into_iter()
        .filter_map(|g| tree.full_name(g.id))
        .collect();
    names.sort();
    names
}

/// Every connection as `(id, group full name, display name)`, sorted
fn placements(tree: &GroupTree) -> Vec<(String, String, String)> {
    let mut result: Vec<_> = tree
        .connections_in_group(ROOT_GROUP_ID)
        .into_iter()
        .map(|c| {
            (
                c.id.to_string(),
                tree.full_name(c.group_id).unwrap_or_default(),
                c.display_name(),
            )
        })
        .collect();
    result.sort();
    result
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // ========== Tree Persistence ==========

    #[test]
    fn saved_tree_reloads_with_same_structure(
        paths in prop::collection::vec(arb_group_path(), 0..6),
        connections in prop::collection::vec(arb_connection(), 0..8)
    ) {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_config_dir(temp.path().to_path_buf());
        let tree = build_tree(&paths, connections);

        manager.save_tree(&tree).unwrap();
        let loaded = manager.load_tree().unwrap();

        prop_assert_eq!(loaded.group_count(), tree.group_count());
        prop_assert_eq!(loaded.connection_count(), tree.connection_count());
        prop_assert_eq!(group_names(&loaded), group_names(&tree));
        prop_assert_eq!(placements(&loaded), placements(&tree));
    }

    #[test]
    fn saved_tree_keeps_child_order(
        names in prop::collection::btree_set("[A-Z][a-z]{2,6}", 1..6)
    ) {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_config_dir(temp.path().to_path_buf());
        let mut tree = GroupTree::new();
        // Reverse insertion so child order differs from sorted order
        let names: Vec<String> = names
            .into_iter()
            .filter(|n| !n.eq_ignore_ascii_case("root"))
            .rev()
            .collect();
        for name in &names {
            tree.add_group(ROOT_GROUP_ID, name, None, None).unwrap();
        }

        manager.save_tree(&tree).unwrap();
        let loaded = manager.load_tree().unwrap();
        let order: Vec<String> = loaded
            .child_groups(ROOT_GROUP_ID)
            .into_iter()
            .map(|g| g.name.clone())
            .collect();
        prop_assert_eq!(order, names);
    }

    // ========== Settings Persistence ==========

    #[test]
    fn settings_round_trip(
        max_recent in 1usize..200,
        view in arb_view(),
        level in prop_oneof![Just("warn"), Just("info"), Just("dbtree_core=debug")]
    ) {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_config_dir(temp.path().to_path_buf());
        let settings = AppSettings {
            tree: TreeSettings {
                max_recent_connections: max_recent,
                default_view: view,
            },
            logging: LoggingSettings {
                level: level.to_string(),
            },
        };

        manager.save_settings(&settings).unwrap();
        prop_assert_eq!(manager.load_settings().unwrap(), settings);
    }

    // ========== Validation ==========

    #[test]
    fn blank_server_is_rejected(spaces in " {0,4}") {
        let profile = ConnectionProfile::new(spaces);
        prop_assert!(ConfigManager::validate_connection(&profile).is_err());
    }
}
