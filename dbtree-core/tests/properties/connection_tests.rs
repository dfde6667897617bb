//! Property-based tests for the connection manager
//!
//! These tests drive `ConnectionManager` through random operation sequences
//! and check the recently used list and the tree views it feeds.

use std::collections::HashSet;

use dbtree_core::{
    AppSettings, ConfigManager, ConnectionManager, ConnectionProfile, TreeView, ROOT_GROUP_ID,
};
use proptest::prelude::*;
use tempfile::TempDir;
use uuid::Uuid;

// ========== Strategies ==========

/// Strategy for a sequence of connection picks, as indexes into the pool
fn arb_picks() -> impl Strategy<Value = Vec<prop::sample::Index>> {
    prop::collection::vec(any::<prop::sample::Index>(), 0..30)
}

/// Creates a manager whose recently used list holds at most `max_recent`
fn manager_with(temp: &TempDir, max_recent: usize) -> ConnectionManager {
    let config = ConfigManager::with_config_dir(temp.path().to_path_buf());
    let mut settings = AppSettings::default();
    settings.tree.max_recent_connections = max_recent;
    config.save_settings(&settings).unwrap();
    ConnectionManager::new(config).unwrap()
}

fn add_pool(manager: &mut ConnectionManager, size: usize) -> Vec<Uuid> {
    let group = manager.save_group("Pool/Servers", None, None).unwrap();
    (0..size)
        .map(|i| {
            manager
                .create_connection(ConnectionProfile::new(format!("sql{i:02}")).with_group(group))
                .unwrap()
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    // ========== Recently Used List ==========
    //
    // The list is most recent first, has no duplicates and never exceeds
    // its configured length.

    #[test]
    fn recent_list_is_bounded_mru(
        max_recent in 1usize..6,
        pool_size in 1usize..8,
        picks in arb_picks()
    ) {
        let temp = TempDir::new().unwrap();
        let mut manager = manager_with(&temp, max_recent);
        let pool = add_pool(&mut manager, pool_size);

        let mut model: Vec<Uuid> = Vec::new();
        for pick in &picks {
            let id = pool[pick.index(pool.len())];
            manager.mark_connected(id).unwrap();
            model.retain(|other| *other != id);
            model.insert(0, id);
            model.truncate(max_recent);
        }

        let recent: Vec<Uuid> = manager.recent_connections().iter().map(|c| c.id).collect();
        let unique: HashSet<Uuid> = recent.iter().copied().collect();
        prop_assert!(recent.len() <= max_recent);
        prop_assert_eq!(unique.len(), recent.len());
        prop_assert_eq!(recent, model);
    }

    #[test]
    fn recent_list_survives_reload(pool_size in 1usize..6, picks in arb_picks()) {
        let temp = TempDir::new().unwrap();
        let mut manager = manager_with(&temp, 25);
        let pool = add_pool(&mut manager, pool_size);
        for pick in &picks {
            manager.mark_connected(pool[pick.index(pool.len())]).unwrap();
        }
        let before: Vec<Uuid> = manager.recent_connections().iter().map(|c| c.id).collect();

        let reloaded =
            ConnectionManager::new(ConfigManager::with_config_dir(temp.path().to_path_buf()))
                .unwrap();
        let after: Vec<Uuid> = reloaded.recent_connections().iter().map(|c| c.id).collect();
        prop_assert_eq!(after, before);
        // Open connections are not persisted
        for id in &pool {
            prop_assert!(!reloaded.is_connected(*id));
        }
    }

    #[test]
    fn deleted_connections_leave_recent_list(
        pool_size in 2usize..6,
        picks in arb_picks(),
        victim in any::<prop::sample::Index>()
    ) {
        let temp = TempDir::new().unwrap();
        let mut manager = manager_with(&temp, 25);
        let pool = add_pool(&mut manager, pool_size);
        for pick in &picks {
            manager.mark_connected(pool[pick.index(pool.len())]).unwrap();
        }

        let victim = pool[victim.index(pool.len())];
        manager.delete_connection(victim).unwrap();
        prop_assert!(!manager.is_recent(victim));
        prop_assert!(!manager.is_connected(victim));
        prop_assert!(manager.recent_connections().iter().all(|c| c.id != victim));
    }

    // ========== Views ==========
    //
    // The active view holds exactly the connected profiles, each under the
    // same group path as in the full tree.

    #[test]
    fn active_view_holds_connected_profiles(pool_size in 1usize..6, picks in arb_picks()) {
        let temp = TempDir::new().unwrap();
        let mut manager = manager_with(&temp, 25);
        let pool = add_pool(&mut manager, pool_size);

        let mut connected = HashSet::new();
        for pick in &picks {
            let id = pool[pick.index(pool.len())];
            manager.mark_connected(id).unwrap();
            connected.insert(id);
        }

        match manager.view(TreeView::Active) {
            None => prop_assert!(connected.is_empty()),
            Some(view) => {
                let shown: HashSet<Uuid> = view
                    .connections_in_group(ROOT_GROUP_ID)
                    .into_iter()
                    .map(|c| c.id)
                    .collect();
                prop_assert_eq!(&shown, &connected);
                for id in &shown {
                    let group = view.connection(*id).map(|c| c.group_id);
                    prop_assert_eq!(
                        group.and_then(|g| view.full_name(g)),
                        Some("Pool/Servers".to_string())
                    );
                }
            }
        }
    }
}
