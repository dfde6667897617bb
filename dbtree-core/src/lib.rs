//! `DbTree` Core Library
//!
//! This crate provides the core functionality for the `DbTree` server tree:
//! the connection group hierarchy, the object explorer node store, filtering
//! of the tree by free text or object type, profiler event filtering, and
//! TOML configuration.

pub mod config;
pub mod connection;
pub mod error;
pub mod explorer;
pub mod filter;
pub mod group;
pub mod models;
pub mod profiler;

pub use config::{AppSettings, ConfigManager, LoggingSettings, TreeSettings};
pub use connection::ConnectionManager;
pub use error::{
    ConfigError, ConfigResult, DbTreeError, GroupError, GroupResult, ProfilerError,
    ProfilerResult, Result,
};
pub use explorer::{ExplorerSnapshot, ExplorerTree, ServerTree, TreeDataSource};
pub use filter::{
    filter_tree_view, search_connections, search_tree, ConnectionStatus, FilterExpression,
    NodeFilterType, TreeElement, TreeView, TreeVisibilityFilter,
};
pub use group::{
    group_full_name_parts, is_root, same_group_name, GroupTree, ROOT_GROUP_ID, ROOT_NAME,
};
pub use models::{ConnectionGroup, ConnectionProfile, ExplorerNode, NodeId};
pub use profiler::{filter_data, FieldType, FilterClause, FilterOperator, ProfilerFilter, Row};
