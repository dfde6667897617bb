//! Core data models for `DbTree`
//!
//! This module defines the primary data structures used throughout `DbTree`:
//! connection groups, connection profiles and hierarchical explorer nodes.

mod group;
mod node;
mod profile;

pub use group::ConnectionGroup;
pub use node::{ExplorerNode, NodeId, FOLDER_NODE_TYPE};
pub use profile::{ConnectionProfile, DEFAULT_PROVIDER};
