//! Error types for `DbTree`
//!
//! This module defines all error types used throughout the `DbTree` crates,
//! providing descriptive error messages for configuration, group tree and
//! profiler filter operations.

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Top-level error type for `DbTree` operations
#[derive(Debug, Error)]
pub enum DbTreeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Group tree errors
    #[error("Group error: {0}")]
    Group(#[from] GroupError),

    /// Profiler filter errors
    #[error("Profiler filter error: {0}")]
    Profiler(#[from] ProfilerError),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to configuration file operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {reason}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// The reason for validation failure
        reason: String,
    },

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to write configuration file
    #[error("Failed to write configuration: {0}")]
    Write(String),

    /// Failed to serialize configuration
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    /// Failed to deserialize configuration
    #[error("Failed to deserialize configuration: {0}")]
    Deserialize(String),

    /// A group tree operation failed while applying a configuration change
    #[error(transparent)]
    Group(#[from] GroupError),
}

/// Errors raised by group tree mutations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupError {
    /// Group does not exist in the tree
    #[error("Group with ID {0} not found")]
    GroupNotFound(Uuid),

    /// Connection does not exist in the tree
    #[error("Connection with ID {0} not found")]
    ConnectionNotFound(Uuid),

    /// A sibling group already uses this name
    #[error("A server group named '{name}' already exists in this group")]
    DuplicateName {
        /// The conflicting name
        name: String,
    },

    /// The target group already holds the same connection target
    #[error("Same connection already exists in group {group_id}")]
    DuplicateConnection {
        /// The target group
        group_id: Uuid,
    },

    /// Re-parenting would make a group its own ancestor
    #[error("Moving group {group_id} under {parent_id} would create a cycle")]
    Cycle {
        /// The group being moved
        group_id: Uuid,
        /// The requested parent
        parent_id: Uuid,
    },

    /// Invalid group name
    #[error("Invalid group name '{name}': {reason}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// The reason it was rejected
        reason: String,
    },

    /// The root group cannot be renamed, moved or deleted
    #[error("The root group cannot be modified")]
    RootImmutable,
}

/// Errors related to profiler filter clauses
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfilerError {
    /// Operator name not recognized
    #[error("Unknown filter operator '{0}'")]
    UnknownOperator(String),

    /// Ordering operator applied to a value that is neither a number nor a timestamp
    #[error("Operator '{operator}' on field '{field}' requires a numeric or date-time value, got '{value}'")]
    UnorderedOperand {
        /// The clause field
        field: String,
        /// The ordering operator
        operator: String,
        /// The clause value
        value: String,
    },

    /// Clause is missing the value its operator compares against
    #[error("Operator '{operator}' on field '{field}' requires a value")]
    MissingValue {
        /// The clause field
        field: String,
        /// The operator
        operator: String,
    },

    /// Clause text could not be parsed
    #[error("Invalid filter clause '{0}'")]
    InvalidClause(String),
}

/// Result type alias for `DbTree` operations
pub type Result<T> = std::result::Result<T, DbTreeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for group tree operations
pub type GroupResult<T> = std::result::Result<T, GroupError>;

/// Result type alias for profiler filter operations
pub type ProfilerResult<T> = std::result::Result<T, ProfilerError>;
