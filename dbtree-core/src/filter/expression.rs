//! Parsing of the server tree filter box text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Object type a filter can be restricted to with a `prefix:` marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeFilterType {
    /// `db:`
    Database,
    /// `sp:`
    StoredProcedure,
    /// `fn:`
    Function,
}

impl NodeFilterType {
    /// Parses a filter prefix, ignoring case
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.trim().to_lowercase().as_str() {
            "db" => Some(Self::Database),
            "sp" => Some(Self::StoredProcedure),
            "fn" => Some(Self::Function),
            _ => None,
        }
    }

    /// The prefix that selects this type
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Database => "db",
            Self::StoredProcedure => "sp",
            Self::Function => "fn",
        }
    }

    /// Returns true if an explorer node type tag belongs to this filter type
    ///
    /// Function filters cover every function kind the explorer reports
    /// (`ScalarValuedFunction`, `TableValuedFunction`, ...).
    #[must_use]
    pub fn matches(self, node_type: &str) -> bool {
        match self {
            Self::Database => node_type == "Database",
            Self::StoredProcedure => node_type == "StoredProcedure",
            Self::Function => node_type.ends_with("Function"),
        }
    }
}

impl fmt::Display for NodeFilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Parsed form of the filter text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterExpression {
    /// Lowercased text to look for; may be empty when only a type is given
    pub filter_string: String,
    /// Object type restriction, if a known prefix was given
    pub filter_type: Option<NodeFilterType>,
}

impl FilterExpression {
    /// Parses filter text
    ///
    /// Returns None when the text is blank (no filtering). A known prefix
    /// before the first colon selects a type and the rest, trimmed, is the
    /// search text; later colons are part of the text. Any other prefix is
    /// not a type: the whole text, colons included, is searched for.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let lowered = text.to_lowercase();

        if let Some((prefix, rest)) = lowered.split_once(':') {
            if let Some(filter_type) = NodeFilterType::from_prefix(prefix) {
                return Some(Self {
                    filter_string: rest.trim().to_string(),
                    filter_type: Some(filter_type),
                });
            }
        }

        Some(Self {
            filter_string: lowered,
            filter_type: None,
        })
    }

    /// Case-insensitive substring test; an empty search text matches
    #[must_use]
    pub fn matches_text(&self, candidate: &str) -> bool {
        self.filter_string.is_empty() || candidate.to_lowercase().contains(&self.filter_string)
    }

    /// Matches a group name; typed filters never match groups
    #[must_use]
    pub fn matches_group_name(&self, name: &str) -> bool {
        self.filter_type.is_none()
            && !self.filter_string.is_empty()
            && name.to_lowercase().contains(&self.filter_string)
    }

    /// Matches a node's own type and label
    #[must_use]
    pub fn matches_node(&self, node_type: &str, label: &str) -> bool {
        if let Some(filter_type) = self.filter_type {
            if !filter_type.matches(node_type) {
                return false;
            }
        }
        self.matches_text(label)
    }
}
