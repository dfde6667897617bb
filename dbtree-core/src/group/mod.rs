//! Group path model
//!
//! Canonical parsing and comparison of group full names (`ROOT/Prod/Web`),
//! plus the [`GroupTree`] arena that owns groups and connection profiles.
//!
//! Group names compare case-insensitively everywhere; the stored name keeps
//! its original case. The reserved root token is `ROOT` (any case on input,
//! uppercase on output) and the root group itself has an empty name.

mod tree;

pub use tree::GroupTree;

use uuid::Uuid;

/// Reserved name of the root group in full-name paths
pub const ROOT_NAME: &str = "ROOT";

/// Separator between segments of a group full name
pub const GROUP_SEPARATOR: char = '/';

/// Fixed id of the root group of every tree
pub const ROOT_GROUP_ID: Uuid = Uuid::from_u128(0xC777_F06B_202E_4480_B475_FA41_6154_D458);

/// Returns true if `name` denotes the root group
///
/// Empty, missing, a lone separator, or `ROOT` in any case are all root.
#[must_use]
pub fn is_root(name: Option<&str>) -> bool {
    match name {
        None => true,
        Some(name) => {
            name.is_empty() || name == "/" || name.eq_ignore_ascii_case(ROOT_NAME)
        }
    }
}

/// Compares two group full names
///
/// Two root-like names are equal. Otherwise both must be present and equal
/// ignoring case.
#[must_use]
pub fn same_group_name(a: Option<&str>, b: Option<&str>) -> bool {
    if is_root(a) && is_root(b) {
        return true;
    }
    match (a, b) {
        (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
        _ => false,
    }
}

/// Splits a full name into its segments, always starting with `ROOT`
///
/// Empty segments are dropped; a leading root segment in any case is
/// normalized to [`ROOT_NAME`], and one is inserted when absent.
#[must_use]
pub fn group_full_name_parts(full_name: Option<&str>) -> Vec<String> {
    let mut parts: Vec<String> = full_name
        .unwrap_or_default()
        .split(GROUP_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();

    let starts_at_root = parts
        .first()
        .is_some_and(|first| first.eq_ignore_ascii_case(ROOT_NAME));
    if starts_at_root {
        parts[0] = ROOT_NAME.to_string();
    } else {
        parts.insert(0, ROOT_NAME.to_string());
    }
    parts
}

/// Normalizes a stored group name: root-like names become empty
#[must_use]
pub fn normalize_group_name(name: &str) -> String {
    if is_root(Some(name)) {
        String::new()
    } else {
        name.to_string()
    }
}
