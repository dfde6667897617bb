//! Typed interpretation of profiler field values.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Formats tried for timestamps whose offset has no colon (`+0200`)
const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Formats tried for timestamps without an offset, read as UTC
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A field value resolved to the most specific type it parses as
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// A finite number
    Number(f64),
    /// An ISO 8601 date or date-time
    Timestamp(DateTime<Utc>),
    /// Anything else, lowercased
    Text(String),
}

impl FieldType {
    /// Resolves a raw value: number first, then timestamp, then text
    #[must_use]
    pub fn resolve(raw: &str) -> Self {
        parse_number(raw)
            .map(Self::Number)
            .or_else(|| parse_timestamp(raw).map(Self::Timestamp))
            .unwrap_or_else(|| Self::Text(raw.to_lowercase()))
    }

    /// Returns true for numbers and timestamps
    #[must_use]
    pub const fn is_ordered(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Timestamp(_))
    }

    /// Compares two values of the same kind
    ///
    /// Returns None when the kinds differ or either side is text.
    #[must_use]
    pub fn ordering(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Some(ts) = OFFSET_DATETIME_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(raw, format).ok())
    {
        return Some(ts.with_timezone(&Utc));
    }
    if let Some(ts) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(ts.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}
