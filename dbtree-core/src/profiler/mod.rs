//! Profiler event filtering
//!
//! A [`ProfilerFilter`] is a conjunction of [`FilterClause`]s evaluated
//! against event rows (field name to string value). Each clause's value is
//! resolved once into a [`FieldType`]; rows compare numerically when both
//! sides are numbers, chronologically when both are timestamps, and as
//! case-insensitive text otherwise.

mod value;

pub use value::FieldType;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use crate::error::{ProfilerError, ProfilerResult};

/// One profiler event: field name to value
pub type Row = HashMap<String, String>;

/// Comparison applied by a clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEquals,
    LessThan,
    LessThanOrEquals,
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    /// All operators, in display order
    pub const ALL: [Self; 12] = [
        Self::Equals,
        Self::NotEquals,
        Self::GreaterThan,
        Self::GreaterThanOrEquals,
        Self::LessThan,
        Self::LessThanOrEquals,
        Self::Contains,
        Self::NotContains,
        Self::StartsWith,
        Self::NotStartsWith,
        Self::IsNull,
        Self::IsNotNull,
    ];

    /// Short name used on the command line
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Equals => "eq",
            Self::NotEquals => "ne",
            Self::GreaterThan => "gt",
            Self::GreaterThanOrEquals => "gte",
            Self::LessThan => "lt",
            Self::LessThanOrEquals => "lte",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::NotStartsWith => "not_starts_with",
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
        }
    }

    /// Operators that need an ordered (number or timestamp) value
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::GreaterThan
                | Self::GreaterThanOrEquals
                | Self::LessThan
                | Self::LessThanOrEquals
        )
    }

    /// Operators that compare against a clause value
    #[must_use]
    pub const fn requires_value(self) -> bool {
        !matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterOperator {
    type Err = ProfilerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|op| op.name() == name)
            .ok_or_else(|| ProfilerError::UnknownOperator(s.to_string()))
    }
}

/// A single `field operator value` condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterClause {
    /// Row field the clause reads
    pub field: String,
    /// Comparison to apply
    pub operator: FilterOperator,
    /// Value to compare against; unused by the null checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FilterClause {
    /// Creates a clause comparing `field` with `value`
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: Some(value.into()),
        }
    }

    /// Creates a null check on `field`
    #[must_use]
    pub fn null_check(field: impl Into<String>, is_null: bool) -> Self {
        Self {
            field: field.into(),
            operator: if is_null {
                FilterOperator::IsNull
            } else {
                FilterOperator::IsNotNull
            },
            value: None,
        }
    }

    /// Checks that the clause can be evaluated meaningfully
    ///
    /// # Errors
    ///
    /// Returns an error for an empty field name, a missing value, or an
    /// ordering operator whose value is neither a number nor a timestamp.
    pub fn validate(&self) -> ProfilerResult<()> {
        if self.field.trim().is_empty() {
            return Err(ProfilerError::InvalidClause(
                "field name cannot be empty".to_string(),
            ));
        }
        if !self.operator.requires_value() {
            return Ok(());
        }
        let Some(value) = self.value.as_deref() else {
            return Err(ProfilerError::MissingValue {
                field: self.field.clone(),
                operator: self.operator.to_string(),
            });
        };
        if self.operator.is_ordering() && !FieldType::resolve(value).is_ordered() {
            return Err(ProfilerError::UnorderedOperand {
                field: self.field.clone(),
                operator: self.operator.to_string(),
                value: value.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) if self.operator.requires_value() => {
                write!(f, "{} {} '{}'", self.field, self.operator, value)
            }
            _ => write!(f, "{} {}", self.field, self.operator),
        }
    }
}

/// All clauses must hold for a row to pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilerFilter {
    /// Conditions, combined with AND
    #[serde(default)]
    pub clauses: Vec<FilterClause>,
}

impl ProfilerFilter {
    /// Creates a filter that passes every row
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a clause
    #[must_use]
    pub fn with_clause(mut self, clause: FilterClause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Returns true if the filter has no clauses
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Validates every clause
    ///
    /// # Errors
    ///
    /// Returns the first clause error found.
    pub fn validate(&self) -> ProfilerResult<()> {
        self.clauses.iter().try_for_each(FilterClause::validate)
    }

    /// Returns true if `row` satisfies every clause
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        self.resolve().iter().all(|clause| clause.matches(row))
    }

    fn resolve(&self) -> Vec<ResolvedClause<'_>> {
        self.clauses.iter().map(ResolvedClause::new).collect()
    }
}

/// Rows of `rows` that satisfy every clause of `filter`, in input order
#[must_use]
pub fn filter_data<'a>(filter: &ProfilerFilter, rows: &'a [Row]) -> Vec<&'a Row> {
    let _span = debug_span!(
        "profiler.filter_data",
        clauses = filter.clauses.len(),
        rows = rows.len()
    )
    .entered();

    let clauses = filter.resolve();
    let matched: Vec<&Row> = rows
        .iter()
        .filter(|row| clauses.iter().all(|clause| clause.matches(row)))
        .collect();
    debug!(matched = matched.len(), "Filtered profiler rows");
    matched
}

/// A clause with its value parsed once for a whole row set
struct ResolvedClause<'a> {
    clause: &'a FilterClause,
    raw: String,
    typed: FieldType,
}

impl<'a> ResolvedClause<'a> {
    fn new(clause: &'a FilterClause) -> Self {
        let raw = clause.value.as_deref().unwrap_or_default();
        Self {
            clause,
            raw: raw.to_lowercase(),
            typed: FieldType::resolve(raw),
        }
    }

    fn matches(&self, row: &Row) -> bool {
        let value = row
            .get(&self.clause.field)
            .map(String::as_str)
            .unwrap_or_default();
        let text = value.to_lowercase();

        match self.clause.operator {
            FilterOperator::IsNull => value.is_empty(),
            FilterOperator::IsNotNull => !value.is_empty(),
            FilterOperator::Contains => text.contains(&self.raw),
            FilterOperator::NotContains => !text.contains(&self.raw),
            FilterOperator::StartsWith => text.starts_with(&self.raw),
            FilterOperator::NotStartsWith => !text.starts_with(&self.raw),
            FilterOperator::Equals => self.compare(value, &text).is_eq(),
            FilterOperator::NotEquals => self.compare(value, &text).is_ne(),
            FilterOperator::GreaterThan => self.ordered(value).is_some_and(Ordering::is_gt),
            FilterOperator::GreaterThanOrEquals => {
                self.ordered(value).is_some_and(Ordering::is_ge)
            }
            FilterOperator::LessThan => self.ordered(value).is_some_and(Ordering::is_lt),
            FilterOperator::LessThanOrEquals => self.ordered(value).is_some_and(Ordering::is_le),
        }
    }

    /// Typed comparison when both sides share an ordered type, text otherwise
    fn compare(&self, value: &str, text: &str) -> Ordering {
        self.ordered(value)
            .unwrap_or_else(|| text.cmp(self.raw.as_str()))
    }

    /// Row value compared with the clause value; None unless both are
    /// numbers or both are timestamps
    fn ordered(&self, value: &str) -> Option<Ordering> {
        if !self.typed.is_ordered() {
            return None;
        }
        FieldType::resolve(value).ordering(&self.typed)
    }
}
