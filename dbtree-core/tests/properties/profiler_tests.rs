//! Property-based tests for profiler event filtering

use dbtree_core::{filter_data, FieldType, FilterClause, FilterOperator, ProfilerFilter, Row};
use proptest::prelude::*;

// ========== Strategies ==========

/// Strategy for generating integer field values
fn arb_number() -> impl Strategy<Value = i64> {
    -100_000i64..100_000
}

/// Strategy for generating free text that never parses as a number or date
fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z ]{0,12}"
}

/// Strategy for generating a small set of event rows
fn arb_rows() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (
            arb_number(),
            prop::option::of(arb_text()),
            prop::option::of(arb_text()),
        )
            .prop_map(|(duration, text, database)| {
                let mut row = Row::new();
                row.insert("Duration".to_string(), duration.to_string());
                if let Some(text) = text {
                    row.insert("TextData".to_string(), text);
                }
                if let Some(database) = database {
                    row.insert("DatabaseName".to_string(), database);
                }
                row
            }),
        0..12,
    )
}

fn row(field: &str, value: &str) -> Row {
    Row::from([(field.to_string(), value.to_string())])
}

fn holds(operator: FilterOperator, row_value: &str, clause_value: &str) -> bool {
    ProfilerFilter::new()
        .with_clause(FilterClause::new("Field", operator, clause_value))
        .matches(&row("Field", row_value))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========== Numeric Comparison ==========
    //
    // Numbers compare by value, not by spelling.

    #[test]
    fn equal_numbers_match_regardless_of_format(n in arb_number()) {
        let plain = n.to_string();
        let decimal = format!("{n}.0");
        prop_assert!(holds(FilterOperator::Equals, &plain, &decimal));
        prop_assert!(!holds(FilterOperator::NotEquals, &plain, &decimal));
    }

    #[test]
    fn order_operators_follow_numeric_order(a in arb_number(), b in arb_number()) {
        let (a_text, b_text) = (a.to_string(), b.to_string());
        prop_assert_eq!(holds(FilterOperator::GreaterThan, &a_text, &b_text), a > b);
        prop_assert_eq!(holds(FilterOperator::GreaterThanOrEquals, &a_text, &b_text), a >= b);
        prop_assert_eq!(holds(FilterOperator::LessThan, &a_text, &b_text), a < b);
        prop_assert_eq!(holds(FilterOperator::LessThanOrEquals, &a_text, &b_text), a <= b);
    }

    #[test]
    fn order_operators_never_hold_for_text(value in arb_text(), other in arb_text()) {
        prop_assert!(matches!(FieldType::resolve(&other), FieldType::Text(_)));
        for operator in [
            FilterOperator::GreaterThan,
            FilterOperator::GreaterThanOrEquals,
            FilterOperator::LessThan,
            FilterOperator::LessThanOrEquals,
        ] {
            prop_assert!(!holds(operator, &value, &other));
            prop_assert!(FilterClause::new("Field", operator, other.as_str()).validate().is_err());
        }
    }

    // ========== Negated Operators ==========
    //
    // Each negated operator holds exactly when its positive form does not.

    #[test]
    fn negated_operators_are_complements(value in arb_text(), needle in arb_text()) {
        let pairs = [
            (FilterOperator::Equals, FilterOperator::NotEquals),
            (FilterOperator::Contains, FilterOperator::NotContains),
            (FilterOperator::StartsWith, FilterOperator::NotStartsWith),
        ];
        for (positive, negative) in pairs {
            prop_assert_ne!(holds(positive, &value, &needle), holds(negative, &value, &needle));
        }
    }

    #[test]
    fn text_operators_ignore_case(value in arb_text()) {
        let upper = value.to_uppercase();
        prop_assert!(holds(FilterOperator::Equals, &value, &upper));
        prop_assert!(holds(FilterOperator::Contains, &upper, &value));
        prop_assert!(holds(FilterOperator::StartsWith, &value.to_lowercase(), &upper));
    }

    // ========== Null Checks ==========

    #[test]
    fn null_checks_follow_field_presence(rows in arb_rows()) {
        let is_null = ProfilerFilter::new().with_clause(FilterClause::null_check("TextData", true));
        let not_null = ProfilerFilter::new().with_clause(FilterClause::null_check("TextData", false));

        for row in &rows {
            let missing = row.get("TextData").is_none_or(String::is_empty);
            prop_assert_eq!(is_null.matches(row), missing);
            prop_assert_eq!(not_null.matches(row), !missing);
        }
    }

    // ========== Row Selection ==========
    //
    // Filtering keeps input order, an empty filter keeps everything, and
    // clauses combine with AND.

    #[test]
    fn empty_filter_keeps_all_rows(rows in arb_rows()) {
        let kept = filter_data(&ProfilerFilter::new(), &rows);
        prop_assert_eq!(kept.len(), rows.len());
    }

    #[test]
    fn clauses_combine_with_and(rows in arb_rows(), threshold in arb_number()) {
        let duration = FilterClause::new(
            "Duration",
            FilterOperator::GreaterThan,
            threshold.to_string(),
        );
        let has_text = FilterClause::null_check("TextData", false);

        let both = ProfilerFilter::new()
            .with_clause(duration.clone())
            .with_clause(has_text.clone());
        let first = ProfilerFilter::new().with_clause(duration);
        let second = ProfilerFilter::new().with_clause(has_text);

        let kept = filter_data(&both, &rows);
        let expected: Vec<&Row> = rows
            .iter()
            .filter(|row| first.matches(row) && second.matches(row))
            .collect();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn filter_preserves_input_order(rows in arb_rows(), threshold in arb_number()) {
        let filter = ProfilerFilter::new().with_clause(FilterClause::new(
            "Duration",
            FilterOperator::LessThanOrEquals,
            threshold.to_string(),
        ));
        let kept = filter_data(&filter, &rows);
        let positions: Vec<usize> = kept
            .iter()
            .filter_map(|k| rows.iter().position(|r| std::ptr::eq(r, *k)))
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(positions.len(), kept.len());
    }
}
