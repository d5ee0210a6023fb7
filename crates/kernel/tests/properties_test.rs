#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Property-based tests for the engine's invariants.
//!
//! - paging: page counts and clamping
//! - filtering: restore on empty criteria, AND semantics, pure evaluation
//! - sorting: per-type comparators are total orders

use std::cmp::Ordering;

use proptest::prelude::*;
use serde_json::{Value, json};

use gridline_kernel::filter::{
    Criterion, DateCriterion, FilterEngine, ValueCriterion, coerce_filter_value,
};
use gridline_kernel::sort::compare_values;
use gridline_kernel::{
    ColumnDescriptor, ColumnType, Operator, Paginator, Persistence, Row, SortDirection,
};

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn number_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-1000i64..1000).prop_map(Value::from),
        (-1000.0f64..1000.0).prop_map(Value::from),
        (-1000i64..1000).prop_map(|n| Value::String(n.to_string())),
        Just(Value::Null),
        Just(json!("n/a")),
    ]
}

fn date_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        (2000i32..2030, 1u32..13, 1u32..29)
            .prop_map(|(y, m, d)| Value::String(format!("{y:04}-{m:02}-{d:02}"))),
        (2000i32..2030, 1u32..13, 1u32..29, 0u32..24)
            .prop_map(|(y, m, d, h)| Value::String(format!("{y:04}-{m:02}-{d:02}T{h:02}:00:00"))),
        Just(json!("not a date")),
        Just(Value::Null),
    ]
}

/// Scalar filter values plus two-element bounds for `between` and `in`.
fn number_filter() -> impl Strategy<Value = Value> {
    prop_oneof![
        number_value(),
        (number_value(), number_value()).prop_map(|(lo, hi)| json!([lo, hi])),
    ]
}

fn date_filter() -> impl Strategy<Value = Value> {
    prop_oneof![
        date_value(),
        (date_value(), date_value()).prop_map(|(lo, hi)| json!([lo, hi])),
    ]
}

fn text_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z]{0,6}".prop_map(Value::String),
        Just(Value::Null),
    ]
}

fn operator() -> impl Strategy<Value = Operator> {
    prop_oneof![
        Just(Operator::Equals),
        Just(Operator::Like),
        Just(Operator::LessThan),
        Just(Operator::LessOrEqual),
        Just(Operator::GreaterThan),
        Just(Operator::GreaterOrEqual),
        Just(Operator::NotEquals),
        Just(Operator::Between),
        Just(Operator::In),
    ]
}

fn direction() -> impl Strategy<Value = SortDirection> {
    prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)]
}

fn number_rows(values: &[i64]) -> Vec<Row> {
    values
        .iter()
        .map(|n| json!({"n": n}).as_object().cloned().unwrap())
        .collect()
}

fn is_total_order(values: &[Value], column_type: ColumnType, dir: SortDirection) -> bool {
    let cmp = |a: &Value, b: &Value| compare_values(Some(a), Some(b), column_type, dir);
    for a in values {
        for b in values {
            if cmp(a, b) != cmp(b, a).reverse() {
                return false;
            }
            for c in values {
                if cmp(a, b) != Ordering::Greater
                    && cmp(b, c) != Ordering::Greater
                    && cmp(a, c) == Ordering::Greater
                {
                    return false;
                }
            }
        }
    }
    true
}

// =============================================================================
// PAGING
// =============================================================================

mod paging_properties {
    use super::*;

    proptest! {
        #[test]
        fn total_pages_is_ceiling_and_at_least_one(total in 0usize..2000, rpp in 1usize..60) {
            let mut pager = Paginator::new(rpp, 5);
            pager.render_remote(&Persistence::default(), total);

            prop_assert_eq!(pager.total_pages(), total.div_ceil(rpp).max(1));
        }

        #[test]
        fn validate_page_stays_in_range(
            total in 0usize..2000,
            rpp in 0usize..60,
            requested in any::<i64>(),
        ) {
            let mut pager = Paginator::new(rpp, 5);
            pager.render_remote(&Persistence::default(), total);

            let page = pager.validate_page(requested);
            prop_assert!(page >= 1);
            prop_assert!(page <= pager.total_pages());
        }

        #[test]
        fn display_window_stays_in_range(
            total in 1usize..500,
            window in 1usize..10,
            requested in 1i64..600,
        ) {
            let mut pager = Paginator::new(1, window);
            pager.render_remote(&Persistence::default(), total);
            let current = pager.set_page(requested);

            let pages = &pager.navigation().pages;
            if pager.total_pages() > 1 {
                prop_assert!(pages.contains(&current));
                prop_assert!(pages.len() <= window);
                prop_assert!(pages.iter().all(|p| *p >= 1 && *p <= pager.total_pages()));
            } else {
                prop_assert!(pages.is_empty());
            }
        }
    }
}

// =============================================================================
// FILTERING
// =============================================================================

mod filter_properties {
    use super::*;

    proptest! {
        #[test]
        fn empty_criteria_restore_snapshot(values in prop::collection::vec(-50i64..50, 0..40)) {
            let mut persistence = Persistence::new(number_rows(&values));
            persistence.filter_from_cache(|_| false);

            let engine = FilterEngine::new(vec![
                ColumnDescriptor::new("n", ColumnType::Number).with_filter(Operator::Equals),
            ]);
            engine.apply(&mut persistence);

            prop_assert_eq!(persistence.rows(), persistence.cached_rows());
        }

        #[test]
        fn ge_filter_keeps_exactly_matching_rows(
            values in prop::collection::vec(-50i64..50, 0..40),
            threshold in -50i64..50,
        ) {
            let mut persistence = Persistence::new(number_rows(&values));
            let mut engine = FilterEngine::new(vec![
                ColumnDescriptor::new("n", ColumnType::Number).with_filter(Operator::GreaterOrEqual),
            ]);
            engine.set_input("n", Value::from(threshold));
            engine.apply(&mut persistence);

            let kept: Vec<i64> = persistence.rows().iter().filter_map(|r| r["n"].as_i64()).collect();
            let expected: Vec<i64> = values.iter().copied().filter(|n| *n >= threshold).collect();
            prop_assert_eq!(kept, expected);
        }

        #[test]
        fn number_evaluation_is_pure(
            filter in number_filter(),
            row_value in number_value(),
            op in operator(),
        ) {
            if let Some(value) = coerce_filter_value(&filter, op, ColumnType::Number) {
                let criterion = Criterion::Value(ValueCriterion {
                    field: "n".to_string(),
                    value,
                    column_type: ColumnType::Number,
                    operator: op,
                });
                let first = criterion.evaluate(&row_value, &Row::new());
                let second = criterion.evaluate(&row_value, &Row::new());
                prop_assert_eq!(first, second);
            }
        }

        #[test]
        fn date_evaluation_is_pure(
            filter in date_filter(),
            row_value in date_value(),
            op in operator(),
        ) {
            if let Some(value) = coerce_filter_value(&filter, op, ColumnType::Date) {
                let criterion = Criterion::Date(DateCriterion {
                    field: "d".to_string(),
                    value,
                    operator: op,
                });
                let first = criterion.evaluate(&row_value, &Row::new());
                let second = criterion.evaluate(&row_value, &Row::new());
                prop_assert_eq!(first, second);
            }
        }

        #[test]
        fn compile_is_repeatable(input in number_filter(), op in operator()) {
            let mut engine = FilterEngine::new(vec![
                ColumnDescriptor::new("n", ColumnType::Number).with_filter(op),
            ]);
            engine.set_input("n", input);
            prop_assert_eq!(engine.compile(), engine.compile());
        }
    }
}

// =============================================================================
// SORTING
// =============================================================================

mod sort_properties {
    use super::*;

    proptest! {
        #[test]
        fn number_comparator_is_total(
            values in prop::collection::vec(number_value(), 0..12),
            dir in direction(),
        ) {
            prop_assert!(is_total_order(&values, ColumnType::Number, dir));
        }

        #[test]
        fn date_comparator_is_total(
            values in prop::collection::vec(date_value(), 0..12),
            dir in direction(),
        ) {
            prop_assert!(is_total_order(&values, ColumnType::Datetime, dir));
        }

        #[test]
        fn string_comparator_is_total(
            values in prop::collection::vec(text_value(), 0..12),
            dir in direction(),
        ) {
            prop_assert!(is_total_order(&values, ColumnType::String, dir));
        }
    }
}
