//! Compiled filter criteria.
//!
//! A criterion holds an already-coerced filter value. Evaluation coerces the
//! row's value the same way and applies the operator; it has no side
//! effects, so the same (filter value, row value) pair always gives the
//! same answer.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::coerce::{Coerced, coerce_scalar};
use super::types::{FilterFn, Operator};
use crate::types::{ColumnType, Row, field_value};

/// Comparison on a string-like or number column.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueCriterion {
    pub field: String,
    pub value: Coerced,
    pub column_type: ColumnType,
    pub operator: Operator,
}

/// Comparison at calendar-day granularity.
#[derive(Debug, Clone, PartialEq)]
pub struct DateCriterion {
    pub field: String,
    /// A `Coerced::Date`, or a list of them for `between`/`in`.
    pub value: Coerced,
    pub operator: Operator,
}

/// Caller-supplied predicate over the raw values.
#[derive(Clone)]
pub struct FunctionCriterion {
    pub field: String,
    pub raw_value: Value,
    pub predicate: FilterFn,
    pub params: Value,
}

impl fmt::Debug for FunctionCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCriterion")
            .field("field", &self.field)
            .field("raw_value", &self.raw_value)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl PartialEq for FunctionCriterion {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
            && self.raw_value == other.raw_value
            && self.params == other.params
            && std::ptr::addr_eq(Arc::as_ptr(&self.predicate), Arc::as_ptr(&other.predicate))
    }
}

/// One compiled filter condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Value(ValueCriterion),
    Date(DateCriterion),
    Function(FunctionCriterion),
}

impl Criterion {
    pub fn field(&self) -> &str {
        match self {
            Criterion::Value(c) => &c.field,
            Criterion::Date(c) => &c.field,
            Criterion::Function(c) => &c.field,
        }
    }

    /// Decide whether a row value passes.
    pub fn evaluate(&self, row_value: &Value, row: &Row) -> bool {
        match self {
            Criterion::Value(c) => {
                let coerced = coerce_scalar(row_value, c.column_type);
                evaluate_operator(c.operator, coerced.as_ref(), &c.value)
            }
            Criterion::Date(c) => {
                let coerced = coerce_scalar(row_value, ColumnType::Date);
                evaluate_operator(c.operator, coerced.as_ref(), &c.value)
            }
            Criterion::Function(c) => (c.predicate)(&c.raw_value, row_value, row, &c.params),
        }
    }

    /// Evaluate against the row's own value for this criterion's field.
    /// Missing fields evaluate as null.
    pub fn matches(&self, row: &Row) -> bool {
        let value = field_value(row, self.field()).unwrap_or(&Value::Null);
        self.evaluate(value, row)
    }
}

/// Apply `operator` between a coerced row value and a coerced filter value.
///
/// A row value that failed to coerce (`None`) only satisfies `!=` and an
/// empty `in`.
fn evaluate_operator(operator: Operator, row: Option<&Coerced>, filter: &Coerced) -> bool {
    match operator {
        Operator::Between => {
            let (Some(row), Coerced::List(bounds)) = (row, filter) else {
                return false;
            };
            let [low, high] = bounds.as_slice() else {
                return false;
            };
            matches!(row.compare(low), Some(Ordering::Greater | Ordering::Equal))
                && matches!(row.compare(high), Some(Ordering::Less | Ordering::Equal))
        }
        Operator::In => match filter {
            Coerced::List(items) if items.is_empty() => true,
            Coerced::List(items) => items.iter().any(|v| compare_scalar(Operator::Equals, row, v)),
            scalar => compare_scalar(Operator::Equals, row, scalar),
        },
        _ => match filter {
            Coerced::List(items) => items.iter().any(|v| compare_scalar(operator, row, v)),
            scalar => compare_scalar(operator, row, scalar),
        },
    }
}

fn compare_scalar(operator: Operator, row: Option<&Coerced>, filter: &Coerced) -> bool {
    let Some(row) = row else {
        return operator == Operator::NotEquals;
    };

    if operator == Operator::Like {
        return match (row, filter) {
            (Coerced::Date(a), Coerced::Date(b)) => a == b,
            _ => {
                let haystack = row.text().to_lowercase();
                !haystack.is_empty() && haystack.contains(&filter.text().to_lowercase())
            }
        };
    }

    let Some(ordering) = row.compare(filter) else {
        return operator == Operator::NotEquals;
    };
    match operator {
        Operator::Equals => ordering == Ordering::Equal,
        Operator::NotEquals => ordering != Ordering::Equal,
        Operator::LessThan => ordering == Ordering::Less,
        Operator::LessOrEqual => ordering != Ordering::Greater,
        Operator::GreaterThan => ordering == Ordering::Greater,
        Operator::GreaterOrEqual => ordering != Ordering::Less,
        Operator::Like | Operator::Between | Operator::In => false,
    }
}
