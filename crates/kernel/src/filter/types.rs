//! Filter operator types.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Row;

/// Comparison operators for filtering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    /// Exact match.
    #[default]
    #[serde(rename = "equals")]
    Equals,
    /// Case-insensitive substring match.
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "!=")]
    NotEquals,
    /// Inclusive range over a two-element bound.
    #[serde(rename = "between")]
    Between,
    /// Membership; an empty bound matches everything.
    #[serde(rename = "in")]
    In,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::Like => "like",
            Operator::LessThan => "<",
            Operator::LessOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::NotEquals => "!=",
            Operator::Between => "between",
            Operator::In => "in",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim().to_ascii_lowercase().as_str() {
            "equals" | "=" | "==" => Operator::Equals,
            "like" => Operator::Like,
            "<" => Operator::LessThan,
            "<=" => Operator::LessOrEqual,
            ">" => Operator::GreaterThan,
            ">=" => Operator::GreaterOrEqual,
            "!=" | "<>" => Operator::NotEquals,
            "between" => Operator::Between,
            "in" => Operator::In,
            other => return Err(format!("unknown filter operator '{other}'")),
        };
        Ok(op)
    }
}

/// Caller-supplied predicate: `(filter_value, row_value, row, params) -> keep`.
pub type FilterFn = Arc<dyn Fn(&Value, &Value, &Row, &Value) -> bool + Send + Sync>;

/// Wrap a closure as a [`FilterFn`].
pub fn filter_fn<F>(f: F) -> FilterFn
where
    F: Fn(&Value, &Value, &Row, &Value) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Operator-or-function of a filter.
#[derive(Clone)]
pub enum FilterOp {
    Named(Operator),
    /// Bypasses coercion entirely.
    Custom(FilterFn),
}

impl FilterOp {
    /// Same operator, or the same predicate allocation.
    pub fn same(&self, other: &FilterOp) -> bool {
        match (self, other) {
            (FilterOp::Named(a), FilterOp::Named(b)) => a == b,
            (FilterOp::Custom(a), FilterOp::Custom(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl Default for FilterOp {
    fn default() -> Self {
        FilterOp::Named(Operator::default())
    }
}

impl From<Operator> for FilterOp {
    fn from(op: Operator) -> Self {
        FilterOp::Named(op)
    }
}

impl fmt::Debug for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOp::Named(op) => f.debug_tuple("Named").field(op).finish(),
            FilterOp::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Filter attached to a column.
#[derive(Debug, Clone, Default)]
pub struct FilterDescriptor {
    pub op: FilterOp,
    /// Extra parameters handed to custom predicates.
    pub params: Value,
}

impl FilterDescriptor {
    pub fn named(op: Operator) -> Self {
        Self {
            op: FilterOp::Named(op),
            params: Value::Null,
        }
    }

    pub fn custom(f: FilterFn, params: Value) -> Self {
        Self {
            op: FilterOp::Custom(f),
            params,
        }
    }
}
