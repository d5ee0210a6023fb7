//! Per-type row comparators.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::filter::{parse_instant, parse_number};
use crate::types::{ColumnType, SortDirection, value_text};

/// A value reduced to what its column sorts on.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Text(String),
    Number(f64),
    Instant(NaiveDateTime),
}

impl SortKey {
    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Instant(a), SortKey::Instant(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Sort key for `value`, or `None` for "no value".
///
/// Missing, null and empty values have no key; so do non-numeric values in
/// number columns and unparsable values in date columns.
fn sort_key(value: Option<&Value>, column_type: ColumnType) -> Option<SortKey> {
    let value = value?;
    match column_type {
        ColumnType::Number => parse_number(value).map(SortKey::Number),
        ColumnType::Date | ColumnType::Datetime => parse_instant(value).map(SortKey::Instant),
        ColumnType::String | ColumnType::Icon | ColumnType::Object => {
            let text = value_text(value)?;
            (!text.is_empty()).then(|| SortKey::Text(text.to_lowercase()))
        }
    }
}

/// Compare two row values of one column.
///
/// A value with no key sorts before one with a key. The full result,
/// including that rule, is reversed for [`SortDirection::Desc`], so empty
/// values end up last in a descending sort.
pub fn compare_values(
    a: Option<&Value>,
    b: Option<&Value>,
    column_type: ColumnType,
    direction: SortDirection,
) -> Ordering {
    let ordering = match (sort_key(a, column_type), sort_key(b, column_type)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.compare(&b),
    };

    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}
