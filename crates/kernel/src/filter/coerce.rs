//! Value coercion into declared column types.
//!
//! Every coercion is fallible and returns `None` rather than an error: a
//! filter value that does not convert is dropped, and a row value that
//! does not convert counts as "no value".

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use super::types::Operator;
use crate::types::{ColumnType, value_text};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// A value converted into its column's type.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Text(String),
    Number(f64),
    /// Calendar day; time of day is discarded.
    Date(NaiveDate),
    List(Vec<Coerced>),
}

impl Coerced {
    /// Order two scalars of the same kind. Mixed kinds and lists don't
    /// compare.
    pub fn compare(&self, other: &Coerced) -> Option<Ordering> {
        match (self, other) {
            (Coerced::Text(a), Coerced::Text(b)) => Some(a.cmp(b)),
            (Coerced::Number(a), Coerced::Number(b)) => a.partial_cmp(b),
            (Coerced::Date(a), Coerced::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Text form used by `like`.
    pub fn text(&self) -> String {
        match self {
            Coerced::Text(s) => s.clone(),
            Coerced::Number(n) => n.to_string(),
            Coerced::Date(d) => d.format("%Y-%m-%d").to_string(),
            Coerced::List(items) => items
                .iter()
                .map(Coerced::text)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Parse a finite number from a JSON number or numeric string.
pub fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Parse a point in time, normalized to UTC.
///
/// Accepts RFC 3339 (converted by its offset), ISO-like date-times without
/// offset and plain dates (midnight), both read as UTC, and integer epoch
/// milliseconds.
pub fn parse_instant(value: &Value) -> Option<NaiveDateTime> {
    parse_datetime(value).map(|dt| dt.naive_utc())
}

/// Calendar-only parse: the day as written, ignoring any offset.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    parse_datetime(value).map(|dt| dt.date_naive())
}

fn parse_datetime(value: &Value) -> Option<DateTime<FixedOffset>> {
    match value {
        Value::Number(n) => {
            let millis = n.as_i64()?;
            DateTime::from_timestamp_millis(millis).map(|dt| dt.fixed_offset())
        }
        Value::String(s) => parse_datetime_str(s.trim()),
        _ => None,
    }
}

fn parse_datetime_str(s: &str) -> Option<DateTime<FixedOffset>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc().fixed_offset());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return Some(d.and_time(NaiveTime::MIN).and_utc().fixed_offset());
        }
    }
    None
}

/// Coerce a single value to `column_type`.
///
/// Null and the empty string never coerce. String-like columns (string,
/// icon, object) compare on text; arrays and objects use their JSON text.
pub fn coerce_scalar(value: &Value, column_type: ColumnType) -> Option<Coerced> {
    match column_type {
        ColumnType::Number => parse_number(value).map(Coerced::Number),
        ColumnType::Date | ColumnType::Datetime => parse_date(value).map(Coerced::Date),
        ColumnType::String | ColumnType::Icon | ColumnType::Object => {
            let text = value_text(value)?;
            (!text.is_empty()).then_some(Coerced::Text(text))
        }
    }
}

/// Coerce a raw filter value for `operator`.
///
/// `between` needs exactly two bounds that both coerce. Arrays coerce
/// element-wise and any failing element fails the whole value. A scalar
/// given to `in` becomes a one-element list.
pub fn coerce_filter_value(
    raw: &Value,
    operator: Operator,
    column_type: ColumnType,
) -> Option<Coerced> {
    match (operator, raw) {
        (Operator::Between, Value::Array(bounds)) if bounds.len() == 2 => {
            let low = coerce_scalar(&bounds[0], column_type)?;
            let high = coerce_scalar(&bounds[1], column_type)?;
            Some(Coerced::List(vec![low, high]))
        }
        (Operator::Between, _) => None,
        (_, Value::Array(items)) => items
            .iter()
            .map(|item| coerce_scalar(item, column_type))
            .collect::<Option<Vec<_>>>()
            .map(Coerced::List),
        (Operator::In, scalar) => coerce_scalar(scalar, column_type).map(|v| Coerced::List(vec![v])),
        (_, scalar) => coerce_scalar(scalar, column_type),
    }
}
