//! Shared row and column types.
//!
//! Rows are JSON objects. Cloning a [`Row`] is a deep copy, which is what
//! the persistence snapshot relies on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::{FilterDescriptor, FilterFn, FilterOp, Operator};

/// One keyed record.
pub type Row = serde_json::Map<String, Value>;

/// Outgoing remote query parameters, accumulated by the `remoteParams` chain.
pub type Params = serde_json::Map<String, Value>;

/// Event fired after every state change that needs a redraw.
pub const RENDER_EVENT: &str = "render";

/// Chain event collecting outgoing query parameters in remote mode.
pub const REMOTE_PARAMS_EVENT: &str = "remoteParams";

/// Pipeline run once when the table starts.
pub const INIT_PIPELINE: &str = "init";

/// Pipeline run on explicit refresh.
pub const REFRESH_PIPELINE: &str = "refresh";

/// Declared column type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    String,
    Number,
    Date,
    Datetime,
    Icon,
    Object,
}

impl ColumnType {
    /// Date-like columns filter and sort on calendar values.
    pub fn is_date(self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::Datetime)
    }
}

/// Runtime description of one column.
#[derive(Debug, Clone, Default)]
pub struct ColumnDescriptor {
    /// Row field this column reads.
    pub field: String,

    pub column_type: ColumnType,

    /// Filter control attached to the column, if any.
    pub filter: Option<FilterDescriptor>,

    /// Static option list for select-style filter controls.
    pub filter_values: Vec<Value>,

    /// URL the `init` pipeline fetches the option list from.
    pub filter_values_remote_source: Option<String>,

    /// Re-render on every input change instead of on explicit apply.
    pub filter_real_time: bool,
}

impl ColumnDescriptor {
    pub fn new(field: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            field: field.into(),
            column_type,
            ..Default::default()
        }
    }

    /// Attach a named-operator filter.
    pub fn with_filter(mut self, op: Operator) -> Self {
        self.filter = Some(FilterDescriptor::named(op));
        self
    }

    /// Attach a custom predicate filter.
    pub fn with_filter_fn(mut self, f: FilterFn, params: Value) -> Self {
        self.filter = Some(FilterDescriptor::custom(f, params));
        self
    }

    pub fn with_filter_values(mut self, values: Vec<Value>) -> Self {
        self.filter_values = values;
        self
    }

    pub fn with_remote_options(mut self, url: impl Into<String>) -> Self {
        self.filter_values_remote_source = Some(url.into());
        self
    }

    pub fn real_time(mut self) -> Self {
        self.filter_real_time = true;
        self
    }

    /// The column's filter operator, when it is a named one.
    pub fn operator(&self) -> Option<Operator> {
        match self.filter.as_ref().map(|f| &f.op) {
            Some(FilterOp::Named(op)) => Some(*op),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// The opposite direction.
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

/// Whether a filter input counts as "no value".
///
/// Null, the empty string and the empty array are empty; everything else,
/// including `0` and `false`, is a value.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Look up a field on a row.
///
/// An exact key wins; otherwise a dotted name (`"owner.name"`) walks nested
/// objects. Missing fields resolve to `None`.
pub fn field_value<'a>(row: &'a Row, field: &str) -> Option<&'a Value> {
    if let Some(value) = row.get(field) {
        return Some(value);
    }
    if !field.contains('.') {
        return None;
    }
    let mut parts = field.split('.');
    let first = parts.next()?;
    let mut current = row.get(first)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Text form of a JSON value for string comparisons.
///
/// Returns `None` for null so a missing value never compares equal to
/// anything.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_values() {
        assert!(is_empty_value(&Value::Null));
        assert!(is_empty_value(&json!("")));
        assert!(is_empty_value(&json!([])));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(false)));
        assert!(!is_empty_value(&json!(" ")));
    }

    #[test]
    fn field_value_top_level_and_nested() {
        let r = row(json!({"id": 1, "owner": {"name": "ada"}, "a.b": 7}));
        assert_eq!(field_value(&r, "id"), Some(&json!(1)));
        assert_eq!(field_value(&r, "owner.name"), Some(&json!("ada")));
        assert_eq!(field_value(&r, "a.b"), Some(&json!(7)));
        assert_eq!(field_value(&r, "owner.missing"), None);
        assert_eq!(field_value(&r, "nope"), None);
    }

    #[test]
    fn value_text_forms() {
        assert_eq!(value_text(&json!("x")), Some("x".to_string()));
        assert_eq!(value_text(&json!(2.5)), Some("2.5".to_string()));
        assert_eq!(value_text(&json!(true)), Some("true".to_string()));
        assert_eq!(value_text(&Value::Null), None);
    }

    #[test]
    fn column_type_serialization() {
        let parsed: ColumnType = serde_json::from_str("\"datetime\"").unwrap();
        assert_eq!(parsed, ColumnType::Datetime);
        assert!(parsed.is_date());
        assert!(!ColumnType::Icon.is_date());
    }

    #[test]
    fn sort_direction_toggle_and_parse() {
        assert_eq!(SortDirection::default(), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.toggled(), SortDirection::Asc);
        assert_eq!("ASC".parse::<SortDirection>(), Ok(SortDirection::Asc));
        assert!("up".parse::<SortDirection>().is_err());
    }
}
