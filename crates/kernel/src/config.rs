//! Table configuration.
//!
//! Loaded from JSON or TOML, then optionally overridden from environment
//! variables. Keys are camelCase in both formats.

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::Operator;
use crate::pager::{DEFAULT_PAGES_TO_DISPLAY, DEFAULT_ROWS_PER_PAGE};
use crate::types::{ColumnDescriptor, ColumnType, SortDirection};

/// `remoteProcessing`: a plain switch, or remote mode with a default sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteProcessing {
    Enabled(bool),
    Sorted {
        column: String,
        #[serde(default)]
        direction: SortDirection,
    },
}

impl Default for RemoteProcessing {
    fn default() -> Self {
        RemoteProcessing::Enabled(false)
    }
}

impl RemoteProcessing {
    pub fn is_enabled(&self) -> bool {
        match self {
            RemoteProcessing::Enabled(enabled) => *enabled,
            RemoteProcessing::Sorted { .. } => true,
        }
    }

    /// Initial remote sort, when configured.
    pub fn default_sort(&self) -> Option<(&str, SortDirection)> {
        match self {
            RemoteProcessing::Sorted { column, direction } => Some((column.as_str(), *direction)),
            RemoteProcessing::Enabled(_) => None,
        }
    }
}

/// One column as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    pub field: String,

    #[serde(default, rename = "type")]
    pub column_type: ColumnType,

    /// Operator of the column's filter control; no control when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_type: Option<Operator>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter_values: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_values_remote_source: Option<String>,

    #[serde(default)]
    pub filter_real_time: bool,
}

impl ColumnConfig {
    pub fn to_descriptor(&self) -> ColumnDescriptor {
        let mut descriptor = ColumnDescriptor::new(self.field.clone(), self.column_type)
            .with_filter_values(self.filter_values.clone());
        if let Some(op) = self.filter_type {
            descriptor = descriptor.with_filter(op);
        }
        if let Some(url) = &self.filter_values_remote_source {
            descriptor = descriptor.with_remote_options(url.clone());
        }
        descriptor.filter_real_time = self.filter_real_time;
        descriptor
    }
}

/// Table configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    #[serde(default)]
    pub remote_processing: RemoteProcessing,

    /// Remote page endpoint in remote mode; dataset endpoint in local mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    /// Rows per page (default: 10).
    #[serde(default = "default_rows_per_page")]
    pub pager_rows_per_page: usize,

    /// Page buttons in the navigation window (default: 5).
    #[serde(default = "default_pages_to_display")]
    pub pager_pages_to_display: usize,

    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
}

fn default_rows_per_page() -> usize {
    DEFAULT_ROWS_PER_PAGE
}

fn default_pages_to_display() -> usize {
    DEFAULT_PAGES_TO_DISPLAY
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            remote_processing: RemoteProcessing::default(),
            remote_url: None,
            pager_rows_per_page: DEFAULT_ROWS_PER_PAGE,
            pager_pages_to_display: DEFAULT_PAGES_TO_DISPLAY,
            columns: Vec::new(),
        }
    }
}

impl TableConfig {
    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("invalid JSON table configuration")
    }

    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).context("invalid TOML table configuration")
    }

    /// Load from a file; `.toml` files are TOML, everything else JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let input = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let config = if is_toml {
            Self::from_toml_str(&input)
        } else {
            Self::from_json_str(&input)
        };
        config.with_context(|| format!("failed to load {}", path.display()))
    }

    /// Apply `GRIDLINE_REMOTE_URL` and `GRIDLINE_ROWS_PER_PAGE` when set.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = env::var("GRIDLINE_REMOTE_URL") {
            self.remote_url = Some(url);
        }

        if let Ok(rows) = env::var("GRIDLINE_ROWS_PER_PAGE") {
            self.pager_rows_per_page = rows
                .trim()
                .parse()
                .context("GRIDLINE_ROWS_PER_PAGE must be a non-negative integer")?;
        }

        Ok(())
    }

    pub fn is_remote(&self) -> bool {
        self.remote_processing.is_enabled()
    }

    /// Runtime column descriptors.
    pub fn descriptors(&self) -> Vec<ColumnDescriptor> {
        self.columns.iter().map(ColumnConfig::to_descriptor).collect()
    }

    /// Validate the configuration. Returns a list of problems; empty means
    /// valid.
    pub fn validate(&self) -> Vec<String> {
        validate_columns(self, self.columns.iter().map(|c| c.field.as_str()))
    }
}

/// Shared checks over a config and the field names of the columns actually
/// in use.
pub(crate) fn validate_columns<'a>(
    config: &TableConfig,
    fields: impl Iterator<Item = &'a str>,
) -> Vec<String> {
    let mut errors = Vec::new();
    let fields: Vec<&str> = fields.collect();

    if fields.is_empty() {
        errors.push("At least one column is required".to_string());
    }

    for (i, field) in fields.iter().enumerate() {
        if field.is_empty() {
            errors.push(format!("Column {i} has an empty field name"));
        } else if fields[..i].contains(field) {
            errors.push(format!("Duplicate column field: {field}"));
        }
    }

    if config.is_remote() && config.remote_url.as_deref().is_none_or(str::is_empty) {
        errors.push("remoteUrl is required when remoteProcessing is enabled".to_string());
    }

    errors
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_with_defaults() {
        let config = TableConfig::from_json_str(
            r#"{"columns": [{"field": "name"}, {"field": "age", "type": "number", "filterType": ">="}]}"#,
        )
        .unwrap();

        assert!(!config.is_remote());
        assert_eq!(config.pager_rows_per_page, 10);
        assert_eq!(config.pager_pages_to_display, 5);
        assert_eq!(config.columns[0].column_type, ColumnType::String);
        assert_eq!(config.columns[1].filter_type, Some(Operator::GreaterOrEqual));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn remote_processing_forms() {
        let config = TableConfig::from_json_str(
            r#"{
                "remoteProcessing": {"column": "date", "direction": "asc"},
                "remoteUrl": "http://localhost/rows",
                "columns": [{"field": "date", "type": "date"}]
            }"#,
        )
        .unwrap();
        assert!(config.is_remote());
        assert_eq!(
            config.remote_processing.default_sort(),
            Some(("date", SortDirection::Asc))
        );

        let config = TableConfig::from_json_str(r#"{"remoteProcessing": true}"#).unwrap();
        assert!(config.is_remote());
        assert_eq!(config.remote_processing.default_sort(), None);
    }

    #[test]
    fn toml_config() {
        let config = TableConfig::from_toml_str(
            r#"
remoteUrl = "http://localhost/rows"
pagerRowsPerPage = 25

[[columns]]
field = "status"
filterType = "in"
filterValues = ["open", "closed"]
filterRealTime = true

[[columns]]
field = "owner"
filterType = "equals"
filterValuesRemoteSource = "/api/owners"
"#,
        )
        .unwrap();

        assert_eq!(config.pager_rows_per_page, 25);
        let columns = config.descriptors();
        assert_eq!(columns[0].operator(), Some(Operator::In));
        assert_eq!(columns[0].filter_values, vec![json!("open"), json!("closed")]);
        assert!(columns[0].filter_real_time);
        assert_eq!(
            columns[1].filter_values_remote_source.as_deref(),
            Some("/api/owners")
        );
    }

    #[test]
    fn column_without_filter_type_has_no_control() {
        let column = ColumnConfig {
            field: "note".to_string(),
            column_type: ColumnType::String,
            filter_type: None,
            filter_values: Vec::new(),
            filter_values_remote_source: None,
            filter_real_time: false,
        };
        assert!(column.to_descriptor().filter.is_none());
    }

    #[test]
    fn validate_requires_columns() {
        let errors = TableConfig::default().validate();
        assert!(errors.iter().any(|e| e.contains("At least one column")));
    }

    #[test]
    fn validate_remote_needs_url() {
        let config =
            TableConfig::from_json_str(r#"{"remoteProcessing": true, "columns": [{"field": "a"}]}"#)
                .unwrap();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("remoteUrl is required")));
    }

    #[test]
    fn validate_duplicates_but_not_default_sort() {
        let config = TableConfig::from_json_str(
            r#"{
                "remoteProcessing": {"column": "missing"},
                "remoteUrl": "http://localhost/rows",
                "columns": [{"field": "a"}, {"field": "a"}]
            }"#,
        )
        .unwrap();
        let errors = config.validate();
        assert_eq!(errors, vec!["Duplicate column field: a".to_string()]);
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let result = TableConfig::from_json_str(
            r#"{"columns": [{"field": "a", "filterType": "contains"}]}"#,
        );
        assert!(result.is_err());
    }
}
