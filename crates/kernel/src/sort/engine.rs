//! Sort state and application.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::compare::compare_values;
use crate::persistence::Persistence;
use crate::types::{ColumnDescriptor, ColumnType, Params, SortDirection, field_value};

/// The active sort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortState {
    /// Active column, `None` until something is sorted.
    pub column: Option<String>,
    pub direction: SortDirection,
    pub column_type: ColumnType,
}

/// Per-column indicator read by the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortIndicator {
    #[default]
    None,
    Asc,
    Desc,
}

impl From<SortDirection> for SortIndicator {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => SortIndicator::Asc,
            SortDirection::Desc => SortIndicator::Desc,
        }
    }
}

/// Holds the active sort column and applies it.
#[derive(Debug, Clone, Default)]
pub struct SortEngine {
    column_types: HashMap<String, ColumnType>,
    state: SortState,
    indicators: HashMap<String, SortIndicator>,
}

impl SortEngine {
    pub fn new(columns: &[ColumnDescriptor]) -> Self {
        Self {
            column_types: columns
                .iter()
                .map(|c| (c.field.clone(), c.column_type))
                .collect(),
            state: SortState::default(),
            indicators: HashMap::new(),
        }
    }

    /// Start with `field` already active in `direction`.
    ///
    /// Used for the remote default sort; unknown fields are sorted as
    /// strings.
    pub fn with_default(mut self, field: &str, direction: SortDirection) -> Self {
        let column_type = self.column_types.get(field).copied().unwrap_or_default();
        self.state = SortState {
            column: Some(field.to_string()),
            direction,
            column_type,
        };
        self.indicators.insert(field.to_string(), direction.into());
        self
    }

    /// Activate a column.
    ///
    /// Repeating the active column toggles its direction. A different
    /// column clears the previous indicator and starts descending. Returns
    /// `false` for fields that are not columns.
    pub fn activate(&mut self, field: &str) -> bool {
        let Some(column_type) = self.column_types.get(field).copied() else {
            warn!(field = %field, "cannot sort on unknown column");
            return false;
        };

        if self.state.column.as_deref() == Some(field) {
            self.state.direction = self.state.direction.toggled();
        } else {
            if let Some(previous) = self.state.column.take() {
                self.indicators.insert(previous, SortIndicator::None);
            }
            self.state = SortState {
                column: Some(field.to_string()),
                direction: SortDirection::Desc,
                column_type,
            };
        }

        self.indicators
            .insert(field.to_string(), self.state.direction.into());
        debug!(field = %field, direction = %self.state.direction, "sort activated");
        true
    }

    pub fn state(&self) -> &SortState {
        &self.state
    }

    pub fn indicator(&self, field: &str) -> SortIndicator {
        self.indicators.get(field).copied().unwrap_or_default()
    }

    /// Stable-sort the working rows by the active column. No-op when
    /// nothing is active.
    pub fn apply(&self, persistence: &mut Persistence) {
        let Some(column) = self.state.column.as_deref() else {
            return;
        };
        let column_type = self.state.column_type;
        let direction = self.state.direction;
        persistence.sort_rows_by(|a, b| {
            compare_values(field_value(a, column), field_value(b, column), column_type, direction)
        });
    }

    /// Remote-mode contribution: `{sort, direction}` when a column is
    /// active.
    pub fn remote_params(&self, mut params: Params) -> Params {
        if let Some(column) = &self.state.column {
            params.insert("sort".to_string(), Value::String(column.clone()));
            params.insert(
                "direction".to_string(),
                Value::String(self.state.direction.as_str().to_string()),
            );
        }
        params
    }
}
