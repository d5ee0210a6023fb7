//! Filter engine: filter state, compilation and application.
//!
//! Filter state comes from two places:
//! - control inputs, one per column that declares a filter, rebuilt into
//!   criteria on every pass
//! - programmatic filters from `set_filter`, kept until removed and unique
//!   per field

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use super::coerce::coerce_filter_value;
use super::criterion::{Criterion, DateCriterion, FunctionCriterion, ValueCriterion};
use super::types::{FilterOp, Operator};
use crate::persistence::Persistence;
use crate::types::{ColumnDescriptor, ColumnType, Params, is_empty_value};

/// Filter added through the API rather than a column control.
#[derive(Debug, Clone)]
struct ProgrammaticFilter {
    field: String,
    value: Value,
    op: FilterOp,
    params: Value,
}

/// Compiles filter state into criteria and applies them.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    columns: Vec<ColumnDescriptor>,
    /// Current control values by field.
    inputs: HashMap<String, Value>,
    programmatic: Vec<ProgrammaticFilter>,
    /// Option lists for select-style controls by field.
    options: HashMap<String, Vec<Value>>,
}

impl FilterEngine {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        let options = columns
            .iter()
            .filter(|c| !c.filter_values.is_empty())
            .map(|c| (c.field.clone(), c.filter_values.clone()))
            .collect();

        Self {
            columns,
            inputs: HashMap::new(),
            programmatic: Vec::new(),
            options,
        }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn column(&self, field: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// Declared type of `field`; unknown fields are strings.
    pub fn column_type(&self, field: &str) -> ColumnType {
        self.column(field).map(|c| c.column_type).unwrap_or_default()
    }

    /// Set a column control's value.
    ///
    /// Returns `false` when the column has no filter control.
    pub fn set_input(&mut self, field: &str, value: Value) -> bool {
        if self.column(field).and_then(|c| c.filter.as_ref()).is_none() {
            warn!(field = %field, "no filter control on column; input ignored");
            return false;
        }
        self.inputs.insert(field.to_string(), value);
        true
    }

    pub fn input(&self, field: &str) -> Option<&Value> {
        self.inputs.get(field)
    }

    /// Whether changes to this column's control should re-render at once.
    pub fn is_real_time(&self, field: &str) -> bool {
        self.column(field).is_some_and(|c| c.filter_real_time)
    }

    pub fn clear_inputs(&mut self) {
        self.inputs.clear();
    }

    /// Add or replace the programmatic filter for `field`.
    pub fn set_filter(
        &mut self,
        field: &str,
        value: Value,
        op: impl Into<FilterOp>,
        params: Value,
    ) {
        let filter = ProgrammaticFilter {
            field: field.to_string(),
            value,
            op: op.into(),
            params,
        };
        match self.programmatic.iter_mut().find(|f| f.field == field) {
            Some(existing) => *existing = filter,
            None => self.programmatic.push(filter),
        }
    }

    /// Shorthand for a `field <op> value` programmatic filter.
    pub fn set_named_filter(&mut self, field: &str, operator: Operator, value: Value) {
        self.set_filter(field, value, operator, Value::Null);
    }

    /// Remove the programmatic filter for `field`.
    pub fn remove_filter(&mut self, field: &str) -> bool {
        let before = self.programmatic.len();
        self.programmatic.retain(|f| f.field != field);
        before != self.programmatic.len()
    }

    /// Drop every control value and programmatic filter.
    pub fn clear_filters(&mut self) {
        self.inputs.clear();
        self.programmatic.clear();
    }

    pub fn programmatic_count(&self) -> usize {
        self.programmatic.len()
    }

    /// Compile the current state into an ordered criterion list.
    ///
    /// Column controls come first in column order, then programmatic
    /// filters in the order they were added. Values that fail coercion are
    /// left out.
    pub fn compile(&self) -> Vec<Criterion> {
        let mut criteria = Vec::new();

        for column in &self.columns {
            let Some(filter) = &column.filter else {
                continue;
            };
            let Some(raw) = self.inputs.get(&column.field) else {
                continue;
            };
            if is_empty_value(raw) {
                continue;
            }
            if let Some(c) =
                compile_criterion(&column.field, raw, &filter.op, &filter.params, column.column_type)
            {
                criteria.push(c);
            }
        }

        for filter in &self.programmatic {
            let named = matches!(filter.op, FilterOp::Named(_));
            if named && is_empty_value(&filter.value) {
                continue;
            }
            let column_type = self.column_type(&filter.field);
            if let Some(c) =
                compile_criterion(&filter.field, &filter.value, &filter.op, &filter.params, column_type)
            {
                criteria.push(c);
            }
        }

        criteria
    }

    /// Filter the snapshot into the working rows.
    ///
    /// With no criteria the working rows are restored from the snapshot
    /// instead. Returns the resulting row count.
    pub fn apply(&self, persistence: &mut Persistence) -> usize {
        let criteria = self.compile();
        if criteria.is_empty() {
            persistence.restore_data();
            return persistence.row_count();
        }

        persistence.filter_from_cache(|row| criteria.iter().all(|c| c.matches(row)));
        debug!(
            criteria = criteria.len(),
            rows = persistence.row_count(),
            "filters applied"
        );
        persistence.row_count()
    }

    /// Remote-mode contribution: `{field: raw value}` for every active
    /// control and programmatic filter.
    pub fn remote_params(&self, mut params: Params) -> Params {
        for column in &self.columns {
            if column.filter.is_none() {
                continue;
            }
            if let Some(raw) = self.inputs.get(&column.field) {
                if !is_empty_value(raw) {
                    params.insert(column.field.clone(), raw.clone());
                }
            }
        }
        for filter in &self.programmatic {
            if !is_empty_value(&filter.value) {
                params.insert(filter.field.clone(), filter.value.clone());
            }
        }
        params
    }

    pub fn set_options(&mut self, field: &str, values: Vec<Value>) {
        self.options.insert(field.to_string(), values);
    }

    /// Store options from a fetched body: a bare array, or `{data: [...]}`.
    pub fn set_options_from_body(&mut self, field: &str, body: Value) {
        let values = match body {
            Value::Array(items) => items,
            Value::Object(mut obj) => match obj.remove("data") {
                Some(Value::Array(items)) => items,
                _ => {
                    warn!(field = %field, "option body has no data array");
                    Vec::new()
                }
            },
            _ => {
                warn!(field = %field, "option body is not an array");
                Vec::new()
            }
        };
        debug!(field = %field, options = values.len(), "filter options loaded");
        self.set_options(field, values);
    }

    /// Option list for a control, if one was configured or loaded.
    pub fn options(&self, field: &str) -> Option<&[Value]> {
        self.options.get(field).map(|v| v.as_slice())
    }
}

/// Build one criterion, or `None` when the value does not coerce.
fn compile_criterion(
    field: &str,
    raw: &Value,
    op: &FilterOp,
    params: &Value,
    column_type: ColumnType,
) -> Option<Criterion> {
    let operator = match op {
        FilterOp::Custom(predicate) => {
            return Some(Criterion::Function(FunctionCriterion {
                field: field.to_string(),
                raw_value: raw.clone(),
                predicate: predicate.clone(),
                params: params.clone(),
            }));
        }
        FilterOp::Named(operator) => *operator,
    };

    let Some(value) = coerce_filter_value(raw, operator, column_type) else {
        debug!(
            field = %field,
            operator = %operator,
            "filter value does not coerce to column type; skipping"
        );
        return None;
    };

    let criterion = if column_type.is_date() {
        Criterion::Date(DateCriterion {
            field: field.to_string(),
            value,
            operator,
        })
    } else {
        Criterion::Value(ValueCriterion {
            field: field.to_string(),
            value,
            column_type,
            operator,
        })
    };
    Some(criterion)
}
