//! Working row collection and snapshot cache.
//!
//! The working collection is what filters, sorts and the pager operate on.
//! The cache is an independent copy of the last dataset that was set, used
//! to undo filtering without refetching.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{Row, field_value, value_text};

/// Owner of the working rows and their snapshot.
#[derive(Debug, Clone, Default)]
pub struct Persistence {
    rows: Vec<Row>,
    cache: Vec<Row>,
}

impl Persistence {
    /// Start with `rows` as both the working set and the snapshot.
    pub fn new(rows: Vec<Row>) -> Self {
        let cache = rows.clone();
        Self { rows, cache }
    }

    /// Replace working rows and snapshot from a fetched JSON body.
    ///
    /// Anything but an array empties both collections. Array elements that
    /// are not objects are skipped.
    pub fn set_data(&mut self, data: Value) {
        let Value::Array(items) = data else {
            warn!("dataset is not an array; resetting to empty");
            self.set_rows(Vec::new());
            return;
        };

        let total = items.len();
        let rows: Vec<Row> = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect();
        if rows.len() != total {
            warn!(
                skipped = total - rows.len(),
                "dataset contained non-object rows"
            );
        }
        self.set_rows(rows);
    }

    /// Replace working rows and snapshot.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.cache = rows.clone();
        self.rows = rows;
        debug!(rows = self.rows.len(), "dataset replaced");
    }

    /// Reset the working rows to a copy of the snapshot.
    pub fn restore_data(&mut self) {
        self.rows = self.cache.clone();
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn cached_rows(&self) -> &[Row] {
        &self.cache
    }

    /// Rebuild the working rows from the snapshot, keeping rows that pass
    /// `keep`.
    pub fn filter_from_cache<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Row) -> bool,
    {
        self.rows.clear();
        for row in &self.cache {
            if keep(row) {
                self.rows.push(row.clone());
            }
        }
    }

    /// Stable-sort the working rows. The snapshot keeps its order.
    pub fn sort_rows_by<F>(&mut self, compare: F)
    where
        F: FnMut(&Row, &Row) -> Ordering,
    {
        self.rows.sort_by(compare);
    }

    /// Distinct non-empty values of `field` across the snapshot, sorted by
    /// their text form.
    pub fn distinct_values(&self, field: &str) -> Vec<Value> {
        let mut seen: BTreeMap<String, Value> = BTreeMap::new();
        for row in &self.cache {
            let Some(value) = field_value(row, field) else {
                continue;
            };
            let Some(text) = value_text(value) else {
                continue;
            };
            if !text.is_empty() {
                seen.entry(text).or_insert_with(|| value.clone());
            }
        }
        seen.into_values().collect()
    }
}
