#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common helpers for table integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::Value;

use gridline_kernel::{DataTable, TableConfig};
use gridline_test_utils::{RecordingNotifier, StaticSource, people};

/// Endpoint the remote fixtures answer on.
pub const ROWS_URL: &str = "http://rows.test/api/rows";

/// A table plus handles on its collaborators.
pub struct Harness {
    pub table: DataTable,
    pub source: Arc<StaticSource>,
    pub notifier: Arc<RecordingNotifier>,
}

/// Build a table from a JSON config over `source`.
pub fn harness(config: Value, source: StaticSource) -> Harness {
    let config: TableConfig = serde_json::from_value(config).unwrap();
    let source = Arc::new(source);
    let notifier = Arc::new(RecordingNotifier::new());
    let table = DataTable::new(config, source.clone(), notifier.clone());
    Harness {
        table,
        source,
        notifier,
    }
}

/// Local-mode table over the people fixture, 3 rows per page.
pub fn people_table() -> Harness {
    let mut h = harness(
        serde_json::json!({
            "pagerRowsPerPage": 3,
            "pagerPagesToDisplay": 3,
            "columns": [
                {"field": "id", "type": "number"},
                {"field": "name", "filterType": "like"},
                {"field": "age", "type": "number", "filterType": "between"},
                {"field": "status", "filterType": "in", "filterRealTime": true},
                {"field": "joined", "type": "date", "filterType": "<="}
            ]
        }),
        StaticSource::new(),
    );
    h.table = h.table.with_rows(people());
    h
}
