//! Gridline test utilities.
//!
//! Helpers for integration testing: row fixtures, an in-memory
//! [`DataSource`] that records requests, a notifier that records messages,
//! and JSON assertion helpers.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use gridline_kernel::error::{EngineError, EngineResult};
use gridline_kernel::{DataSource, Notifier, Params, Row};

/// Create a row from a JSON object literal. Non-objects give an empty row.
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

/// Create rows from a JSON array literal.
pub fn rows(value: Value) -> Vec<Row> {
    match value {
        Value::Array(items) => items.into_iter().map(row).collect(),
        _ => Vec::new(),
    }
}

/// Ten people with a mix of strings, numbers, dates and gaps.
pub fn people() -> Vec<Row> {
    rows(json!([
        {"id": 1, "name": "Ada", "age": 36, "status": "open", "joined": "2021-03-04"},
        {"id": 2, "name": "Grace", "age": 85, "status": "closed", "joined": "2019-11-20"},
        {"id": 3, "name": "alan", "age": 41, "status": "open", "joined": "2022-01-15T09:30:00"},
        {"id": 4, "name": "Barbara", "age": "n/a", "status": "pending", "joined": ""},
        {"id": 5, "name": "", "age": 29, "status": "open", "joined": "2023-07-01"},
        {"id": 6, "name": "Edsger", "age": 72, "status": "closed", "joined": "2020-05-05"},
        {"id": 7, "name": "Donald", "age": 84, "status": "open", "joined": "2018-02-28"},
        {"id": 8, "name": "Frances", "age": 52, "status": "pending", "joined": "2021-03-04T23:00:00"},
        {"id": 9, "name": "Ken", "age": null, "status": "open"},
        {"id": 10, "name": "Radia", "age": 70, "status": "closed", "joined": "2024-12-31"}
    ]))
}

/// Ids of `rows`, in order.
pub fn ids(rows: &[Row]) -> Vec<i64> {
    rows.iter()
        .filter_map(|r| r.get("id").and_then(Value::as_i64))
        .collect()
}

/// In-memory [`DataSource`].
///
/// Bodies are registered per URL; unregistered URLs answer with a 404
/// status error. Every request is recorded.
#[derive(Debug, Default)]
pub struct StaticSource {
    bodies: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<(String, Params)>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn with_body(self, url: &str, body: Value) -> Self {
        self.set_body(url, body);
        self
    }

    pub fn set_body(&self, url: &str, body: Value) {
        self.bodies.lock().insert(url.to_string(), body);
    }

    /// Stop serving `url`; later requests fail.
    pub fn remove_body(&self, url: &str) {
        self.bodies.lock().remove(url);
    }

    /// Every request so far as `(url, params)`.
    pub fn requests(&self) -> Vec<(String, Params)> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Params of the latest request, as a JSON object.
    pub fn last_params(&self) -> Option<Value> {
        self.requests
            .lock()
            .last()
            .map(|(_, params)| Value::Object(params.clone()))
    }
}

#[async_trait]
impl DataSource for StaticSource {
    async fn fetch(&self, url: &str, params: &Params) -> EngineResult<Value> {
        self.requests.lock().push((url.to_string(), params.clone()));
        self.bodies
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| EngineError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// [`Notifier`] that keeps every message.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

/// Assertion helpers for JSON values.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON value equals expected.
    pub fn json_eq(actual: &Value, expected: &Value) {
        assert_eq!(
            actual,
            expected,
            "JSON mismatch:\nactual: {}\nexpected: {}",
            serde_json::to_string_pretty(actual).unwrap_or_default(),
            serde_json::to_string_pretty(expected).unwrap_or_default()
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn rows_from_literal() {
        let r = rows(json!([{"a": 1}, 2, {"a": 3}]));
        assert_eq!(r.len(), 3);
        assert!(r[1].is_empty());
    }

    #[test]
    fn people_fixture_ids() {
        assert_eq!(ids(&people()), (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn static_source_serves_and_records() {
        let source = StaticSource::new().with_body("/rows", json!([1]));
        let mut params = Params::new();
        params.insert("page".to_string(), json!(2));

        assert_eq!(source.fetch("/rows", &params).await.unwrap(), json!([1]));
        assert!(source.fetch("/missing", &Params::new()).await.is_err());
        assert_eq!(source.request_count(), 2);
        assert_eq!(source.requests()[0].1.get("page"), Some(&json!(2)));
    }

    #[test]
    fn notifier_records() {
        let n = RecordingNotifier::new();
        n.notify("boom");
        assert_eq!(n.messages(), vec!["boom".to_string()]);
    }
}
