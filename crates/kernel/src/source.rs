//! Fetch and notification collaborators.
//!
//! The engine never talks to the network directly: pipelines and the remote
//! pager go through a [`DataSource`], and failures the user must see go
//! through a [`Notifier`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use crate::error::{EngineError, EngineResult};
use crate::types::Params;

/// Request timeout for the HTTP data source.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Fetch collaborator: `GET url?params -> JSON body`.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, url: &str, params: &Params) -> EngineResult<Value>;
}

/// User-visible notification sink for failures the user must acknowledge.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Notifier that only logs. Used when no presentation layer is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        error!(message = %message, "user notification");
    }
}

/// [`DataSource`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpDataSource {
    client: reqwest::Client,
    base_url: Option<Url>,
}

impl Default for HttpDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpDataSource {
    /// Create a data source that requires absolute URLs.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: None,
        }
    }

    /// Resolve relative step URLs (`/api/statuses`) against `base`.
    pub fn with_base_url(mut self, base: &str) -> EngineResult<Self> {
        let parsed = Url::parse(base)
            .map_err(|e| EngineError::Config(format!("invalid base url '{base}': {e}")))?;
        self.base_url = Some(parsed);
        Ok(self)
    }

    fn resolve(&self, url: &str) -> EngineResult<Url> {
        let resolved = match &self.base_url {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        resolved.map_err(|e| EngineError::Config(format!("invalid request url '{url}': {e}")))
    }
}

/// Render params as query pairs. Strings go out as-is, everything else as
/// its JSON text; null params are omitted.
pub fn query_pairs(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), text)
        })
        .collect()
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch(&self, url: &str, params: &Params) -> EngineResult<Value> {
        let target = self.resolve(url)?;
        let pairs = query_pairs(params);
        debug!(url = %target, params = pairs.len(), "fetching");

        let response = self
            .client
            .get(target.clone())
            .query(&pairs)
            .send()
            .await
            .map_err(|source| EngineError::Network {
                url: target.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Status {
                url: target.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| EngineError::Decode {
                url: target.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_pairs_stringify_values() {
        let mut params = Params::new();
        params.insert("status".to_string(), json!("open"));
        params.insert("page".to_string(), json!(2));
        params.insert("tags".to_string(), json!(["a", "b"]));
        params.insert("gone".to_string(), Value::Null);

        let pairs = query_pairs(&params);

        assert!(pairs.contains(&("status".to_string(), "open".to_string())));
        assert!(pairs.contains(&("page".to_string(), "2".to_string())));
        assert!(pairs.contains(&("tags".to_string(), "[\"a\",\"b\"]".to_string())));
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn relative_url_needs_base() {
        let source = HttpDataSource::new();
        assert!(source.resolve("/rows").is_err());

        let source = HttpDataSource::new()
            .with_base_url("http://localhost:8080/api/")
            .unwrap();
        assert_eq!(
            source.resolve("rows").unwrap().as_str(),
            "http://localhost:8080/api/rows"
        );
        assert_eq!(
            source.resolve("http://other/x").unwrap().as_str(),
            "http://other/x"
        );
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let err = HttpDataSource::new().with_base_url("not a url").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
