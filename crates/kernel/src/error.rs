//! Engine error types.

use thiserror::Error;

/// Engine errors.
///
/// Coercion failures and malformed responses never show up here: they are
/// recovered where they happen (criterion dropped, dataset emptied).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid response body from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("handler failed: {0}")]
    Handler(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    /// Whether this error came from the fetch collaborator.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            EngineError::Network { .. } | EngineError::Status { .. } | EngineError::Decode { .. }
        )
    }
}

/// Result type alias using EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
