//! Crate-wide error hierarchy for mr-reviewer.
//!
//! - [`TaskError`]: why a webhook task stopped. Every variant is terminal for
//!   its task and only ever logged.
//! - [`ProviderError`]: GitLab REST failures, mapped from `reqwest`
//!   (401→Unauthorized, 429→RateLimited, 5xx→Server, etc.).

use project_code_store::SyncError;
use thiserror::Error;

/// Convenient alias for task results.
pub type TaskResult<T> = Result<T, TaskError>;

#[derive(Debug, Error)]
pub enum TaskError {
    /// Payload carried no project id; nothing can be published.
    #[error("project id missing from payload")]
    MissingProjectId,

    /// Payload carried no source branch (e.g. GitLab test payloads).
    #[error("source branch missing from payload")]
    MissingSourceBranch,

    #[error("workspace sync failed: {0}")]
    Sync(#[from] SyncError),

    /// Fetching the target branch failed before a diff could be computed.
    #[error("diff unavailable for target branch {target}")]
    DiffUnavailable { target: String },

    /// The assistant produced no usable answer (details logged at the call).
    #[error("assistant produced no usable output")]
    Assistant,

    /// Map phase finished without a single successful chunk.
    #[error("no chunk analysis succeeded ({chunks} chunks)")]
    NoPartialAnalyses { chunks: usize },

    #[error("publish failed: {0}")]
    Publish(#[from] ProviderError),
}

/// Detailed provider-specific error used by the publisher.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Unauthorized (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403).
    #[error("forbidden")]
    Forbidden,

    /// Not found (HTTP 404).
    #[error("not found")]
    NotFound,

    /// Rate limited (HTTP 429).
    #[error("rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Gateway/Server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other HTTP status (4xx/3xx) not covered above.
    #[error("http status error: {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Client could not be configured (bad token header, TLS backend).
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ProviderError {
    /// Maps a non-success HTTP status.
    pub fn from_status(code: u16, retry_after_secs: Option<u64>) -> Self {
        match code {
            401 => ProviderError::Unauthorized,
            403 => ProviderError::Forbidden,
            404 => ProviderError::NotFound,
            429 => ProviderError::RateLimited { retry_after_secs },
            500..=599 => ProviderError::Server(code),
            _ => ProviderError::HttpStatus(code),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return ProviderError::Timeout;
        }
        if let Some(status) = e.status() {
            return ProviderError::from_status(status.as_u16(), None);
        }
        if e.is_builder() {
            return ProviderError::InvalidConfig(e.without_url().to_string());
        }
        ProviderError::Network(e.without_url().to_string())
    }
}
