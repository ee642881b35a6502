//! Error types for the chat pipeline.

use std::time::Duration;

use dvnc_core::error::DvncError;

/// Errors surfaced to callers of the chat pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyInput,
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("config error: {0}")]
    Config(String),
}

impl From<DvncError> for ChatError {
    fn from(err: DvncError) -> Self {
        ChatError::Config(err.to_string())
    }
}

/// Failure of a single remote resolution attempt.
///
/// Never returned from `ResponseResolver::resolve`; the resolver logs it and
/// answers from the local catalog instead.
#[derive(Debug, thiserror::Error)]
pub enum RemoteResolutionError {
    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("remote returned HTTP {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    MalformedBody(String),
    #[error("response field missing or empty")]
    MissingResponse,
}
