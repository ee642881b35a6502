//! Remote chat backend.
//!
//! The wire contract is a single JSON exchange:
//! `POST <endpoint>` with `{"message": "..."}`, answered by
//! `{"response": "..."}`. Anything else is a [`RemoteResolutionError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::RemoteResolutionError;

/// HTTP abstraction the resolver talks to in remote mode.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one user message to `endpoint` and return the reply text.
    ///
    /// Implementations return `MissingResponse` rather than an empty string.
    async fn send(&self, endpoint: &str, message: &str) -> Result<String, RemoteResolutionError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    response: Option<serde_json::Value>,
}

/// [`ChatBackend`] over reqwest.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: Client,
}

impl HttpChatBackend {
    /// Create a backend whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, RemoteResolutionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteResolutionError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, endpoint: &str, message: &str) -> Result<String, RemoteResolutionError> {
        let start = std::time::Instant::now();
        let response = self
            .client
            .post(endpoint)
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RemoteResolutionError::Timeout(start.elapsed())
                } else {
                    RemoteResolutionError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteResolutionError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RemoteResolutionError::Network(e.to_string()))?;

        tracing::debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Remote chat response received"
        );

        parse_reply(&body)
    }
}

/// Extract the reply text from a response body.
fn parse_reply(body: &str) -> Result<String, RemoteResolutionError> {
    let reply: ChatReply = serde_json::from_str(body)
        .map_err(|e| RemoteResolutionError::MalformedBody(e.to_string()))?;

    match reply.response {
        Some(serde_json::Value::String(text)) if !text.is_empty() => Ok(text),
        _ => Err(RemoteResolutionError::MissingResponse),
    }
}
