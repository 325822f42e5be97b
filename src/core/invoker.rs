//! Invocation abstraction for chat completion endpoints
//!
//! Defines the error taxonomy, the raw response returned by a single call,
//! and the trait the detached spawner and retry wrapper work against.

use crate::models::openai::ChatCompletionRequest;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Error types for a single invocation
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Authentication failed (status {status}): {message}")]
    Authentication { status: u16, message: String },

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ResponseParse(String),

    #[error("Failed to serialize request: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl InvokeError {
    /// Connection, DNS, TLS and timeout failures
    pub fn is_network(&self) -> bool {
        matches!(self, InvokeError::Network(_) | InvokeError::Timeout)
    }

    /// HTTP status reported by the endpoint, if the failure carried one
    pub fn status(&self) -> Option<u16> {
        match self {
            InvokeError::Authentication { status, .. } => Some(*status),
            InvokeError::RateLimit(_) => Some(429),
            InvokeError::BadRequest(_) => Some(400),
            InvokeError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for InvokeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            InvokeError::Timeout
        } else {
            InvokeError::Network(err.to_string())
        }
    }
}

/// Opaque bearer token
///
/// The value is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Result<Self, InvokeError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(InvokeError::Configuration(
                "API key must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Successful response from one invocation, body not yet parsed
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub request_id: Uuid,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    /// Parse the body as untyped JSON
    pub fn json(&self) -> Result<serde_json::Value, InvokeError> {
        serde_json::from_str(&self.body).map_err(|e| InvokeError::ResponseParse(e.to_string()))
    }
}

/// Anything that can perform one chat completion round trip
#[async_trait]
pub trait Invoke: Send + Sync {
    /// Send `payload` and wait for the response
    async fn invoke(&self, payload: &ChatCompletionRequest) -> Result<RawResponse, InvokeError>;

    /// Fixed URL requests are sent to
    fn endpoint(&self) -> &str;
}
