//! Chat completion wire models
//!
//! Request payload sent to an OpenAI-compatible `/chat/completions` endpoint,
//! plus a typed view over the JSON it sends back.

use crate::core::constants::role;
use serde::{Deserialize, Serialize};

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(role::USER, content)
    }

    #[cfg(test)]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(role::SYSTEM, content)
    }

    #[cfg(test)]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(role::ASSISTANT, content)
    }
}

/// Chat completion request body
///
/// Field order matches the wire format: `model`, `messages`, `max_tokens`.
/// Message order is preserved and defines the conversation turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens,
        }
    }
}

/// Message returned inside a choice
///
/// Every field is optional; compatible endpoints differ in what they fill in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Recognised chat completion response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Typed view over a successful response body
///
/// Bodies that do not look like a chat completion are kept as raw JSON
/// instead of being rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompletionBody {
    Completion(ChatCompletionResponse),
    Unknown(serde_json::Value),
}

impl CompletionBody {
    pub fn from_value(value: serde_json::Value) -> Self {
        match serde_json::from_value::<ChatCompletionResponse>(value.clone()) {
            Ok(completion) => CompletionBody::Completion(completion),
            Err(_) => CompletionBody::Unknown(value),
        }
    }

    /// Content of the first choice, if the body is a completion carrying one
    pub fn first_content(&self) -> Option<&str> {
        match self {
            CompletionBody::Completion(completion) => completion
                .choices
                .first()
                .and_then(|choice| choice.message.content.as_deref()),
            CompletionBody::Unknown(_) => None,
        }
    }
}

/// Error envelope returned by OpenAI-compatible endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}
