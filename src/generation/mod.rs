//! Validated article generation.
//!
//! A request flows through three stages: the [`prompt`] assembler builds the
//! system instruction from template fragments, the [`attempt`] loop asks the
//! generative API for a JSON article a bounded number of times, and the
//! [`validator`] decides whether each raw answer has the article shape.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub mod attempt;
pub mod prompt;
pub mod validator;

pub use attempt::{generate_article, AttemptPolicy, GenerationError};
pub use prompt::{assemble_system_prompt, PromptError, PromptTemplateSet, SystemPrompt, ToneKey};
pub use validator::{AttemptResult, GeneratedArticle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

/// Decoded body of a generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub messages: Vec<ConversationMessage>,
    pub category: Option<String>,
    pub tone: Option<ToneKey>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("messages must be an array")]
    MessagesNotArray,

    #[error("messages must not be empty")]
    EmptyMessages,

    #[error("message {index} is malformed: {reason}")]
    MalformedMessage { index: usize, reason: String },
}

impl GenerationRequest {
    /// Decode a request body that has already been parsed as JSON.
    ///
    /// `category` and `tone` are lenient: a non-string value is treated as
    /// absent and an unknown tone key resolves to no tone.
    pub fn from_value(body: &Value) -> Result<Self, RequestError> {
        let raw_messages = body
            .get("messages")
            .and_then(Value::as_array)
            .ok_or(RequestError::MessagesNotArray)?;

        if raw_messages.is_empty() {
            return Err(RequestError::EmptyMessages);
        }

        let messages = raw_messages
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                serde_json::from_value::<ConversationMessage>(raw.clone()).map_err(|e| {
                    RequestError::MalformedMessage {
                        index,
                        reason: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let category = body
            .get("category")
            .and_then(Value::as_str)
            .map(str::to_string);

        let tone = body
            .get("tone")
            .and_then(Value::as_str)
            .and_then(ToneKey::parse);

        Ok(Self {
            messages,
            category,
            tone,
        })
    }
}

/// Transport-level failures talking to the generative API.
///
/// These are never retried by the attempt loop.
#[derive(Debug, Error)]
pub enum GenerativeError {
    #[error("generative API request failed: {0}")]
    Transport(String),

    #[error("generative API returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("generative API did not answer within {0:?}")]
    Timeout(Duration),
}

/// A text-completion backend constrained to emit a single JSON document.
#[async_trait]
pub trait GenerativeApi: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &SystemPrompt,
        messages: &[ConversationMessage],
    ) -> Result<String, GenerativeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_full_request() {
        let body = json!({
            "messages": [
                {"role": "user", "content": "보이스피싱 피해 대처법"},
                {"role": "assistant", "content": "네"}
            ],
            "category": "사기",
            "tone": "friendly"
        });
        let req = GenerationRequest::from_value(&body).unwrap();
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[1].role, Role::Assistant);
        assert_eq!(req.category.as_deref(), Some("사기"));
        assert_eq!(req.tone, Some(ToneKey::Friendly));
    }

    #[test]
    fn rejects_non_array_messages() {
        let body = json!({ "messages": "hello" });
        assert_eq!(
            GenerationRequest::from_value(&body).unwrap_err(),
            RequestError::MessagesNotArray
        );
        assert_eq!(
            GenerationRequest::from_value(&json!({})).unwrap_err(),
            RequestError::MessagesNotArray
        );
    }

    #[test]
    fn rejects_empty_and_mistyped_messages() {
        assert_eq!(
            GenerationRequest::from_value(&json!({ "messages": [] })).unwrap_err(),
            RequestError::EmptyMessages
        );

        let body = json!({ "messages": [{"role": "user", "content": "ok"}, {"role": "tool", "content": "x"}] });
        match GenerationRequest::from_value(&body).unwrap_err() {
            RequestError::MalformedMessage { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_tone_and_non_string_category_are_absent() {
        let body = json!({
            "messages": [{"role": "user", "content": "hi"}],
            "category": 42,
            "tone": "sarcastic"
        });
        let req = GenerationRequest::from_value(&body).unwrap();
        assert!(req.category.is_none());
        assert!(req.tone.is_none());
    }
}
