//! LLM provider trait and request types.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Role of a message sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single chat message on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request for a streamed completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }
}

/// Text fragments in arrival order. Finite; ends when the provider signals
/// end-of-stream, or yields one `Err` on failure.
pub type FragmentStream<E = LlmError> = Pin<Box<dyn Stream<Item = Result<String, E>> + Send>>;

/// A hosted completion service that streams its reply.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier used for requests.
    fn model_name(&self) -> &str;

    /// Open a streamed completion.
    ///
    /// Errors returned here happen before any fragment is produced
    /// (connection failure, non-2xx status).
    async fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<FragmentStream, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_roles_serialize_lowercase() {
        let json = serde_json::to_value(ChatMessage::system("be nice")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "be nice"}));
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
    }
}
