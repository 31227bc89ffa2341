//! Conversation log: the ordered, role-tagged messages shown in the widget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single displayed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Append-only message log. Only the last message may change after it is
/// pushed, and only while it is an assistant reply being streamed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ConversationLog {
    messages: Vec<ConversationMessage>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ConversationMessage) -> &ConversationMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The last message, if it is an assistant message.
    pub(crate) fn last_assistant_mut(&mut self) -> Option<&mut ConversationMessage> {
        self.messages
            .last_mut()
            .filter(|m| m.role == MessageRole::Assistant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_preserves_order() {
        let mut log = ConversationLog::new();
        log.push(ConversationMessage::assistant("q"));
        log.push(ConversationMessage::user("a"));
        let roles: Vec<_> = log.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MessageRole::Assistant, MessageRole::User]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn last_assistant_mut_ignores_user_tail() {
        let mut log = ConversationLog::new();
        log.push(ConversationMessage::assistant("q"));
        log.push(ConversationMessage::user("a"));
        assert!(log.last_assistant_mut().is_none());
        log.push(ConversationMessage::assistant(""));
        log.last_assistant_mut().unwrap().content.push_str("hi");
        assert_eq!(log.last().unwrap().content, "hi");
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut log = ConversationLog::new();
        log.push(ConversationMessage::user("hello"));
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json[0]["role"], "user");
        assert_eq!(json[0]["content"], "hello");
    }
}
