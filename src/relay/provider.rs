//! In-process relay backed directly by an [`LlmProvider`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;

use super::{Relay, RelayStream};
use crate::error::RelayError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::onboarding::{Preferences, preference_instruction};

/// Relay that calls the completion provider from this process.
#[derive(Clone)]
pub struct ProviderRelay {
    llm: Arc<dyn LlmProvider>,
}

impl ProviderRelay {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

/// Wire messages for one relayed turn: the personalization instruction (when
/// preferences are known) followed by the user's message.
pub fn build_messages(message: &str, preferences: Option<&Preferences>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(prefs) = preferences {
        messages.push(ChatMessage::system(preference_instruction(prefs)));
    }
    messages.push(ChatMessage::user(message));
    messages
}

#[async_trait]
impl Relay for ProviderRelay {
    async fn send_message(
        &self,
        message: &str,
        preferences: Option<&Preferences>,
    ) -> Result<RelayStream, RelayError> {
        tracing::debug!(
            model = %self.llm.model_name(),
            personalized = preferences.is_some(),
            "Relaying message to provider"
        );
        let request = CompletionRequest::new(build_messages(message, preferences));
        let stream = self.llm.stream_completion(request).await?;
        Ok(Box::pin(stream.map(|item| item.map_err(RelayError::from))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn instruction_prepended_when_preferences_present() {
        let prefs = Preferences::new("Italy", "Europe", "Rome");
        let messages = build_messages("Tell me about pasta", Some(&prefs));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Favorite country: Italy"));
        assert_eq!(messages[1], ChatMessage::user("Tell me about pasta"));
    }

    #[test]
    fn user_message_only_without_preferences() {
        let messages = build_messages("hi", None);
        assert_eq!(messages, vec![ChatMessage::user("hi")]);
    }
}
