//! LLM integration for geo-chat.
//!
//! The relay only needs one operation from a provider: open a streamed
//! completion and hand back text fragments. `OpenAiProvider` implements it
//! over the chat-completions API (any OpenAI-compatible base URL works).

pub mod openai;
pub mod provider;

pub use openai::OpenAiProvider;
pub use provider::*;

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::error::LlmError;

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: secrecy::SecretString,
    pub base_url: String,
    pub model: String,
}

impl From<&ServerConfig> for LlmConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        }
    }
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    if config.model.trim().is_empty() {
        return Err(LlmError::RequestFailed {
            provider: "openai".to_string(),
            reason: "model name is empty".to_string(),
        });
    }

    tracing::info!("Using OpenAI-compatible API (model: {})", config.model);
    Ok(Arc::new(OpenAiProvider::new(
        config.api_key.clone(),
        config.base_url.clone(),
        config.model.clone(),
    )))
}
