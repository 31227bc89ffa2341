//! geo-chat: onboarding chatbot with a streaming LLM relay.

pub mod chat;
pub mod commands;
pub mod config;
pub mod error;
pub mod llm;
pub mod onboarding;
pub mod relay;
