//! Configuration types.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default completion model.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default OpenAI-compatible API base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Server configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Provider credential (`OPENAI_KEY`).
    pub api_key: SecretString,
    /// Completion model name.
    pub model: String,
    /// Base URL of the chat-completions API.
    pub base_url: String,
    /// Address to bind the HTTP server to.
    pub host: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
}

impl ServerConfig {
    /// Build the configuration from environment variables.
    ///
    /// `OPENAI_KEY` is required; everything else falls back to a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENAI_KEY".to_string()))?;

        let model = std::env::var("GEO_CHAT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let base_url = std::env::var("GEO_CHAT_OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string());

        let host = std::env::var("GEO_CHAT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = match std::env::var("GEO_CHAT_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "GEO_CHAT_PORT".to_string(),
                message: format!("'{raw}' is not a valid port"),
            })?,
            Err(_) => 8080,
        };

        Ok(Self {
            api_key: SecretString::from(api_key),
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            host,
            port,
        })
    }

    /// `host:port` string for binding the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
