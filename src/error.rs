//! Error types for geo-chat.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Fixed text shown to the user (and returned over HTTP) when the completion
/// provider cannot produce a response.
pub const PROVIDER_FAILURE_MESSAGE: &str = "Error: Failed to get response";

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} returned HTTP {status}: {body}")]
    HttpStatus {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Stream from {provider} failed: {reason}")]
    Stream { provider: String, reason: String },
}

/// Errors raised while relaying a message to the completion service.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Completion service returned HTTP {status}")]
    Status { status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Errors surfaced by the inbound HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Provider failure: {0}")]
    ProviderFailure(#[from] RelayError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::MalformedRequest(reason) => {
                tracing::debug!(reason = %reason, "Rejected malformed stream request");
                (StatusCode::BAD_REQUEST, format!("Error: {reason}")).into_response()
            }
            Self::ProviderFailure(e) => {
                tracing::error!(error = %e, "Completion provider failed");
                (StatusCode::INTERNAL_SERVER_ERROR, PROVIDER_FAILURE_MESSAGE).into_response()
            }
        }
    }
}

/// Result type alias for geo-chat.
pub type Result<T> = std::result::Result<T, Error>;
