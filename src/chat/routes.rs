//! REST endpoints: the streaming completion route, command autocomplete and
//! health.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use super::ws::ws_chat_handler;
use crate::commands::{command_help, command_suggestions};
use crate::error::ApiError;
use crate::onboarding::Preferences;
use crate::relay::Relay;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<dyn Relay>,
}

/// Body of `POST /api/stream`.
#[derive(Debug, Deserialize)]
pub struct StreamRequest {
    pub message: String,
    #[serde(default)]
    pub preferences: Option<Preferences>,
}

#[derive(Debug, Deserialize)]
struct SuggestionQuery {
    #[serde(default)]
    input: String,
}

#[derive(Debug, Serialize)]
struct SuggestionResponse {
    suggestions: Vec<&'static str>,
    help: Option<&'static str>,
}

/// Build the router with every chat route.
pub fn chat_routes(relay: Arc<dyn Relay>) -> Router {
    let state = AppState { relay };

    Router::new()
        .route("/health", get(health))
        .route("/api/stream", post(stream_reply))
        .route("/api/commands/suggestions", get(suggestions))
        .route("/ws/chat", get(ws_chat_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "geo-chat"
    }))
}

// ── Streaming completion ────────────────────────────────────────────────

/// POST /api/stream
///
/// Relays the message (with the personalization instruction built from
/// `preferences`) and streams the reply as raw text.
async fn stream_reply(
    State(state): State<AppState>,
    payload: Result<Json<StreamRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::MalformedRequest(e.body_text()))?;

    info!(
        chars = request.message.len(),
        personalized = request.preferences.is_some(),
        "Stream request"
    );

    let stream = state
        .relay
        .send_message(&request.message, request.preferences.as_ref())
        .await?;

    let body = stream.filter_map(|item| async move {
        match item {
            Ok(fragment) if fragment.is_empty() => None,
            Ok(fragment) => Some(Ok(fragment)),
            Err(e) => {
                warn!(error = %e, "Completion stream failed mid-response");
                Some(Err(e))
            }
        }
    });

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response())
}

// ── Autocomplete ────────────────────────────────────────────────────────

/// GET /api/commands/suggestions?input=/cha
async fn suggestions(Query(query): Query<SuggestionQuery>) -> impl IntoResponse {
    Json(SuggestionResponse {
        suggestions: command_suggestions(&query.input).collect(),
        help: command_help(&query.input),
    })
}
