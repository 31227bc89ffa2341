//! OpenAI-compatible chat-completions provider with server-sent-event
//! streaming.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, FragmentStream, LlmProvider};

const PROVIDER: &str = "openai";

/// Streams completions from `{base_url}/chat/completions`.
pub struct OpenAiProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: SecretString, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": request.messages,
            "stream": true,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<FragmentStream, LlmError> {
        let body = self.build_request_body(&request);
        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            "Opening completion stream"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::HttpStatus {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let stream = response
            .bytes_stream()
            .eventsource()
            .map(|event| {
                let event = event.map_err(|e| LlmError::Stream {
                    provider: PROVIDER.to_string(),
                    reason: e.to_string(),
                })?;
                parse_event_data(&event.data)
            })
            .take_while(|item| {
                let more = !matches!(item, Ok(SseItem::Done));
                async move { more }
            })
            .filter_map(|item| async move {
                match item {
                    Ok(SseItem::Content(text)) => Some(Ok(text)),
                    Ok(SseItem::Skip | SseItem::Done) => None,
                    Err(e) => Some(Err(e)),
                }
            });

        Ok(Box::pin(stream))
    }
}

/// A decoded SSE payload.
#[derive(Debug, PartialEq, Eq)]
enum SseItem {
    Content(String),
    /// Role-only deltas, finish markers, and empty content.
    Skip,
    Done,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

fn parse_event_data(data: &str) -> Result<SseItem, LlmError> {
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SseItem::Done);
    }
    if data.is_empty() {
        return Ok(SseItem::Skip);
    }

    let chunk: StreamChunk = serde_json::from_str(data).map_err(|e| LlmError::InvalidResponse {
        provider: PROVIDER.to_string(),
        reason: format!("bad stream chunk: {e}"),
    })?;

    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .unwrap_or_default();

    if content.is_empty() {
        Ok(SseItem::Skip)
    } else {
        Ok(SseItem::Content(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ChatMessage;

    use axum::Router;
    use axum::http::{StatusCode, header};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use tokio::net::TcpListener;

    #[test]
    fn parses_content_delta() {
        let data = r#"{"id":"c1","choices":[{"index":0,"delta":{"content":"Par"}}]}"#;
        assert_eq!(parse_event_data(data).unwrap(), SseItem::Content("Par".into()));
    }

    #[test]
    fn empty_and_role_only_deltas_are_skipped() {
        let role_only = r#"{"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_event_data(role_only).unwrap(), SseItem::Skip);
        let empty = r#"{"choices":[{"delta":{"content":""},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_event_data(empty).unwrap(), SseItem::Skip);
        let no_choices = r#"{"choices":[]}"#;
        assert_eq!(parse_event_data(no_choices).unwrap(), SseItem::Skip);
    }

    #[test]
    fn done_marker() {
        assert_eq!(parse_event_data("[DONE]").unwrap(), SseItem::Done);
    }

    #[test]
    fn malformed_chunk_is_an_error() {
        assert!(matches!(
            parse_event_data("{not json"),
            Err(LlmError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn request_body_is_streaming() {
        let provider = OpenAiProvider::new(SecretString::from("sk-test"), "http://x", "gpt-4o");
        let req = CompletionRequest::new(vec![
            ChatMessage::system("instruction"),
            ChatMessage::user("hi"),
        ]);
        let body = provider.build_request_body(&req);
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert!(body.get("max_tokens").is_none());
    }

    /// Serve a canned SSE body from a local fake provider.
    async fn fake_provider(status: StatusCode, body: &'static str) -> String {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || async move {
                (status, [(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://127.0.0.1:{port}/v1")
    }

    #[tokio::test]
    async fn streams_fragments_until_done() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Par\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"is is\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" lovely\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
        );
        let base_url = fake_provider(StatusCode::OK, body).await;
        let provider = OpenAiProvider::new(SecretString::from("sk-test"), base_url, "gpt-4o");

        let stream = provider
            .stream_completion(CompletionRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .unwrap();
        let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;
        assert_eq!(fragments, vec!["Par", "is is", " lovely"]);
    }

    #[tokio::test]
    async fn non_success_status_fails_before_streaming() {
        let base_url = fake_provider(StatusCode::UNAUTHORIZED, "bad key").await;
        let provider = OpenAiProvider::new(SecretString::from("sk-test"), base_url, "gpt-4o");

        let result = provider
            .stream_completion(CompletionRequest::new(vec![ChatMessage::user("hi")]))
            .await;
        match result {
            Err(LlmError::HttpStatus { status, .. }) => assert_eq!(status, 401),
            Err(other) => panic!("expected HttpStatus, got {other:?}"),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[tokio::test]
    async fn malformed_chunk_surfaces_as_stream_error() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
            "data: {broken\n\n",
        );
        let base_url = fake_provider(StatusCode::OK, body).await;
        let provider = OpenAiProvider::new(SecretString::from("sk-test"), base_url, "gpt-4o");

        let mut stream = provider
            .stream_completion(CompletionRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), "ok");
        assert!(stream.next().await.unwrap().is_err());
    }
}
