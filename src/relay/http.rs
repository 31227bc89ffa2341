//! Relay client for a remote `/api/stream` endpoint.
//!
//! The endpoint answers with a plain-text body whose chunks are the
//! fragments. Chunk boundaries may fall inside a multi-byte UTF-8 sequence,
//! so bytes are decoded incrementally.

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;

use super::{Relay, RelayStream};
use crate::error::RelayError;
use crate::onboarding::Preferences;

/// Relay that POSTs to a geo-chat server and reads the streamed reply.
#[derive(Clone)]
pub struct HttpRelay {
    client: Client,
    endpoint: String,
}

#[derive(Serialize)]
struct StreamRequestBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    preferences: Option<&'a Preferences>,
}

impl HttpRelay {
    /// `endpoint` is the full URL of the stream route, e.g.
    /// `http://localhost:8080/api/stream`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Relay for HttpRelay {
    async fn send_message(
        &self,
        message: &str,
        preferences: Option<&Preferences>,
    ) -> Result<RelayStream, RelayError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&StreamRequestBody {
                message,
                preferences,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), endpoint = %self.endpoint, "Stream endpoint returned an error");
            return Err(RelayError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(RelayError::from))
            .boxed();
        Ok(decode_utf8(bytes))
    }
}

struct DecodeState {
    bytes: BoxStream<'static, Result<Vec<u8>, RelayError>>,
    pending: Vec<u8>,
    finished: bool,
}

/// Turn a stream of byte chunks into a stream of text fragments, carrying
/// incomplete trailing sequences over to the next chunk.
fn decode_utf8(bytes: BoxStream<'static, Result<Vec<u8>, RelayError>>) -> RelayStream {
    let state = DecodeState {
        bytes,
        pending: Vec::new(),
        finished: false,
    };

    let stream = stream::unfold(state, |mut state| async move {
        loop {
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    state.pending.extend_from_slice(&chunk);
                    match take_valid_prefix(&mut state.pending) {
                        Ok(text) if text.is_empty() => continue,
                        Ok(text) => return Some((Ok(text), state)),
                        Err(e) => {
                            state.finished = true;
                            return Some((Err(e), state));
                        }
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.finished = true;
                    if state.pending.is_empty() {
                        return None;
                    }
                    return Some((
                        Err(RelayError::MalformedBody(
                            "stream ended inside a UTF-8 sequence".to_string(),
                        )),
                        state,
                    ));
                }
            }
        }
    });

    Box::pin(stream)
}

/// Split off the longest valid UTF-8 prefix of `buf`, leaving an incomplete
/// trailing sequence in place.
fn take_valid_prefix(buf: &mut Vec<u8>) -> Result<String, RelayError> {
    let valid_up_to = match std::str::from_utf8(buf) {
        Ok(_) => buf.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(e) => return Err(RelayError::MalformedBody(e.to_string())),
    };
    let rest = buf.split_off(valid_up_to);
    let text = String::from_utf8(std::mem::replace(buf, rest))
        .map_err(|e| RelayError::MalformedBody(e.to_string()))?;
    Ok(text)
}
