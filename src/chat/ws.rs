//! WebSocket chat: one [`ChatSession`] per connection.
//!
//! The socket task owns the session. While a reply is streaming it waits on
//! both the fragment stream and the socket, so messages sent mid-stream are
//! answered with `busy` instead of being queued.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::conversation::{ConversationMessage, MessageRole};
use super::routes::AppState;
use super::session::{ChatSession, RelayRequest, Turn};
use crate::commands::{command_help, command_suggestions};
use crate::error::{PROVIDER_FAILURE_MESSAGE, RelayError};
use crate::onboarding::PreferenceState;
use crate::relay::{Relay, RelayStream};

// ── JSON Protocol ───────────────────────────────────────────────────────

/// Message from client → server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// A line typed by the user.
    Message { content: String },
    /// Autocomplete request for partial input.
    Suggest { input: String },
}

/// Message from server → client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    History {
        messages: Vec<ConversationMessage>,
        preferences: PreferenceState,
    },
    Message {
        role: MessageRole,
        content: String,
    },
    StreamStart,
    StreamChunk {
        content: String,
    },
    StreamEnd {
        content: String,
        ok: bool,
    },
    Busy,
    Preferences {
        #[serde(flatten)]
        state: PreferenceState,
    },
    Suggestions {
        suggestions: Vec<&'static str>,
        help: Option<&'static str>,
    },
    Error {
        message: String,
    },
}

enum Event {
    Fragment(Option<Result<String, RelayError>>),
    Frame(Option<Result<Message, axum::Error>>),
}

// ── WebSocket Handler ───────────────────────────────────────────────────

pub(super) async fn ws_chat_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    info!("Chat client connecting");
    ws.on_upgrade(move |socket| handle_chat_socket(socket, state.relay))
}

async fn handle_chat_socket(mut socket: WebSocket, relay: Arc<dyn Relay>) {
    let mut session = ChatSession::new();
    let session_id = session.id();
    info!(session = %session_id, "Chat session opened");

    let history = ServerMessage::History {
        messages: session.log().messages().to_vec(),
        preferences: session.state().clone(),
    };
    if send(&mut socket, &history).await.is_err() {
        return;
    }

    let mut active: Option<RelayStream> = None;

    loop {
        let event = match active.as_mut() {
            Some(stream) => tokio::select! {
                item = stream.next() => Event::Fragment(item),
                frame = socket.recv() => Event::Frame(frame),
            },
            None => Event::Frame(socket.recv().await),
        };

        let outgoing = match event {
            Event::Fragment(Some(Ok(fragment))) => {
                if fragment.is_empty() {
                    continue;
                }
                session.append_fragment(&fragment);
                vec![ServerMessage::StreamChunk { content: fragment }]
            }
            Event::Fragment(Some(Err(e))) => {
                warn!(session = %session_id, error = %e, "Reply stream failed");
                active = None;
                session.fail_relay();
                vec![ServerMessage::StreamEnd {
                    content: PROVIDER_FAILURE_MESSAGE.to_string(),
                    ok: false,
                }]
            }
            Event::Fragment(None) => {
                active = None;
                let content = session.finish_relay().to_string();
                debug!(session = %session_id, chars = content.len(), "Reply stream finished");
                vec![ServerMessage::StreamEnd { content, ok: true }]
            }
            Event::Frame(Some(Ok(Message::Text(text)))) => {
                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Message { content }) => {
                        let (echo, request) = handle_user_message(&mut session, &content);
                        if send_all(&mut socket, &echo).await.is_err() {
                            debug!(session = %session_id, "Chat client disconnected during send");
                            return;
                        }
                        match request {
                            Some(request) => {
                                open_relay(&mut session, relay.as_ref(), &request, &mut active)
                                    .await
                            }
                            None => Vec::new(),
                        }
                    }
                    Ok(ClientMessage::Suggest { input }) => vec![ServerMessage::Suggestions {
                        suggestions: command_suggestions(&input).collect(),
                        help: command_help(&input),
                    }],
                    Err(e) => {
                        debug!(error = %e, text = %text, "Invalid JSON from chat client");
                        vec![ServerMessage::Error {
                            message: format!("invalid message: {e}"),
                        }]
                    }
                }
            }
            Event::Frame(Some(Ok(Message::Ping(data)))) => {
                if socket.send(Message::Pong(data)).await.is_err() {
                    break;
                }
                continue;
            }
            Event::Frame(Some(Ok(Message::Close(_)))) | Event::Frame(None) => {
                info!(session = %session_id, "Chat client disconnected");
                break;
            }
            Event::Frame(Some(Err(e))) => {
                warn!(session = %session_id, error = %e, "Chat WebSocket error");
                break;
            }
            Event::Frame(Some(Ok(_))) => continue,
        };

        if send_all(&mut socket, &outgoing).await.is_err() {
            debug!(session = %session_id, "Chat client disconnected during send");
            return;
        }
    }

    info!(session = %session_id, "Chat session closed");
}

/// Dispatch one user line and collect what the client should see right
/// away. A relay turn also returns the request to open once these are sent.
fn handle_user_message(
    session: &mut ChatSession,
    content: &str,
) -> (Vec<ServerMessage>, Option<RelayRequest>) {
    let before = session.log().len();
    let turn = session.submit(content);

    let mut out: Vec<ServerMessage> = session.log().messages()[before..]
        .iter()
        .filter(|m| !(m.role == MessageRole::Assistant && m.content.is_empty()))
        .map(|m| ServerMessage::Message {
            role: m.role,
            content: m.content.clone(),
        })
        .collect();

    let request = match turn {
        Turn::Ignored | Turn::CommandPrompt { .. } => None,
        Turn::Busy => {
            out.push(ServerMessage::Busy);
            None
        }
        Turn::PreferenceUpdated { .. } | Turn::Onboarding { .. } => {
            out.push(ServerMessage::Preferences {
                state: session.state().clone(),
            });
            None
        }
        Turn::Relay(request) => {
            out.push(ServerMessage::StreamStart);
            Some(request)
        }
    };

    (out, request)
}

/// Open the reply stream for a relay turn. On failure the reply is closed
/// with the error text.
async fn open_relay(
    session: &mut ChatSession,
    relay: &dyn Relay,
    request: &RelayRequest,
    active: &mut Option<RelayStream>,
) -> Vec<ServerMessage> {
    match relay
        .send_message(&request.message, Some(&request.preferences))
        .await
    {
        Ok(stream) => {
            *active = Some(stream);
            Vec::new()
        }
        Err(e) => {
            warn!(session = %session.id(), error = %e, "Relay request failed");
            session.fail_relay();
            vec![ServerMessage::StreamEnd {
                content: PROVIDER_FAILURE_MESSAGE.to_string(),
                ok: false,
            }]
        }
    }
}

async fn send_all(socket: &mut WebSocket, msgs: &[ServerMessage]) -> Result<(), axum::Error> {
    for msg in msgs {
        send(socket, msg).await?;
    }
    Ok(())
}

async fn send(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await,
        Err(e) => {
            warn!(error = %e, "Failed to serialize chat message");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_parses() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"message","content":"Italy"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Message { content } if content == "Italy"));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"suggest","input":"/cha"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Suggest { input } if input == "/cha"));
    }

    #[test]
    fn server_message_tags() {
        let json = serde_json::to_value(ServerMessage::StreamStart).unwrap();
        assert_eq!(json, serde_json::json!({"type": "stream_start"}));

        let json = serde_json::to_value(ServerMessage::StreamChunk {
            content: "Par".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "stream_chunk");
        assert_eq!(json["content"], "Par");

        let json = serde_json::to_value(ServerMessage::Preferences {
            state: PreferenceState::default(),
        })
        .unwrap();
        assert_eq!(json["type"], "preferences");
        assert_eq!(json["currentQuestion"], 0);
    }

    #[test]
    fn user_message_during_onboarding_emits_reply_and_preferences() {
        let mut session = ChatSession::new();
        let (out, request) = handle_user_message(&mut session, "Italy");

        assert_eq!(out.len(), 3);
        assert!(matches!(&out[0], ServerMessage::Message { role: MessageRole::User, content } if content == "Italy"));
        assert!(matches!(&out[1], ServerMessage::Message { role: MessageRole::Assistant, content } if content == "What is your favorite continent?"));
        assert!(matches!(&out[2], ServerMessage::Preferences { state } if state.current_question == 1));
        assert!(request.is_none());
    }

    #[test]
    fn relay_turn_announces_stream_before_request() {
        let mut session = ChatSession::new();
        for answer in ["Italy", "Europe", "Rome"] {
            handle_user_message(&mut session, answer);
        }

        let (out, request) = handle_user_message(&mut session, "Tell me about Rome");

        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], ServerMessage::Message { role: MessageRole::User, content } if content == "Tell me about Rome"));
        assert!(matches!(out[1], ServerMessage::StreamStart));
        assert_eq!(request.unwrap().message, "Tell me about Rome");
        assert!(session.is_streaming());
    }

    #[tokio::test]
    async fn failed_request_closes_reply_with_error_text() {
        struct DownRelay;

        #[async_trait::async_trait]
        impl Relay for DownRelay {
            async fn send_message(
                &self,
                _message: &str,
                _preferences: Option<&crate::onboarding::Preferences>,
            ) -> Result<RelayStream, RelayError> {
                Err(RelayError::Status { status: 503 })
            }
        }

        let mut session = ChatSession::new();
        for answer in ["Italy", "Europe", "Rome"] {
            handle_user_message(&mut session, answer);
        }
        let (_, request) = handle_user_message(&mut session, "hi");
        let mut active = None;

        let out = open_relay(&mut session, &DownRelay, &request.unwrap(), &mut active).await;

        assert!(matches!(&out[..], [ServerMessage::StreamEnd { content, ok: false }] if content == PROVIDER_FAILURE_MESSAGE));
        assert!(active.is_none());
        assert!(!session.is_streaming());
    }
}
