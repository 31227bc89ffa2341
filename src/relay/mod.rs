//! Streaming relay: forwards a user message plus the collected preferences
//! to the completion service and feeds the reply back into the conversation
//! fragment by fragment.

pub mod http;
pub mod provider;

pub use http::HttpRelay;
pub use provider::ProviderRelay;

use async_trait::async_trait;
use futures::StreamExt;

use crate::chat::{ChatSession, RelayRequest};
use crate::error::RelayError;
use crate::llm::FragmentStream;
use crate::onboarding::Preferences;

/// Fragments of one relayed reply. Finite and not restartable: every user
/// turn opens a new stream.
pub type RelayStream = FragmentStream<RelayError>;

/// Something that can turn a user message into a streamed reply.
#[async_trait]
pub trait Relay: Send + Sync {
    async fn send_message(
        &self,
        message: &str,
        preferences: Option<&Preferences>,
    ) -> Result<RelayStream, RelayError>;
}

/// How a relayed turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The stream reached its end; `content` is the full reply.
    Completed { content: String },
    /// The request or the stream failed; the reply was replaced by the fixed
    /// error text.
    Failed { reason: String },
}

/// Consume `stream` into the session's in-flight assistant message.
///
/// `on_fragment` sees every non-empty fragment as it is appended. On the
/// first error the rest of the stream is dropped.
pub async fn drive_relay<F>(
    session: &mut ChatSession,
    stream: Result<RelayStream, RelayError>,
    mut on_fragment: F,
) -> RelayOutcome
where
    F: FnMut(&str),
{
    let mut stream = match stream {
        Ok(stream) => stream,
        Err(e) => return fail(session, e),
    };

    while let Some(item) = stream.next().await {
        match item {
            Ok(fragment) => {
                if fragment.is_empty() {
                    continue;
                }
                session.append_fragment(&fragment);
                on_fragment(&fragment);
            }
            Err(e) => return fail(session, e),
        }
    }

    RelayOutcome::Completed {
        content: session.finish_relay().to_string(),
    }
}

/// Run one relayed turn end to end: open the request returned by
/// [`ChatSession::submit`] and stream it into the session.
///
/// A session with no reply in flight is left untouched.
pub async fn relay_turn<R, F>(
    session: &mut ChatSession,
    relay: &R,
    request: &RelayRequest,
    on_fragment: F,
) -> RelayOutcome
where
    R: Relay + ?Sized,
    F: FnMut(&str),
{
    if !session.is_streaming() {
        return RelayOutcome::Failed {
            reason: "no reply in flight".to_string(),
        };
    }
    let stream = relay
        .send_message(&request.message, Some(&request.preferences))
        .await;
    drive_relay(session, stream, on_fragment).await
}

fn fail(session: &mut ChatSession, error: RelayError) -> RelayOutcome {
    tracing::warn!(error = %error, "Relay failed");
    session.fail_relay();
    RelayOutcome::Failed {
        reason: error.to_string(),
    }
}
