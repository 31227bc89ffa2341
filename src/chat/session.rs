//! Chat session: the per-user context that owns preferences, the
//! conversation log and any pending field edit, and decides where each user
//! message goes.
//!
//! Dispatch order for a message:
//! 1. a slash-command sets a pending edit and asks for the new value;
//! 2. a pending edit consumes the message as the new value;
//! 3. an unfinished onboarding records the message as the next answer;
//! 4. otherwise the message is relayed to the completion service.

use tracing::{debug, info};
use uuid::Uuid;

use super::conversation::{ConversationLog, ConversationMessage};
use crate::commands::{Command, parse_command};
use crate::error::PROVIDER_FAILURE_MESSAGE;
use crate::onboarding::prompts::edit_confirmation;
use crate::onboarding::{PreferenceField, PreferenceState, Preferences, QUESTIONS, state};

/// What a submitted message led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// Blank input; nothing was logged.
    Ignored,
    /// A reply is still streaming; the message was not accepted.
    Busy,
    /// A command was recognized and its prompt appended.
    CommandPrompt { command: Command },
    /// A pending edit consumed the message.
    PreferenceUpdated { field: PreferenceField, value: String },
    /// Onboarding recorded the answer and appended the next prompt.
    Onboarding { field: PreferenceField, complete: bool },
    /// The message must be relayed. An empty assistant message has been
    /// appended to receive the reply.
    Relay(RelayRequest),
}

/// The inputs for one relayed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    pub message: String,
    pub preferences: Preferences,
}

/// Session-scoped chat state. One per connected user; nothing is shared
/// between sessions.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: Uuid,
    state: PreferenceState,
    log: ConversationLog,
    pending_edit: Option<Command>,
    streaming: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// Start a session; the log opens with the first onboarding question.
    pub fn new() -> Self {
        let mut log = ConversationLog::new();
        log.push(ConversationMessage::assistant(QUESTIONS[0]));
        Self {
            id: Uuid::new_v4(),
            state: PreferenceState::default(),
            log,
            pending_edit: None,
            streaming: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &PreferenceState {
        &self.state
    }

    pub fn preferences(&self) -> &Preferences {
        &self.state.preferences
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn pending_edit(&self) -> Option<Command> {
        self.pending_edit
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn onboarding_complete(&self) -> bool {
        self.state.onboarding_complete
    }

    /// Dispatch one user message.
    pub fn submit(&mut self, input: &str) -> Turn {
        let message = input.trim();
        if message.is_empty() {
            return Turn::Ignored;
        }
        if self.streaming {
            debug!(session = %self.id, "Message rejected while a reply is streaming");
            return Turn::Busy;
        }

        self.log.push(ConversationMessage::user(message));

        if let Some(command) = parse_command(message).command {
            self.pending_edit = Some(command);
            self.log.push(ConversationMessage::assistant(command.prompt()));
            debug!(session = %self.id, command = %command, "Command awaiting value");
            return Turn::CommandPrompt { command };
        }

        if let Some(command) = self.pending_edit.take() {
            let field = command.field();
            self.state.preferences.set(field, message);
            self.log
                .push(ConversationMessage::assistant(edit_confirmation(field, message)));
            info!(session = %self.id, field = %field, "Preference updated");
            return Turn::PreferenceUpdated {
                field,
                value: message.to_string(),
            };
        }

        if let Some(outcome) = state::answer(&mut self.state, message) {
            self.log.push(ConversationMessage::assistant(outcome.reply));
            let complete = outcome.next.is_terminal();
            if complete {
                info!(session = %self.id, "Onboarding complete");
            }
            return Turn::Onboarding {
                field: outcome.field,
                complete,
            };
        }

        self.log.push(ConversationMessage::assistant(""));
        self.streaming = true;
        Turn::Relay(RelayRequest {
            message: message.to_string(),
            preferences: self.preferences().clone(),
        })
    }

    /// Append a streamed fragment to the in-flight reply.
    pub fn append_fragment(&mut self, fragment: &str) {
        if !self.streaming {
            return;
        }
        if let Some(reply) = self.log.last_assistant_mut() {
            reply.content.push_str(fragment);
        }
    }

    /// Mark the in-flight reply as finished and return its content.
    pub fn finish_relay(&mut self) -> &str {
        self.streaming = false;
        self.log.last().map(|m| m.content.as_str()).unwrap_or_default()
    }

    /// Replace the in-flight reply with the fixed error text.
    pub fn fail_relay(&mut self) {
        if !self.streaming {
            return;
        }
        if let Some(reply) = self.log.last_assistant_mut() {
            reply.content = PROVIDER_FAILURE_MESSAGE.to_string();
        }
        self.streaming = false;
    }
}
