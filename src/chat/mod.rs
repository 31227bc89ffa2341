//! Chat surface: the per-user session state machine, its conversation log,
//! and the HTTP/WebSocket routes that expose them.

pub mod conversation;
pub mod routes;
pub mod session;
pub mod ws;

pub use conversation::{ConversationLog, ConversationMessage, MessageRole};
pub use routes::{AppState, StreamRequest, chat_routes};
pub use session::{ChatSession, RelayRequest, Turn};
