//! Sohbet Core - Shared library for the streaming chat client
//!
//! This crate provides the core functionality for the Sohbet TUI:
//! - Streaming chat protocol client and event decoding
//! - Conversation log with send/stop/regenerate orchestration
//! - Per-device session identity
//! - Voice capture and read-aloud side channels

pub mod chat;
pub mod constants;
pub mod error;
pub mod identity;
pub mod notify;
pub mod paths;
pub mod voice;

// Re-exports for convenience
pub use chat::client::{ChatClient, ChatTransport, EventByteStream};
pub use chat::session::ChatSession;
pub use chat::sse::{StreamDecoder, StreamEvent};
pub use chat::store::ConversationStore;
pub use chat::types::{HistoryMessage, Message};
pub use error::{ChatError, VoiceError};
pub use identity::SessionIdentity;
pub use notify::{ChannelNotifier, Notice, NoticeKind, Notifier};
pub use voice::{Dictation, Speaker};
