//! Chat layer
//!
//! Talks to the chat backend over streaming HTTP and keeps the conversation
//! log consistent while replies arrive, stop, or fail.

pub mod client;
pub mod session;
pub mod sse;
pub mod store;
pub mod types;

pub use client::{ChatClient, ChatTransport, EventByteStream};
pub use session::ChatSession;
pub use sse::{StreamDecoder, StreamEvent};
pub use store::ConversationStore;
pub use types::{HistoryMessage, Message};
