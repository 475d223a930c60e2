//! Conversation and wire types for the chat backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::notices;

/// One entry in the conversation log
///
/// `responded` is `None` for user messages, `Some(false)` while an
/// assistant reply is pending, `Some(true)` once it settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub text: String,
    pub is_user: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded: Option<bool>,
}

impl Message {
    /// A user turn as entered
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
            responded: None,
        }
    }

    /// The provisional assistant entry that follows every user turn
    pub fn placeholder() -> Self {
        Self {
            text: notices::REPLY_PENDING.to_string(),
            is_user: false,
            responded: Some(false),
        }
    }

    /// True while this entry is an unanswered placeholder
    pub fn is_pending(&self) -> bool {
        !self.is_user && self.responded == Some(false)
    }
}

/// One entry as returned by the history endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMessage {
    pub text: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
    pub id: String,
    pub responded: bool,
}

impl From<HistoryMessage> for Message {
    fn from(entry: HistoryMessage) -> Self {
        Self {
            text: entry.text,
            is_user: entry.is_user,
            responded: Some(entry.responded),
        }
    }
}

/// Body of the streaming chat request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub session_id: &'a str,
}

/// Body of the text-to-speech request
#[derive(Debug, Serialize)]
pub struct ReadRequest<'a> {
    pub text: &'a str,
}
