//! HTTP client for the chat backend
//!
//! Three endpoints: a streaming `POST /chat`, a `GET /history` used once to
//! seed the conversation log, and a `POST /read` returning synthesized
//! speech audio. The streaming call sits behind [`ChatTransport`] so the
//! orchestrator is testable against scripted streams.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};

use super::types::{ChatRequest, HistoryMessage, ReadRequest};
use crate::constants;
use crate::error::ChatError;

/// Byte stream of one streaming chat response
pub type EventByteStream = BoxStream<'static, Result<Bytes, ChatError>>;

/// Opens streaming chat requests
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// POST the message and return the response byte stream
    ///
    /// Fails on connection errors and on non-success statuses; both are
    /// terminal for the send that issued them.
    async fn open_stream(
        &self,
        message: &str,
        session_id: &str,
    ) -> Result<EventByteStream, ChatError>;
}

/// reqwest-backed client for the chat backend
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    /// Build a client for the backend at `base_url`
    ///
    /// A connect timeout applies to every request. There is deliberately no
    /// read timeout: a stalled stream runs until the remote closes it or
    /// the user stops the reply.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .connect_timeout(constants::http::CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Fetch the conversation history that seeds the log at startup
    pub async fn fetch_history(&self, session_id: &str) -> Result<Vec<HistoryMessage>, ChatError> {
        let response = self
            .http
            .get(self.endpoint("history"))
            .query(&[("sessionId", session_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status));
        }

        let body = response.text().await?;
        let history: Vec<HistoryMessage> = serde_json::from_str(&body)?;
        tracing::info!(entries = history.len(), "Fetched conversation history");
        Ok(history)
    }

    /// Fetch synthesized speech audio for `text`
    ///
    /// Success is an `audio/mpeg` payload; failures propagate the backend
    /// status.
    pub async fn fetch_speech(&self, text: &str) -> Result<Bytes, ChatError> {
        let response = self
            .http
            .post(self.endpoint("read"))
            .json(&ReadRequest { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status));
        }
        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl ChatTransport for ChatClient {
    async fn open_stream(
        &self,
        message: &str,
        session_id: &str,
    ) -> Result<EventByteStream, ChatError> {
        let response = self
            .http
            .post(self.endpoint("chat"))
            .json(&ChatRequest {
                message,
                session_id,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "Chat endpoint refused the request");
            return Err(ChatError::Status(status));
        }

        tracing::info!("Chat stream opened");
        Ok(response.bytes_stream().map_err(ChatError::from).boxed())
    }
}
