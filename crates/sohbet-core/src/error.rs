//! Error types for the chat and voice paths
//!
//! Chat-path errors never escape the orchestrator; they are converted into
//! tail replacements or notifications there. These enums exist for the
//! layers underneath (transport, decoding, voice engines) and for logging.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors from the chat backend and its transport
#[derive(Debug, Error)]
pub enum ChatError {
    /// The endpoint answered with a non-success status
    #[error("chat service returned status {0}")]
    Status(StatusCode),

    /// The request could not be sent or the body stream failed
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body could not be decoded
    #[error("could not decode server payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Errors from the speech synthesis and recognition engines
#[derive(Debug, Error)]
pub enum VoiceError {
    /// No backend exists for the requested capability
    #[error("no speech backend available")]
    Unavailable,

    /// The backend started but reported a failure
    #[error("speech backend failed: {0}")]
    Backend(String),

    /// Subprocess or file plumbing failed
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Remote synthesis call failed
    #[error(transparent)]
    Service(#[from] ChatError),
}
