//! Text-to-speech playback
//!
//! Synthesis and playback are injected engines: the synthesizer turns text
//! into an audio payload, the player takes that payload to completion. The
//! speaking flag covers both phases and clears on every exit path. Voice
//! failures never surface as messages; a missing backend is a silent no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::chat::ChatClient;
use crate::error::VoiceError;

/// Produces an audio payload for a piece of text
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Bytes, VoiceError>;
}

/// Plays an audio payload to completion
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, audio: Bytes) -> Result<(), VoiceError>;
}

/// Synthesizer backed by the chat service's read endpoint
pub struct RemoteSynthesizer {
    client: Arc<ChatClient>,
}

impl RemoteSynthesizer {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SpeechSynthesizer for RemoteSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Bytes, VoiceError> {
        Ok(self.client.fetch_speech(text).await?)
    }
}

/// Reads text aloud through the configured synthesis and playback engines
///
/// One playback at a time: a `speak` while an earlier one runs is rejected,
/// not queued.
pub struct Speaker {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    player: Arc<dyn AudioPlayer>,
    speaking: AtomicBool,
}

impl Speaker {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, player: Arc<dyn AudioPlayer>) -> Self {
        Self {
            synthesizer,
            player,
            speaking: AtomicBool::new(false),
        }
    }

    /// True from the start of synthesis until playback finished or failed
    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    /// Synthesize `text` and play it to completion
    ///
    /// No-op for whitespace-only text. Failures are logged, never surfaced;
    /// a backend reporting itself unavailable returns without a trace.
    pub async fn speak(&self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        if self.speaking.swap(true, Ordering::SeqCst) {
            tracing::debug!("Speak rejected, playback already running");
            return;
        }
        let _cleanup = scopeguard::guard((), |_| {
            self.speaking.store(false, Ordering::SeqCst);
        });

        let audio = match self.synthesizer.synthesize(text).await {
            Ok(audio) => audio,
            Err(VoiceError::Unavailable) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Speech synthesis failed");
                return;
            }
        };

        tracing::info!(bytes = audio.len(), "Playing synthesized speech");
        match self.player.play(audio).await {
            Ok(()) | Err(VoiceError::Unavailable) => {}
            Err(e) => tracing::warn!(error = %e, "Audio playback failed"),
        }
    }
}
