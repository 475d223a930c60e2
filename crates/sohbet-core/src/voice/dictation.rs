//! Voice capture feeding the input field
//!
//! Recognition is an injected engine that hands out capture sessions. While
//! one runs, its transcript segments accumulate into a watched text buffer
//! the input layer observes; dictation never touches the chat pipeline. The
//! dictating flag clears on every exit path of the capture that owns the
//! slot, whether the engine ended on its own or the user toggled capture
//! off; a superseded capture never touches the state of the one after it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::constants::notices;
use crate::error::VoiceError;
use crate::notify::{Notice, Notifier};

/// One live capture session handed out by a recognition engine
pub struct Capture {
    /// Transcript segments in recognition order; closes when the engine ends
    pub segments: mpsc::UnboundedReceiver<String>,
    /// Cancelling this tells the engine to stop capturing
    pub stop: CancellationToken,
}

/// Starts voice capture sessions
pub trait SpeechRecognizer: Send + Sync {
    fn start(&self) -> Result<Capture, VoiceError>;
}

/// Toggles voice capture and publishes the growing transcript
pub struct Dictation {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    notifier: Arc<dyn Notifier>,
    dictating: Arc<AtomicBool>,
    /// Generation and stop handle of the running capture; empty when idle
    active: Arc<Mutex<Option<(u64, CancellationToken)>>>,
    /// Mints one generation per started capture
    generation: AtomicU64,
    transcript: watch::Sender<String>,
}

impl Dictation {
    /// `recognizer` is `None` when the host has no capture backend
    pub fn new(recognizer: Option<Arc<dyn SpeechRecognizer>>, notifier: Arc<dyn Notifier>) -> Self {
        let (transcript, _) = watch::channel(String::new());
        Self {
            recognizer,
            notifier,
            dictating: Arc::new(AtomicBool::new(false)),
            active: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
            transcript,
        }
    }

    pub fn is_dictating(&self) -> bool {
        self.dictating.load(Ordering::SeqCst)
    }

    /// Observe the published transcript; updated on every engine segment
    pub fn transcript(&self) -> watch::Receiver<String> {
        self.transcript.subscribe()
    }

    /// Start capture, or stop the one already running
    ///
    /// `prefix` is the text already in the input field; every published
    /// transcript starts with it, separated by a space when non-empty.
    /// Without a recognizer this notifies and aborts.
    pub fn toggle(&self, prefix: &str) {
        if let Some((_, stop)) = self.active.lock().take() {
            stop.cancel();
            self.dictating.store(false, Ordering::SeqCst);
            tracing::info!("Dictation stopped");
            return;
        }

        let Some(recognizer) = self.recognizer.clone() else {
            self.notifier
                .notify(Notice::error(notices::DICTATION_UNSUPPORTED));
            return;
        };

        let capture = match recognizer.start() {
            Ok(capture) => capture,
            Err(e) => {
                tracing::warn!(error = %e, "Voice capture failed to start");
                self.notifier.notify(Notice::error(notices::DICTATION_FAILED));
                return;
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        self.dictating.store(true, Ordering::SeqCst);
        *self.active.lock() = Some((generation, capture.stop.clone()));
        tracing::info!("Dictation started");

        let prefix = prefix.to_string();
        let dictating = self.dictating.clone();
        let active = self.active.clone();
        let transcript = self.transcript.clone();
        tokio::spawn(async move {
            run_capture(capture, prefix, transcript).await;
            // Engine end and toggle-off converge here. A drain task that no
            // longer owns the slot has been superseded by a newer capture
            // and must leave the shared state alone.
            let mut slot = active.lock();
            if slot.as_ref().is_some_and(|(owner, _)| *owner == generation) {
                slot.take();
                dictating.store(false, Ordering::SeqCst);
            }
        });
    }
}

/// Drain segments into the transcript until the engine ends or capture stops
async fn run_capture(mut capture: Capture, prefix: String, transcript: watch::Sender<String>) {
    let mut joined = String::new();
    loop {
        tokio::select! {
            biased;

            _ = capture.stop.cancelled() => break,
            segment = capture.segments.recv() => match segment {
                Some(segment) => {
                    if !joined.is_empty() {
                        joined.push(' ');
                    }
                    joined.push_str(&segment);
                    let text = if prefix.is_empty() {
                        joined.clone()
                    } else {
                        format!("{prefix} {joined}")
                    };
                    let _ = transcript.send(text);
                }
                None => {
                    tracing::debug!("Voice capture ended");
                    break;
                }
            }
        }
    }
}
