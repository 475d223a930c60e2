//! Voice layer
//!
//! Side channel for spoken input and output. Dictation produces text for the
//! input field; the speaker reads replies aloud. Neither touches the chat
//! pipeline, and both degrade to no-ops or notifications when the host has
//! no audio backend.

pub mod dictation;
pub mod speech;

pub use dictation::{Capture, Dictation, SpeechRecognizer};
pub use speech::{AudioPlayer, RemoteSynthesizer, Speaker, SpeechSynthesizer};
