//! Voice capture through an external recognizer process
//!
//! The recognizer is any command that prints one transcript line per
//! utterance to stdout (a whisper wrapper, a vosk client, a test script).
//! The deployment locale is exported to the command's environment so it can
//! pick the matching model.

use std::process::Stdio;

use sohbet_core::constants;
use sohbet_core::voice::{Capture, SpeechRecognizer};
use sohbet_core::VoiceError;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Environment variable carrying the capture locale to the command
const LANGUAGE_VAR: &str = "SOHBET_LANGUAGE";

/// Runs a configured shell command and streams its stdout as transcripts
pub struct ProcessRecognizer {
    command: String,
}

impl ProcessRecognizer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl SpeechRecognizer for ProcessRecognizer {
    fn start(&self) -> Result<Capture, VoiceError> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .env(LANGUAGE_VAR, constants::voice::LANGUAGE)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| VoiceError::Backend("recognizer stdout not captured".to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let stop = CancellationToken::new();
        let cancel = stop.clone();

        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        let _ = child.start_kill();
                        break;
                    }
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => {
                            let segment = line.trim();
                            if segment.is_empty() {
                                continue;
                            }
                            if tx.send(segment.to_string()).is_err() {
                                // Nobody is listening anymore
                                let _ = child.start_kill();
                                break;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            tracing::warn!(error = %e, "Recognizer output read failed");
                            break;
                        }
                    }
                }
            }
            match child.wait().await {
                Ok(status) => tracing::debug!(%status, "Recognizer process ended"),
                Err(e) => tracing::warn!(error = %e, "Recognizer process could not be reaped"),
            }
        });

        tracing::info!(command = %self.command, "Voice capture process started");
        Ok(Capture { segments: rx, stop })
    }
}
