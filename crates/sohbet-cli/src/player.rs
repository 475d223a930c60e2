//! Audio playback through an external player process
//!
//! Playback shells out to whatever MPEG-capable player the host has; the
//! payload is piped through stdin so nothing touches the filesystem. With no
//! player on the PATH the backend reports itself unavailable and read-aloud
//! quietly does nothing.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use bytes::Bytes;
use sohbet_core::voice::AudioPlayer;
use sohbet_core::VoiceError;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Players tried in order; each reads MPEG audio from stdin
const KNOWN_PLAYERS: &[(&str, &[&str])] = &[
    ("mpv", &["--really-quiet", "--no-video", "-"]),
    ("mpg123", &["-q", "-"]),
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet", "-"]),
];

/// Plays audio by piping it into an external player process
pub struct ProcessPlayer {
    command: Option<(PathBuf, Vec<String>)>,
}

impl ProcessPlayer {
    /// Search the PATH for a known player
    pub fn detect() -> Self {
        for (name, args) in KNOWN_PLAYERS {
            if let Ok(program) = which::which(name) {
                tracing::info!(player = %program.display(), "Audio player detected");
                return Self {
                    command: Some((program, args.iter().map(|a| a.to_string()).collect())),
                };
            }
        }
        tracing::info!("No audio player found, read-aloud is disabled");
        Self { command: None }
    }

    /// Use an explicit player command line instead of searching the PATH
    pub fn from_command(command: &str) -> Self {
        let mut parts = command.split_whitespace();
        let Some(program) = parts.next() else {
            return Self { command: None };
        };
        Self {
            command: Some((PathBuf::from(program), parts.map(str::to_string).collect())),
        }
    }
}

#[async_trait]
impl AudioPlayer for ProcessPlayer {
    async fn play(&self, audio: Bytes) -> Result<(), VoiceError> {
        let Some((program, args)) = &self.command else {
            return Err(VoiceError::Unavailable);
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&audio).await?;
            stdin.shutdown().await?;
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(VoiceError::Backend(format!("player exited with {status}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_command_is_unavailable() {
        let player = ProcessPlayer::from_command("");
        let result = player.play(Bytes::from_static(b"ses")).await;
        assert!(matches!(result, Err(VoiceError::Unavailable)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_play_pipes_audio_to_command() {
        // cat drains stdin and exits cleanly
        let player = ProcessPlayer::from_command("cat");
        let result = player.play(Bytes::from_static(b"sahte-mpeg-verisi")).await;
        assert!(result.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_reports_backend_error() {
        // grep consumes stdin and exits 1 when nothing matches
        let player = ProcessPlayer::from_command("grep kesinlikle-olmayan-kalip");
        let result = player.play(Bytes::from_static(b"sahte-ses")).await;
        assert!(matches!(result, Err(VoiceError::Backend(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let player = ProcessPlayer::from_command("sohbet-olmayan-oynatici-9999");
        let result = player.play(Bytes::from_static(b"ses")).await;
        assert!(matches!(result, Err(VoiceError::Io(_))));
    }
}
