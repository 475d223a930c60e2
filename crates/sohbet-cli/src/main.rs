//! Sohbet - streaming chat in the terminal
//!
//! A Turkish-language chat client that:
//! - Streams assistant replies token by token into the transcript
//! - Keeps one conversation per device through a persisted session id
//! - Dictates into the input field and reads replies aloud through
//!   pluggable external commands

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use sohbet_core::voice::{AudioPlayer, RemoteSynthesizer, SpeechRecognizer};
use sohbet_core::{
    constants, paths, ChannelNotifier, ChatClient, ChatSession, ConversationStore, Dictation,
    Message, SessionIdentity, Speaker,
};

mod player;
mod recognizer;
mod tui;

/// Sohbet - streaming chat with voice in the terminal
#[derive(Parser)]
#[command(name = "sohbet")]
#[command(about = "Streaming chat terminal client", long_about = None)]
struct Cli {
    /// Chat service base URL (falls back to SOHBET_API_URL, then the default)
    #[arg(long)]
    api_url: Option<String>,

    /// Command printing one transcript line per utterance to stdout;
    /// dictation is disabled when unset (falls back to SOHBET_DICTATE_CMD)
    #[arg(long)]
    dictate_cmd: Option<String>,

    /// Audio player command reading MPEG audio from stdin; known players
    /// are tried in order when unset (falls back to SOHBET_PLAYER_CMD)
    #[arg(long)]
    player_cmd: Option<String>,
}

/// Restore terminal state - called on panic or unexpected exit
fn restore_terminal() {
    use crossterm::{
        event::DisableBracketedPaste,
        execute,
        terminal::{disable_raw_mode, LeaveAlternateScreen},
    };
    let _ = disable_raw_mode();
    let _ = execute!(std::io::stdout(), LeaveAlternateScreen, DisableBracketedPaste);
}

fn arg_or_env(arg: Option<String>, var: &str) -> Option<String> {
    arg.or_else(|| std::env::var(var).ok())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set up panic hook to restore terminal state
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    // Log to file, never to the terminal the TUI owns
    let log_dir = paths::logs_dir();
    std::fs::create_dir_all(&log_dir).ok();

    #[cfg(unix)]
    let null_device = "/dev/null";
    #[cfg(windows)]
    let null_device = "NUL";

    let log_file = std::fs::File::create(log_dir.join("sohbet.log"))
        .unwrap_or_else(|_| std::fs::File::create(null_device).unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let api_url = arg_or_env(cli.api_url, "SOHBET_API_URL")
        .unwrap_or_else(|| constants::http::DEFAULT_API_URL.to_string());
    tracing::info!(api_url = %api_url, "Starting Sohbet");

    let identity = SessionIdentity::load_or_create();
    let client = Arc::new(ChatClient::new(&api_url)?);

    // Seed the transcript from the service; an unscoped identity has no
    // server-side history to fetch
    let store = ConversationStore::new();
    if identity.is_scoped() {
        match client.fetch_history(identity.get()).await {
            Ok(history) => {
                store.seed(history.into_iter().map(Message::from).collect());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not load conversation history");
            }
        }
    }

    let (notifier, notices) = ChannelNotifier::new();
    let notifier = Arc::new(notifier);

    let session = Arc::new(ChatSession::new(
        client.clone(),
        store,
        identity.get(),
        notifier.clone(),
    ));

    let synthesizer = Arc::new(RemoteSynthesizer::new(client.clone()));
    let player: Arc<dyn AudioPlayer> =
        match arg_or_env(cli.player_cmd, "SOHBET_PLAYER_CMD") {
            Some(cmd) => Arc::new(player::ProcessPlayer::from_command(&cmd)),
            None => Arc::new(player::ProcessPlayer::detect()),
        };
    let speaker = Arc::new(Speaker::new(synthesizer, player));

    let recognizer: Option<Arc<dyn SpeechRecognizer>> =
        arg_or_env(cli.dictate_cmd, "SOHBET_DICTATE_CMD")
            .map(|cmd| Arc::new(recognizer::ProcessRecognizer::new(cmd)) as _);
    let dictation = Dictation::new(recognizer, notifier);

    let mut app = tui::App::new(session, speaker, dictation, notices);
    app.run().await
}
