//! TUI application state and event loop
//!
//! The loop redraws at a fixed cadence while anything is animating (a reply
//! streaming in, capture or playback running) and otherwise only when an
//! event changed something. Chat operations run on spawned tasks; the loop
//! observes their effects through the store, the loading flag, and notices.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, Event, EventStream, KeyCode, KeyEvent,
    KeyEventKind, KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use sohbet_core::{ChatSession, Dictation, Message, Notice, Speaker};
use tokio::sync::{mpsc, watch};

use super::input::InputBox;
use super::render;
use super::toast::ToastQueue;

pub struct App {
    pub(crate) session: Arc<ChatSession>,
    pub(crate) speaker: Arc<Speaker>,
    pub(crate) dictation: Dictation,
    notices: mpsc::UnboundedReceiver<Notice>,
    transcript: watch::Receiver<String>,
    pub(crate) input: InputBox,
    pub(crate) toasts: ToastQueue,
    pub(crate) scroll_offset: usize,
    pub(crate) auto_follow: bool,
    pub(crate) tick: usize,
    needs_redraw: bool,
    should_quit: bool,
}

impl App {
    pub fn new(
        session: Arc<ChatSession>,
        speaker: Arc<Speaker>,
        dictation: Dictation,
        notices: mpsc::UnboundedReceiver<Notice>,
    ) -> Self {
        let transcript = dictation.transcript();
        Self {
            session,
            speaker,
            dictation,
            notices,
            transcript,
            input: InputBox::new(),
            toasts: ToastQueue::new(),
            scroll_offset: 0,
            auto_follow: true,
            tick: 0,
            needs_redraw: true,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableBracketedPaste)?;
        terminal.show_cursor()?;
        result
    }

    async fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let mut events = EventStream::new();

        loop {
            while let Ok(notice) = self.notices.try_recv() {
                self.toasts.push(notice);
                self.needs_redraw = true;
            }

            // Dictation rewrites the whole input on every engine segment
            if self.transcript.has_changed().unwrap_or(false) {
                let text = self.transcript.borrow_and_update().clone();
                if self.dictation.is_dictating() {
                    self.input.set_text(text);
                    self.needs_redraw = true;
                }
            }

            if self.toasts.tick() {
                self.needs_redraw = true;
            }

            // Streaming and voice activity change state between input events
            if self.session.is_loading()
                || self.dictation.is_dictating()
                || self.speaker.is_speaking()
            {
                self.tick = self.tick.wrapping_add(1);
                self.needs_redraw = true;
            }

            if self.needs_redraw {
                terminal.draw(|frame| render::draw(frame, self))?;
                self.needs_redraw = false;
            }

            tokio::select! {
                biased;

                maybe_event = events.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        match event {
                            Event::Key(key) => {
                                if key.kind == KeyEventKind::Press {
                                    self.handle_key(key);
                                    self.needs_redraw = true;
                                }
                            }
                            Event::Paste(text) => {
                                for ch in text.chars() {
                                    self.input.insert(ch);
                                }
                                self.needs_redraw = true;
                            }
                            Event::Resize(_, _) => {
                                self.needs_redraw = true;
                            }
                            _ => {}
                        }
                    }
                }
                _ = tokio::time::sleep(Duration::from_millis(16)) => {}
            }

            if self.should_quit {
                break;
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('r') => self.regenerate(),
                KeyCode::Char('t') => self.dictation.toggle(self.input.text()),
                KeyCode::Char('o') => self.speak_last_reply(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Esc => self.session.stop(),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            KeyCode::Up => {
                self.auto_follow = false;
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            KeyCode::Down => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
            }
            KeyCode::PageUp => {
                self.auto_follow = false;
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
            }
            KeyCode::PageDown => {
                self.auto_follow = true;
            }
            KeyCode::Char(ch) => self.input.insert(ch),
            _ => {}
        }
    }

    fn submit(&mut self) {
        // Keep the typed text instead of losing it to a rejected send
        if self.session.is_loading() {
            return;
        }
        if self.dictation.is_dictating() {
            // Freeze the transcript before it can rewrite a cleared input
            self.dictation.toggle("");
        }

        let text = self.input.take();
        if text.trim().is_empty() {
            return;
        }

        self.auto_follow = true;
        let session = self.session.clone();
        tokio::spawn(async move { session.send(&text).await });
    }

    fn regenerate(&mut self) {
        if self.session.is_loading() {
            return;
        }
        self.auto_follow = true;
        let session = self.session.clone();
        tokio::spawn(async move { session.regenerate().await });
    }

    fn speak_last_reply(&self) {
        let messages = self.session.store().messages();
        let Some(text) = last_assistant_text(&messages) else {
            return;
        };
        let speaker = self.speaker.clone();
        tokio::spawn(async move { speaker.speak(&text).await });
    }
}

/// Most recent completed assistant reply, if any
fn last_assistant_text(messages: &[Message]) -> Option<String> {
    messages
        .iter()
        .rev()
        .find(|m| !m.is_user && !m.is_pending() && !m.text.is_empty())
        .map(|m| m.text.clone())
}
