//! Transient notices in the top-right corner
//!
//! Notices from the chat and voice layers land here. Duplicates of a still
//! visible message are dropped so a burst of identical stream errors shows
//! up once.

use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use sohbet_core::{Notice, NoticeKind};

/// Maximum number of visible toasts
const MAX_VISIBLE: usize = 3;

/// How long a toast stays on screen
const DURATION: Duration = Duration::from_secs(5);

const TOAST_WIDTH: u16 = 44;
const TOAST_HEIGHT: u16 = 3;

struct Toast {
    notice: Notice,
    created_at: Instant,
}

impl Toast {
    fn new(notice: Notice) -> Self {
        Self {
            notice,
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= DURATION
    }

    fn color(&self) -> Color {
        match self.notice.kind {
            NoticeKind::Error => Color::Red,
            NoticeKind::Info => Color::Cyan,
        }
    }

    fn icon(&self) -> &'static str {
        match self.notice.kind {
            NoticeKind::Error => "✗",
            NoticeKind::Info => "ℹ",
        }
    }
}

/// Queue of visible toasts
#[derive(Default)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a notice; a duplicate of a visible message is dropped
    pub fn push(&mut self, notice: Notice) {
        if self.toasts.iter().any(|t| t.notice.text == notice.text) {
            return;
        }
        while self.toasts.len() >= MAX_VISIBLE {
            self.toasts.remove(0);
        }
        self.toasts.push(Toast::new(notice));
    }

    /// Drop expired toasts; true when any were removed
    pub fn tick(&mut self) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| !t.is_expired());
        self.toasts.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Draw the queue in the top-right corner, newest on top
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if self.is_empty() {
            return;
        }

        let width = TOAST_WIDTH.min(area.width);
        let x = area.right().saturating_sub(width + 1);

        for (i, toast) in self.toasts.iter().rev().take(MAX_VISIBLE).enumerate() {
            let y = area.y + 1 + i as u16 * (TOAST_HEIGHT + 1);
            if y + TOAST_HEIGHT > area.bottom() {
                break;
            }

            let slot = Rect::new(x, y, width, TOAST_HEIGHT);
            let style = Style::default().fg(toast.color());
            let line = Line::from(format!("{} {}", toast.icon(), toast.notice.text));

            frame.render_widget(Clear, slot);
            frame.render_widget(
                Paragraph::new(line)
                    .block(Block::default().borders(Borders::ALL).border_style(style)),
                slot,
            );
        }
    }
}
