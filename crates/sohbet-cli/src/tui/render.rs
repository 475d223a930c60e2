//! Frame rendering
//!
//! One draw call lays out the transcript, the input box, the status line,
//! and any toasts on top.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use sohbet_core::Message;

use super::app::App;

const USER_LABEL: &str = "Siz";
const ASSISTANT_LABEL: &str = "Sohbet";

const SPINNER: [&str; 4] = ["⠋", "⠙", "⠸", "⠴"];

const KEY_HINTS: &str =
    "Enter gönder · Esc durdur · Ctrl+R yeniden · Ctrl+T ses · Ctrl+O oku · Ctrl+C çıkış";

pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_transcript(frame, chunks[0], app);
    draw_input(frame, chunks[1], app);
    draw_status(frame, chunks[2], app);
    app.toasts.render(frame, frame.area());
}

fn draw_transcript(frame: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Sohbet ")
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);

    let messages = app.session.store().messages();
    let lines = transcript_lines(&messages, inner.width as usize);

    let max_scroll = lines.len().saturating_sub(inner.height as usize);
    if app.auto_follow || app.scroll_offset > max_scroll {
        app.scroll_offset = max_scroll;
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((widget_scroll(app.scroll_offset), 0));
    frame.render_widget(paragraph, area);
}

/// `Paragraph::scroll` takes a u16 row offset; very long transcripts exceed it
fn widget_scroll(offset: usize) -> u16 {
    offset.min(u16::MAX as usize) as u16
}

/// Wrap every message into labeled, indented lines
fn transcript_lines(messages: &[Message], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for message in messages {
        let (label, label_style) = if message.is_user {
            (
                USER_LABEL,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )
        } else {
            (
                ASSISTANT_LABEL,
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
        };
        let body_style = if message.is_pending() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        let indent = label.len() + 2;
        let wrap_width = width.saturating_sub(indent).max(10);

        for (i, piece) in textwrap::wrap(&message.text, wrap_width).iter().enumerate() {
            if i == 0 {
                lines.push(Line::from(vec![
                    Span::styled(format!("{label}: "), label_style),
                    Span::styled(piece.to_string(), body_style),
                ]));
            } else {
                lines.push(Line::from(vec![
                    Span::raw(" ".repeat(indent)),
                    Span::styled(piece.to_string(), body_style),
                ]));
            }
        }
        lines.push(Line::default());
    }

    lines
}

fn draw_input(frame: &mut Frame, area: Rect, app: &App) {
    let (title, border) = if app.dictation.is_dictating() {
        (" Mesaj (kayıt açık) ", Style::default().fg(Color::Red))
    } else {
        (" Mesaj ", Style::default().fg(Color::DarkGray))
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border);
    let inner = block.inner(area);

    let (visible, cursor_col) = app.input.view(inner.width);
    frame.render_widget(Paragraph::new(visible).block(block), area);
    frame.set_cursor_position(Position::new(inner.x + cursor_col, inner.y));
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App) {
    frame.render_widget(
        Paragraph::new(KEY_HINTS).style(Style::default().fg(Color::DarkGray)),
        area,
    );

    let mut state: Vec<Span> = Vec::new();
    if app.session.is_loading() {
        state.push(Span::styled(
            format!("{} yanıt yazılıyor", spinner(app.tick)),
            Style::default().fg(Color::Yellow),
        ));
    }
    if app.dictation.is_dictating() {
        if !state.is_empty() {
            state.push(Span::raw("  "));
        }
        state.push(Span::styled("● dinleniyor", Style::default().fg(Color::Red)));
    }
    if app.speaker.is_speaking() {
        if !state.is_empty() {
            state.push(Span::raw("  "));
        }
        state.push(Span::styled(
            "♪ okunuyor",
            Style::default().fg(Color::Magenta),
        ));
    }

    if !state.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::from(state)).alignment(Alignment::Right),
            area,
        );
    }
}

fn spinner(tick: usize) -> &'static str {
    SPINNER[(tick / 4) % SPINNER.len()]
}
