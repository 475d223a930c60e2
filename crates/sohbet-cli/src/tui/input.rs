//! Single-line input with cursor and horizontal scrolling
//!
//! The cursor is a byte offset that always sits on a character boundary;
//! width math uses display columns so wide characters scroll correctly.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

#[derive(Default)]
pub struct InputBox {
    text: String,
    /// Byte offset of the cursor within `text`
    cursor: usize,
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Take the current text, leaving the box empty
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// Replace the whole text, cursor at the end
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.len();
    }

    pub fn insert(&mut self, ch: char) {
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.text.remove(prev);
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(ch) = self.text[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.len();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
    }

    /// Visible slice and cursor column for a viewport `width` columns wide
    ///
    /// The window scrolls so the cursor always stays inside it.
    pub fn view(&self, width: u16) -> (String, u16) {
        let width = width as usize;
        if width == 0 {
            return (String::new(), 0);
        }

        let cursor_col = self.text[..self.cursor].width();
        let offset = cursor_col.saturating_sub(width - 1);

        let mut visible = String::new();
        let mut col = 0;
        for ch in self.text.chars() {
            let w = ch.width().unwrap_or(0);
            if col + w <= offset {
                col += w;
                continue;
            }
            if col + w > offset + width {
                break;
            }
            visible.push(ch);
            col += w;
        }

        (visible, (cursor_col - offset) as u16)
    }
}
