//! # TextField Component
//!
//! Single-line editable field used by the login forms, the Telegram login
//! dialog and the sidebar filter. Newlines are never inserted: pasted text
//! is flattened onto one line.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, BorderType, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::EventHandler;
use crate::tui::event::TuiEvent;

const MASK: char = '•';

/// Byte offset of the character boundary before `pos`.
pub(crate) fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte offset of the character boundary after `pos`.
pub(crate) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map(|c| pos + c.len_utf8())
        .unwrap_or(text.len())
}

#[derive(Debug, Default, Clone)]
pub struct TextField {
    value: String,
    /// Cursor as byte offset into `value`
    pos: usize,
    /// Render characters as bullets (passwords)
    pub masked: bool,
}

impl TextField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn masked() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            pos: value.len(),
            value,
            masked: false,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.pos = 0;
    }

    /// Text as it appears on screen.
    fn display(&self) -> String {
        if self.masked {
            MASK.to_string().repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    /// Display columns between the start of the field and the cursor.
    fn cursor_column(&self) -> u16 {
        let before = &self.value[..self.pos];
        if self.masked {
            before.chars().count() as u16
        } else {
            before.width() as u16
        }
    }

    /// Draw the field as a bordered box titled `label`. A focused field
    /// places the terminal cursor.
    pub fn render(&self, frame: &mut Frame, area: Rect, label: &str, focused: bool) {
        let border = if focused { Color::Cyan } else { Color::DarkGray };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border))
            .title(label.to_string());

        let inner_width = area.width.saturating_sub(2);
        let column = self.cursor_column();
        // Scroll horizontally so the cursor stays inside the box
        let scroll = (column + 1).saturating_sub(inner_width);

        let paragraph = Paragraph::new(self.display())
            .block(block)
            .scroll((0, scroll));
        frame.render_widget(paragraph, area);

        if focused && area.height >= 3 {
            frame.set_cursor_position((area.x + 1 + column - scroll, area.y + 1));
        }
    }
}

/// Emitted whenever the field's text changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edited;

impl EventHandler for TextField {
    type Event = Edited;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Edited> {
        match event {
            TuiEvent::InputChar('\n') => None,
            TuiEvent::InputChar(c) => {
                self.value.insert(self.pos, *c);
                self.pos += c.len_utf8();
                Some(Edited)
            }
            TuiEvent::Paste(text) => {
                let flat: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
                self.value.insert_str(self.pos, &flat);
                self.pos += flat.len();
                Some(Edited)
            }
            TuiEvent::Backspace if self.pos > 0 => {
                let prev = prev_char_boundary(&self.value, self.pos);
                self.value.drain(prev..self.pos);
                self.pos = prev;
                Some(Edited)
            }
            TuiEvent::Delete if self.pos < self.value.len() => {
                let next = next_char_boundary(&self.value, self.pos);
                self.value.drain(self.pos..next);
                Some(Edited)
            }
            TuiEvent::CursorLeft => {
                self.pos = prev_char_boundary(&self.value, self.pos);
                None
            }
            TuiEvent::CursorRight if self.pos < self.value.len() => {
                self.pos = next_char_boundary(&self.value, self.pos);
                None
            }
            TuiEvent::CursorHome => {
                self.pos = 0;
                None
            }
            TuiEvent::CursorEnd => {
                self.pos = self.value.len();
                None
            }
            _ => None,
        }
    }
}
