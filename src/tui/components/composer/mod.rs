//! # Composer Component
//!
//! Multi-line message input at the bottom of the chat area.
//!
//! ## Responsibilities
//!
//! - Capture text input (Shift+Enter or Ctrl+J inserts a newline)
//! - Handle editing (backspace, delete, cursor movement, paste)
//! - Emit `Submit` on Enter with the drained buffer
//! - Grow with its content up to five rows, then scroll internally
//!
//! The buffer is internal state. Whether a send is allowed right now is
//! decided by the caller, which checks before forwarding Enter.

mod rows;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};

use crate::tui::component::{Component, EventHandler};
use crate::tui::components::text_field::{next_char_boundary, prev_char_boundary};
use crate::tui::event::TuiEvent;

use rows::{MAX_VISIBLE_ROWS, VERTICAL_OVERHEAD, column_of, inner_width, layout, offset_at_column, row_of};

pub const COMPOSER_TITLE: &str = "Write a message...";

#[derive(Debug, Clone, PartialEq)]
pub enum ComposerEvent {
    Submit(String),
    ContentChanged,
}

pub struct Composer {
    pub buffer: String,
    /// Cursor as byte offset into `buffer`
    pos: usize,
    /// First visible row when the content exceeds the viewport
    scroll: u16,
    /// Width of the last render, used for vertical movement between frames
    last_width: u16,
    /// Dim the border while another part of the screen has focus (Prop)
    pub dimmed: bool,
    /// Shown bottom-right while a send is in flight (Prop)
    pub sending: bool,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    const DEFAULT_WIDTH: u16 = 80;

    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            pos: 0,
            scroll: 0,
            last_width: Self::DEFAULT_WIDTH,
            dimmed: false,
            sending: false,
        }
    }

    /// Height for the current content, clamped to
    /// `[1, MAX_VISIBLE_ROWS]` rows plus borders.
    pub fn calculate_height(&self, area_width: u16) -> u16 {
        let rows = layout(&self.buffer, inner_width(area_width)).len() as u16;
        rows.clamp(1, MAX_VISIBLE_ROWS) + VERTICAL_OVERHEAD
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.pos = 0;
        self.scroll = 0;
    }

    /// Move the cursor one row up (`-1`) or down (`1`), keeping its column.
    fn move_vertically(&mut self, direction: i16) -> bool {
        let rows = layout(&self.buffer, inner_width(self.last_width));
        let current = row_of(&rows, self.pos);
        let target = match direction {
            d if d < 0 && current > 0 => current - 1,
            d if d > 0 && current + 1 < rows.len() => current + 1,
            _ => return false,
        };
        let column = column_of(&self.buffer, &rows[current], self.pos);
        self.pos = offset_at_column(&self.buffer, &rows[target], column);
        true
    }

    fn keep_cursor_visible(&mut self, cursor_row: u16, total_rows: u16) {
        if total_rows <= MAX_VISIBLE_ROWS {
            self.scroll = 0;
        } else if cursor_row < self.scroll {
            self.scroll = cursor_row;
        } else if cursor_row >= self.scroll + MAX_VISIBLE_ROWS {
            self.scroll = cursor_row + 1 - MAX_VISIBLE_ROWS;
        }
    }
}

impl Component for Composer {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.last_width = area.width;
        let width = inner_width(area.width);
        let rows = layout(&self.buffer, width);
        let cursor_row = row_of(&rows, self.pos);
        self.keep_cursor_visible(cursor_row as u16, rows.len() as u16);

        let lines: Vec<Line> = rows
            .iter()
            .skip(self.scroll as usize)
            .take(MAX_VISIBLE_ROWS as usize)
            .map(|row| Line::raw(&self.buffer[row.clone()]))
            .collect();

        let border = if self.dimmed { Color::DarkGray } else { Color::Cyan };
        let mut block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border))
            .title(COMPOSER_TITLE);
        if self.sending {
            block = block.title_bottom(Line::from(" Sending... ").right_aligned());
        }
        frame.render_widget(Paragraph::new(lines).block(block), area);

        if rows.len() as u16 > MAX_VISIBLE_ROWS {
            let mut state = ScrollbarState::default()
                .content_length(rows.len() - MAX_VISIBLE_ROWS as usize)
                .position(self.scroll as usize);
            let bar = Rect {
                x: area.x + area.width.saturating_sub(1),
                y: area.y + 1,
                width: 1,
                height: area.height.saturating_sub(2),
            };
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                bar,
                &mut state,
            );
        }

        if !self.dimmed {
            let column = column_of(&self.buffer, &rows[cursor_row], self.pos).min(width);
            let visible_row = (cursor_row as u16).saturating_sub(self.scroll);
            frame.set_cursor_position((area.x + 1 + column, area.y + 1 + visible_row));
        }
    }
}

impl EventHandler for Composer {
    type Event = ComposerEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<ComposerEvent> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.insert(self.pos, *c);
                self.pos += c.len_utf8();
                Some(ComposerEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                let text = text.replace("\r\n", "\n");
                self.buffer.insert_str(self.pos, &text);
                self.pos += text.len();
                Some(ComposerEvent::ContentChanged)
            }
            TuiEvent::Backspace if self.pos > 0 => {
                let prev = prev_char_boundary(&self.buffer, self.pos);
                self.buffer.drain(prev..self.pos);
                self.pos = prev;
                Some(ComposerEvent::ContentChanged)
            }
            TuiEvent::Delete if self.pos < self.buffer.len() => {
                let next = next_char_boundary(&self.buffer, self.pos);
                self.buffer.drain(self.pos..next);
                Some(ComposerEvent::ContentChanged)
            }
            TuiEvent::CursorLeft if self.pos > 0 => {
                self.pos = prev_char_boundary(&self.buffer, self.pos);
                Some(ComposerEvent::ContentChanged)
            }
            TuiEvent::CursorRight if self.pos < self.buffer.len() => {
                self.pos = next_char_boundary(&self.buffer, self.pos);
                Some(ComposerEvent::ContentChanged)
            }
            TuiEvent::CursorHome => {
                let start = self.buffer[..self.pos].rfind('\n').map_or(0, |i| i + 1);
                (start != self.pos).then(|| {
                    self.pos = start;
                    ComposerEvent::ContentChanged
                })
            }
            TuiEvent::CursorEnd => {
                let end = self.buffer[self.pos..]
                    .find('\n')
                    .map_or(self.buffer.len(), |i| self.pos + i);
                (end != self.pos).then(|| {
                    self.pos = end;
                    ComposerEvent::ContentChanged
                })
            }
            TuiEvent::CursorUp => self
                .move_vertically(-1)
                .then_some(ComposerEvent::ContentChanged),
            TuiEvent::CursorDown => self
                .move_vertically(1)
                .then_some(ComposerEvent::ContentChanged),
            TuiEvent::Submit if !self.buffer.trim().is_empty() => {
                let text = std::mem::take(&mut self.buffer);
                self.clear();
                Some(ComposerEvent::Submit(text))
            }
            _ => None,
        }
    }
}
