//! # ChatArea Component
//!
//! Thread view of the selected chat.
//!
//! ## Layout
//!
//! ```text
//! ┌ Alice · 3 unread ───────────────────────┐
//! │                  May 1                  │
//! │ hey                                     │
//! │ are you there?                          │
//! │ 12:01                                   │
//! │                                   sure  │
//! │                              12:09 ✓✓   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Messages are grouped by calendar date, then into runs of consecutive
//! messages from the same sender less than five minutes apart. A run shows
//! its time (and delivery ticks for outgoing messages) once, under its last
//! message.
//!
//! `ChatAreaState` persists scroll state; `ChatArea` is rebuilt each frame.

use chrono::{Datelike, NaiveDate, TimeDelta, TimeZone};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::api::{Chat, Message};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Consecutive messages closer than this merge into one run.
pub const MERGE_WINDOW: TimeDelta = TimeDelta::minutes(5);

pub const ENDPOINT_MISSING_WARNING: &str =
    "⚠ The get_messages endpoint is missing on the backend. Showing placeholder messages.";

/// Messages of one calendar day, split into sender runs.
#[derive(Debug)]
pub struct DateGroup<'a> {
    pub date: NaiveDate,
    pub runs: Vec<Vec<&'a Message>>,
}

fn same_sender(a: &Message, b: &Message) -> bool {
    a.out == b.out && a.sender_id == b.sender_id
}

/// Group `messages` (in display order) by their date in `tz`, then into
/// runs of the same sender with gaps under `MERGE_WINDOW`.
pub fn group_messages<'a, Tz: TimeZone>(messages: &'a [Message], tz: &Tz) -> Vec<DateGroup<'a>> {
    let mut groups: Vec<DateGroup<'a>> = Vec::new();
    for message in messages {
        let date = message.date.with_timezone(tz).date_naive();
        if groups.last().is_none_or(|group| group.date != date) {
            groups.push(DateGroup {
                date,
                runs: Vec::new(),
            });
        }
        let Some(group) = groups.last_mut() else {
            continue;
        };

        let merges = group
            .runs
            .last()
            .and_then(|run| run.last())
            .is_some_and(|prev| {
                same_sender(prev, message) && message.date - prev.date < MERGE_WINDOW
            });
        match group.runs.last_mut() {
            Some(run) if merges => run.push(message),
            _ => group.runs.push(vec![message]),
        }
    }
    groups
}

/// "May 1" for dates in the current year, "May 1, 2023" otherwise.
pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    if date.year() == today.year() {
        date.format("%B %-d").to_string()
    } else {
        date.format("%B %-d, %Y").to_string()
    }
}

pub struct ChatAreaState {
    pub scroll_state: ScrollViewState,
    /// Follow new messages until the user scrolls up
    pub stick_to_bottom: bool,
    content_height: u16,
    viewport_height: u16,
}

impl Default for ChatAreaState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatAreaState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            stick_to_bottom: true,
            content_height: 0,
            viewport_height: 0,
        }
    }

    fn max_offset(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    /// Re-pin to the bottom once the user scrolled back down to it.
    fn repin_if_at_bottom(&mut self) {
        let max = self.max_offset();
        if self.scroll_state.offset().y >= max {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position { x: 0, y: max });
        }
    }
}

impl EventHandler for ChatAreaState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<()> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            _ => {}
        }
        None
    }
}

pub struct ChatArea<'a, Tz: TimeZone> {
    pub state: &'a mut ChatAreaState,
    pub chat: Option<&'a Chat>,
    pub messages: &'a [Message],
    pub loading: bool,
    pub endpoint_missing: bool,
    /// Zone used for date grouping and labels
    pub tz: Tz,
    pub today: NaiveDate,
}

impl<Tz: TimeZone> ChatArea<'_, Tz> {
    /// Thread content as pre-wrapped lines.
    fn thread_lines(&self, width: u16) -> Vec<Line<'static>> {
        let bubble_width = (usize::from(width) * 3 / 4).max(10);
        let mut lines = Vec::new();

        for group in group_messages(self.messages, &self.tz) {
            lines.push(Line::from(""));
            lines.push(
                Line::styled(
                    date_label(group.date, self.today),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::BOLD),
                )
                .centered(),
            );

            for run in &group.runs {
                lines.push(Line::from(""));
                let Some(last) = run.last() else { continue };
                let out = last.out;
                let style = if out {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default()
                };
                for message in run {
                    for piece in textwrap::wrap(&message.text, bubble_width) {
                        let line = Line::styled(piece.into_owned(), style);
                        lines.push(if out { line.right_aligned() } else { line });
                    }
                }

                let meta_style = Style::default().fg(Color::DarkGray);
                lines.push(if out {
                    Line::from(vec![
                        Span::styled(format!("{} ", last.time_label()), meta_style),
                        Span::styled(last.status.ticks(), Style::default().fg(Color::Cyan)),
                    ])
                    .right_aligned()
                } else {
                    Line::styled(last.time_label(), meta_style)
                });
            }
        }
        lines
    }

    fn render_thread(&mut self, frame: &mut Frame, area: Rect) {
        let placeholder = if self.loading && self.messages.is_empty() {
            Some("Loading messages...")
        } else if self.messages.is_empty() {
            Some("No messages yet")
        } else {
            None
        };
        if let Some(text) = placeholder {
            frame.render_widget(
                Paragraph::new(text)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::DarkGray)),
                area,
            );
            return;
        }

        let content_width = area.width.saturating_sub(1); // scrollbar
        let lines = self.thread_lines(content_width.saturating_sub(1));
        let height = lines.len() as u16;

        self.state.content_height = height;
        self.state.viewport_height = area.height;

        let mut scroll_view = ScrollView::new(Size::new(content_width, height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);
        scroll_view.render_widget(
            Paragraph::new(lines),
            Rect::new(0, 0, content_width, height),
        );

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        } else if self.state.scroll_state.offset().y > self.state.max_offset() {
            let max = self.state.max_offset();
            self.state.scroll_state.set_offset(Position { x: 0, y: max });
        }
        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

impl<Tz: TimeZone> Component for ChatArea<'_, Tz> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let Some(chat) = self.chat else {
            let block = Block::bordered()
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::DarkGray));
            let text = Paragraph::new("Select a chat to start messaging")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(text, area);
            return;
        };

        let mut title = vec![Span::styled(
            format!(" {} ", chat.name),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        if chat.unread_count > 0 {
            title.push(Span::styled(
                format!("· {} unread ", chat.unread_count),
                Style::default().fg(Color::Cyan),
            ));
        }
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Line::from(title));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let warning_height = if self.endpoint_missing { 2 } else { 0 };
        let [warning_area, thread_area] =
            Layout::vertical([Constraint::Length(warning_height), Constraint::Min(0)])
                .areas(inner);

        if self.endpoint_missing {
            frame.render_widget(
                Paragraph::new(ENDPOINT_MISSING_WARNING)
                    .style(Style::default().fg(Color::Yellow))
                    .wrap(ratatui::widgets::Wrap { trim: true }),
                warning_area,
            );
        }
        self.render_thread(frame, thread_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MessageStatus;
    use crate::test_support::{chat, message_at};
    use chrono::Utc;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn run_ids(group: &DateGroup) -> Vec<Vec<i64>> {
        group
            .runs
            .iter()
            .map(|run| run.iter().map(|m| m.id).collect())
            .collect()
    }

    #[test]
    fn test_date_label_adds_year_only_for_other_years() {
        let today = day(2024, 6, 15);
        assert_eq!(date_label(day(2024, 5, 1), today), "May 1");
        assert_eq!(date_label(day(2023, 12, 31), today), "December 31, 2023");
    }

    #[test]
    fn test_groups_split_by_calendar_date() {
        let messages = vec![
            message_at(1, "late", false, "2024-05-01T23:58:00Z"),
            message_at(2, "early", false, "2024-05-02T00:01:00Z"),
        ];
        let groups = group_messages(&messages, &Utc);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, day(2024, 5, 1));
        assert_eq!(groups[1].date, day(2024, 5, 2));
    }

    #[test]
    fn test_runs_merge_within_five_minutes() {
        let messages = vec![
            message_at(1, "a", false, "2024-05-01T12:00:00Z"),
            message_at(2, "b", false, "2024-05-01T12:04:59Z"),
            // Exactly five minutes after the previous message starts a new run
            message_at(3, "c", false, "2024-05-01T12:09:59Z"),
        ];
        let groups = group_messages(&messages, &Utc);
        assert_eq!(run_ids(&groups[0]), vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_runs_split_on_sender_change() {
        let messages = vec![
            message_at(1, "hi", false, "2024-05-01T12:00:00Z"),
            message_at(2, "hello", true, "2024-05-01T12:01:00Z"),
            message_at(3, "how are you", true, "2024-05-01T12:02:00Z"),
            message_at(4, "fine", false, "2024-05-01T12:03:00Z"),
        ];
        let groups = group_messages(&messages, &Utc);
        assert_eq!(run_ids(&groups[0]), vec![vec![1], vec![2, 3], vec![4]]);
    }

    #[test]
    fn test_scroll_up_unpins() {
        let mut state = ChatAreaState::new();
        state.handle_event(&TuiEvent::ScrollUp);
        assert!(!state.stick_to_bottom);
        // Content fits, so scrolling down lands at the bottom again
        state.handle_event(&TuiEvent::ScrollDown);
        assert!(state.stick_to_bottom);
    }

    fn rendered(area: &mut ChatArea<Utc>, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| area.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_render_thread_with_ticks_and_header() {
        let mut alice = chat(1, "Alice");
        alice.unread_count = 3;
        let mut sent = message_at(2, "on my way", true, "2024-05-01T12:01:00Z");
        sent.status = MessageStatus::Sent;
        let messages = vec![message_at(1, "where are you", false, "2024-05-01T12:00:00Z"), sent];
        let mut state = ChatAreaState::new();
        let mut area = ChatArea {
            state: &mut state,
            chat: Some(&alice),
            messages: &messages,
            loading: false,
            endpoint_missing: false,
            tz: Utc,
            today: day(2024, 6, 1),
        };
        let text = rendered(&mut area, 50, 16);
        assert!(text.contains("Alice"));
        assert!(text.contains("3 unread"));
        assert!(text.contains("May 1"));
        assert!(text.contains("where are you"));
        assert!(text.contains("on my way"));
        assert!(text.contains("✓"));
        assert!(!text.contains("✓✓"));
    }

    #[test]
    fn test_render_endpoint_missing_warning() {
        let alice = chat(1, "Alice");
        let messages = vec![message_at(1, "placeholder", false, "2024-05-01T12:00:00Z")];
        let mut state = ChatAreaState::new();
        let mut area = ChatArea {
            state: &mut state,
            chat: Some(&alice),
            messages: &messages,
            loading: false,
            endpoint_missing: true,
            tz: Utc,
            today: day(2024, 6, 1),
        };
        let text = rendered(&mut area, 100, 12);
        assert!(text.contains("get_messages endpoint is missing"));
    }

    #[test]
    fn test_render_without_chat() {
        let mut state = ChatAreaState::new();
        let mut area = ChatArea {
            state: &mut state,
            chat: None,
            messages: &[],
            loading: false,
            endpoint_missing: false,
            tz: Utc,
            today: day(2024, 6, 1),
        };
        assert!(rendered(&mut area, 50, 5).contains("Select a chat"));
    }
}
