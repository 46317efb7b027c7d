//! # Sidebar Component
//!
//! Chat list of the selected account with a search filter on top and the
//! account footer at the bottom.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `SidebarState` lives in `TuiState` (filter text, highlighted row)
//! - `Sidebar` is created each frame with borrowed state and `App` props

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::api::Chat;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::overlay::truncate_str;
use crate::tui::components::text_field::TextField;
use crate::tui::event::TuiEvent;

pub const NO_ACCOUNT_FOOTER: &str = "Login to Telegram";

/// Chats whose name contains `query`, ignoring case. An empty query keeps
/// the list unchanged.
pub fn filter_chats<'a>(chats: &'a [Chat], query: &str) -> Vec<&'a Chat> {
    if query.is_empty() {
        return chats.iter().collect();
    }
    let needle = query.to_lowercase();
    chats
        .iter()
        .filter(|chat| chat.name.to_lowercase().contains(&needle))
        .collect()
}

pub enum SidebarEvent {
    Select(Chat),
    Deselect,
}

#[derive(Default)]
pub struct SidebarState {
    pub filter: TextField,
    pub list_state: ListState,
}

impl SidebarState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget filter and highlight (account switch, logout).
    pub fn reset(&mut self) {
        self.filter.clear();
        self.list_state = ListState::default();
    }

    /// Handle a key while the sidebar has focus. `chats` is the full,
    /// unfiltered chat list.
    pub fn handle_event(&mut self, event: &TuiEvent, chats: &[Chat]) -> Option<SidebarEvent> {
        let visible = filter_chats(chats, self.filter.value());
        match event {
            TuiEvent::Escape => Some(SidebarEvent::Deselect),
            TuiEvent::CursorUp => {
                let current = self.list_state.selected().unwrap_or(0);
                self.list_state.select(Some(current.saturating_sub(1)));
                None
            }
            TuiEvent::CursorDown => {
                if !visible.is_empty() {
                    let next = self
                        .list_state
                        .selected()
                        .map_or(0, |i| (i + 1).min(visible.len() - 1));
                    self.list_state.select(Some(next));
                }
                None
            }
            TuiEvent::Submit => self
                .list_state
                .selected()
                .and_then(|i| visible.get(i))
                .map(|chat| SidebarEvent::Select((*chat).clone())),
            other => {
                if self.filter.handle_event(other).is_some() {
                    // The filtered list changed: restart from the top
                    self.list_state.select(Some(0));
                }
                None
            }
        }
    }
}

pub struct Sidebar<'a> {
    state: &'a mut SidebarState,
    chats: &'a [Chat],
    selected_chat: Option<i64>,
    account: Option<&'a str>,
    loading: bool,
    focused: bool,
}

impl<'a> Sidebar<'a> {
    pub fn new(
        state: &'a mut SidebarState,
        chats: &'a [Chat],
        selected_chat: Option<i64>,
        account: Option<&'a str>,
        loading: bool,
        focused: bool,
    ) -> Self {
        Self {
            state,
            chats,
            selected_chat,
            account,
            loading,
            focused,
        }
    }

    fn chat_item(&self, chat: &Chat, width: usize) -> ListItem<'static> {
        let is_selected = self.selected_chat == Some(chat.id);
        let dot = if chat.online == Some(true) {
            Span::styled("● ", Style::default().fg(Color::Green))
        } else {
            Span::raw("  ")
        };
        let badge = if chat.unread_count > 0 {
            format!(" {} ", chat.unread_count)
        } else {
            String::new()
        };
        let name_width = width.saturating_sub(2 + badge.len() + 1);
        let name_style = if is_selected {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let mut first = vec![
            dot,
            Span::styled(
                format!("{:<name_width$}", truncate_str(&chat.name, name_width)),
                name_style,
            ),
        ];
        if !badge.is_empty() {
            first.push(Span::raw(" "));
            first.push(Span::styled(
                badge,
                Style::default().fg(Color::Black).bg(Color::Cyan),
            ));
        }

        let preview = chat.last_message.as_deref().unwrap_or("");
        let second = Line::from(Span::styled(
            format!("  {}", truncate_str(preview, width.saturating_sub(2))),
            Style::default().fg(Color::DarkGray),
        ));
        ListItem::new(vec![Line::from(first), second])
    }
}

impl Component for Sidebar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let border = if self.focused { Color::Cyan } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::RIGHT)
            .border_style(Style::default().fg(border));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [filter_area, list_area, footer_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(inner);

        self.state
            .filter
            .render(frame, filter_area, "Search", self.focused);

        let visible = filter_chats(self.chats, self.state.filter.value());
        let placeholder = if self.account.is_none() {
            Some("No Telegram account selected")
        } else if self.loading && self.chats.is_empty() {
            Some("Loading chats...")
        } else if self.chats.is_empty() {
            Some("No chats")
        } else if visible.is_empty() {
            Some("No chats match")
        } else {
            None
        };

        if let Some(text) = placeholder {
            frame.render_widget(
                Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
                list_area,
            );
        } else {
            if self.state.list_state.selected().is_none_or(|i| i >= visible.len()) {
                let fallback = visible
                    .iter()
                    .position(|c| Some(c.id) == self.selected_chat)
                    .unwrap_or(0);
                self.state.list_state.select(Some(fallback));
            }
            let width = list_area.width as usize;
            let items: Vec<ListItem> = visible
                .iter()
                .map(|chat| self.chat_item(chat, width))
                .collect();
            let highlight = if self.focused {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            let list = List::new(items).highlight_style(highlight);
            frame.render_stateful_widget(list, list_area, &mut self.state.list_state);
        }

        let footer = match self.account {
            Some(phone) => Line::from(vec![
                Span::styled("Account: ", Style::default().fg(Color::DarkGray)),
                Span::styled(phone.to_string(), Style::default().fg(Color::Cyan)),
            ]),
            None => Line::styled(NO_ACCOUNT_FOOTER, Style::default().fg(Color::Yellow)),
        };
        frame.render_widget(Paragraph::new(footer), footer_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::chat;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn chats() -> Vec<Chat> {
        vec![chat(1, "Alice"), chat(2, "Bob"), chat(3, "alina")]
    }

    fn rendered(sidebar: &mut Sidebar) -> String {
        let mut terminal = Terminal::new(TestBackend::new(30, 14)).unwrap();
        terminal.draw(|f| sidebar.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let chats = chats();
        let names: Vec<&str> = filter_chats(&chats, "ALI")
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Alice", "alina"]);
    }

    #[test]
    fn test_empty_filter_keeps_list() {
        let chats = chats();
        assert_eq!(filter_chats(&chats, "").len(), 3);
        assert!(filter_chats(&chats, "zzz").is_empty());
    }

    #[test]
    fn test_enter_selects_highlighted_filtered_chat() {
        let chats = chats();
        let mut state = SidebarState::new();
        for c in "ob".chars() {
            state.handle_event(&TuiEvent::InputChar(c), &chats);
        }
        match state.handle_event(&TuiEvent::Submit, &chats) {
            Some(SidebarEvent::Select(chat)) => assert_eq!(chat.name, "Bob"),
            _ => panic!("Expected Select"),
        }
    }

    #[test]
    fn test_arrows_move_highlight_within_bounds() {
        let chats = chats();
        let mut state = SidebarState::new();
        for _ in 0..5 {
            state.handle_event(&TuiEvent::CursorDown, &chats);
        }
        assert_eq!(state.list_state.selected(), Some(2));
        state.handle_event(&TuiEvent::CursorUp, &chats);
        assert_eq!(state.list_state.selected(), Some(1));
    }

    #[test]
    fn test_escape_deselects() {
        let mut state = SidebarState::new();
        assert!(matches!(
            state.handle_event(&TuiEvent::Escape, &chats()),
            Some(SidebarEvent::Deselect)
        ));
    }

    #[test]
    fn test_render_lists_chats_with_badge_and_footer() {
        let mut chats = chats();
        chats[1].unread_count = 4;
        chats[1].online = Some(true);
        let mut state = SidebarState::new();
        let mut sidebar = Sidebar::new(&mut state, &chats, Some(1), Some("+1555"), false, true);
        let text = rendered(&mut sidebar);
        assert!(text.contains("Alice"));
        assert!(text.contains(" 4 "));
        assert!(text.contains("●"));
        assert!(text.contains("Account: +1555"));
    }

    #[test]
    fn test_render_without_account() {
        let mut state = SidebarState::new();
        let mut sidebar = Sidebar::new(&mut state, &[], None, None, false, false);
        let text = rendered(&mut sidebar);
        assert!(text.contains(NO_ACCOUNT_FOOTER));
        assert!(text.contains("No Telegram account selected"));
    }
}
