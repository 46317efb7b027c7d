//! # Account Selector Component
//!
//! Overlay listing the linked Telegram accounts. Opened with Ctrl+A.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `AccountSelectorState` lives in `TuiState` while the overlay is open
//! - `AccountSelector` is created each frame with borrowed state

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph};

use crate::api::Account;
use crate::tui::components::overlay::{centered_rect, truncate_str};
use crate::tui::event::TuiEvent;

/// Persistent state for the account selector overlay.
#[derive(Default)]
pub struct AccountSelectorState {
    pub selected: usize,
    pub list_state: ListState,
}

impl AccountSelectorState {
    /// Open with the highlight on the current account.
    pub fn new(accounts: &[Account], current: Option<&str>) -> Self {
        let selected = current
            .and_then(|phone| accounts.iter().position(|a| a.phone == phone))
            .unwrap_or(0);
        let mut list_state = ListState::default();
        if !accounts.is_empty() {
            list_state.select(Some(selected));
        }
        Self {
            selected,
            list_state,
        }
    }

    /// Handle a key event, returning an `AccountSelectorEvent` if the overlay should act.
    pub fn handle_event(
        &mut self,
        event: &TuiEvent,
        accounts: &[Account],
    ) -> Option<AccountSelectorEvent> {
        match event {
            TuiEvent::Escape | TuiEvent::OpenAccountSelector => {
                Some(AccountSelectorEvent::Dismiss)
            }
            TuiEvent::CursorUp => {
                if !accounts.is_empty() {
                    self.selected = self.selected.saturating_sub(1);
                    self.list_state.select(Some(self.selected));
                }
                None
            }
            TuiEvent::CursorDown => {
                if !accounts.is_empty() {
                    self.selected = (self.selected + 1).min(accounts.len() - 1);
                    self.list_state.select(Some(self.selected));
                }
                None
            }
            TuiEvent::Submit => accounts
                .get(self.selected)
                .map(|account| AccountSelectorEvent::Select(account.clone())),
            TuiEvent::InputChar('a') => Some(AccountSelectorEvent::AddAccount),
            _ => None,
        }
    }
}

/// Events emitted by the account selector.
#[derive(Debug, PartialEq)]
pub enum AccountSelectorEvent {
    Select(Account),
    AddAccount,
    Dismiss,
}

/// Transient render wrapper for the account selector overlay.
pub struct AccountSelector<'a> {
    state: &'a mut AccountSelectorState,
    accounts: &'a [Account],
    current: Option<&'a str>,
    loading: bool,
}

impl<'a> AccountSelector<'a> {
    pub fn new(
        state: &'a mut AccountSelectorState,
        accounts: &'a [Account],
        current: Option<&'a str>,
        loading: bool,
    ) -> Self {
        Self {
            state,
            accounts,
            current,
            loading,
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(50, 50, area);
        frame.render_widget(Clear, overlay);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Telegram Accounts ")
            .title_alignment(Alignment::Left)
            .title_bottom(Line::from(" Enter Select  a Add account  Esc Back ").centered())
            .padding(Padding::horizontal(1));

        if self.accounts.is_empty() {
            let text = if self.loading {
                "Loading accounts..."
            } else {
                "No Telegram accounts linked.\nPress a to log in to Telegram."
            };
            let empty = Paragraph::new(text)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, overlay);
            return;
        }

        let inner_width = overlay.width.saturating_sub(4) as usize; // borders + padding
        let items: Vec<ListItem> = self
            .accounts
            .iter()
            .enumerate()
            .map(|(i, account)| {
                let is_current = self.current == Some(account.phone.as_str());
                let marker = if is_current { " *" } else { "" };
                let inactive = if account.is_active == Some(false) {
                    " (inactive)"
                } else {
                    ""
                };
                let phone_width = inner_width.saturating_sub(marker.len() + inactive.len());
                let style = if i == self.state.selected {
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else if is_current {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::Gray)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(truncate_str(&account.phone, phone_width), style),
                    Span::styled(inactive, Style::default().fg(Color::DarkGray)),
                    Span::styled(marker, style),
                ]))
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_stateful_widget(list, overlay, &mut self.state.list_state);
    }
}
