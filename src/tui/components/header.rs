//! # Header Component
//!
//! Top status line of the main screen.
//!
//! ## Layout
//!
//! ```text
//!  telepanel │ alice │ ● Online │ +15551234 │ ^A Accounts ^R Refresh ^L Logout ^C Quit
//! ```
//!
//! Stateless: every field is a prop copied from `App` each frame. While a
//! full refresh runs the backend indicator is replaced by a spinner.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::core::state::BackendStatus;
use crate::tui::component::Component;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const KEY_HINTS: &str = "^A Accounts  ^R Refresh  ^L Logout  ^C Quit";

pub struct Header<'a> {
    pub username: Option<&'a str>,
    pub backend: &'a BackendStatus,
    pub refreshing: bool,
    pub account: Option<&'a str>,
    pub spinner_frame: usize,
}

impl Header<'_> {
    fn status_span(&self) -> Span<'static> {
        if self.refreshing {
            let frame = SPINNER[self.spinner_frame % SPINNER.len()];
            return Span::styled(format!("{frame} Refreshing"), Style::default().fg(Color::Yellow));
        }
        match self.backend {
            BackendStatus::Checking => {
                Span::styled("○ Connecting", Style::default().fg(Color::Yellow))
            }
            BackendStatus::Online => Span::styled("● Online", Style::default().fg(Color::Green)),
            BackendStatus::Offline => Span::styled("● Offline", Style::default().fg(Color::Red)),
            BackendStatus::Error(_) => Span::styled("● Error", Style::default().fg(Color::Red)),
        }
    }
}

impl Component for Header<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let separator = Span::styled(" │ ", Style::default().fg(Color::DarkGray));
        let mut spans = vec![Span::styled(
            " telepanel",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )];

        if let Some(name) = self.username {
            spans.push(separator.clone());
            spans.push(Span::raw(name.to_string()));
        }
        spans.push(separator.clone());
        spans.push(self.status_span());
        if let Some(phone) = self.account {
            spans.push(separator.clone());
            spans.push(Span::styled(phone.to_string(), Style::default().fg(Color::Cyan)));
        }
        spans.push(separator);
        spans.push(Span::styled(KEY_HINTS, Style::default().fg(Color::DarkGray)));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn rendered(header: &mut Header) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 1)).unwrap();
        terminal.draw(|f| header.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_header_shows_user_status_and_account() {
        let mut header = Header {
            username: Some("alice"),
            backend: &BackendStatus::Online,
            refreshing: false,
            account: Some("+15551234"),
            spinner_frame: 0,
        };
        let text = rendered(&mut header);
        assert!(text.contains("alice"));
        assert!(text.contains("Online"));
        assert!(text.contains("+15551234"));
    }

    #[test]
    fn test_refresh_replaces_backend_status() {
        let mut header = Header {
            username: None,
            backend: &BackendStatus::Offline,
            refreshing: true,
            account: None,
            spinner_frame: 1,
        };
        let text = rendered(&mut header);
        assert!(text.contains("/ Refreshing"));
        assert!(!text.contains("Offline"));
    }
}
