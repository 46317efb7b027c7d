//! Full-screen notices shown instead of the chat UI while the backend is
//! being probed or cannot be reached.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph, Wrap};

use crate::core::state::BackendStatus;
use crate::tui::component::Component;
use crate::tui::components::overlay::centered_fixed;

pub const CONNECTING_TEXT: &str = "Connecting to Telegram backend...";
pub const UNAVAILABLE_TITLE: &str = "Backend Not Available";
pub const OFFLINE_TEXT: &str =
    "Unable to connect to the Telegram backend server. Please make sure the server is running.";

pub struct StatusView<'a> {
    pub backend: &'a BackendStatus,
    pub base_url: &'a str,
    pub spinner_frame: usize,
}

impl Component for StatusView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let dim = Style::default().fg(Color::DarkGray);
        let (border, lines) = match self.backend {
            BackendStatus::Checking | BackendStatus::Online => {
                let dots = ".".repeat(self.spinner_frame % 4);
                (
                    Color::Cyan,
                    vec![
                        Line::from(""),
                        Line::from(format!("{CONNECTING_TEXT}{dots}")),
                        Line::styled(self.base_url.to_string(), dim),
                    ],
                )
            }
            BackendStatus::Offline | BackendStatus::Error(_) => {
                let detail = match self.backend {
                    BackendStatus::Error(message) => message.as_str(),
                    _ => OFFLINE_TEXT,
                };
                (
                    Color::Red,
                    vec![
                        Line::styled(
                            UNAVAILABLE_TITLE,
                            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                        ),
                        Line::from(""),
                        Line::from(detail.to_string()),
                        Line::styled(self.base_url.to_string(), dim),
                        Line::from(""),
                        Line::from(vec![
                            Span::styled("r", Style::default().fg(Color::Cyan)),
                            Span::raw(" Retry    "),
                            Span::styled("l", Style::default().fg(Color::Cyan)),
                            Span::raw(" Logout"),
                        ]),
                    ],
                )
            }
        };

        let panel = centered_fixed(64, lines.len() as u16 + 4, area);
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border));
        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block),
            panel,
        );
    }
}
