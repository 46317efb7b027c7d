//! # Telegram Login Dialog
//!
//! Two-step overlay linking a Telegram account: phone number first, then
//! the verification code Telegram sends to it.
//!
//! The step, busy flag and backend messages live in core
//! (`core::state::TelegramLogin`). This component owns only the text the
//! user types, so it is created when the dialog opens and dropped when it
//! closes.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};

use crate::core::state::{LoginStep, TelegramLogin};
use crate::tui::component::EventHandler;
use crate::tui::components::overlay::centered_fixed;
use crate::tui::components::text_field::TextField;
use crate::tui::event::TuiEvent;

#[derive(Debug, PartialEq)]
pub enum LoginDialogEvent {
    SubmitPhone(String),
    SubmitCode(String),
    Dismiss,
}

pub struct TelegramLoginForm {
    pub phone: TextField,
    pub code: TextField,
}

impl TelegramLoginForm {
    pub fn new(prefill: Option<&str>) -> Self {
        Self {
            phone: prefill.map(TextField::with_value).unwrap_or_default(),
            code: TextField::new(),
        }
    }

    pub fn handle_event(&mut self, event: &TuiEvent, step: LoginStep) -> Option<LoginDialogEvent> {
        match (event, step) {
            (TuiEvent::Escape, _) => Some(LoginDialogEvent::Dismiss),
            (TuiEvent::Submit, LoginStep::Phone) => {
                Some(LoginDialogEvent::SubmitPhone(self.phone.value().to_string()))
            }
            (TuiEvent::Submit, LoginStep::Code) => {
                Some(LoginDialogEvent::SubmitCode(self.code.value().to_string()))
            }
            (other, LoginStep::Phone) => {
                self.phone.handle_event(other);
                None
            }
            (other, LoginStep::Code) => {
                self.code.handle_event(other);
                None
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, dialog: &TelegramLogin) {
        let overlay = centered_fixed(56, 14, area);
        frame.render_widget(Clear, overlay);

        let help = match dialog.step {
            LoginStep::Phone => " Enter Send code  Esc Close ",
            LoginStep::Code => " Enter Verify  Esc Close ",
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Login to Telegram ")
            .title_bottom(Line::from(help).centered())
            .padding(Padding::horizontal(1));
        let inner = block.inner(overlay);
        frame.render_widget(block, overlay);

        let [intro_area, field_area, status_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .areas(inner);

        let intro = match (dialog.step, dialog.phone.as_deref()) {
            (LoginStep::Code, Some(phone)) => format!("Enter the code sent to {phone}."),
            (LoginStep::Code, None) => "Enter the verification code.".to_string(),
            (LoginStep::Phone, _) => {
                "Enter the phone number of the Telegram account, in international format."
                    .to_string()
            }
        };
        frame.render_widget(
            Paragraph::new(intro).wrap(Wrap { trim: true }),
            intro_area,
        );

        let focused = !dialog.busy && !dialog.completed;
        match dialog.step {
            LoginStep::Phone => self.phone.render(frame, field_area, "Phone number", focused),
            LoginStep::Code => self.code.render(frame, field_area, "Verification code", focused),
        }

        let status = if dialog.busy {
            Some(("Please wait...".to_string(), Color::Yellow))
        } else if let Some(error) = &dialog.error {
            Some((error.clone(), Color::Red))
        } else if dialog.completed {
            let text = dialog
                .message
                .clone()
                .unwrap_or_else(|| "Logged in successfully.".to_string());
            Some((text, Color::Green))
        } else {
            dialog.message.clone().map(|m| (m, Color::Gray))
        };
        if let Some((text, color)) = status {
            frame.render_widget(
                Paragraph::new(text)
                    .style(Style::default().fg(color))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true }),
                status_area,
            );
        }
    }
}
