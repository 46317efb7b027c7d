//! # Auth Form Component
//!
//! Operator login and registration screens. Tab moves between fields,
//! Enter on the last field submits, Ctrl+N switches between the two forms.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Paragraph, Wrap};

use crate::core::state::AuthForm;
use crate::tui::component::EventHandler;
use crate::tui::components::overlay::centered_fixed;
use crate::tui::components::text_field::TextField;
use crate::tui::event::TuiEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

#[derive(Debug, PartialEq)]
pub enum AuthEvent {
    Login {
        email: String,
        password: String,
    },
    Register {
        username: String,
        email: String,
        password: String,
        confirm: String,
    },
    ToggleMode,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Username,
    Email,
    Password,
    Confirm,
}

impl AuthMode {
    fn fields(self) -> &'static [Field] {
        match self {
            AuthMode::Login => &[Field::Email, Field::Password],
            AuthMode::Register => &[Field::Username, Field::Email, Field::Password, Field::Confirm],
        }
    }
}

pub struct AuthFormState {
    username: TextField,
    email: TextField,
    password: TextField,
    confirm: TextField,
    focus: usize,
}

impl Default for AuthFormState {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthFormState {
    pub fn new() -> Self {
        Self {
            username: TextField::new(),
            email: TextField::new(),
            password: TextField::masked(),
            confirm: TextField::masked(),
            focus: 0,
        }
    }

    /// Clear secrets and return focus to the first field.
    pub fn reset(&mut self) {
        self.password.clear();
        self.confirm.clear();
        self.focus = 0;
    }

    fn field(&self, field: Field) -> &TextField {
        match field {
            Field::Username => &self.username,
            Field::Email => &self.email,
            Field::Password => &self.password,
            Field::Confirm => &self.confirm,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut TextField {
        match field {
            Field::Username => &mut self.username,
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
            Field::Confirm => &mut self.confirm,
        }
    }

    fn submission(&self, mode: AuthMode) -> AuthEvent {
        match mode {
            AuthMode::Login => AuthEvent::Login {
                email: self.email.value().trim().to_string(),
                password: self.password.value().to_string(),
            },
            AuthMode::Register => AuthEvent::Register {
                username: self.username.value().trim().to_string(),
                email: self.email.value().trim().to_string(),
                password: self.password.value().to_string(),
                confirm: self.confirm.value().to_string(),
            },
        }
    }

    pub fn handle_event(&mut self, event: &TuiEvent, mode: AuthMode) -> Option<AuthEvent> {
        let fields = mode.fields();
        self.focus = self.focus.min(fields.len() - 1);
        match event {
            TuiEvent::ToggleAuthMode => Some(AuthEvent::ToggleMode),
            TuiEvent::NextField | TuiEvent::CursorDown => {
                self.focus = (self.focus + 1) % fields.len();
                None
            }
            TuiEvent::PrevField | TuiEvent::CursorUp => {
                self.focus = (self.focus + fields.len() - 1) % fields.len();
                None
            }
            TuiEvent::Submit if self.focus + 1 < fields.len() => {
                self.focus += 1;
                None
            }
            TuiEvent::Submit => Some(self.submission(mode)),
            other => {
                self.field_mut(fields[self.focus]).handle_event(other);
                None
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, mode: AuthMode, form: &AuthForm) {
        let fields = mode.fields();
        let height = 3 * fields.len() as u16 + 6;
        let panel = centered_fixed(50, height, area);

        let (title, hint) = match mode {
            AuthMode::Login => (" Login ", " Tab Next  Enter Sign in  ^N Register "),
            AuthMode::Register => (" Create account ", " Tab Next  Enter Register  ^N Login "),
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(Line::from(title).style(Style::default().add_modifier(Modifier::BOLD)))
            .title_bottom(Line::from(hint).centered());
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let mut constraints = vec![Constraint::Length(3); fields.len()];
        constraints.push(Constraint::Min(0));
        let areas = Layout::vertical(constraints).split(inner);

        for (i, field) in fields.iter().enumerate() {
            let label = match field {
                Field::Username => "Username",
                Field::Email => "Email",
                Field::Password => "Password",
                Field::Confirm => "Confirm password",
            };
            let focused = i == self.focus && !form.busy;
            self.field(*field).render(frame, areas[i], label, focused);
        }

        let status = if form.busy {
            Some(Line::styled("Please wait...", Style::default().fg(Color::Yellow)))
        } else {
            form.error
                .as_deref()
                .map(|e| Line::styled(e.to_string(), Style::default().fg(Color::Red)))
        };
        if let Some(line) = status {
            frame.render_widget(
                Paragraph::new(line)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true }),
                areas[fields.len()],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn type_str(state: &mut AuthFormState, mode: AuthMode, text: &str) {
        for c in text.chars() {
            state.handle_event(&TuiEvent::InputChar(c), mode);
        }
    }

    #[test]
    fn test_login_submits_on_last_field() {
        let mut state = AuthFormState::new();
        type_str(&mut state, AuthMode::Login, " me@example.com ");
        assert_eq!(state.handle_event(&TuiEvent::Submit, AuthMode::Login), None);
        type_str(&mut state, AuthMode::Login, "hunter2");
        assert_eq!(
            state.handle_event(&TuiEvent::Submit, AuthMode::Login),
            Some(AuthEvent::Login {
                email: "me@example.com".into(),
                password: "hunter2".into(),
            })
        );
    }

    #[test]
    fn test_register_cycles_through_four_fields() {
        let mut state = AuthFormState::new();
        let mode = AuthMode::Register;
        for value in ["bob", "bob@example.com", "pw1", "pw2"] {
            type_str(&mut state, mode, value);
            state.handle_event(&TuiEvent::NextField, mode);
        }
        // Wrapped back to the first field
        assert_eq!(state.focus, 0);
        state.handle_event(&TuiEvent::PrevField, mode);
        assert_eq!(
            state.handle_event(&TuiEvent::Submit, mode),
            Some(AuthEvent::Register {
                username: "bob".into(),
                email: "bob@example.com".into(),
                password: "pw1".into(),
                confirm: "pw2".into(),
            })
        );
    }

    #[test]
    fn test_toggle_mode_event() {
        let mut state = AuthFormState::new();
        assert_eq!(
            state.handle_event(&TuiEvent::ToggleAuthMode, AuthMode::Login),
            Some(AuthEvent::ToggleMode)
        );
    }

    #[test]
    fn test_render_shows_error_and_masks_password() {
        let mut state = AuthFormState::new();
        type_str(&mut state, AuthMode::Login, "a@b.c");
        state.handle_event(&TuiEvent::NextField, AuthMode::Login);
        type_str(&mut state, AuthMode::Login, "pw");
        let form = AuthForm {
            busy: false,
            error: Some("Invalid credentials".into()),
        };

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|f| state.render(f, f.area(), AuthMode::Login, &form))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Login"));
        assert!(text.contains("a@b.c"));
        assert!(text.contains("••"));
        assert!(text.contains("Invalid credentials"));
    }
}
