//! # Application State
//!
//! Core business state for telepanel. Domain data only: no TUI types.
//! Presentation state (text buffers, list cursors, scroll) lives in `tui`.
//!
//! ```text
//! App
//! ├── screen: Screen                    // startup / login / register / main
//! ├── user: Option<User>                // operator account
//! ├── backend: BackendStatus            // checking | online | offline | error
//! ├── accounts / selected_account       // linked Telegram phones
//! ├── chats / selected_chat             // chat list of the selected account
//! ├── messages                          // thread of the selected chat
//! ├── loading: Loading                  // per-operation flags, no global busy
//! ├── endpoint_missing: bool            // placeholder mode for get_messages
//! ├── error: Option<String>             // dismissible banner
//! ├── relogin_phone: Option<String>     // account to re-authenticate
//! ├── telegram_login: Option<..>        // phone/code dialog
//! ├── refresh: Option<RefreshStage>     // full refresh cascade position
//! └── chats_generation / messages_generation
//! ```
//!
//! State changes only happen through `update(app, action)` in action.rs.

use crate::api::{Account, Chat, Message, User};

pub const SESSION_INVALID_MESSAGE: &str =
    "Your Telegram session is no longer valid. Please log in again.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";
pub const FAILED_TO_SEND_SUFFIX: &str = " (failed to send)";

#[derive(Debug, Clone, PartialEq)]
pub enum BackendStatus {
    Checking,
    Online,
    Offline,
    Error(String),
}

impl BackendStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, BackendStatus::Online)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, BackendStatus::Offline | BackendStatus::Error(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Validating a persisted token.
    Starting,
    Login,
    Register,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Loading {
    pub accounts: bool,
    pub chats: bool,
    pub messages: bool,
    pub sending: bool,
    pub refreshing: bool,
}

/// Position of the full interface refresh. Each stage waits for the
/// previous one to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStage {
    Health,
    Token,
    Accounts,
    Chats,
    Messages,
}

/// Status of the operator login/register form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthForm {
    pub busy: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    Phone,
    Code,
}

/// The Telegram phone/code dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct TelegramLogin {
    pub step: LoginStep,
    /// Phone the form opens with (relogin target).
    pub prefill: Option<String>,
    /// Phone a code was requested for.
    pub phone: Option<String>,
    pub busy: bool,
    pub error: Option<String>,
    pub message: Option<String>,
    /// Login finished; the dialog closes shortly.
    pub completed: bool,
}

impl TelegramLogin {
    pub fn new(prefill: Option<String>) -> Self {
        Self {
            step: LoginStep::Phone,
            prefill,
            phone: None,
            busy: false,
            error: None,
            message: None,
            completed: false,
        }
    }
}

pub struct App {
    pub screen: Screen,
    pub user: Option<User>,
    pub auth_form: AuthForm,
    pub backend: BackendStatus,
    pub accounts: Vec<Account>,
    pub selected_account: Option<Account>,
    pub chats: Vec<Chat>,
    pub selected_chat: Option<Chat>,
    pub messages: Vec<Message>,
    pub loading: Loading,
    pub endpoint_missing: bool,
    pub error: Option<String>,
    pub relogin_phone: Option<String>,
    pub telegram_login: Option<TelegramLogin>,
    pub account_selector_open: bool,
    pub refresh: Option<RefreshStage>,
    /// Latest chat fetch; older results are discarded.
    pub chats_generation: u64,
    /// Latest message fetch; older results are discarded.
    pub messages_generation: u64,
    /// Phone the 30 s chat poll is currently armed for.
    pub poll_armed_for: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            screen: Screen::Starting,
            user: None,
            auth_form: AuthForm::default(),
            backend: BackendStatus::Checking,
            accounts: Vec::new(),
            selected_account: None,
            chats: Vec::new(),
            selected_chat: None,
            messages: Vec::new(),
            loading: Loading::default(),
            endpoint_missing: false,
            error: None,
            relogin_phone: None,
            telegram_login: None,
            account_selector_open: false,
            refresh: None,
            chats_generation: 0,
            messages_generation: 0,
            poll_armed_for: None,
        }
    }

    pub fn selected_phone(&self) -> Option<&str> {
        self.selected_account.as_ref().map(|a| a.phone.as_str())
    }

    pub fn selected_chat_id(&self) -> Option<i64> {
        self.selected_chat.as_ref().map(|c| c.id)
    }

    /// Whether a send with this text would be accepted right now.
    pub fn can_send(&self, text: &str) -> bool {
        !text.trim().is_empty()
            && self.selected_account.is_some()
            && self.selected_chat.is_some()
            && !self.loading.sending
    }

    /// Drop everything tied to the operator session.
    pub fn reset_session_data(&mut self) {
        let screen = self.screen;
        let chats_generation = self.chats_generation + 1;
        let messages_generation = self.messages_generation + 1;
        *self = Self::new();
        self.screen = screen;
        self.chats_generation = chats_generation;
        self.messages_generation = messages_generation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{account, chat, test_app};

    #[test]
    fn test_app_new_defaults() {
        let app = test_app();
        assert_eq!(app.screen, Screen::Starting);
        assert_eq!(app.backend, BackendStatus::Checking);
        assert_eq!(app.loading, Loading::default());
        assert!(app.selected_account.is_none());
    }

    #[test]
    fn test_can_send_requires_text_selection_and_idle() {
        let mut app = test_app();
        assert!(!app.can_send("hi"));
        app.selected_account = Some(account("+1"));
        app.selected_chat = Some(chat(1, "Alice"));
        assert!(app.can_send("hi"));
        assert!(!app.can_send("   \n"));
        app.loading.sending = true;
        assert!(!app.can_send("hi"));
    }

    #[test]
    fn test_reset_keeps_generations_monotonic() {
        let mut app = test_app();
        app.chats_generation = 4;
        app.messages_generation = 9;
        app.screen = Screen::Main;
        app.accounts.push(account("+1"));
        app.reset_session_data();
        assert!(app.accounts.is_empty());
        assert_eq!(app.screen, Screen::Main);
        assert_eq!(app.chats_generation, 5);
        assert_eq!(app.messages_generation, 10);
    }
}
