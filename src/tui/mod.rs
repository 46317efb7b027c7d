//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! translates keyboard events into core `Action`s and executes the
//! `Effect`s the reducer returns.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! The event loop uses conditional redraw to avoid unnecessary work:
//!
//! - **Animating** (connecting, refreshing, requests in flight): draws every
//!   ~80ms so spinners move.
//! - **Idle**: sleeps up to 500ms, only redraws on input, background results
//!   or terminal resize.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call, making blinking cursors appear erratic during continuous redraws.

mod component;
mod components;
mod effects;
mod event;
mod ui;

use log::{debug, info};
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::api::Backend;
use crate::core::action::{Action, update};
use crate::core::config::ResolvedConfig;
use crate::core::state::{App, Screen};
use crate::core::store::SharedStore;
use crate::tui::component::EventHandler;
use crate::tui::components::{
    AccountSelectorEvent, AccountSelectorState, AuthEvent, AuthFormState, AuthMode,
    ChatAreaState, Composer, ComposerEvent, LoginDialogEvent, SidebarEvent, SidebarState,
    TelegramLoginForm,
};
use crate::tui::effects::EffectRunner;
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Which pane receives keys on the main screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Composer,
}

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    // Persistent component states
    pub composer: Composer,
    pub sidebar: SidebarState,
    pub chat_area: ChatAreaState,
    pub auth_form: AuthFormState,
    // Overlays (None = hidden), mirrored from App by `sync`
    pub account_selector: Option<AccountSelectorState>,
    pub telegram_form: Option<TelegramLoginForm>,
    pub focus: Focus,
    pub base_url: String,
    // What the last sync saw, to detect changes
    last_screen: Screen,
    last_account: Option<String>,
    last_chat: Option<i64>,
    last_login_prefill: Option<String>,
}

impl TuiState {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            composer: Composer::new(),
            sidebar: SidebarState::new(),
            chat_area: ChatAreaState::new(),
            auth_form: AuthFormState::new(),
            account_selector: None,
            telegram_form: None,
            focus: Focus::Sidebar,
            base_url: base_url.into(),
            last_screen: Screen::Starting,
            last_account: None,
            last_chat: None,
            last_login_prefill: None,
        }
    }

    /// Bring presentation state in line with `app` after an update.
    pub fn sync(&mut self, app: &App) {
        if app.screen != self.last_screen {
            self.last_screen = app.screen;
            self.auth_form.reset();
        }

        match (app.account_selector_open, self.account_selector.is_some()) {
            (true, false) => {
                self.account_selector =
                    Some(AccountSelectorState::new(&app.accounts, app.selected_phone()));
            }
            (false, true) => self.account_selector = None,
            _ => {}
        }

        match &app.telegram_login {
            Some(dialog) => {
                if self.telegram_form.is_none() || dialog.prefill != self.last_login_prefill {
                    self.telegram_form = Some(TelegramLoginForm::new(dialog.prefill.as_deref()));
                }
                self.last_login_prefill = dialog.prefill.clone();
            }
            None => {
                self.telegram_form = None;
                self.last_login_prefill = None;
            }
        }

        let account = app.selected_phone().map(str::to_string);
        if account != self.last_account {
            self.last_account = account;
            self.sidebar.reset();
            self.composer.clear();
        }

        let chat = app.selected_chat_id();
        if chat != self.last_chat {
            self.last_chat = chat;
            self.chat_area = ChatAreaState::new();
            self.focus = if chat.is_some() {
                Focus::Composer
            } else {
                Focus::Sidebar
            };
        }
    }

    /// Whether anything on screen is animating.
    fn animating(&self, app: &App) -> bool {
        app.screen == Screen::Starting
            || app.auth_form.busy
            || ui::shows_status_view(app) && !app.backend.is_unavailable()
            || app.loading.refreshing
            || app.loading.accounts
            || app.loading.chats
            || app.loading.messages
            || app.loading.sending
            || app.telegram_login.as_ref().is_some_and(|d| d.busy)
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol lets Shift+Enter reach us; terminals
        // without it ignore the request
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!(
            "Terminal modes enabled (mouse, bracketed paste, steady block cursor, keyboard enhancement)"
        );
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Translate one input event into at most one `Action`, updating
/// presentation state along the way.
pub fn route_event(
    app: &App,
    tui: &mut TuiState,
    event: TuiEvent,
    now: DateTime<Utc>,
) -> Option<Action> {
    if event == TuiEvent::ForceQuit {
        return Some(Action::Quit);
    }
    match app.screen {
        Screen::Starting => None,
        Screen::Login | Screen::Register => {
            let mode = if app.screen == Screen::Login {
                AuthMode::Login
            } else {
                AuthMode::Register
            };
            match tui.auth_form.handle_event(&event, mode)? {
                AuthEvent::ToggleMode => Some(match mode {
                    AuthMode::Login => Action::ShowRegister,
                    AuthMode::Register => Action::ShowLogin,
                }),
                AuthEvent::Login { email, password } => {
                    Some(Action::SubmitLogin { email, password })
                }
                AuthEvent::Register {
                    username,
                    email,
                    password,
                    confirm,
                } => Some(Action::SubmitRegister {
                    username,
                    email,
                    password,
                    confirm,
                }),
            }
        }
        Screen::Main => route_main(app, tui, event, now),
    }
}

fn route_main(
    app: &App,
    tui: &mut TuiState,
    event: TuiEvent,
    now: DateTime<Utc>,
) -> Option<Action> {
    // Overlays take every key while open
    if let (Some(dialog), Some(form)) = (&app.telegram_login, tui.telegram_form.as_mut()) {
        if dialog.completed && event != TuiEvent::Escape {
            return None;
        }
        return match form.handle_event(&event, dialog.step)? {
            LoginDialogEvent::SubmitPhone(phone) => Some(Action::SubmitTelegramPhone(phone)),
            LoginDialogEvent::SubmitCode(code) => Some(Action::SubmitTelegramCode(code)),
            LoginDialogEvent::Dismiss => Some(Action::CloseTelegramLogin),
        };
    }
    if let Some(selector) = tui.account_selector.as_mut() {
        return match selector.handle_event(&event, &app.accounts)? {
            AccountSelectorEvent::Select(account) => Some(Action::SelectAccount(account)),
            AccountSelectorEvent::AddAccount => Some(Action::OpenTelegramLogin),
            AccountSelectorEvent::Dismiss => Some(Action::CloseAccountSelector),
        };
    }

    match event {
        TuiEvent::Refresh => return Some(Action::Refresh),
        TuiEvent::Logout => return Some(Action::Logout),
        TuiEvent::DismissError => return Some(Action::DismissError),
        TuiEvent::OpenAccountSelector => return Some(Action::OpenAccountSelector),
        _ => {}
    }

    if ui::shows_status_view(app) {
        return match event {
            TuiEvent::InputChar('r') if app.backend.is_unavailable() => Some(Action::CheckBackend),
            TuiEvent::InputChar('l') => Some(Action::Logout),
            _ => None,
        };
    }

    match event {
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown => {
            tui.chat_area.handle_event(&event);
            return None;
        }
        TuiEvent::NextField | TuiEvent::PrevField => {
            tui.focus = match tui.focus {
                Focus::Sidebar if app.selected_chat.is_some() => Focus::Composer,
                _ => Focus::Sidebar,
            };
            return None;
        }
        _ => {}
    }

    match tui.focus {
        Focus::Sidebar => {
            if app.selected_account.is_none() && event == TuiEvent::Submit {
                return Some(Action::OpenTelegramLogin);
            }
            match tui.sidebar.handle_event(&event, &app.chats)? {
                SidebarEvent::Select(chat) => Some(Action::SelectChat(Some(chat))),
                SidebarEvent::Deselect => Some(Action::SelectChat(None)),
            }
        }
        Focus::Composer => {
            if event == TuiEvent::Escape {
                tui.focus = Focus::Sidebar;
                return None;
            }
            if event == TuiEvent::Submit && !app.can_send(&tui.composer.buffer) {
                debug!("Send not possible right now, keeping draft");
                return None;
            }
            match tui.composer.handle_event(&event)? {
                ComposerEvent::Submit(text) => Some(Action::SendMessage { text, at: now }),
                ComposerEvent::ContentChanged => None,
            }
        }
    }
}

/// Apply `action` and run its effects. Returns `true` on quit.
fn dispatch(app: &mut App, runner: &mut EffectRunner, action: Action) -> bool {
    debug!("Dispatching: {:?}", action);
    let mut quit = false;
    for effect in update(app, action) {
        quit |= runner.run(effect);
    }
    quit
}

pub fn run(
    config: ResolvedConfig,
    store: SharedStore,
    backend: Arc<dyn Backend>,
) -> std::io::Result<()> {
    let mut app = App::new();
    let mut tui = TuiState::new(config.base_url.clone());

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();
    let mut runner = EffectRunner::new(backend, store, tx);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let mut should_quit = dispatch(&mut app, &mut runner, Action::Start);

    // Animation timer
    let start_time = Instant::now();
    let mut needs_redraw = true; // Force first frame

    while !should_quit {
        tui.sync(&app);
        let animating = tui.animating(&app);
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        // Short poll while animating (~12fps), long when idle
        let timeout = if animating {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Drain every pending event before the next draw
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if event == TuiEvent::Resize {
                continue;
            }
            if let Some(action) = route_event(&app, &mut tui, event, Utc::now()) {
                should_quit |= dispatch(&mut app, &mut runner, action);
                tui.sync(&app);
            }
            if should_quit {
                break;
            }
        }

        // Results from background tasks
        while !should_quit && let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            should_quit |= dispatch(&mut app, &mut runner, action);
        }
    }

    info!("Shutting down");
    runner.shutdown();
    ratatui::restore();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{BackendStatus, LoginStep, TelegramLogin};
    use crate::test_support::{account, chat, online_app, test_app};

    fn now() -> DateTime<Utc> {
        "2024-05-01T12:00:00Z".parse().unwrap()
    }

    fn main_app() -> App {
        let mut app = online_app();
        app.accounts = vec![account("+1"), account("+2")];
        app.selected_account = Some(account("+1"));
        app.chats = vec![chat(1, "Alice"), chat(2, "Bob")];
        app
    }

    fn route(app: &App, tui: &mut TuiState, event: TuiEvent) -> Option<Action> {
        route_event(app, tui, event, now())
    }

    fn type_str(app: &App, tui: &mut TuiState, text: &str) {
        for c in text.chars() {
            assert_eq!(route(app, tui, TuiEvent::InputChar(c)), None);
        }
    }

    #[test]
    fn test_force_quit_from_any_screen() {
        let app = test_app();
        let mut tui = TuiState::new("");
        assert_eq!(route(&app, &mut tui, TuiEvent::ForceQuit), Some(Action::Quit));
    }

    #[test]
    fn test_login_form_submits() {
        let mut app = test_app();
        app.screen = Screen::Login;
        let mut tui = TuiState::new("");
        type_str(&app, &mut tui, "a@b.c");
        assert_eq!(route(&app, &mut tui, TuiEvent::Submit), None);
        type_str(&app, &mut tui, "pw");
        assert_eq!(
            route(&app, &mut tui, TuiEvent::Submit),
            Some(Action::SubmitLogin {
                email: "a@b.c".into(),
                password: "pw".into(),
            })
        );
        assert_eq!(
            route(&app, &mut tui, TuiEvent::ToggleAuthMode),
            Some(Action::ShowRegister)
        );
    }

    #[test]
    fn test_global_shortcuts_on_main() {
        let app = main_app();
        let mut tui = TuiState::new("");
        assert_eq!(route(&app, &mut tui, TuiEvent::Refresh), Some(Action::Refresh));
        assert_eq!(route(&app, &mut tui, TuiEvent::Logout), Some(Action::Logout));
        assert_eq!(
            route(&app, &mut tui, TuiEvent::DismissError),
            Some(Action::DismissError)
        );
        assert_eq!(
            route(&app, &mut tui, TuiEvent::OpenAccountSelector),
            Some(Action::OpenAccountSelector)
        );
    }

    #[test]
    fn test_sidebar_selects_filtered_chat() {
        let app = main_app();
        let mut tui = TuiState::new("");
        tui.sync(&app);
        type_str(&app, &mut tui, "bo");
        assert_eq!(
            route(&app, &mut tui, TuiEvent::Submit),
            Some(Action::SelectChat(Some(chat(2, "Bob"))))
        );
    }

    #[test]
    fn test_no_account_enter_opens_telegram_login() {
        let mut app = online_app();
        app.selected_account = None;
        let mut tui = TuiState::new("");
        assert_eq!(
            route(&app, &mut tui, TuiEvent::Submit),
            Some(Action::OpenTelegramLogin)
        );
    }

    #[test]
    fn test_composer_sends_only_when_allowed() {
        let mut app = main_app();
        app.selected_chat = Some(chat(1, "Alice"));
        let mut tui = TuiState::new("");
        tui.sync(&app);
        assert_eq!(tui.focus, Focus::Composer);

        type_str(&app, &mut tui, "hi");
        app.loading.sending = true;
        assert_eq!(route(&app, &mut tui, TuiEvent::Submit), None);
        assert_eq!(tui.composer.buffer, "hi", "draft kept while a send is in flight");

        app.loading.sending = false;
        assert_eq!(
            route(&app, &mut tui, TuiEvent::Submit),
            Some(Action::SendMessage {
                text: "hi".into(),
                at: now(),
            })
        );
        assert!(tui.composer.buffer.is_empty());
    }

    #[test]
    fn test_tab_toggles_focus_only_with_chat() {
        let mut app = main_app();
        let mut tui = TuiState::new("");
        route(&app, &mut tui, TuiEvent::NextField);
        assert_eq!(tui.focus, Focus::Sidebar);

        app.selected_chat = Some(chat(1, "Alice"));
        tui.sync(&app);
        route(&app, &mut tui, TuiEvent::NextField);
        assert_eq!(tui.focus, Focus::Sidebar);
        route(&app, &mut tui, TuiEvent::NextField);
        assert_eq!(tui.focus, Focus::Composer);
        route(&app, &mut tui, TuiEvent::Escape);
        assert_eq!(tui.focus, Focus::Sidebar);
    }

    #[test]
    fn test_account_selector_routes() {
        let mut app = main_app();
        app.account_selector_open = true;
        let mut tui = TuiState::new("");
        tui.sync(&app);
        route(&app, &mut tui, TuiEvent::CursorDown);
        assert_eq!(
            route(&app, &mut tui, TuiEvent::Submit),
            Some(Action::SelectAccount(account("+2")))
        );
        assert_eq!(
            route(&app, &mut tui, TuiEvent::InputChar('a')),
            Some(Action::OpenTelegramLogin)
        );
        assert_eq!(
            route(&app, &mut tui, TuiEvent::Escape),
            Some(Action::CloseAccountSelector)
        );
        // Global shortcuts do not leak through the overlay
        assert_eq!(route(&app, &mut tui, TuiEvent::Refresh), None);
    }

    #[test]
    fn test_telegram_dialog_routes() {
        let mut app = main_app();
        app.telegram_login = Some(TelegramLogin::new(Some("+3".into())));
        let mut tui = TuiState::new("");
        tui.sync(&app);
        assert_eq!(
            route(&app, &mut tui, TuiEvent::Submit),
            Some(Action::SubmitTelegramPhone("+3".into()))
        );

        if let Some(dialog) = app.telegram_login.as_mut() {
            dialog.step = LoginStep::Code;
        }
        type_str(&app, &mut tui, "123");
        assert_eq!(
            route(&app, &mut tui, TuiEvent::Submit),
            Some(Action::SubmitTelegramCode("123".into()))
        );
        assert_eq!(
            route(&app, &mut tui, TuiEvent::Escape),
            Some(Action::CloseTelegramLogin)
        );

        app.telegram_login = None;
        tui.sync(&app);
        assert!(tui.telegram_form.is_none());
    }

    #[test]
    fn test_unavailable_screen_keys() {
        let mut app = main_app();
        app.backend = BackendStatus::Offline;
        let mut tui = TuiState::new("");
        assert_eq!(
            route(&app, &mut tui, TuiEvent::InputChar('r')),
            Some(Action::CheckBackend)
        );
        assert_eq!(
            route(&app, &mut tui, TuiEvent::InputChar('l')),
            Some(Action::Logout)
        );
        assert_eq!(route(&app, &mut tui, TuiEvent::InputChar('x')), None);
    }

    #[test]
    fn test_sync_resets_on_account_and_chat_change() {
        let mut app = main_app();
        let mut tui = TuiState::new("");
        tui.sync(&app);
        type_str(&app, &mut tui, "ali");
        app.selected_account = Some(account("+2"));
        tui.sync(&app);
        assert_eq!(tui.sidebar.filter.value(), "");

        app.selected_chat = Some(chat(1, "Alice"));
        tui.sync(&app);
        tui.chat_area.stick_to_bottom = false;
        app.selected_chat = Some(chat(2, "Bob"));
        tui.sync(&app);
        assert!(tui.chat_area.stick_to_bottom);
    }

    #[test]
    fn test_sync_reseeds_login_form_when_prefill_changes() {
        let mut app = main_app();
        app.telegram_login = Some(TelegramLogin::new(None));
        let mut tui = TuiState::new("");
        tui.sync(&app);
        type_str(&app, &mut tui, "+9");
        tui.sync(&app);
        assert_eq!(tui.telegram_form.as_ref().unwrap().phone.value(), "+9");

        app.telegram_login = Some(TelegramLogin::new(Some("+1".into())));
        tui.sync(&app);
        assert_eq!(tui.telegram_form.as_ref().unwrap().phone.value(), "+1");
    }
}
