//! # Actions
//!
//! Everything that can happen in telepanel becomes an `Action`.
//! User picks a chat? That's `Action::SelectChat(Some(chat))`.
//! Backend answers? That's `Action::ChatsLoaded { .. }`.
//!
//! `update()` takes the current state and an action, mutates the state and
//! returns the `Effect`s the runtime must perform. No I/O here: network
//! calls, storage writes and timers are all effects, and their results come
//! back as actions.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effects
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::api::{Account, ApiError, Chat, LoginReply, Message, MessageStatus, User};
use crate::core::scheduler::TaskKey;
use crate::core::state::{
    App, BackendStatus, FAILED_TO_SEND_SUFFIX, LoginStep, RefreshStage, SESSION_EXPIRED_MESSAGE,
    SESSION_INVALID_MESSAGE, Screen, TelegramLogin,
};

pub const CHAT_POLL_PERIOD: Duration = Duration::from_secs(30);
pub const RECONCILE_MESSAGES_DELAY: Duration = Duration::from_secs(1);
pub const RECONCILE_CHATS_DELAY: Duration = Duration::from_secs(2);
pub const SESSION_EXPIRED_DELAY: Duration = Duration::from_secs(3);
pub const LOGIN_DIALOG_CLOSE_DELAY: Duration = Duration::from_millis(1500);

/// Shown in place of the thread when `get_messages` is not deployed.
pub const MISSING_ENDPOINT_PLACEHOLDERS: [&str; 2] = [
    "This is a placeholder message. The get_messages endpoint is missing.",
    "To implement message fetching, add the get_messages endpoint to your backend.",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Process start: validate any persisted token.
    Start,
    AuthChecked(Option<User>),
    ShowLogin,
    ShowRegister,
    SubmitLogin {
        email: String,
        password: String,
    },
    SubmitRegister {
        username: String,
        email: String,
        password: String,
        confirm: String,
    },
    /// Login or register finished; `Err` carries the form message.
    AuthFinished(Result<User, String>),
    Logout,
    /// Delayed logout after a session-expired notice.
    SessionExpired,

    /// Probe backend health (startup, retry).
    CheckBackend,
    HealthChecked(Result<bool, String>),
    /// Full interface refresh.
    Refresh,
    TokenChecked(bool),

    AccountsLoaded {
        result: Result<Vec<Account>, ApiError>,
        saved_phone: Option<String>,
    },
    SelectAccount(Account),
    OpenAccountSelector,
    CloseAccountSelector,

    ChatsLoaded {
        phone: String,
        generation: u64,
        result: Result<Vec<Chat>, ApiError>,
    },
    SelectChat(Option<Chat>),
    MessagesLoaded {
        phone: String,
        chat_id: i64,
        generation: u64,
        result: Result<Vec<Message>, ApiError>,
        at: DateTime<Utc>,
    },

    SendMessage {
        text: String,
        at: DateTime<Utc>,
    },
    MessageSent {
        phone: String,
        chat_id: i64,
        temp_id: i64,
        result: Result<(), ApiError>,
    },

    PollTick {
        phone: String,
    },
    ReconcileMessages {
        phone: String,
        chat_id: i64,
    },
    ReconcileChats {
        phone: String,
    },

    OpenTelegramLogin,
    CloseTelegramLogin,
    SubmitTelegramPhone(String),
    TelegramLoginStarted(Result<LoginReply, ApiError>),
    SubmitTelegramCode(String),
    TelegramLoginCompleted(Result<LoginReply, ApiError>),
    TelegramLoginSucceeded,

    DismissError,
    Quit,
}

/// Work the runtime performs on behalf of the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AuthInit,
    Login {
        email: String,
        password: String,
    },
    Register {
        username: String,
        email: String,
        password: String,
    },
    Logout,
    ProbeHealth,
    /// Report whether an auth token is persisted.
    VerifyToken,
    FetchAccounts,
    FetchChats {
        phone: String,
        generation: u64,
    },
    FetchMessages {
        phone: String,
        chat_id: i64,
        generation: u64,
    },
    SendMessage {
        phone: String,
        chat_id: i64,
        recipient: String,
        text: String,
        temp_id: i64,
    },
    StartTelegramLogin {
        phone: String,
    },
    CompleteTelegramLogin {
        phone: String,
        code: String,
    },
    PersistSelectedAccount(Option<String>),
    Schedule {
        key: TaskKey,
        delay: Duration,
        action: Box<Action>,
    },
    ScheduleEvery {
        key: TaskKey,
        period: Duration,
        action: Box<Action>,
    },
    Cancel(TaskKey),
    CancelAll,
    Quit,
}

/// Apply `action` to `app` and return the effects to run.
pub fn update(app: &mut App, action: Action) -> Vec<Effect> {
    let mut effects = apply(app, action);
    if let Some(effect) = sync_poll(app) {
        effects.push(effect);
    }
    effects
}

fn apply(app: &mut App, action: Action) -> Vec<Effect> {
    match action {
        Action::Start => vec![Effect::AuthInit],
        Action::AuthChecked(Some(user)) => enter_main(app, user),
        Action::AuthChecked(None) => {
            app.screen = Screen::Login;
            vec![]
        }
        Action::ShowLogin => {
            app.screen = Screen::Login;
            app.auth_form = Default::default();
            vec![]
        }
        Action::ShowRegister => {
            app.screen = Screen::Register;
            app.auth_form = Default::default();
            vec![]
        }
        Action::SubmitLogin { email, password } => {
            if app.auth_form.busy {
                return vec![];
            }
            app.auth_form.busy = true;
            app.auth_form.error = None;
            vec![Effect::Login { email, password }]
        }
        Action::SubmitRegister {
            username,
            email,
            password,
            confirm,
        } => {
            if app.auth_form.busy {
                return vec![];
            }
            if password != confirm {
                app.auth_form.error = Some("Passwords do not match".to_string());
                return vec![];
            }
            app.auth_form.busy = true;
            app.auth_form.error = None;
            vec![Effect::Register {
                username,
                email,
                password,
            }]
        }
        Action::AuthFinished(Ok(user)) => {
            app.auth_form = Default::default();
            enter_main(app, user)
        }
        Action::AuthFinished(Err(message)) => {
            app.auth_form.busy = false;
            app.auth_form.error = Some(message);
            vec![]
        }
        Action::Logout | Action::SessionExpired => logout(app),

        Action::CheckBackend => check_backend(app),
        Action::HealthChecked(result) => health_checked(app, result),
        Action::Refresh => start_refresh(app),
        Action::TokenChecked(present) => token_checked(app, present),

        Action::AccountsLoaded {
            result,
            saved_phone,
        } => accounts_loaded(app, result, saved_phone),
        Action::SelectAccount(account) => {
            app.account_selector_open = false;
            select_account(app, Some(account))
        }
        Action::OpenAccountSelector => {
            app.account_selector_open = app.screen == Screen::Main;
            vec![]
        }
        Action::CloseAccountSelector => {
            app.account_selector_open = false;
            vec![]
        }

        Action::ChatsLoaded {
            phone,
            generation,
            result,
        } => chats_loaded(app, phone, generation, result),
        Action::SelectChat(chat) => select_chat(app, chat),
        Action::MessagesLoaded {
            phone,
            chat_id,
            generation,
            result,
            at,
        } => messages_loaded(app, phone, chat_id, generation, result, at),

        Action::SendMessage { text, at } => send_message(app, text, at),
        Action::MessageSent {
            phone,
            chat_id,
            temp_id,
            result,
        } => message_sent(app, phone, chat_id, temp_id, result),

        Action::PollTick { phone } | Action::ReconcileChats { phone } => {
            if app.refresh.is_some() || app.selected_phone() != Some(phone.as_str()) {
                debug!("Skipping silent chat refresh for {}", phone);
                return vec![];
            }
            fetch_chats(app, true)
        }
        Action::ReconcileMessages { phone, chat_id } => {
            if app.refresh.is_some()
                || app.selected_phone() != Some(phone.as_str())
                || app.selected_chat_id() != Some(chat_id)
            {
                debug!("Skipping message reconcile for chat {}", chat_id);
                return vec![];
            }
            fetch_messages(app)
        }

        Action::OpenTelegramLogin => {
            app.account_selector_open = false;
            if app.telegram_login.is_none() {
                app.telegram_login = Some(TelegramLogin::new(app.relogin_phone.clone()));
            }
            vec![]
        }
        Action::CloseTelegramLogin => {
            app.telegram_login = None;
            app.relogin_phone = None;
            vec![]
        }
        Action::SubmitTelegramPhone(phone) => submit_telegram_phone(app, phone),
        Action::TelegramLoginStarted(result) => telegram_login_started(app, result),
        Action::SubmitTelegramCode(code) => submit_telegram_code(app, code),
        Action::TelegramLoginCompleted(result) => telegram_login_completed(app, result),
        Action::TelegramLoginSucceeded => {
            info!("Telegram login succeeded, refreshing interface");
            app.relogin_phone = None;
            app.telegram_login = None;
            start_refresh(app)
        }

        Action::DismissError => {
            app.error = None;
            vec![]
        }
        Action::Quit => vec![Effect::CancelAll, Effect::Quit],
    }
}

// ============================================================================
// Session
// ============================================================================

fn enter_main(app: &mut App, user: User) -> Vec<Effect> {
    info!("Signed in as {}", user.username);
    app.user = Some(user);
    app.screen = Screen::Main;
    check_backend(app)
}

/// Leave the main screen: cancel everything, forget session data.
fn go_to_login(app: &mut App) -> Vec<Effect> {
    app.reset_session_data();
    app.screen = Screen::Login;
    vec![Effect::CancelAll]
}

fn logout(app: &mut App) -> Vec<Effect> {
    info!("Logging out");
    let mut effects = go_to_login(app);
    effects.push(Effect::Logout);
    effects
}

fn session_expired(app: &mut App) -> Vec<Effect> {
    warn!("Operator session expired during refresh");
    app.error = Some(SESSION_EXPIRED_MESSAGE.to_string());
    vec![Effect::Schedule {
        key: TaskKey::SessionExpired,
        delay: SESSION_EXPIRED_DELAY,
        action: Box::new(Action::SessionExpired),
    }]
}

/// The backend revoked `phone`'s Telegram session: drop the account and
/// ask for a new login. Running it twice leaves the same state.
fn recover_session(app: &mut App, phone: &str) -> Vec<Effect> {
    warn!("Telegram session for {} is no longer valid", phone);
    app.error = Some(SESSION_INVALID_MESSAGE.to_string());
    app.accounts.retain(|a| a.phone != phone);
    app.relogin_phone = Some(phone.to_string());
    app.account_selector_open = false;
    match app.telegram_login.as_mut() {
        None => app.telegram_login = Some(TelegramLogin::new(Some(phone.to_string()))),
        // A dialog mid-request or already finished keeps its own flow
        Some(dialog) if !dialog.busy && !dialog.completed => {
            *dialog = TelegramLogin::new(Some(phone.to_string()));
        }
        Some(_) => {}
    }

    let mut effects = Vec::new();
    if app.selected_phone() == Some(phone) {
        effects.extend(clear_selection(app));
        effects.push(Effect::PersistSelectedAccount(None));
    }
    finish_refresh(app);
    effects
}

// ============================================================================
// Backend health + full refresh
// ============================================================================

fn check_backend(app: &mut App) -> Vec<Effect> {
    app.backend = BackendStatus::Checking;
    app.error = None;
    vec![Effect::ProbeHealth]
}

fn health_checked(app: &mut App, result: Result<bool, String>) -> Vec<Effect> {
    app.backend = match result {
        Ok(true) => BackendStatus::Online,
        Ok(false) => BackendStatus::Offline,
        Err(message) => {
            app.error = Some(message.clone());
            BackendStatus::Error(message)
        }
    };
    info!("Backend status: {:?}", app.backend);

    if !app.backend.is_online() {
        finish_refresh(app);
        return vec![];
    }
    if app.refresh == Some(RefreshStage::Health) {
        app.refresh = Some(RefreshStage::Token);
        return vec![Effect::VerifyToken];
    }
    fetch_accounts(app)
}

fn start_refresh(app: &mut App) -> Vec<Effect> {
    if app.refresh.is_some() || app.screen != Screen::Main {
        return vec![];
    }
    info!("Refreshing interface");
    app.loading.refreshing = true;
    app.refresh = Some(RefreshStage::Health);
    check_backend(app)
}

fn finish_refresh(app: &mut App) {
    if let Some(stage) = app.refresh.take() {
        debug!("Refresh finished at {:?}", stage);
        app.loading.refreshing = false;
    }
}

fn token_checked(app: &mut App, present: bool) -> Vec<Effect> {
    if app.refresh != Some(RefreshStage::Token) {
        return vec![];
    }
    if !present {
        info!("No authentication token found during refresh");
        finish_refresh(app);
        return go_to_login(app);
    }
    app.refresh = Some(RefreshStage::Accounts);
    fetch_accounts(app)
}

/// Surface a failed request. Returns follow-up effects.
fn report_failure(app: &mut App, err: &ApiError) -> Vec<Effect> {
    warn!("Request failed: {}", err);
    if app.refresh.is_some() && err.is_unauthorized() {
        finish_refresh(app);
        return session_expired(app);
    }
    let message = err.user_message();
    if err.is_connectivity() {
        app.backend = BackendStatus::Error(message.clone());
    }
    app.error = Some(message);
    finish_refresh(app);
    vec![]
}

// ============================================================================
// Accounts
// ============================================================================

fn fetch_accounts(app: &mut App) -> Vec<Effect> {
    app.loading.accounts = true;
    app.error = None;
    vec![Effect::FetchAccounts]
}

fn accounts_loaded(
    app: &mut App,
    result: Result<Vec<Account>, ApiError>,
    saved_phone: Option<String>,
) -> Vec<Effect> {
    app.loading.accounts = false;
    let accounts = match result {
        Ok(accounts) => accounts,
        Err(err) => return report_failure(app, &err),
    };
    info!("Loaded {} accounts", accounts.len());

    let pick = saved_phone
        .as_deref()
        .and_then(|saved| accounts.iter().find(|a| a.phone == saved))
        .or_else(|| accounts.first())
        .cloned();
    app.accounts = accounts;

    let in_refresh = app.refresh == Some(RefreshStage::Accounts);
    let effects = match pick {
        Some(account) if app.selected_phone() == Some(account.phone.as_str()) => {
            app.selected_account = Some(account);
            fetch_chats(app, false)
        }
        other => select_account(app, other),
    };
    if in_refresh {
        if effects.iter().any(|e| matches!(e, Effect::FetchChats { .. })) {
            app.refresh = Some(RefreshStage::Chats);
        } else {
            finish_refresh(app);
        }
    }
    effects
}

/// Cancel work tied to the current selection and clear it.
fn clear_selection(app: &mut App) -> Vec<Effect> {
    app.chats_generation += 1;
    app.messages_generation += 1;
    app.loading.chats = false;
    app.loading.messages = false;
    app.selected_account = None;
    app.chats.clear();
    app.selected_chat = None;
    app.messages.clear();
    app.endpoint_missing = false;
    TaskKey::ACCOUNT_SCOPED.map(Effect::Cancel).to_vec()
}

fn select_account(app: &mut App, account: Option<Account>) -> Vec<Effect> {
    let Some(account) = account else {
        debug!("No account to select");
        let effects = clear_selection(app);
        if matches!(
            app.refresh,
            Some(RefreshStage::Chats | RefreshStage::Messages)
        ) {
            finish_refresh(app);
        }
        return effects;
    };
    if app.selected_phone() == Some(account.phone.as_str()) {
        return vec![];
    }

    info!("Selecting account {}", account.phone);
    let mut effects = clear_selection(app);
    let phone = account.phone.clone();
    app.selected_account = Some(account);
    effects.push(Effect::PersistSelectedAccount(Some(phone)));

    let fetch = fetch_chats(app, false);
    if !fetch.is_empty() && app.refresh == Some(RefreshStage::Messages) {
        app.refresh = Some(RefreshStage::Chats);
    }
    effects.extend(fetch);
    effects
}

// ============================================================================
// Chats
// ============================================================================

fn fetch_chats(app: &mut App, silent: bool) -> Vec<Effect> {
    let Some(phone) = app.selected_phone().map(str::to_string) else {
        return vec![];
    };
    if !app.backend.is_online() {
        return vec![];
    }
    app.chats_generation += 1;
    if !silent {
        app.loading.chats = true;
        app.error = None;
    }
    vec![Effect::FetchChats {
        phone,
        generation: app.chats_generation,
    }]
}

fn chats_loaded(
    app: &mut App,
    phone: String,
    generation: u64,
    result: Result<Vec<Chat>, ApiError>,
) -> Vec<Effect> {
    if generation != app.chats_generation || app.selected_phone() != Some(phone.as_str()) {
        debug!("Discarding stale chats (generation {})", generation);
        return vec![];
    }
    app.loading.chats = false;

    let chats = match result {
        Ok(chats) => chats,
        Err(err) if err.is_session_invalid() => return recover_session(app, &phone),
        Err(err) => return report_failure(app, &err),
    };
    debug!("Loaded {} chats for {}", chats.len(), phone);

    if let Some(selected) = &app.selected_chat
        && let Some(fresh) = chats.iter().find(|c| c.id == selected.id)
    {
        app.selected_chat = Some(fresh.clone());
    }
    app.chats = chats;

    if app.refresh == Some(RefreshStage::Chats) {
        let effects = fetch_messages(app);
        if effects.is_empty() {
            finish_refresh(app);
        } else {
            app.refresh = Some(RefreshStage::Messages);
        }
        return effects;
    }
    vec![]
}

fn select_chat(app: &mut App, chat: Option<Chat>) -> Vec<Effect> {
    if app.selected_chat_id() == chat.as_ref().map(|c| c.id) {
        return vec![];
    }
    app.messages_generation += 1;
    app.loading.messages = false;
    app.messages.clear();
    let mut effects = vec![
        Effect::Cancel(TaskKey::ReconcileMessages),
        Effect::Cancel(TaskKey::FetchMessages),
    ];

    match chat {
        Some(chat) => {
            debug!("Selecting chat {} ({})", chat.id, chat.name);
            app.selected_chat = Some(chat);
            effects.extend(fetch_messages(app));
        }
        None => {
            app.selected_chat = None;
            app.endpoint_missing = false;
            if app.refresh == Some(RefreshStage::Messages) {
                finish_refresh(app);
            }
        }
    }
    effects
}

// ============================================================================
// Messages
// ============================================================================

fn fetch_messages(app: &mut App) -> Vec<Effect> {
    let (Some(phone), Some(chat_id)) = (
        app.selected_phone().map(str::to_string),
        app.selected_chat_id(),
    ) else {
        return vec![];
    };
    if !app.backend.is_online() {
        return vec![];
    }
    app.messages_generation += 1;
    app.loading.messages = true;
    app.endpoint_missing = false;
    app.error = None;
    vec![Effect::FetchMessages {
        phone,
        chat_id,
        generation: app.messages_generation,
    }]
}

fn placeholder(id: i64, text: String, at: DateTime<Utc>) -> Message {
    Message {
        id,
        text,
        date: at,
        out: false,
        sender_id: Some(0),
        reply_to_msg_id: None,
        status: MessageStatus::Read,
    }
}

fn messages_loaded(
    app: &mut App,
    phone: String,
    chat_id: i64,
    generation: u64,
    result: Result<Vec<Message>, ApiError>,
    at: DateTime<Utc>,
) -> Vec<Effect> {
    if generation != app.messages_generation
        || app.selected_phone() != Some(phone.as_str())
        || app.selected_chat_id() != Some(chat_id)
    {
        debug!("Discarding stale messages (generation {})", generation);
        return vec![];
    }
    app.loading.messages = false;

    match result {
        Ok(messages) => {
            debug!("Loaded {} messages for chat {}", messages.len(), chat_id);
            app.messages = messages
                .into_iter()
                .map(|mut m| {
                    m.status = MessageStatus::Read;
                    m
                })
                .collect();
        }
        Err(err) if err.is_session_invalid() => return recover_session(app, &phone),
        Err(err) if err.is_connectivity() => {
            app.messages.clear();
            return report_failure(app, &err);
        }
        Err(err) if err.is_not_found() => {
            warn!("get_messages endpoint missing, showing placeholders");
            app.endpoint_missing = true;
            app.messages = MISSING_ENDPOINT_PLACEHOLDERS
                .iter()
                .zip(1..)
                .map(|(text, id)| placeholder(id, text.to_string(), at))
                .collect();
        }
        Err(err) => {
            if app.refresh.is_some() && err.is_unauthorized() {
                return report_failure(app, &err);
            }
            warn!("Error fetching messages: {}", err);
            let message = err.user_message();
            app.messages = vec![placeholder(
                1,
                format!("Error fetching messages: {message}"),
                at,
            )];
            app.error = Some(message);
        }
    }
    finish_refresh(app);
    vec![]
}

fn send_message(app: &mut App, text: String, at: DateTime<Utc>) -> Vec<Effect> {
    if !app.can_send(&text) {
        debug!("Ignoring send");
        return vec![];
    }
    let (Some(phone), Some(chat)) = (
        app.selected_phone().map(str::to_string),
        app.selected_chat.clone(),
    ) else {
        return vec![];
    };

    let temp_id = at.timestamp_millis();
    app.loading.sending = true;
    app.error = None;
    app.messages.push(Message::outgoing(temp_id, text.clone(), at));
    vec![Effect::SendMessage {
        phone,
        chat_id: chat.id,
        recipient: chat.name,
        text,
        temp_id,
    }]
}

fn message_sent(
    app: &mut App,
    phone: String,
    chat_id: i64,
    temp_id: i64,
    result: Result<(), ApiError>,
) -> Vec<Effect> {
    app.loading.sending = false;
    let pending = app.messages.iter_mut().find(|m| m.id == temp_id);

    match result {
        Ok(()) => {
            if let Some(message) = pending {
                message.status = MessageStatus::Delivered;
            }
            let mut effects = Vec::new();
            if !app.endpoint_missing {
                effects.push(Effect::Schedule {
                    key: TaskKey::ReconcileMessages,
                    delay: RECONCILE_MESSAGES_DELAY,
                    action: Box::new(Action::ReconcileMessages {
                        phone: phone.clone(),
                        chat_id,
                    }),
                });
            }
            effects.push(Effect::Schedule {
                key: TaskKey::ReconcileChats,
                delay: RECONCILE_CHATS_DELAY,
                action: Box::new(Action::ReconcileChats { phone }),
            });
            effects
        }
        Err(err) if err.is_session_invalid() => recover_session(app, &phone),
        Err(err) => {
            warn!("Failed to send message: {}", err);
            if let Some(message) = pending {
                message.text.push_str(FAILED_TO_SEND_SUFFIX);
                message.status = MessageStatus::Sent;
            }
            let message = err.user_message();
            if err.is_connectivity() {
                app.backend = BackendStatus::Error(message.clone());
            }
            app.error = Some(message);
            vec![]
        }
    }
}

// ============================================================================
// Telegram login dialog
// ============================================================================

fn submit_telegram_phone(app: &mut App, phone: String) -> Vec<Effect> {
    let Some(dialog) = app.telegram_login.as_mut() else {
        return vec![];
    };
    if dialog.busy {
        return vec![];
    }
    let phone = phone.trim().to_string();
    if phone.is_empty() {
        dialog.error = Some("Please enter a phone number".to_string());
        return vec![];
    }
    dialog.busy = true;
    dialog.error = None;
    dialog.phone = Some(phone.clone());
    vec![Effect::StartTelegramLogin { phone }]
}

fn telegram_login_started(app: &mut App, result: Result<LoginReply, ApiError>) -> Vec<Effect> {
    let Some(dialog) = app.telegram_login.as_mut() else {
        return vec![];
    };
    dialog.busy = false;
    match result {
        Ok(reply) => {
            dialog.message = reply.message;
            dialog.step = LoginStep::Code;
        }
        Err(err) => {
            warn!("start_login failed: {}", err);
            dialog.error = Some(err.message_or("Failed to start login"));
        }
    }
    vec![]
}

fn submit_telegram_code(app: &mut App, code: String) -> Vec<Effect> {
    let Some(dialog) = app.telegram_login.as_mut() else {
        return vec![];
    };
    if dialog.busy {
        return vec![];
    }
    let code = code.trim().to_string();
    if code.is_empty() {
        dialog.error = Some("Please enter the verification code".to_string());
        return vec![];
    }
    let Some(phone) = dialog.phone.clone() else {
        dialog.step = LoginStep::Phone;
        dialog.error = Some("Please enter a phone number".to_string());
        return vec![];
    };
    dialog.busy = true;
    dialog.error = None;
    vec![Effect::CompleteTelegramLogin { phone, code }]
}

fn telegram_login_completed(app: &mut App, result: Result<LoginReply, ApiError>) -> Vec<Effect> {
    let Some(dialog) = app.telegram_login.as_mut() else {
        return vec![];
    };
    dialog.busy = false;
    match result {
        Ok(reply) => {
            dialog.message = reply.message;
            dialog.step = LoginStep::Phone;
            dialog.phone = None;
            dialog.prefill = None;
            dialog.completed = true;
            vec![Effect::Schedule {
                key: TaskKey::LoginDialogClose,
                delay: LOGIN_DIALOG_CLOSE_DELAY,
                action: Box::new(Action::TelegramLoginSucceeded),
            }]
        }
        Err(err) => {
            warn!("complete_login failed: {}", err);
            dialog.error = Some(err.message_or("Failed to complete login"));
            vec![]
        }
    }
}

// ============================================================================
// Chat poll
// ============================================================================

/// Keep exactly one 30 s poll armed while an account is selected and the
/// backend is online; cancel it otherwise.
fn sync_poll(app: &mut App) -> Option<Effect> {
    let desired = if app.backend.is_online() && app.screen == Screen::Main {
        app.selected_phone().map(str::to_string)
    } else {
        None
    };
    if desired == app.poll_armed_for {
        return None;
    }
    app.poll_armed_for = desired.clone();
    Some(match desired {
        Some(phone) => {
            debug!("Arming chat poll for {}", phone);
            Effect::ScheduleEvery {
                key: TaskKey::ChatPoll,
                period: CHAT_POLL_PERIOD,
                action: Box::new(Action::PollTick { phone }),
            }
        }
        None => Effect::Cancel(TaskKey::ChatPoll),
    })
}
