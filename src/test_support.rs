//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::api::types::{AuthResponse, SendReply};
use crate::api::{Account, ApiError, Backend, Chat, ErrorBody, LoginReply, Message, MessageStatus, User};
use crate::core::state::{App, BackendStatus, Screen};
use crate::core::store::{self, AUTH_TOKEN_KEY, SharedStore};

/// Canned-response backend for tests that don't need real HTTP.
#[derive(Clone)]
pub struct FakeBackend {
    pub health: bool,
    /// Returned by both `login` and `register`.
    pub auth: Result<User, ApiError>,
    pub me: Result<User, ApiError>,
    pub login_reply: Result<LoginReply, ApiError>,
    pub accounts: Result<Vec<Account>, ApiError>,
    pub chats: Result<Vec<Chat>, ApiError>,
    pub messages: Result<Vec<Message>, ApiError>,
    pub send: Result<SendReply, ApiError>,
    /// When set, a successful login stores the token here like the real client.
    pub store: Option<SharedStore>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            health: true,
            auth: Ok(user("tester")),
            me: Ok(user("tester")),
            login_reply: Ok(LoginReply::default()),
            accounts: Ok(Vec::new()),
            chats: Ok(Vec::new()),
            messages: Ok(Vec::new()),
            send: Ok(SendReply::default()),
            store: None,
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn check_health(&self) -> bool {
        self.health
    }

    async fn login(&self, _email: &str, _password: &str) -> Result<AuthResponse, ApiError> {
        let auth = self.auth.clone().map(|user| AuthResponse {
            user,
            token: "fake-token".to_string(),
        })?;
        if let Some(store) = &self.store {
            store::lock(store).set(AUTH_TOKEN_KEY, &auth.token);
        }
        Ok(auth)
    }

    async fn register(
        &self,
        _username: &str,
        _email: &str,
        _password: &str,
    ) -> Result<AuthResponse, ApiError> {
        self.login("", "").await
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.me.clone()
    }

    async fn start_login(&self, _phone: &str) -> Result<LoginReply, ApiError> {
        self.login_reply.clone()
    }

    async fn complete_login(&self, _phone: &str, _code: &str) -> Result<LoginReply, ApiError> {
        self.login_reply.clone()
    }

    async fn list_accounts(&self, _kind: Option<&str>) -> Result<Vec<Account>, ApiError> {
        self.accounts.clone()
    }

    async fn get_chats(&self, _phone: &str) -> Result<Vec<Chat>, ApiError> {
        self.chats.clone()
    }

    async fn get_messages(&self, _phone: &str, _chat_id: i64) -> Result<Vec<Message>, ApiError> {
        self.messages.clone()
    }

    async fn send_message(
        &self,
        _phone: &str,
        _recipient: &str,
        _message: &str,
    ) -> Result<SendReply, ApiError> {
        self.send.clone()
    }
}

pub fn user(name: &str) -> User {
    User {
        id: "1".to_string(),
        username: name.to_string(),
        email: format!("{name}@example.com"),
    }
}

pub fn account(phone: &str) -> Account {
    Account::new(phone)
}

pub fn chat(id: i64, name: &str) -> Chat {
    Chat {
        id,
        name: name.to_string(),
        unread_count: 0,
        avatar: None,
        last_message: None,
        online: None,
    }
}

pub fn message(id: i64, text: &str, out: bool) -> Message {
    message_at(id, text, out, "2024-05-01T12:00:00Z")
}

pub fn message_at(id: i64, text: &str, out: bool, date: &str) -> Message {
    let date: DateTime<Utc> = date.parse().unwrap();
    Message {
        id,
        text: text.to_string(),
        date,
        out,
        sender_id: Some(if out { 0 } else { 42 }),
        reply_to_msg_id: None,
        status: MessageStatus::Read,
    }
}

pub fn http_error(status: u16, body: &str) -> ApiError {
    ApiError::Http {
        status,
        body: ErrorBody::parse(body),
    }
}

/// 401 carrying the structured session-invalid code.
pub fn session_invalid() -> ApiError {
    http_error(
        401,
        r#"{"detail":"Session is no longer valid. Please log in again.","code":"session_invalid"}"#,
    )
}

pub fn test_app() -> App {
    App::new()
}

/// Signed-in app on the main screen with the backend online.
pub fn online_app() -> App {
    let mut app = App::new();
    app.user = Some(user("tester"));
    app.screen = Screen::Main;
    app.backend = BackendStatus::Online;
    app
}
