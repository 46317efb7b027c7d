//! HTTP implementation of [`Backend`] on top of `reqwest`.
//!
//! Authenticated calls pick up the bearer token from the shared local store
//! on every request, so a login or logout elsewhere takes effect immediately.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::backend::Backend;
use super::error::{ApiError, ErrorBody};
use super::types::{
    Account, AccountsEnvelope, AuthResponse, Chat, ChatsEnvelope, CompleteLoginRequest,
    LoginReply, MeResponse, Message, MessagesEnvelope, RegisterRequest, SendMessageRequest,
    SendReply, StartLoginRequest, User,
};
use crate::core::store::{self, AUTH_TOKEN_KEY, SharedStore};

/// Timeout applied to every call except the health probe.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// The health probe gives up sooner so the status screen stays responsive.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
/// Page size requested from `get_messages`.
pub const MESSAGE_PAGE_LIMIT: u32 = 50;

pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
    store: SharedStore,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, store: SharedStore) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self {
            base_url,
            client,
            store,
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}/", self.base_url, route)
    }

    fn token(&self) -> Option<String> {
        store::lock(&self.store).get(AUTH_TOKEN_KEY)
    }

    fn with_auth(&self, req: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn persist_token(&self, token: &str) {
        store::lock(&self.store).set(AUTH_TOKEN_KEY, token);
        debug!("Stored auth token ({} chars)", token.len());
    }

    /// Send a request and decode a JSON success body.
    async fn execute<T: DeserializeOwned>(
        &self,
        route: &str,
        req: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = req.send().await.map_err(|e| {
            let err = ApiError::from(e);
            warn!("{} failed before a response: {}", route, err);
            err
        })?;
        let response = check_status(route, response).await?;
        response.json::<T>().await.map_err(|e| {
            warn!("{} returned an undecodable body: {}", route, e);
            ApiError::Decode(e.to_string())
        })
    }
}

/// Turn a non-success response into `ApiError::Http` with its parsed body.
async fn check_status(route: &str, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    debug!("{} -> {}", route, status);
    if status.is_success() {
        return Ok(response);
    }
    let raw = response.text().await.unwrap_or_default();
    warn!("{} error: {} - {}", route, status.as_u16(), raw);
    Err(ApiError::Http {
        status: status.as_u16(),
        body: ErrorBody::parse(&raw),
    })
}

#[async_trait]
impl Backend for BackendClient {
    async fn check_health(&self) -> bool {
        let result = self
            .client
            .get(self.url("health"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!("Backend health probe returned {}", response.status());
                false
            }
            Err(e) => {
                warn!("Backend not available: {}", e);
                false
            }
        }
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        info!("Logging in as {}", email);
        // OAuth2 password form: the email travels in the `username` field.
        let req = self
            .client
            .post(self.url("login"))
            .form(&[("username", email), ("password", password)]);
        let auth: AuthResponse = self.execute("login", req).await?;
        self.persist_token(&auth.token);
        Ok(auth)
    }

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        info!("Registering {}", username);
        let req = self.client.post(self.url("register")).json(&RegisterRequest {
            username,
            email,
            password,
        });
        let auth: AuthResponse = self.execute("register", req).await?;
        self.persist_token(&auth.token);
        Ok(auth)
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        if self.token().is_none() {
            return Err(ApiError::MissingToken);
        }
        let req = self.with_auth(self.client.get(self.url("me")));
        match self.execute::<MeResponse>("me", req).await {
            Ok(me) => Ok(me.user),
            Err(err) => {
                if err.is_unauthorized() {
                    info!("Stored token rejected, clearing it");
                    store::lock(&self.store).remove(AUTH_TOKEN_KEY);
                }
                Err(err)
            }
        }
    }

    async fn start_login(&self, phone: &str) -> Result<LoginReply, ApiError> {
        info!("Requesting Telegram login code for {}", phone);
        let req = self.with_auth(self.client.post(self.url("start_login"))).json(
            &StartLoginRequest {
                phone,
                force_code: true,
            },
        );
        self.execute("start_login", req).await
    }

    async fn complete_login(&self, phone: &str, code: &str) -> Result<LoginReply, ApiError> {
        info!("Completing Telegram login for {}", phone);
        let req = self
            .with_auth(self.client.post(self.url("complete_login")))
            .json(&CompleteLoginRequest { phone, code });
        self.execute("complete_login", req).await
    }

    async fn list_accounts(&self, kind: Option<&str>) -> Result<Vec<Account>, ApiError> {
        let mut req = self.with_auth(self.client.get(self.url("list_accounts")));
        if let Some(kind) = kind {
            req = req.query(&[("type", kind)]);
        }
        let env: AccountsEnvelope = self.execute("list_accounts", req).await?;
        let accounts: Vec<Account> = env.accounts.into_iter().map(Account::from).collect();
        debug!("Listed {} accounts", accounts.len());
        Ok(accounts)
    }

    async fn get_chats(&self, phone: &str) -> Result<Vec<Chat>, ApiError> {
        let req = self
            .with_auth(self.client.get(self.url("get_chats")))
            .query(&[("phone", phone)]);
        let env: ChatsEnvelope = self.execute("get_chats", req).await?;
        debug!("Fetched {} chats for {}", env.chats.len(), phone);
        Ok(env.chats)
    }

    async fn get_messages(&self, phone: &str, chat_id: i64) -> Result<Vec<Message>, ApiError> {
        let req = self
            .with_auth(self.client.get(self.url("get_messages")))
            .query(&[
                ("phone", phone.to_string()),
                ("chat_id", chat_id.to_string()),
                ("limit", MESSAGE_PAGE_LIMIT.to_string()),
            ]);
        let env: MessagesEnvelope = self.execute("get_messages", req).await?;
        debug!("Fetched {} messages for chat {}", env.messages.len(), chat_id);
        Ok(env.messages)
    }

    async fn send_message(
        &self,
        phone: &str,
        recipient: &str,
        message: &str,
    ) -> Result<SendReply, ApiError> {
        info!("Sending message from {} to {} ({} bytes)", phone, recipient, message.len());
        let req = self
            .with_auth(self.client.post(self.url("send_message")))
            .json(&SendMessageRequest {
                phone,
                recipient,
                message,
            });
        self.execute("send_message", req).await
    }
}
