use async_trait::async_trait;

use super::error::ApiError;
use super::types::{Account, AuthResponse, Chat, LoginReply, Message, SendReply, User};

/// Account type requested from `list_accounts`.
pub const TELEGRAM_ACCOUNT_TYPE: &str = "telegram";

/// Everything the client needs from the remote backend.
///
/// `BackendClient` is the HTTP implementation; tests substitute fakes.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Returns `true` if the backend answered the health probe.
    async fn check_health(&self) -> bool;

    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError>;

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError>;

    async fn current_user(&self) -> Result<User, ApiError>;

    async fn start_login(&self, phone: &str) -> Result<LoginReply, ApiError>;

    async fn complete_login(&self, phone: &str, code: &str) -> Result<LoginReply, ApiError>;

    async fn list_accounts(&self, kind: Option<&str>) -> Result<Vec<Account>, ApiError>;

    async fn get_chats(&self, phone: &str) -> Result<Vec<Chat>, ApiError>;

    async fn get_messages(&self, phone: &str, chat_id: i64) -> Result<Vec<Message>, ApiError>;

    async fn send_message(
        &self,
        phone: &str,
        recipient: &str,
        message: &str,
    ) -> Result<SendReply, ApiError>;
}
