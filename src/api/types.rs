use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// The operator account logged into the backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// Backend user ids are integers in some deployments and strings in others.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Str(String),
    }
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(n) => n.to_string(),
        RawId::Str(s) => s,
    })
}

/// A linked Telegram phone account. Identity is the phone number.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub phone: String,
    #[serde(default, rename = "isActive", skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Account {
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            is_active: None,
        }
    }
}

/// `list_accounts` returns either bare phone strings or account objects.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum AccountEntry {
    Phone(String),
    Full(Account),
}

impl From<AccountEntry> for Account {
    fn from(entry: AccountEntry) -> Self {
        match entry {
            AccountEntry::Phone(phone) => Account::new(phone),
            AccountEntry::Full(account) => account,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Chat {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, rename = "lastMessage", skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
}

impl Chat {
    /// Two-letter uppercase initials used as the avatar placeholder.
    pub fn initials(&self) -> String {
        self.name.chars().take(2).collect::<String>().to_uppercase()
    }
}

/// Delivery state of a message as shown in the UI.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    /// Fetched messages are assumed read.
    #[default]
    Read,
}

impl MessageStatus {
    pub fn ticks(self) -> &'static str {
        match self {
            MessageStatus::Read => "✓✓",
            MessageStatus::Sent | MessageStatus::Delivered => "✓",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub id: i64,
    #[serde(default)]
    pub text: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub out: bool,
    #[serde(default)]
    pub sender_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_msg_id: Option<i64>,
    #[serde(default)]
    pub status: MessageStatus,
}

impl Message {
    /// Optimistic outgoing message created before the backend confirms it.
    pub fn outgoing(temp_id: i64, text: String, date: DateTime<Utc>) -> Self {
        Self {
            id: temp_id,
            text,
            date,
            out: true,
            sender_id: Some(0),
            reply_to_msg_id: None,
            status: MessageStatus::Sent,
        }
    }

    /// Local wall-clock time, e.g. `14:05`.
    pub fn time_label(&self) -> String {
        self.date.with_timezone(&Local).format("%H:%M").to_string()
    }
}

// ============================================================================
// Request / response envelopes
// ============================================================================

#[derive(Deserialize, Debug)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(Deserialize, Debug)]
pub struct MeResponse {
    pub user: User,
}

#[derive(Serialize, Debug)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize, Debug)]
pub struct StartLoginRequest<'a> {
    pub phone: &'a str,
    pub force_code: bool,
}

#[derive(Serialize, Debug)]
pub struct CompleteLoginRequest<'a> {
    pub phone: &'a str,
    pub code: &'a str,
}

/// Reply to the Telegram login steps.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LoginReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct AccountsEnvelope {
    #[serde(default)]
    pub accounts: Vec<AccountEntry>,
}

#[derive(Deserialize, Debug)]
pub struct ChatsEnvelope {
    #[serde(default)]
    pub chats: Vec<Chat>,
}

#[derive(Deserialize, Debug)]
pub struct MessagesEnvelope {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Serialize, Debug)]
pub struct SendMessageRequest<'a> {
    pub phone: &'a str,
    pub recipient: &'a str,
    pub message: &'a str,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SendReply {
    #[serde(default)]
    pub message: Option<String>,
}
