use std::fmt;

use serde::Deserialize;

/// Structured code the backend attaches to revoked Telegram sessions.
pub const SESSION_INVALID_CODE: &str = "session_invalid";

/// Legacy marker: older backends only put this text into `detail`.
const SESSION_INVALID_DETAIL: &str = "Session is no longer valid";

pub const TIMEOUT_MESSAGE: &str = "Request timed out. Please check your connection.";
pub const NETWORK_MESSAGE: &str = "Network error. Please check if the backend server is running.";

/// Error payload returned by the backend. Every field is optional because
/// FastAPI-style errors only carry `detail`, while newer routes add `code`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Parse a raw response body. Non-JSON bodies become the `detail`.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(raw) {
            Ok(body) => body,
            Err(_) => {
                let trimmed = raw.trim();
                ErrorBody {
                    detail: (!trimmed.is_empty()).then(|| trimmed.to_string()),
                    ..Default::default()
                }
            }
        }
    }

    /// Best human-readable text carried by the body.
    pub fn text(&self) -> Option<&str> {
        self.detail.as_deref().or(self.message.as_deref())
    }
}

/// Errors produced by the backend client.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never got a response (DNS, refused connection, reset).
    Network(String),
    /// The request exceeded its deadline.
    Timeout,
    /// The backend answered with a non-success status.
    Http { status: u16, body: ErrorBody },
    /// The response body could not be decoded.
    Decode(String),
    /// An authenticated call was attempted without a stored token.
    MissingToken,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// No response reached the client.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// The backend revoked the Telegram session of the account in question.
    ///
    /// Prefers the structured `code`; the `detail` text match is kept for
    /// backends that predate it.
    pub fn is_session_invalid(&self) -> bool {
        match self {
            ApiError::Http { status: 401, body } => {
                body.code.as_deref() == Some(SESSION_INVALID_CODE)
                    || body
                        .detail
                        .as_deref()
                        .is_some_and(|d| d.contains(SESSION_INVALID_DETAIL))
            }
            _ => false,
        }
    }

    /// Backend-provided text for HTTP failures, the connectivity message
    /// for network failures, `fallback` otherwise.
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            ApiError::Http { body, .. } => body
                .text()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
            ApiError::Network(_) | ApiError::Timeout => self.user_message(),
            _ => fallback.to_string(),
        }
    }

    /// Text suitable for the error banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => NETWORK_MESSAGE.to_string(),
            ApiError::Timeout => TIMEOUT_MESSAGE.to_string(),
            ApiError::Http { status, body } => body
                .text()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {status}")),
            ApiError::Decode(msg) => format!("Unexpected response from backend: {msg}"),
            ApiError::MissingToken => "No authentication token found".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Timeout => write!(f, "request timed out"),
            ApiError::Http { status, body } => match body.text() {
                Some(text) => write!(f, "HTTP {status}: {text}"),
                None => write!(f, "HTTP {status}"),
            },
            ApiError::Decode(msg) => write!(f, "decode error: {msg}"),
            ApiError::MissingToken => write!(f, "no authentication token"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
