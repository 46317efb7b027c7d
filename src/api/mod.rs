//! # Backend API
//!
//! Thin client for the remote Telegram-management backend: wire types,
//! the error taxonomy, and the `Backend` seam with its HTTP implementation.

pub mod backend;
pub mod client;
pub mod error;
pub mod types;

pub use backend::{Backend, TELEGRAM_ACCOUNT_TYPE};
pub use client::BackendClient;
pub use error::{ApiError, ErrorBody};
pub use types::{Account, Chat, LoginReply, Message, MessageStatus, User};
