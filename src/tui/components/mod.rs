//! # TUI Components
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as struct fields:
//! - `Header`: top status line
//! - `StatusView`: connecting / backend-unavailable notices
//!
//! ### Stateful Components (Event-Driven)
//!
//! Persistent state lives in `TuiState`; a transient wrapper borrows it for
//! one frame:
//! - `Composer`: multi-line message input
//! - `Sidebar` / `SidebarState`: filtered chat list
//! - `ChatArea` / `ChatAreaState`: grouped, scrollable thread
//! - `AccountSelector` / `AccountSelectorState`: account overlay
//! - `TelegramLoginForm`: phone/code dialog
//! - `AuthFormState`: operator login and registration
//!
//! Components receive external data as props, never by reaching into
//! `App` themselves, so each one renders in isolation under `TestBackend`.
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs              (this file)
//! ├── overlay.rs          (centered rects, truncation)
//! ├── text_field.rs       (single-line input)
//! ├── composer/           (multi-line input with row layout)
//! ├── header.rs
//! ├── sidebar.rs
//! ├── chat_area.rs
//! ├── account_selector.rs
//! ├── telegram_login.rs
//! ├── auth_form.rs
//! └── status_view.rs
//! ```

pub mod account_selector;
pub mod auth_form;
pub mod chat_area;
pub mod composer;
mod header;
pub mod overlay;
pub mod sidebar;
mod status_view;
pub mod telegram_login;
pub mod text_field;

pub use account_selector::{AccountSelector, AccountSelectorEvent, AccountSelectorState};
pub use auth_form::{AuthEvent, AuthFormState, AuthMode};
pub use chat_area::{ChatArea, ChatAreaState};
pub use composer::{Composer, ComposerEvent};
pub use header::Header;
pub use sidebar::{Sidebar, SidebarEvent, SidebarState};
pub use status_view::StatusView;
pub use telegram_login::{LoginDialogEvent, TelegramLoginForm};
