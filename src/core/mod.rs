//! # Core Application Logic
//!
//! This module contains telepanel's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │                         │
//!                    │  No I/O in the reducer. │
//!                    └───────────┬─────────────┘
//!                                │ Effects
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │ AuthSession│      │ Scheduler  │
//!     │  Adapter   │      │  + Store   │      │  (timers)  │
//!     │ (ratatui)  │      │            │      │            │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct, all orchestrator state in one place
//! - [`action`]: `Action`, `Effect` and the `update()` reducer
//! - [`auth`]: The operator's `AuthSession`
//! - [`store`]: Client-local key/value persistence
//! - [`scheduler`]: Cancellable timers and tracked in-flight requests
//! - [`config`]: Layered configuration

pub mod action;
pub mod auth;
pub mod config;
pub mod scheduler;
pub mod state;
pub mod store;
