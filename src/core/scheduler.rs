//! # Scheduler
//!
//! Owns the cancellation handle of every delayed follow-up and every
//! tracked in-flight request. Handles are keyed by purpose: scheduling a
//! key again aborts the task already registered under it.
//!
//! Results travel back to the event loop as `Action`s over a std channel,
//! the same path every background task uses.

use std::collections::HashMap;
use std::future::Future;
use std::sync::mpsc::Sender;
use std::time::Duration;

use log::{debug, warn};
use tokio::task::AbortHandle;

use crate::core::action::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKey {
    /// Recurring silent chat refresh.
    ChatPoll,
    /// Message fetch 1 s after a successful send.
    ReconcileMessages,
    /// Silent chat refresh 2 s after a successful send.
    ReconcileChats,
    /// Logout 3 s after a session-expired notice.
    SessionExpired,
    /// Closes the Telegram login dialog after success.
    LoginDialogClose,
    Health,
    FetchChats,
    FetchMessages,
}

impl TaskKey {
    /// Follow-ups that belong to the selected account.
    pub const ACCOUNT_SCOPED: [TaskKey; 4] = [
        TaskKey::ReconcileMessages,
        TaskKey::ReconcileChats,
        TaskKey::FetchChats,
        TaskKey::FetchMessages,
    ];
}

pub struct Scheduler {
    tx: Sender<Action>,
    handles: HashMap<TaskKey, AbortHandle>,
}

impl Scheduler {
    pub fn new(tx: Sender<Action>) -> Self {
        Self {
            tx,
            handles: HashMap::new(),
        }
    }

    /// Run `task` under `key` and forward the action it yields, if any.
    pub fn spawn<F>(&mut self, key: TaskKey, task: F)
    where
        F: Future<Output = Option<Action>> + Send + 'static,
    {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            if let Some(action) = task.await
                && tx.send(action).is_err()
            {
                warn!("Dropped result of {:?}: receiver gone", key);
            }
        });
        self.register(key, handle.abort_handle());
    }

    /// Dispatch `action` once after `delay`.
    pub fn schedule_once(&mut self, key: TaskKey, delay: Duration, action: Action) {
        debug!("Scheduling {:?} in {:?}", key, delay);
        self.spawn(key, async move {
            tokio::time::sleep(delay).await;
            Some(action)
        });
    }

    /// Dispatch `action` every `period`, first after one full period.
    pub fn schedule_every(&mut self, key: TaskKey, period: Duration, action: Action) {
        debug!("Scheduling {:?} every {:?}", key, period);
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tx.send(action.clone()).is_err() {
                    warn!("Stopping {:?}: receiver gone", key);
                    return;
                }
            }
        });
        self.register(key, handle.abort_handle());
    }

    pub fn cancel(&mut self, key: TaskKey) {
        if let Some(handle) = self.handles.remove(&key) {
            if !handle.is_finished() {
                debug!("Cancelling {:?}", key);
            }
            handle.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for (key, handle) in self.handles.drain() {
            debug!("Cancelling {:?}", key);
            handle.abort();
        }
    }

    /// True while a task registered under `key` has not finished.
    #[cfg(test)]
    fn is_active(&self, key: TaskKey) -> bool {
        self.handles.get(&key).is_some_and(|h| !h.is_finished())
    }

    fn register(&mut self, key: TaskKey, handle: AbortHandle) {
        if let Some(previous) = self.handles.insert(key, handle) {
            previous.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
