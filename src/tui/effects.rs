//! # Effect Runner
//!
//! Executes the `Effect`s returned by `core::action::update`. Network work
//! runs on tokio tasks; each task reports back with exactly one `Action`
//! over the event loop's channel. Fetches that belong to the current
//! selection are registered with the `Scheduler` so a newer request or a
//! selection change can abort them.

use std::future::Future;
use std::sync::Arc;
use std::sync::mpsc::Sender;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::Mutex;

use crate::api::{Backend, TELEGRAM_ACCOUNT_TYPE};
use crate::core::action::{Action, Effect};
use crate::core::auth::{AuthSession, AuthStatus};
use crate::core::scheduler::{Scheduler, TaskKey};
use crate::core::store::{self, SELECTED_ACCOUNT_KEY, SharedStore};

pub struct EffectRunner {
    backend: Arc<dyn Backend>,
    auth: Arc<Mutex<AuthSession>>,
    store: SharedStore,
    scheduler: Scheduler,
    tx: Sender<Action>,
}

/// Run `task` detached and forward its action.
fn spawn_untracked<F>(label: &'static str, tx: Sender<Action>, task: F)
where
    F: Future<Output = Action> + Send + 'static,
{
    tokio::spawn(async move {
        let action = task.await;
        if tx.send(action).is_err() {
            warn!("Dropped result of {}: receiver gone", label);
        }
    });
}

impl EffectRunner {
    pub fn new(backend: Arc<dyn Backend>, store: SharedStore, tx: Sender<Action>) -> Self {
        let auth = AuthSession::new(backend.clone(), store.clone());
        Self {
            backend,
            auth: Arc::new(Mutex::new(auth)),
            store,
            scheduler: Scheduler::new(tx.clone()),
            tx,
        }
    }

    /// Execute one effect. Returns `true` when the runtime should quit.
    pub fn run(&mut self, effect: Effect) -> bool {
        debug!("Running effect: {:?}", effect);
        match effect {
            Effect::AuthInit => {
                let auth = self.auth.clone();
                spawn_untracked("auth init", self.tx.clone(), async move {
                    let mut session = auth.lock().await;
                    let user = match session.init().await {
                        AuthStatus::Authenticated(user) => Some(user.clone()),
                        _ => None,
                    };
                    Action::AuthChecked(user)
                });
            }
            Effect::Login { email, password } => {
                let auth = self.auth.clone();
                spawn_untracked("login", self.tx.clone(), async move {
                    let mut session = auth.lock().await;
                    let result = match session.login(&email, &password).await {
                        Ok(user) => Ok(user),
                        Err(_) => Err(session.error().unwrap_or("Failed to login").to_string()),
                    };
                    Action::AuthFinished(result)
                });
            }
            Effect::Register {
                username,
                email,
                password,
            } => {
                let auth = self.auth.clone();
                spawn_untracked("register", self.tx.clone(), async move {
                    let mut session = auth.lock().await;
                    let result = match session.register(&username, &email, &password).await {
                        Ok(user) => Ok(user),
                        Err(_) => Err(session.error().unwrap_or("Failed to register").to_string()),
                    };
                    Action::AuthFinished(result)
                });
            }
            Effect::Logout => {
                let auth = self.auth.clone();
                tokio::spawn(async move { auth.lock().await.logout() });
            }
            Effect::ProbeHealth => {
                let backend = self.backend.clone();
                self.scheduler.spawn(TaskKey::Health, async move {
                    // A panicking probe surfaces as an error status, not a crash
                    let probe = tokio::spawn(async move { backend.check_health().await }).await;
                    Some(Action::HealthChecked(probe.map_err(|e| {
                        warn!("Health probe failed: {}", e);
                        format!("Health check failed: {e}")
                    })))
                });
            }
            Effect::VerifyToken => {
                let auth = self.auth.clone();
                spawn_untracked("token check", self.tx.clone(), async move {
                    Action::TokenChecked(auth.lock().await.has_token())
                });
            }
            Effect::FetchAccounts => {
                let backend = self.backend.clone();
                let saved_phone = store::lock(&self.store).get(SELECTED_ACCOUNT_KEY);
                spawn_untracked("list accounts", self.tx.clone(), async move {
                    Action::AccountsLoaded {
                        result: backend.list_accounts(Some(TELEGRAM_ACCOUNT_TYPE)).await,
                        saved_phone,
                    }
                });
            }
            Effect::FetchChats { phone, generation } => {
                let backend = self.backend.clone();
                self.scheduler.spawn(TaskKey::FetchChats, async move {
                    let result = backend.get_chats(&phone).await;
                    Some(Action::ChatsLoaded {
                        phone,
                        generation,
                        result,
                    })
                });
            }
            Effect::FetchMessages {
                phone,
                chat_id,
                generation,
            } => {
                let backend = self.backend.clone();
                self.scheduler.spawn(TaskKey::FetchMessages, async move {
                    let result = backend.get_messages(&phone, chat_id).await;
                    Some(Action::MessagesLoaded {
                        phone,
                        chat_id,
                        generation,
                        result,
                        at: Utc::now(),
                    })
                });
            }
            Effect::SendMessage {
                phone,
                chat_id,
                recipient,
                text,
                temp_id,
            } => {
                let backend = self.backend.clone();
                spawn_untracked("send message", self.tx.clone(), async move {
                    let result = backend
                        .send_message(&phone, &recipient, &text)
                        .await
                        .map(|_| ());
                    Action::MessageSent {
                        phone,
                        chat_id,
                        temp_id,
                        result,
                    }
                });
            }
            Effect::StartTelegramLogin { phone } => {
                let backend = self.backend.clone();
                spawn_untracked("start login", self.tx.clone(), async move {
                    Action::TelegramLoginStarted(backend.start_login(&phone).await)
                });
            }
            Effect::CompleteTelegramLogin { phone, code } => {
                let backend = self.backend.clone();
                spawn_untracked("complete login", self.tx.clone(), async move {
                    Action::TelegramLoginCompleted(backend.complete_login(&phone, &code).await)
                });
            }
            Effect::PersistSelectedAccount(phone) => {
                let mut store = store::lock(&self.store);
                match phone {
                    Some(phone) => store.set(SELECTED_ACCOUNT_KEY, &phone),
                    None => store.remove(SELECTED_ACCOUNT_KEY),
                }
            }
            Effect::Schedule { key, delay, action } => {
                self.scheduler.schedule_once(key, delay, *action);
            }
            Effect::ScheduleEvery {
                key,
                period,
                action,
            } => {
                self.scheduler.schedule_every(key, period, *action);
            }
            Effect::Cancel(key) => self.scheduler.cancel(key),
            Effect::CancelAll => self.scheduler.cancel_all(),
            Effect::Quit => return true,
        }
        false
    }

    /// Stop every task and drop in-memory auth state.
    pub fn shutdown(&mut self) {
        info!("Shutting down effect runner");
        self.scheduler.cancel_all();
        match self.auth.try_lock() {
            Ok(mut session) => session.teardown(),
            Err(_) => warn!("Auth session busy at shutdown, skipping teardown"),
        }
    }
}
