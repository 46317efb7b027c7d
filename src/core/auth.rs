//! # Auth Session
//!
//! Holds the operator's login state. Constructed once by the runtime and
//! passed to whatever needs it; there is no global lookup.
//!
//! ```text
//! Unauthenticated ──init/refresh (token)──▶ Checking ──ok──▶ Authenticated
//!        ▲                                     │
//!        └────────── 401 / logout ─────────────┘
//! ```

use std::sync::Arc;

use log::{debug, info, warn};

use crate::api::{ApiError, Backend, User};
use crate::core::store::{self, AUTH_TOKEN_KEY, SharedStore};

#[derive(Debug, Clone, PartialEq)]
pub enum AuthStatus {
    Unauthenticated,
    Checking,
    Authenticated(User),
}

pub struct AuthSession {
    backend: Arc<dyn Backend>,
    store: SharedStore,
    status: AuthStatus,
    error: Option<String>,
}

impl AuthSession {
    pub fn new(backend: Arc<dyn Backend>, store: SharedStore) -> Self {
        Self {
            backend,
            store,
            status: AuthStatus::Unauthenticated,
            error: None,
        }
    }

    pub fn status(&self) -> &AuthStatus {
        &self.status
    }

    pub fn user(&self) -> Option<&User> {
        match &self.status {
            AuthStatus::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Last login/register failure, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_token(&self) -> bool {
        store::lock(&self.store).get(AUTH_TOKEN_KEY).is_some()
    }

    /// Validate a persisted token, if there is one.
    pub async fn init(&mut self) -> &AuthStatus {
        info!("Auth session init");
        self.validate_token().await;
        &self.status
    }

    /// Re-validate the stored token with the same rules as `init`.
    pub async fn refresh(&mut self) -> &AuthStatus {
        debug!("Auth session refresh");
        self.validate_token().await;
        &self.status
    }

    async fn validate_token(&mut self) {
        if !self.has_token() {
            self.status = AuthStatus::Unauthenticated;
            return;
        }

        self.status = AuthStatus::Checking;
        match self.backend.current_user().await {
            Ok(user) => {
                info!("Authenticated as {}", user.username);
                self.status = AuthStatus::Authenticated(user);
            }
            Err(err) if err.is_unauthorized() => {
                info!("Invalid or expired token, clearing it");
                store::lock(&self.store).remove(AUTH_TOKEN_KEY);
                self.status = AuthStatus::Unauthenticated;
            }
            Err(err) => {
                // Transient: keep the token for the next attempt.
                warn!("Could not validate token: {}", err);
                self.status = AuthStatus::Unauthenticated;
            }
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, ApiError> {
        self.error = None;
        match self.backend.login(email, password).await {
            Ok(auth) => {
                self.status = AuthStatus::Authenticated(auth.user.clone());
                Ok(auth.user)
            }
            Err(err) => {
                self.error = Some(err.message_or("Failed to login"));
                Err(err)
            }
        }
    }

    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        self.error = None;
        match self.backend.register(username, email, password).await {
            Ok(auth) => {
                self.status = AuthStatus::Authenticated(auth.user.clone());
                Ok(auth.user)
            }
            Err(err) => {
                self.error = Some(err.message_or("Failed to register"));
                Err(err)
            }
        }
    }

    pub fn logout(&mut self) {
        info!("Logging out");
        store::lock(&self.store).remove(AUTH_TOKEN_KEY);
        self.status = AuthStatus::Unauthenticated;
        self.error = None;
    }

    /// Forget in-memory state on shutdown. The token stays persisted.
    pub fn teardown(&mut self) {
        debug!("Auth session teardown");
        self.status = AuthStatus::Unauthenticated;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorBody;
    use crate::core::store::LocalStore;
    use crate::test_support::{FakeBackend, user};

    fn session_with(backend: FakeBackend, token: Option<&str>) -> (AuthSession, SharedStore) {
        let store = LocalStore::in_memory().into_shared();
        if let Some(token) = token {
            store::lock(&store).set(AUTH_TOKEN_KEY, token);
        }
        let backend = FakeBackend {
            store: Some(store.clone()),
            ..backend
        };
        (AuthSession::new(Arc::new(backend), store.clone()), store)
    }

    #[test]
    fn test_init_without_token_stays_unauthenticated() {
        let (mut session, _) = session_with(FakeBackend::default(), None);
        let status = tokio_test::block_on(session.init()).clone();
        assert_eq!(status, AuthStatus::Unauthenticated);
    }

    #[test]
    fn test_init_with_valid_token_authenticates() {
        let backend = FakeBackend {
            me: Ok(user("ann")),
            ..Default::default()
        };
        let (mut session, _) = session_with(backend, Some("tok"));
        tokio_test::block_on(session.init());
        assert_eq!(session.user().map(|u| u.username.as_str()), Some("ann"));
    }

    #[test]
    fn test_init_401_clears_token() {
        let backend = FakeBackend {
            me: Err(ApiError::Http {
                status: 401,
                body: ErrorBody::default(),
            }),
            ..Default::default()
        };
        let (mut session, store) = session_with(backend, Some("stale"));
        tokio_test::block_on(session.init());
        assert_eq!(session.status(), &AuthStatus::Unauthenticated);
        assert!(store::lock(&store).get(AUTH_TOKEN_KEY).is_none());
    }

    #[test]
    fn test_init_transient_error_keeps_token() {
        let backend = FakeBackend {
            me: Err(ApiError::Network("refused".into())),
            ..Default::default()
        };
        let (mut session, store) = session_with(backend, Some("tok"));
        tokio_test::block_on(session.init());
        assert!(session.user().is_none());
        assert_eq!(store::lock(&store).get(AUTH_TOKEN_KEY).as_deref(), Some("tok"));
    }

    #[test]
    fn test_login_failure_records_error_and_leaves_state() {
        let backend = FakeBackend {
            auth: Err(ApiError::Http {
                status: 400,
                body: ErrorBody::parse(r#"{"detail":"Incorrect email or password"}"#),
            }),
            ..Default::default()
        };
        let (mut session, store) = session_with(backend, None);
        let result = tokio_test::block_on(session.login("a@b.c", "nope"));
        assert!(result.is_err());
        assert_eq!(session.error(), Some("Incorrect email or password"));
        assert_eq!(session.status(), &AuthStatus::Unauthenticated);
        assert!(store::lock(&store).get(AUTH_TOKEN_KEY).is_none());
    }

    #[test]
    fn test_register_failure_without_detail_uses_fallback() {
        let backend = FakeBackend {
            auth: Err(ApiError::Http {
                status: 500,
                body: ErrorBody::default(),
            }),
            ..Default::default()
        };
        let (mut session, _) = session_with(backend, None);
        let _ = tokio_test::block_on(session.register("u", "e", "p"));
        assert_eq!(session.error(), Some("Failed to register"));
    }

    #[test]
    fn test_login_then_logout() {
        let (mut session, store) = session_with(FakeBackend::default(), None);
        let user = tokio_test::block_on(session.login("a@b.c", "pw")).unwrap();
        assert_eq!(user.username, "tester");
        assert!(session.has_token());
        session.logout();
        assert!(!session.has_token());
        assert!(store::lock(&store).get(AUTH_TOKEN_KEY).is_none());
        assert_eq!(session.status(), &AuthStatus::Unauthenticated);
    }

    #[test]
    fn test_login_leaves_token_storage_to_backend() {
        let store = LocalStore::in_memory().into_shared();
        let mut session = AuthSession::new(Arc::new(FakeBackend::default()), store.clone());
        tokio_test::block_on(session.login("a@b.c", "pw")).unwrap();
        tokio_test::block_on(session.register("u", "a@b.c", "pw")).unwrap();
        assert!(session.user().is_some());
        assert!(store::lock(&store).get(AUTH_TOKEN_KEY).is_none());
    }

    #[test]
    fn test_teardown_keeps_token() {
        let (mut session, _) = session_with(FakeBackend::default(), None);
        tokio_test::block_on(session.login("a@b.c", "pw")).unwrap();
        session.teardown();
        assert!(session.user().is_none());
        assert!(session.has_token());
    }
}
