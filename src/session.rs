//! Login and logout.
//!
//! Valid transitions are `Unauthenticated → Authenticating → Authenticated`
//! and `Authenticated → Unauthenticated`. A session only becomes active once
//! it has been durably persisted.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{SessionError, StorageError};
use crate::gateway::RemoteGateway;
use crate::models::{Credentials, Session};
use crate::store::SessionStorage;
use crate::sync::SyncLoader;

/// Default number of attempts made to persist a freshly issued session.
pub const DEFAULT_PERSIST_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated(Session),
}

/// Result of [`SessionController::logout`].
///
/// Logout itself always succeeds; a failure to clear local storage is
/// reported here without affecting the transition.
#[must_use]
#[derive(Debug)]
pub struct LogoutOutcome {
    pub storage_error: Option<StorageError>,
}

pub struct SessionController {
    gateway: Arc<dyn RemoteGateway>,
    store: Arc<dyn SessionStorage>,
    loader: Arc<SyncLoader>,
    persist_attempts: u32,
    state: Mutex<Tracked>,
}

struct Tracked {
    auth: AuthState,
    /// Bumped by every login attempt and every logout. A login may only
    /// commit if nothing has bumped it since the attempt started.
    generation: u64,
}

impl SessionController {
    /// Create a controller, restoring any session already in the store.
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        store: Arc<dyn SessionStorage>,
        loader: Arc<SyncLoader>,
    ) -> Self {
        let state = match store.read() {
            Ok(Some(session)) => {
                tracing::info!(user = %session.user.email, "Restored stored session");
                AuthState::Authenticated(session)
            }
            Ok(None) => AuthState::Unauthenticated,
            Err(e) => {
                tracing::warn!("Could not read stored session: {}", e);
                AuthState::Unauthenticated
            }
        };

        Self {
            gateway,
            store,
            loader,
            persist_attempts: DEFAULT_PERSIST_ATTEMPTS,
            state: Mutex::new(Tracked {
                auth: state,
                generation: 0,
            }),
        }
    }

    pub fn with_persist_attempts(mut self, attempts: u32) -> Self {
        self.persist_attempts = attempts.max(1);
        self
    }

    pub fn state(&self) -> AuthState {
        self.lock().auth.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.lock().auth, AuthState::Authenticated(_))
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// Empty fields fail before any request is made. A rejected exchange
    /// surfaces the gateway's message unchanged. If the session cannot be
    /// persisted after the configured attempts, the login fails and the
    /// controller stays signed out. A logout issued while the exchange is in
    /// flight wins: the issued session is dropped without being stored.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(SessionError::Validation(
                "Please fill in all fields".to_string(),
            ));
        }

        let generation = {
            let mut tracked = self.lock();
            match &tracked.auth {
                AuthState::Authenticated(_) => return Err(SessionError::AlreadyAuthenticated),
                AuthState::Authenticating => return Err(SessionError::LoginInProgress),
                AuthState::Unauthenticated => {}
            }
            tracked.auth = AuthState::Authenticating;
            tracked.generation += 1;
            tracked.generation
        };
        let _pending = PendingLogin {
            state: &self.state,
            generation,
        };

        tracing::info!(email = %email.trim(), "Signing in");
        let credentials = Credentials::new(email.trim(), password);
        let session: Session = match self.gateway.login(&credentials).await {
            Ok(response) => response.into(),
            Err(e) => {
                tracing::info!("Sign-in rejected: {}", e);
                return Err(SessionError::Auth(e.to_string()));
            }
        };

        {
            // Held across the write so a concurrent logout either precedes
            // the check or clears what was just stored.
            let mut tracked = self.lock();
            if tracked.generation != generation {
                tracing::info!("Signed out while signing in, dropping issued session");
                return Err(SessionError::SignedOutDuringLogin);
            }
            self.persist_with_retry(&session)?;
            tracked.auth = AuthState::Authenticated(session.clone());
        }
        tracing::info!(user = %session.user.email, role = session.role().as_str(), "Signed in");
        Ok(session)
    }

    fn persist_with_retry(&self, session: &Session) -> Result<(), SessionError> {
        let mut attempt = 1;
        loop {
            match self.store.persist(session) {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.persist_attempts => {
                    tracing::warn!(attempt, "Failed to persist session, retrying: {}", e);
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(attempt, "Failed to persist session: {}", e);
                    if let Err(clear_err) = self.store.clear() {
                        tracing::warn!("Failed to clear partial session: {}", clear_err);
                    }
                    return Err(e.into());
                }
            }
        }
    }

    /// Sign out. Local state is always dropped and any in-flight load result
    /// is discarded, even if clearing storage fails.
    pub fn logout(&self) -> LogoutOutcome {
        {
            let mut tracked = self.lock();
            tracked.auth = AuthState::Unauthenticated;
            tracked.generation += 1;
        }
        self.loader.reset();

        let storage_error = self.store.clear().err();
        match &storage_error {
            Some(e) => tracing::warn!("Signed out, but clearing stored session failed: {}", e),
            None => tracing::info!("Signed out"),
        }
        LogoutOutcome { storage_error }
    }

    /// The stored session while authenticated.
    ///
    /// Reads through to the store. If the stored session has gone missing or
    /// become unreadable, the controller drops to `Unauthenticated`.
    pub fn current_session(&self) -> Option<Session> {
        if !self.is_authenticated() {
            return None;
        }

        match self.store.read() {
            Ok(Some(session)) => Some(session),
            Ok(None) => {
                tracing::warn!("Stored session disappeared, signing out");
                self.drop_session();
                None
            }
            Err(e) => {
                tracing::warn!("Could not read stored session, signing out: {}", e);
                self.drop_session();
                None
            }
        }
    }

    fn drop_session(&self) {
        self.lock().auth = AuthState::Unauthenticated;
        self.loader.reset();
    }

    fn lock(&self) -> MutexGuard<'_, Tracked> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the controller to `Unauthenticated` if its login attempt ends
/// without committing, including when the login future is dropped
/// mid-request. A later attempt is left alone.
struct PendingLogin<'a> {
    state: &'a Mutex<Tracked>,
    generation: u64,
}

impl Drop for PendingLogin<'_> {
    fn drop(&mut self) {
        let mut tracked = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if tracked.generation == self.generation && tracked.auth == AuthState::Authenticating {
            tracked.auth = AuthState::Unauthenticated;
        }
    }
}
