#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;

use gatekeeper::error::{GatewayError, StorageError};
use gatekeeper::gateway::RemoteGateway;
use gatekeeper::models::*;
use gatekeeper::store::{SessionStorage, SqliteSessionStore};

const OPEN_PERMITS: usize = 1 << 16;

pub fn user(email: &str, role: Role) -> User {
    User {
        id: "1".to_string(),
        email: email.to_string(),
        role,
    }
}

pub fn session(role: Role) -> Session {
    Session::new(format!("token-{}", role.as_str()), user("user@demo.com", role))
}

pub fn flag(key: &str, enabled: bool) -> FeatureFlag {
    FeatureFlag {
        id: key.to_string(),
        key: key.to_string(),
        name: key.to_string(),
        description: None,
        enabled,
    }
}

pub fn announcement(message: &str, active: bool) -> Announcement {
    Announcement {
        message: message.to_string(),
        active,
        updated_at: "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap(),
    }
}

pub fn server_error() -> GatewayError {
    GatewayError::Status {
        status: 500,
        message: "HTTP 500".to_string(),
    }
}

pub fn memory_store() -> SqliteSessionStore {
    let store = SqliteSessionStore::open_memory().expect("Failed to create store");
    store.migrate().expect("Failed to migrate");
    store
}

/// In-process gateway with canned responses, call counters, and a gate that
/// can hold requests in flight until released.
pub struct FakeGateway {
    accounts: Mutex<Vec<(String, String, User)>>,
    features: Mutex<Result<Vec<FeatureFlag>, GatewayError>>,
    announcement: Mutex<Result<Option<Announcement>, GatewayError>>,
    gate: Semaphore,
    login_calls: AtomicUsize,
    features_calls: AtomicUsize,
    announcement_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(OPEN_PERMITS))
    }

    /// Requests block until [`FakeGateway::release`] is called.
    pub fn held() -> Arc<Self> {
        Arc::new(Self::build(0))
    }

    fn build(permits: usize) -> Self {
        Self {
            accounts: Mutex::new(vec![
                (
                    "user@demo.com".to_string(),
                    "User@123".to_string(),
                    user("user@demo.com", Role::User),
                ),
                (
                    "admin@demo.com".to_string(),
                    "Admin@123".to_string(),
                    user("admin@demo.com", Role::Admin),
                ),
            ]),
            features: Mutex::new(Ok(Vec::new())),
            announcement: Mutex::new(Ok(None)),
            gate: Semaphore::new(permits),
            login_calls: AtomicUsize::new(0),
            features_calls: AtomicUsize::new(0),
            announcement_calls: AtomicUsize::new(0),
        }
    }

    /// Hold subsequent requests until [`FakeGateway::release`].
    pub fn hold(&self) {
        if let Ok(permits) = self.gate.try_acquire_many(OPEN_PERMITS as u32) {
            permits.forget();
        }
    }

    pub fn release(&self) {
        self.gate.add_permits(OPEN_PERMITS);
    }

    pub fn set_features(&self, result: Result<Vec<FeatureFlag>, GatewayError>) {
        *self.features.lock().unwrap() = result;
    }

    pub fn set_announcement(&self, result: Result<Option<Announcement>, GatewayError>) {
        *self.announcement.lock().unwrap() = result;
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn features_calls(&self) -> usize {
        self.features_calls.load(Ordering::SeqCst)
    }

    pub fn announcement_calls(&self) -> usize {
        self.announcement_calls.load(Ordering::SeqCst)
    }

    async fn pass_gate(&self) {
        let _permit = self.gate.acquire().await.expect("gate closed");
    }
}

#[async_trait]
impl RemoteGateway for FakeGateway {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, GatewayError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;

        let accounts = self.accounts.lock().unwrap();
        accounts
            .iter()
            .find(|(email, password, _)| {
                *email == credentials.email && *password == credentials.password
            })
            .map(|(_, _, user)| LoginResponse {
                token: format!("token-for-{}", user.email),
                user: user.clone(),
            })
            .ok_or(GatewayError::Status {
                status: 401,
                message: "Invalid credentials".to_string(),
            })
    }

    async fn features(&self, _token: &str) -> Result<Vec<FeatureFlag>, GatewayError> {
        self.features_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        self.features.lock().unwrap().clone()
    }

    async fn announcement(&self, _token: &str) -> Result<Option<Announcement>, GatewayError> {
        self.announcement_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        self.announcement.lock().unwrap().clone()
    }
}

/// Store wrapper that can be told to fail writes.
pub struct FlakyStore {
    inner: SqliteSessionStore,
    persist_failures: AtomicUsize,
    fail_clear: AtomicBool,
    persist_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: memory_store(),
            persist_failures: AtomicUsize::new(0),
            fail_clear: AtomicBool::new(false),
            persist_calls: AtomicUsize::new(0),
        })
    }

    /// Fail the next `n` calls to `persist`.
    pub fn fail_persist(&self, n: usize) {
        self.persist_failures.store(n, Ordering::SeqCst);
    }

    pub fn fail_clear(&self, fail: bool) {
        self.fail_clear.store(fail, Ordering::SeqCst);
    }

    pub fn persist_calls(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }
}

impl SessionStorage for FlakyStore {
    fn persist(&self, session: &Session) -> Result<(), StorageError> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.persist_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.persist_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StorageError::Path("disk full".to_string()));
        }
        self.inner.persist(session)
    }

    fn read(&self) -> Result<Option<Session>, StorageError> {
        self.inner.read()
    }

    fn clear(&self) -> Result<(), StorageError> {
        if self.fail_clear.load(Ordering::SeqCst) {
            return Err(StorageError::Path("read-only filesystem".to_string()));
        }
        self.inner.clear()
    }
}
