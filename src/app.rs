//! The single entry point presentation code talks to.

use std::sync::Arc;

use crate::capability::{self, CapabilityView};
use crate::config::Config;
use crate::error::{SessionError, StorageError, SyncError};
use crate::gateway::{HttpGateway, RemoteGateway};
use crate::models::Session;
use crate::session::{AuthState, LogoutOutcome, SessionController};
use crate::store::{SessionStorage, SqliteSessionStore};
use crate::sync::{LoadOutcome, SyncLoader, SyncSnapshot};

/// Session controller and sync loader wired to one gateway and one store.
pub struct Gatekeeper {
    controller: SessionController,
    loader: Arc<SyncLoader>,
}

impl Gatekeeper {
    pub fn new(gateway: Arc<dyn RemoteGateway>, store: Arc<dyn SessionStorage>) -> Self {
        let loader = Arc::new(SyncLoader::new(Arc::clone(&gateway)));
        let controller = SessionController::new(gateway, store, Arc::clone(&loader));
        Self { controller, loader }
    }

    /// HTTP gateway and SQLite store as described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, StorageError> {
        let store = match &config.database_path {
            Some(path) => SqliteSessionStore::open(path.clone())?,
            None => SqliteSessionStore::open_default()?,
        };
        store.migrate()?;

        let gateway = HttpGateway::new(config.api_url.clone());
        tracing::debug!("Using API at {}", gateway.base_url());

        let mut app = Self::new(Arc::new(gateway), Arc::new(store));
        app.controller = app.controller.with_persist_attempts(config.persist_attempts);
        Ok(app)
    }

    pub fn state(&self) -> AuthState {
        self.controller.state()
    }

    pub fn session(&self) -> Option<Session> {
        self.controller.current_session()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        self.controller.login(email, password).await
    }

    pub fn logout(&self) -> LogoutOutcome {
        self.controller.logout()
    }

    pub async fn load(&self) -> Result<LoadOutcome, SyncError> {
        let session = self.controller.current_session();
        self.loader.load(session.as_ref()).await
    }

    pub async fn refresh(&self) -> Result<LoadOutcome, SyncError> {
        let session = self.controller.current_session();
        self.loader.refresh(session.as_ref()).await
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.loader.snapshot()
    }

    pub fn view(&self) -> CapabilityView {
        capability::resolve(self.controller.current_session().as_ref(), &self.loader.snapshot())
    }
}
