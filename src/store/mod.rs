//! Durable storage of the current session.
//!
//! The session is kept as two key-value rows, `token` and `user` (JSON), that
//! are always written and removed together inside one transaction.

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use crate::error::StorageError;
use crate::models::{Session, User};

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";

/// Persistence contract for the session pair.
pub trait SessionStorage: Send + Sync {
    /// Write token and user together. Either both are stored or neither is.
    fn persist(&self, session: &Session) -> Result<(), StorageError>;

    /// The stored session, or `None` if either half is missing or unreadable.
    fn read(&self) -> Result<Option<Session>, StorageError>;

    /// Remove both halves. Clearing an empty store is a no-op.
    fn clear(&self) -> Result<(), StorageError>;
}

pub struct SqliteSessionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSessionStore {
    pub fn open(path: PathBuf) -> Result<Self, StorageError> {
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::Path("database path has no parent directory".into()))?;
        std::fs::create_dir_all(parent).map_err(|e| StorageError::Path(e.to_string()))?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self, StorageError> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<(), StorageError> {
        schema::run_migrations(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `<data_dir>/gatekeeper/session.db`
pub fn default_path() -> Result<PathBuf, StorageError> {
    let dirs = directories::ProjectDirs::from("", "", "gatekeeper")
        .ok_or_else(|| StorageError::Path("could not determine data directory".into()))?;
    Ok(dirs.data_dir().join("session.db"))
}

impl SessionStorage for SqliteSessionStore {
    fn persist(&self, session: &Session) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(&session.user)?;
        let now = Utc::now().to_rfc3339();

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        for (key, value) in [(TOKEN_KEY, session.token.as_str()), (USER_KEY, user_json.as_str())] {
            tx.execute(
                "INSERT INTO session_kv (key, value, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                (key, value, &now),
            )?;
        }
        tx.commit()?;

        tracing::debug!(user = %session.user.email, "Session persisted");
        Ok(())
    }

    fn read(&self) -> Result<Option<Session>, StorageError> {
        let conn = self.lock();
        let get = |key: &str| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row("SELECT value FROM session_kv WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()
        };

        let token = get(TOKEN_KEY)?.filter(|t| !t.is_empty());
        let user_json = get(USER_KEY)?;

        let (Some(token), Some(user_json)) = (token, user_json) else {
            return Ok(None);
        };

        match serde_json::from_str::<User>(&user_json) {
            Ok(user) => Ok(Some(Session::new(token, user))),
            Err(e) => {
                tracing::warn!("Stored user record is unreadable, treating as signed out: {}", e);
                Ok(None)
            }
        }
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM session_kv WHERE key IN (?, ?)",
            (TOKEN_KEY, USER_KEY),
        )?;
        tx.commit()?;
        Ok(())
    }
}
