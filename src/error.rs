//! Error taxonomy shared by the store, gateway, controller and loader.

use thiserror::Error;

/// Message surfaced when a request produced no response at all.
pub const CONNECTIVITY_MESSAGE: &str = "Unable to reach server";

/// Failure raised by the remote gateway.
///
/// `Display` is the user-facing message: the response body's `error` field
/// when present, otherwise a status-based message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("{0}")]
    Connectivity(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Local persistence failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session storage failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Session storage unavailable: {0}")]
    Path(String),
}

/// Failure of a login or session transition.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(String),

    /// Credential exchange rejected; the gateway message is kept verbatim.
    #[error("{0}")]
    Auth(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Already signed in")]
    AlreadyAuthenticated,

    #[error("Sign-in already in progress")]
    LoginInProgress,

    /// A logout arrived while the credential exchange was in flight.
    #[error("Signed out during sign-in")]
    SignedOutDuringLogin,
}

/// Failure of a feature/announcement load cycle.
///
/// Cloneable so every caller coalesced onto one cycle receives the same error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct SyncError {
    pub message: String,
}

impl From<GatewayError> for SyncError {
    fn from(e: GatewayError) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}
