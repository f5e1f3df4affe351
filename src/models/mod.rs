//! Domain models for Gatekeeper.
//!
//! # Core Concepts
//!
//! ## Persisted
//!
//! - [`Session`]: The paired token and [`User`] produced by a successful login.
//!   Token and user are always written and cleared together.
//!
//! ## Fetched per load cycle
//!
//! - [`FeatureFlag`]: Server-controlled boolean switch, looked up by `key`.
//! - [`Announcement`]: At most one live message, shown only while `active`.
//!
//! ## Derived
//!
//! - [`Role`]: Drives which flag-gated affordances apply. [`Role::badge`] maps
//!   each variant to its display attributes.

mod announcement;
mod auth;
mod feature;
mod role;
mod session;

pub use announcement::*;
pub use auth::*;
pub use feature::*;
pub use role::*;
pub use session::*;

use serde::{Deserialize, Deserializer};

/// Accept identifiers sent either as JSON strings or numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
