//! Session and capability engine for a feature-flagged client.
//!
//! - [`store`]: durable persistence of the session pair
//! - [`gateway`]: the remote API
//! - [`session`]: login/logout state machine
//! - [`sync`]: coalesced loading of feature flags and the announcement
//! - [`capability`]: derivation of the view model from role, flags and load state
//! - [`app`]: all of the above behind one facade

pub mod app;
pub mod capability;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod session;
pub mod store;
pub mod sync;

pub use app::Gatekeeper;
