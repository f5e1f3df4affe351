//! Derivation of what the signed-in user may see and do.
//!
//! [`resolve`] is a pure function of the session and the loader's snapshot.
//! It is cheap and is meant to be called again after every state change.

use serde::Serialize;

use crate::models::{flag_enabled, Announcement, FeatureFlag, Role, Session};
use crate::sync::SyncSnapshot;

/// Flag controlling the beta screen entry point.
pub const BETA_SCREEN: &str = "betaScreen";
/// Flag controlling the admin-only action.
pub const ADMIN_BUTTON: &str = "adminButton";

/// Read-only view model consumed by presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapabilityView {
    pub can_open_beta_screen: bool,
    pub can_use_admin_action: bool,
    pub visible_announcement: Option<Announcement>,
    pub loading: bool,
    pub refreshing: bool,
    pub error: Option<String>,
}

pub fn can_open_beta_screen(flags: &[FeatureFlag]) -> bool {
    flag_enabled(flags, BETA_SCREEN)
}

/// Requires both the admin role and the `adminButton` flag.
pub fn can_use_admin_action(role: &Role, flags: &[FeatureFlag]) -> bool {
    role.is_admin() && flag_enabled(flags, ADMIN_BUTTON)
}

pub fn resolve(session: Option<&Session>, sync: &SyncSnapshot) -> CapabilityView {
    let loading = sync.is_loading();
    let refreshing = sync.refreshing;
    let error = sync.error.clone();

    let Some(session) = session else {
        return CapabilityView {
            loading,
            refreshing,
            error,
            ..CapabilityView::default()
        };
    };

    CapabilityView {
        can_open_beta_screen: can_open_beta_screen(&sync.flags),
        can_use_admin_action: can_use_admin_action(session.role(), &sync.flags),
        visible_announcement: sync
            .announcement
            .as_ref()
            .and_then(Announcement::visible)
            .cloned(),
        loading,
        refreshing,
        error,
    }
}
