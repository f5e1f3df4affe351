use serde::{Deserialize, Serialize};

/// The role attached to an authenticated user.
///
/// - `User`: Default role, no elevated affordances
/// - `Manager`: Elevated role, currently no extra affordances
/// - `Admin`: May use admin-only actions when their controlling flag is on
/// - `Unknown`: Any role string this client does not recognise
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Manager,
    Admin,
    #[serde(other)]
    Unknown,
}

/// Display attributes for a role label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleBadge {
    pub label: &'static str,
    /// Hex RGB color.
    pub color: &'static str,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Manager => "manager",
            Self::Admin => "admin",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn badge(&self) -> RoleBadge {
        let color = match self {
            Self::Admin => "#8b5cf6",
            Self::Manager => "#3b82f6",
            Self::User | Self::Unknown => "#64748b",
        };
        RoleBadge {
            label: self.as_str(),
            color,
        }
    }
}
