use serde::{Deserialize, Serialize};

/// A server-controlled switch gating an optional affordance.
///
/// `key` is the stable identifier used for capability lookups; `name` and
/// `description` are for display only. The client never mutates a flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlag {
    #[serde(deserialize_with = "super::string_or_number")]
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub enabled: bool,
}

impl FeatureFlag {
    pub fn status_label(&self) -> &'static str {
        if self.enabled {
            "ON"
        } else {
            "OFF"
        }
    }

    /// Description for list display, falling back to the key.
    pub fn summary(&self) -> &str {
        self.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(&self.key)
    }
}

/// Whether `key` names an enabled flag in `flags`. Absent keys are disabled.
pub fn flag_enabled(flags: &[FeatureFlag], key: &str) -> bool {
    flags.iter().any(|f| f.key == key && f.enabled)
}
