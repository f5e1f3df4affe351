use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The server-wide announcement. At most one is live per fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub message: String,
    pub active: bool,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Announcement {
    /// The announcement if it should be surfaced, otherwise `None`.
    pub fn visible(&self) -> Option<&Self> {
        self.active.then_some(self)
    }
}
