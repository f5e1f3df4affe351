use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::session::DEFAULT_PERSIST_ATTEMPTS;

const APP_NAME: &str = "gatekeeper";
const CONFIG_FILE: &str = "config.json";

/// Default API location for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:4000";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote API (from GATEKEEPER_API_URL)
    pub api_url: String,
    /// Session database location (from GATEKEEPER_DB). Defaults to the
    /// platform data directory.
    pub database_path: Option<PathBuf>,
    /// Attempts made to persist a freshly issued session before the login
    /// is reported as failed.
    pub persist_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            database_path: None,
            persist_attempts: DEFAULT_PERSIST_ATTEMPTS,
        }
    }
}

impl Config {
    /// Load from the user's config directory, then apply environment
    /// overrides. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        let mut config = match get_config_path() {
            Ok(path) => Self::load_from(&path)?,
            Err(e) => {
                tracing::debug!("No config directory, using defaults: {}", e);
                Self::default()
            }
        };
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("GATEKEEPER_API_URL") {
            if !url.trim().is_empty() {
                self.api_url = url.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("GATEKEEPER_DB") {
            if !path.trim().is_empty() {
                self.database_path = Some(PathBuf::from(path.trim()));
            }
        }
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
