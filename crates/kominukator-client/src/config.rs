//! Client configuration loaded from environment variables.
//!
//! All settings have defaults so a tab can start with zero configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;

use kominukator_shared::constants::{
    HEARTBEAT_INTERVAL_SECS, MAX_ATTACHMENT_SIZE, SESSION_KEY, STORE_KEY, SYNC_POLL_INTERVAL_MS,
};

use crate::error::{ClientError, Result};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Directory holding the shared store slot and per-tab session slots.
    /// Env: `KOMINUKATOR_DATA_DIR`
    /// Default: platform data directory, else `./kominukator-data`
    pub data_dir: PathBuf,

    /// Slot name of the shared store document.
    /// Env: `KOMINUKATOR_STORE_KEY`
    pub store_key: String,

    /// Slot name of the per-tab session.
    /// Env: `KOMINUKATOR_SESSION_KEY`
    pub session_key: String,

    /// Fallback reconciliation interval.
    /// Env: `KOMINUKATOR_POLL_INTERVAL_MS`
    pub poll_interval: Duration,

    /// Presence heartbeat interval.
    /// Env: `KOMINUKATOR_HEARTBEAT_SECS`
    pub heartbeat_interval: Duration,

    /// Largest file the view turns into an attachment.
    /// Env: `KOMINUKATOR_MAX_ATTACHMENT_BYTES`
    pub max_attachment_bytes: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store_key: STORE_KEY.to_string(),
            session_key: SESSION_KEY.to_string(),
            poll_interval: Duration::from_millis(SYNC_POLL_INTERVAL_MS),
            heartbeat_interval: Duration::from_secs(HEARTBEAT_INTERVAL_SECS),
            max_attachment_bytes: MAX_ATTACHMENT_SIZE,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("KOMINUKATOR_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }

        if let Some(key) = lookup("KOMINUKATOR_STORE_KEY") {
            if !key.trim().is_empty() {
                config.store_key = key;
            }
        }

        if let Some(key) = lookup("KOMINUKATOR_SESSION_KEY") {
            if !key.trim().is_empty() {
                config.session_key = key;
            }
        }

        if let Some(val) = lookup("KOMINUKATOR_POLL_INTERVAL_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => config.poll_interval = Duration::from_millis(ms),
                _ => tracing::warn!(
                    value = %val,
                    "Invalid KOMINUKATOR_POLL_INTERVAL_MS, using default"
                ),
            }
        }

        if let Some(val) = lookup("KOMINUKATOR_HEARTBEAT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.heartbeat_interval = Duration::from_secs(secs),
                _ => tracing::warn!(
                    value = %val,
                    "Invalid KOMINUKATOR_HEARTBEAT_SECS, using default"
                ),
            }
        }

        if let Some(val) = lookup("KOMINUKATOR_MAX_ATTACHMENT_BYTES") {
            match val.parse::<u64>() {
                Ok(n) => config.max_attachment_bytes = n,
                Err(_) => tracing::warn!(
                    value = %val,
                    "Invalid KOMINUKATOR_MAX_ATTACHMENT_BYTES, using default"
                ),
            }
        }

        config
    }

    /// Directory of the shared store slot.
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    /// Directory of the session slot belonging to `tab`.
    pub fn tab_dir(&self, tab: &str) -> Result<PathBuf> {
        if tab.is_empty()
            || tab.contains('/')
            || tab.contains('\\')
            || tab.contains("..")
            || tab.starts_with('.')
        {
            return Err(ClientError::InvalidTab(tab.to_string()));
        }
        Ok(self.data_dir.join("tabs").join(tab))
    }
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "kominukator", "kominukator")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| Path::new("kominukator-data").to_path_buf())
}
