//! Per-tab "who am I" slot.
//!
//! Unlike the store document, a session slot is private to one execution
//! context. Each tab owns its own backend; nothing is broadcast.

use kominukator_shared::User;
use tracing::warn;

use crate::backend::{KvBackend, MemoryBackend};
use crate::error::Result;

pub trait SessionStore: Send + Sync {
    /// The saved session user, if any. Unreadable data counts as no session.
    fn load(&self) -> Option<User>;
    fn save(&self, user: &User) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SessionSlot<B> {
    backend: B,
    key: String,
}

impl<B: KvBackend> SessionSlot<B> {
    pub fn new(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }
}

impl SessionSlot<MemoryBackend> {
    /// A session that lives only as long as this value (a fresh tab).
    pub fn ephemeral(key: impl Into<String>) -> Self {
        Self::new(MemoryBackend::new(), key)
    }
}

impl<B: KvBackend> SessionStore for SessionSlot<B> {
    fn load(&self) -> Option<User> {
        let raw = match self.backend.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read session slot");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(key = %self.key, error = %e, "corrupt session, ignoring");
                None
            }
        }
    }

    fn save(&self, user: &User) -> Result<()> {
        let raw = serde_json::to_string(user)?;
        self.backend.set_item(&self.key, &raw)
    }

    fn clear(&self) -> Result<()> {
        self.backend.remove_item(&self.key)
    }
}
