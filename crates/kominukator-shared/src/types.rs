use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Opaque user identifier. Registered users get a UUID, seeded demo users
// keep their fixed short ids ("u1", "u2").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The conversation a tab is looking at.
///
/// `Global` is the shared channel every user sees; `Direct` is the two-party
/// conversation between the current user and the given peer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Channel {
    #[default]
    Global,
    Direct(UserId),
}

impl Channel {
    /// Select a channel from an optional peer id (`None` is the global channel).
    pub fn from_recipient(recipient: Option<UserId>) -> Self {
        match recipient {
            Some(peer) => Self::Direct(peer),
            None => Self::Global,
        }
    }

    /// The `recipientId` a message sent into this channel carries.
    pub fn recipient(&self) -> Option<UserId> {
        match self {
            Self::Global => None,
            Self::Direct(peer) => Some(peer.clone()),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Direct(peer) => write!(f, "direct:{peer}"),
        }
    }
}
