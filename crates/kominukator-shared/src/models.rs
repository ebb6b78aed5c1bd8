//! Domain model persisted in the shared store document.
//!
//! Field names follow the camelCase JSON shape written by every tab, so a
//! document produced by one context can be read back by any other.

use chrono::{DateTime, Duration, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{DEFAULT_AVATAR_COLOR, DEFAULT_AVATAR_EMOJI};
use crate::types::{Channel, MessageId, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// Emoji-on-a-colored-disc avatar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Avatar {
    pub emoji: String,
    pub color: String,
}

impl Avatar {
    pub fn new(emoji: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            emoji: emoji.into(),
            color: color.into(),
        }
    }
}

impl Default for Avatar {
    fn default() -> Self {
        Self::new(DEFAULT_AVATAR_EMOJI, DEFAULT_AVATAR_COLOR)
    }
}

/// A registered user. The nickname is the login key and is unique within
/// the store (first registration wins).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub nickname: String,
    #[serde(default)]
    pub avatar: Avatar,
    /// Refreshed by login and by the presence heartbeat.
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
}

impl User {
    /// Build a freshly registered user with a new unique id.
    pub fn register(nickname: impl Into<String>, avatar: Avatar, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::generate(),
            nickname: nickname.into(),
            avatar,
            last_active: Some(now),
        }
    }
}

/// The two demo users written into an empty store on first start.
pub fn demo_users(now: DateTime<Utc>) -> Vec<User> {
    vec![
        User {
            id: UserId::from("u1"),
            nickname: "Alice".to_string(),
            avatar: Avatar::new("👩", "#E91E63"),
            last_active: Some(now),
        },
        User {
            id: UserId::from("u2"),
            nickname: "Bob".to_string(),
            avatar: Avatar::new("👨", "#2196F3"),
            last_active: Some(now - Duration::hours(2)),
        },
    ]
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    File,
}

impl AttachmentKind {
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image/") {
            Self::Image
        } else {
            Self::File
        }
    }
}

/// A file carried inline as a data URI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub name: String,
    pub url: String,
}

/// Recorded on every message; there is no delivery or read-receipt tracking.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Sent,
}

impl<'de> Deserialize<'de> for MessageStatus {
    // Any recorded value reads as sent, whatever client wrote it.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer)?;
        Ok(Self::Sent)
    }
}

/// A single chat message.
///
/// `recipient_id` is `None` for the global channel. `reply_to_id` is a weak
/// reference: the target may have been deleted since.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    #[serde(default)]
    pub recipient_id: Option<UserId>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachment: Option<Attachment>,
    #[serde(default)]
    pub reply_to_id: Option<MessageId>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: MessageStatus,
}

impl Message {
    /// Build a new outgoing message from `sender` into `channel`.
    pub fn compose(
        sender: UserId,
        channel: &Channel,
        text: Option<String>,
        reply_to_id: Option<MessageId>,
        attachment: Option<Attachment>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            sender_id: sender,
            recipient_id: channel.recipient(),
            text,
            attachment,
            reply_to_id,
            timestamp: now,
            status: MessageStatus::Sent,
        }
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// A message needs non-empty text or an attachment to be shown.
    pub fn has_content(&self) -> bool {
        !self.text().is_empty() || self.attachment.is_some()
    }

    pub fn is_global(&self) -> bool {
        self.recipient_id.is_none()
    }
}

// ---------------------------------------------------------------------------
// Store document
// ---------------------------------------------------------------------------

/// The whole persisted state, read and rewritten as one unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreDocument {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl StoreDocument {
    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|u| &u.id == id)
    }

    pub fn user_mut(&mut self, id: &UserId) -> Option<&mut User> {
        self.users.iter_mut().find(|u| &u.id == id)
    }

    pub fn user_by_nickname(&self, nickname: &str) -> Option<&User> {
        self.users.iter().find(|u| u.nickname == nickname)
    }

    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }
}
