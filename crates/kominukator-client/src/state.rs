//! In-memory state of one client context (one tab).
//!
//! [`ClientState`] sits behind an `Arc<Mutex<>>` shared by the client and its
//! background sync task. Views never hold the lock; they read a
//! [`ChatSnapshot`] instead.

use std::sync::{Mutex, MutexGuard, PoisonError};

use kominukator_shared::{Channel, Message, StoreDocument, User, UserId};

use crate::filter::{self, ReplyPreview};

/// Mutable per-context state.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    /// The logged-in user of this context, if any.
    pub user: Option<User>,

    /// Last copy of the store document loaded or written by this context.
    pub document: StoreDocument,

    /// Conversation currently shown.
    pub active_chat: Channel,
}

impl ClientState {
    pub fn new(document: StoreDocument, user: Option<User>) -> Self {
        Self {
            user,
            document,
            active_chat: Channel::Global,
        }
    }

    /// Replace the in-memory document wholesale.
    pub fn apply(&mut self, document: StoreDocument) {
        self.document = document;
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            user: self.user.clone(),
            users: self.document.users.clone(),
            messages: self.document.messages.clone(),
            active_chat: self.active_chat.clone(),
        }
    }
}

/// Lock the shared state. A panic while holding the lock cannot leave the
/// state half-updated (every mutation is a single assignment), so poisoning
/// is ignored.
pub(crate) fn lock_state(state: &Mutex<ClientState>) -> MutexGuard<'_, ClientState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read-only copy of the state handed to views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSnapshot {
    pub user: Option<User>,
    pub users: Vec<User>,
    pub messages: Vec<Message>,
    pub active_chat: Channel,
}

impl ChatSnapshot {
    /// Renderable messages of the active chat. Empty when nobody is logged in.
    pub fn thread(&self) -> Vec<&Message> {
        match &self.user {
            Some(me) => filter::thread(&self.messages, &me.id, &self.active_chat),
            None => Vec::new(),
        }
    }

    /// Sidebar entries: every user except the current one.
    pub fn peers(&self) -> Vec<&User> {
        match &self.user {
            Some(me) => filter::direct_peers(&self.users, &me.id),
            None => self.users.iter().collect(),
        }
    }

    /// The peer of the active direct chat, if it is still a known user.
    pub fn chat_partner(&self) -> Option<&User> {
        match &self.active_chat {
            Channel::Global => None,
            Channel::Direct(peer) => self.user_by_id(peer),
        }
    }

    pub fn user_by_id(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|u| &u.id == id)
    }

    pub fn sender(&self, msg: &Message) -> Option<&User> {
        self.user_by_id(&msg.sender_id)
    }

    /// Preview of the message `msg` replies to, resolved in the full history.
    pub fn reply_preview(&self, msg: &Message) -> Option<ReplyPreview> {
        filter::reply_target(&self.messages, msg).map(|t| ReplyPreview::of(t, &self.users))
    }

    /// Whether the current user may delete `msg`.
    pub fn is_own(&self, msg: &Message) -> bool {
        self.user.as_ref().is_some_and(|me| me.id == msg.sender_id)
    }
}
