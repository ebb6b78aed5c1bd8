//! Channel visibility rules.
//!
//! Everything here is a pure function of the message list, the current user
//! and the selected channel, so every tab derives the same thread from the
//! same document.

use kominukator_shared::constants::REPLY_PREVIEW_CHARS;
use kominukator_shared::{Channel, Message, User, UserId};

/// Whether `msg` belongs to `channel` as seen by `me`.
///
/// Global messages have no recipient. A direct thread holds exactly the
/// messages exchanged between `me` and the peer, in either direction.
pub fn is_visible(msg: &Message, me: &UserId, channel: &Channel) -> bool {
    match channel {
        Channel::Global => msg.recipient_id.is_none(),
        Channel::Direct(peer) => match &msg.recipient_id {
            Some(recipient) => {
                (&msg.sender_id == me && recipient == peer)
                    || (&msg.sender_id == peer && recipient == me)
            }
            None => false,
        },
    }
}

/// Messages of the selected channel that have something to show, in stored
/// (chronological) order.
pub fn thread<'a>(messages: &'a [Message], me: &UserId, channel: &Channel) -> Vec<&'a Message> {
    messages
        .iter()
        .filter(|m| is_visible(m, me, channel) && m.has_content())
        .collect()
}

/// The message `msg` replies to, looked up in the full history.
///
/// `None` when the message is not a reply or its target has been deleted.
pub fn reply_target<'a>(messages: &'a [Message], msg: &Message) -> Option<&'a Message> {
    let target = msg.reply_to_id.as_ref()?;
    messages.iter().find(|m| &m.id == target)
}

/// Everyone except the current user, as listed in the sidebar.
pub fn direct_peers<'a>(users: &'a [User], me: &UserId) -> Vec<&'a User> {
    users.iter().filter(|u| &u.id != me).collect()
}

/// Quoted header shown above a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPreview {
    pub sender_id: UserId,
    /// `None` if the quoted author is no longer in the user list.
    pub sender_name: Option<String>,
    pub excerpt: String,
}

impl ReplyPreview {
    pub fn of(target: &Message, users: &[User]) -> Self {
        Self {
            sender_id: target.sender_id.clone(),
            sender_name: users
                .iter()
                .find(|u| u.id == target.sender_id)
                .map(|u| u.nickname.clone()),
            excerpt: excerpt(target),
        }
    }
}

/// "[Attachment]" for attachments, else the first characters of the text.
pub fn excerpt(msg: &Message) -> String {
    if msg.attachment.is_some() {
        return "[Attachment]".to_string();
    }
    msg.text().chars().take(REPLY_PREVIEW_CHARS).collect()
}
