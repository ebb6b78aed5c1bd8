//! Plain-text rendering of a [`ChatSnapshot`].

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, Utc};

use kominukator_client::{ChatSnapshot, PresenceStatus};
use kominukator_shared::{AttachmentKind, Channel, Message};

pub(crate) fn format_time(ts: DateTime<Utc>, offset: &FixedOffset) -> String {
    ts.with_timezone(offset).format("%H:%M").to_string()
}

/// Title of the active chat.
pub(crate) fn chat_title(snapshot: &ChatSnapshot) -> String {
    match &snapshot.active_chat {
        Channel::Global => "Global chat".to_string(),
        Channel::Direct(peer) => match snapshot.chat_partner() {
            Some(user) => format!("{} {}", user.avatar.emoji, user.nickname),
            None => format!("Unknown user {}", peer.short()),
        },
    }
}

pub(crate) fn render_sidebar(snapshot: &ChatSnapshot, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Users ({})", snapshot.users.len());

    let marker = |active: bool| if active { '*' } else { ' ' };
    let _ = writeln!(
        out,
        "{} 🌍 Global chat",
        marker(snapshot.active_chat.is_global())
    );

    for user in snapshot.peers() {
        let status = PresenceStatus::of(user.last_active, now);
        let active = snapshot.active_chat == Channel::Direct(user.id.clone());
        let dot = if status.is_active() { "●" } else { "○" };
        let _ = writeln!(
            out,
            "{} {} {} {} ({})",
            marker(active),
            dot,
            user.avatar.emoji,
            user.nickname,
            status.label()
        );
    }
    out
}

fn render_message(out: &mut String, snapshot: &ChatSnapshot, msg: &Message, offset: &FixedOffset) {
    let sender = snapshot
        .sender(msg)
        .map(|u| format!("{} {}", u.avatar.emoji, u.nickname))
        .unwrap_or_else(|| "Unknown".to_string());
    let own = if snapshot.is_own(msg) { " (yours, deletable)" } else { "" };

    let _ = writeln!(
        out,
        "[{}] {}  #{}{}",
        format_time(msg.timestamp, offset),
        sender,
        msg.id,
        own
    );

    if let Some(preview) = snapshot.reply_preview(msg) {
        let name = preview.sender_name.as_deref().unwrap_or("Unknown");
        let _ = writeln!(out, "    > {}: {}", name, preview.excerpt);
    }
    if let Some(attachment) = &msg.attachment {
        let kind = match attachment.kind {
            AttachmentKind::Image => "image",
            AttachmentKind::File => "file",
        };
        let _ = writeln!(out, "    [{}] {}", kind, attachment.name);
    }
    if !msg.text().is_empty() {
        for line in msg.text().lines() {
            let _ = writeln!(out, "    {line}");
        }
    }
}

pub(crate) fn render_thread(snapshot: &ChatSnapshot, offset: &FixedOffset) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", chat_title(snapshot));

    let thread = snapshot.thread();
    if thread.is_empty() {
        let _ = writeln!(out, "No messages yet.");
        return out;
    }
    for msg in thread {
        render_message(&mut out, snapshot, msg, offset);
    }
    out
}
