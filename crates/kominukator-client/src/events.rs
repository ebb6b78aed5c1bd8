use tokio::sync::broadcast;

use kominukator_shared::{Channel, UserId};

/// Notifications for the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The in-memory document was replaced with a freshly loaded copy.
    Reconciled { users: usize, messages: usize },
    LoggedIn { user_id: UserId },
    LoggedOut,
    ChatSelected(Channel),
}

pub(crate) fn emit_event(tx: &broadcast::Sender<ClientEvent>, event: ClientEvent) {
    // Having no listener is the normal case for headless use.
    if let Err(e) = tx.send(event) {
        tracing::trace!(event = ?e.0, "no event listeners");
    }
}
