//! Cross-context synchronization.
//!
//! A context never merges: it reloads the whole store document and replaces
//! its in-memory copy. Reloads are triggered by change notifications from
//! other stores in the same scope and, as a fallback for writers outside the
//! scope, by a fixed polling interval.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use kominukator_shared::demo_users;
use kominukator_store::DocumentStore;

use crate::error::Result;
use crate::events::{emit_event, ClientEvent};
use crate::state::{lock_state, ClientState};

/// Seed the demo users into a store that has none.
///
/// Returns `true` if the store was written. Existing messages are kept.
pub fn bootstrap(store: &dyn DocumentStore, now: DateTime<Utc>) -> Result<bool> {
    let mut doc = store.load();
    if !doc.users.is_empty() {
        return Ok(false);
    }

    doc.users = demo_users(now);
    store.save(&doc)?;
    info!(users = doc.users.len(), "Seeded empty store with demo users");
    Ok(true)
}

/// Reload the store document and replace the in-memory copy.
pub fn reconcile(
    store: &dyn DocumentStore,
    state: &Mutex<ClientState>,
    events: &broadcast::Sender<ClientEvent>,
) {
    let doc = store.load();
    let (users, messages) = (doc.users.len(), doc.messages.len());
    lock_state(state).apply(doc);
    emit_event(events, ClientEvent::Reconciled { users, messages });
}

/// A named background task that is aborted when dropped.
#[derive(Debug)]
pub struct TaskHandle {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl TaskHandle {
    pub(crate) fn new(name: &'static str, handle: JoinHandle<()>) -> Self {
        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn abort(&self) {
        if !self.handle.is_finished() {
            debug!(task = self.name, "Aborting background task");
        }
        self.handle.abort();
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn the reconciliation loop for one context.
///
/// The subscription and the timer are set up before the task starts, so a
/// save made right after this call is not missed.
pub fn spawn_sync_loop(
    store: Arc<dyn DocumentStore>,
    state: Arc<Mutex<ClientState>>,
    events: broadcast::Sender<ClientEvent>,
    poll_interval: Duration,
) -> TaskHandle {
    let mut changes = store.subscribe();
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let handle = tokio::spawn(async move {
        let mut notifications_open = true;

        info!(interval_ms = poll_interval.as_millis() as u64, "Sync loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    reconcile(store.as_ref(), &state, &events);
                }
                change = changes.recv(), if notifications_open => {
                    match change {
                        Ok(change) => {
                            debug!(key = %change.key, "Store changed, reconciling");
                            reconcile(store.as_ref(), &state, &events);
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "Change notifications lagged, reconciling");
                            reconcile(store.as_ref(), &state, &events);
                        }
                        Err(RecvError::Closed) => {
                            debug!("Change notifications closed, polling only");
                            notifications_open = false;
                        }
                    }
                }
            }
        }
    });

    TaskHandle::new("sync", handle)
}
