use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use kominukator_shared::UserId;
use kominukator_store::DocumentStore;

use crate::clock::Clock;
use crate::error::Result;
use crate::sync::TaskHandle;

/// Stamp `user_id` as active at `now` and persist the document.
///
/// Returns `false` without writing if the user is not in the store.
pub fn beat(store: &dyn DocumentStore, user_id: &UserId, now: DateTime<Utc>) -> Result<bool> {
    let mut doc = store.load();
    let Some(user) = doc.user_mut(user_id) else {
        debug!(user = %user_id.short(), "Heartbeat skipped, user not in store");
        return Ok(false);
    };
    user.last_active = Some(now);
    store.save(&doc)?;
    debug!(user = %user_id.short(), "Heartbeat");
    Ok(true)
}

/// Spawn the presence heartbeat for `user_id`. The first beat fires one
/// period after the call; login already stamped the user.
pub fn spawn_heartbeat(
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    user_id: UserId,
    period: Duration,
) -> TaskHandle {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let handle = tokio::spawn(async move {
        loop {
            ticker.tick().await;
            if let Err(e) = beat(store.as_ref(), &user_id, clock.now()) {
                warn!(user = %user_id.short(), error = %e, "Heartbeat write failed");
            }
        }
    });

    TaskHandle::new("heartbeat", handle)
}
