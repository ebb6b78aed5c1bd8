//! # kominukator-client
//!
//! Client core of one chat context: session handling, the domain operations
//! (login, logout, chat selection, send, delete), the background sync loop
//! that keeps the in-memory copy of the shared store fresh, and the presence
//! heartbeat.

pub mod client;
pub mod clock;
pub mod config;
pub mod events;
pub mod filter;
pub mod heartbeat;
pub mod input;
pub mod presence;
pub mod state;
pub mod sync;

mod error;

use tracing_subscriber::{fmt, EnvFilter};

pub use client::ChatClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use events::ClientEvent;
pub use filter::ReplyPreview;
pub use presence::PresenceStatus;
pub use state::{ChatSnapshot, ClientState};
pub use sync::TaskHandle;

const DEFAULT_FILTER: &str = "kominukator_client=info,kominukator_store=info,kominukator=info,warn";

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default
/// filter. Logs go to stderr so they never mix with rendered output.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
