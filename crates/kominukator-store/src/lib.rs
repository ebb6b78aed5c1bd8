//! # kominukator-store
//!
//! Local persistence for the Kominukator chat demo.
//!
//! Two adapters sit on top of a plain string key-value backend:
//! - the **store document** ([`DocumentStore`]): one JSON blob holding every
//!   user and message, shared by all tabs and rewritten wholesale on each
//!   save, with a change notification broadcast to every subscriber;
//! - the **session** ([`SessionStore`]): one JSON blob per tab recording who
//!   is logged in there.
//!
//! Backends are in-memory ([`MemoryBackend`]) or a directory of files
//! ([`FileBackend`]).

pub mod backend;
pub mod document;
pub mod file;
pub mod session;

mod error;

pub use backend::{KvBackend, MemoryBackend};
pub use document::{DocumentStore, LocalStore, StorageScope, StoreChange};
pub use error::{Result, StoreError};
pub use file::FileBackend;
pub use session::{SessionSlot, SessionStore};
