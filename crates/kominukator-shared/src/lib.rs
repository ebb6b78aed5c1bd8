//! # kominukator-shared
//!
//! Data model shared by every crate in the workspace: users, messages,
//! attachments, the store document they live in, and the constants that
//! govern intervals and input limits.

pub mod constants;
pub mod error;
pub mod models;
pub mod types;

pub use error::ValidationError;
pub use models::*;
pub use types::{Channel, MessageId, UserId};
