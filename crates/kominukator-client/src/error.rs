use thiserror::Error;

use kominukator_shared::ValidationError;
use kominukator_store::StoreError;

/// Errors surfaced by the chat client.
///
/// Domain no-ops (deleting someone else's message, sending nothing) are not
/// errors; they are reported through return values.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid tab name: {0}")]
    InvalidTab(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
