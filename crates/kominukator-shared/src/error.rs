use thiserror::Error;

/// Input rejected by the view before it reaches the domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Nickname is required")]
    NicknameRequired,

    #[error("Nickname must be at least {min} characters")]
    NicknameTooShort { min: usize },

    #[error("Message needs text or an attachment")]
    EmptyMessage,

    #[error("File is too large (max {}KB for this demo)", .max / 1000)]
    AttachmentTooLarge { size: u64, max: u64 },
}
