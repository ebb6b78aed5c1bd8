//! Input checks the view runs before calling into [`ChatClient`](crate::ChatClient).
//!
//! The domain operations themselves only guard against empty sends; the
//! nickname length and attachment ceiling live here, on the view side.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::seq::SliceRandom;
use rand::Rng;

use kominukator_shared::constants::{DEFAULT_EMOJIS, MIN_NICKNAME_LEN, PRESET_COLORS};
use kominukator_shared::{Attachment, AttachmentKind, Avatar, ValidationError};

use crate::error::Result;

/// Trim and check a nickname typed into the login form.
pub fn validate_nickname(raw: &str) -> std::result::Result<String, ValidationError> {
    let nickname = raw.trim();
    if nickname.is_empty() {
        return Err(ValidationError::NicknameRequired);
    }
    if nickname.chars().count() < MIN_NICKNAME_LEN {
        return Err(ValidationError::NicknameTooShort {
            min: MIN_NICKNAME_LEN,
        });
    }
    Ok(nickname.to_string())
}

/// Check composer input. Returns the text as typed (or `None` when blank),
/// refusing a send that carries neither text nor an attachment.
pub fn validate_compose(
    text: &str,
    attachment: Option<&Attachment>,
) -> std::result::Result<Option<String>, ValidationError> {
    let blank = text.trim().is_empty();
    if blank && attachment.is_none() {
        return Err(ValidationError::EmptyMessage);
    }
    Ok((!blank).then(|| text.to_string()))
}

/// Inline `bytes` as a data-URI attachment.
pub fn attachment_from_bytes(
    name: &str,
    mime: &str,
    bytes: &[u8],
    max_bytes: u64,
) -> std::result::Result<Attachment, ValidationError> {
    let size = bytes.len() as u64;
    if size > max_bytes {
        return Err(ValidationError::AttachmentTooLarge {
            size,
            max: max_bytes,
        });
    }
    Ok(Attachment {
        kind: AttachmentKind::from_mime(mime),
        name: name.to_string(),
        url: format!("data:{mime};base64,{}", STANDARD.encode(bytes)),
    })
}

/// Read a file from disk into an attachment. The size is checked before the
/// file is read.
pub fn attachment_from_file(path: &Path, max_bytes: u64) -> Result<Attachment> {
    let size = std::fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(ValidationError::AttachmentTooLarge {
            size,
            max: max_bytes,
        }
        .into());
    }

    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    let mime = mime_for_name(&name);

    tracing::debug!(name = %name, mime, size, "Attachment loaded");
    Ok(attachment_from_bytes(&name, mime, &bytes, max_bytes)?)
}

/// Guess a MIME type from a file extension.
pub fn mime_for_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Pick a random emoji and color from the picker presets.
pub fn random_avatar<R: Rng + ?Sized>(rng: &mut R) -> Avatar {
    let emoji = DEFAULT_EMOJIS.choose(rng).copied().unwrap_or("😀");
    let color = PRESET_COLORS.choose(rng).copied().unwrap_or("#42A5F5");
    Avatar::new(emoji, color)
}
