use common::storage::STORAGE_KEY_PREFIX_LEN;
use thiserror::Error;

use crate::error::AppError;

/// Longest accepted upload filename, in bytes. The resulting storage key
/// must still fit in a single 255-byte path component.
pub const MAX_FILENAME_LEN: usize = 255 - STORAGE_KEY_PREFIX_LEN;

/// Reasons an uploaded filename cannot become part of a storage key.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum FilenameError {
    #[error("Filename cannot be empty")]
    Empty,
    #[error("Filename must be at most {} bytes", MAX_FILENAME_LEN)]
    TooLong,
    /// `/` or `\` would turn the key into a nested path on some backends.
    #[error("Invalid filename: path separators are not allowed")]
    ContainsPathSeparator,
    /// Leading dot, which also covers `.` and `..`.
    #[error("Invalid filename: names starting with '.' are not allowed")]
    Hidden,
    /// Control characters, NUL included. These would end up in headers.
    #[error("Invalid filename: control characters are not allowed")]
    ControlCharacter,
}

impl From<FilenameError> for AppError {
    fn from(err: FilenameError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Validate the client-supplied name of an uploaded file and return it trimmed.
pub fn validate_upload_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }
    if trimmed.len() > MAX_FILENAME_LEN {
        return Err(FilenameError::TooLong);
    }
    if trimmed.chars().any(char::is_control) {
        return Err(FilenameError::ControlCharacter);
    }
    if trimmed.contains(['/', '\\']) {
        return Err(FilenameError::ContainsPathSeparator);
    }
    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}
