use uuid::Uuid;
use uuid::fmt::Hyphenated;

/// Bytes a storage key adds in front of the filename.
pub const STORAGE_KEY_PREFIX_LEN: usize = Hyphenated::LENGTH + 1;

/// Storage key for a media record: the record id followed by the original
/// filename, so the extension survives in the blob backend.
pub fn storage_key(id: &Uuid, filename: &str) -> String {
    format!("{id}-{filename}")
}
