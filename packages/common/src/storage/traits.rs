use async_trait::async_trait;

use super::error::StorageError;

/// Operations shared by every blob backend, whatever payload it accepts.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Short backend name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Remove the payload stored under `key`.
    ///
    /// Removing a key that does not exist is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// A backend that stores raw bytes.
#[async_trait]
pub trait RawBlobBackend: BlobBackend {
    async fn put_raw(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Returns `None` when nothing is stored under `key`.
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
}

/// A backend that only stores text values.
///
/// Binary payloads reach it base64-encoded through [`MediaStore`](super::MediaStore).
#[async_trait]
pub trait TextBlobBackend: BlobBackend {
    async fn put_text(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Returns `None` when nothing is stored under `key`.
    async fn get_text(&self, key: &str) -> Result<Option<String>, StorageError>;
}
