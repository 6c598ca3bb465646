use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, instrument};

use super::config::{BackendConfig, StorageConfig};
use super::error::StorageError;
use super::filesystem::FilesystemBlobBackend;
use super::s3::S3BlobBackend;
use super::traits::{RawBlobBackend, TextBlobBackend};
use super::vercel::VercelBlobBackend;

#[derive(Clone)]
enum Driver {
    Raw(Arc<dyn RawBlobBackend>),
    Text(Arc<dyn TextBlobBackend>),
}

/// Byte-oriented put/get/delete facade over the configured blob backend.
///
/// Backends that only hold text receive base64-encoded payloads; callers see
/// the same contract either way. Cloning is cheap and clones share the backend.
#[derive(Clone)]
pub struct MediaStore {
    driver: Driver,
}

impl MediaStore {
    /// Wrap a backend that stores raw bytes.
    pub fn raw<B: RawBlobBackend + 'static>(backend: Arc<B>) -> Self {
        Self {
            driver: Driver::Raw(backend),
        }
    }

    /// Wrap a text-only backend; payloads go through base64.
    pub fn text<B: TextBlobBackend + 'static>(backend: Arc<B>) -> Self {
        Self {
            driver: Driver::Text(backend),
        }
    }

    /// Build the store selected by `config`.
    ///
    /// Fails when the selector is unset or unknown, or when the selected
    /// backend's credentials are incomplete.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let store = match config.backend()? {
            BackendConfig::Aws(creds) => Self::raw(Arc::new(S3BlobBackend::aws(&creds)?)),
            BackendConfig::Supabase(creds) => {
                Self::raw(Arc::new(S3BlobBackend::supabase(&creds)?))
            }
            BackendConfig::Vercel(vercel) => Self::text(Arc::new(VercelBlobBackend::new(&vercel)?)),
            BackendConfig::Filesystem(fs) => {
                Self::raw(Arc::new(FilesystemBlobBackend::new(fs.path.clone()).await?))
            }
        };
        Ok(store)
    }

    /// Name of the active backend.
    pub fn backend_name(&self) -> &'static str {
        match &self.driver {
            Driver::Raw(backend) => backend.name(),
            Driver::Text(backend) => backend.name(),
        }
    }

    /// Whether payloads are stored as base64 text.
    pub fn encodes_as_text(&self) -> bool {
        matches!(self.driver, Driver::Text(_))
    }

    #[instrument(skip(self, data), fields(backend = self.backend_name(), size = data.len()))]
    pub async fn put(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        match &self.driver {
            Driver::Raw(backend) => backend.put_raw(key, data).await,
            Driver::Text(backend) => {
                debug!("Encoding payload as base64 text");
                backend.put_text(key, &STANDARD.encode(data)).await
            }
        }
    }

    /// Read back the bytes stored under `key`, or `None` if nothing is there.
    #[instrument(skip(self), fields(backend = self.backend_name()))]
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match &self.driver {
            Driver::Raw(backend) => backend.get_raw(key).await,
            Driver::Text(backend) => {
                let Some(text) = backend.get_text(key).await? else {
                    return Ok(None);
                };
                STANDARD
                    .decode(text.trim())
                    .map(Some)
                    .map_err(|e| StorageError::Corrupt {
                        key: key.to_string(),
                        message: e.to_string(),
                    })
            }
        }
    }

    /// Remove the payload under `key`. Absent keys are not an error.
    #[instrument(skip(self), fields(backend = self.backend_name()))]
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match &self.driver {
            Driver::Raw(backend) => backend.remove(key).await,
            Driver::Text(backend) => backend.remove(key).await,
        }
    }
}

impl std::fmt::Debug for MediaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStore")
            .field("backend", &self.backend_name())
            .field("text_encoded", &self.encodes_as_text())
            .finish()
    }
}
