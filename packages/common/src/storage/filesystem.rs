use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::traits::{BlobBackend, RawBlobBackend};

/// Filesystem-backed blob store for local development.
///
/// Each key maps to one file directly under `base_path`. Writes go through a
/// temporary file in `{base_path}/.tmp` and are renamed into place.
pub struct FilesystemBlobBackend {
    base_path: PathBuf,
}

impl FilesystemBlobBackend {
    /// Create the backend, creating `base_path` if needed.
    pub async fn new(base_path: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self { base_path })
    }

    /// Map a key onto a file path. Keys must be flat names.
    fn blob_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty()
            || key.starts_with('.')
            || key.contains('/')
            || key.contains('\\')
            || key.contains('\0')
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(key))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl BlobBackend for FilesystemBlobBackend {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let blob_path = self.blob_path(key)?;
        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl RawBlobBackend for FilesystemBlobBackend {
    async fn put_raw(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let blob_path = self.blob_path(key)?;

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let blob_path = self.blob_path(key)?;
        match fs::read(&blob_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
