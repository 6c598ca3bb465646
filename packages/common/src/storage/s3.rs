use async_trait::async_trait;
use ::s3::creds::Credentials;
use ::s3::error::S3Error;
use ::s3::{Bucket, Region};
use tracing::warn;

use super::config::ResolvedS3;
use super::error::StorageError;
use super::traits::{BlobBackend, RawBlobBackend};

/// S3-compatible object storage backend.
///
/// Serves both plain AWS buckets and S3-compatible services with their own
/// endpoint conventions (Supabase Storage).
pub struct S3BlobBackend {
    bucket: Box<Bucket>,
    name: &'static str,
}

impl S3BlobBackend {
    /// AWS S3, virtual-hosted addressing. An endpoint, when given, overrides
    /// the regional default.
    pub fn aws(creds: &ResolvedS3) -> Result<Self, StorageError> {
        let region = match &creds.endpoint {
            Some(endpoint) => Region::Custom {
                region: creds.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => creds
                .region
                .parse()
                .map_err(|e| StorageError::Config(format!("invalid AWS region: {e}")))?,
        };
        Self::build("aws", creds, region, false)
    }

    /// Supabase Storage through its S3 endpoint, e.g.
    /// `https://<ref>.supabase.co/storage/v1/s3`. Requires path-style addressing.
    pub fn supabase(creds: &ResolvedS3) -> Result<Self, StorageError> {
        let endpoint = creds
            .endpoint
            .clone()
            .ok_or_else(|| StorageError::Config("supabase endpoint is required".into()))?;
        let region = Region::Custom {
            region: creds.region.clone(),
            endpoint,
        };
        Self::build("supabase", creds, region, true)
    }

    fn build(
        name: &'static str,
        creds: &ResolvedS3,
        region: Region,
        path_style: bool,
    ) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            Some(&creds.access_key_id),
            Some(&creds.secret_access_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(format!("invalid {name} credentials: {e}")))?;

        let mut bucket = Bucket::new(&creds.bucket, region, credentials)
            .map_err(|e| StorageError::Config(format!("invalid {name} bucket: {e}")))?;
        if path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self { bucket, name })
    }
}

fn object_path(key: &str) -> String {
    format!("/{key}")
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[async_trait]
impl BlobBackend for S3BlobBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self.bucket.delete_object(object_path(key)).await {
            Ok(response) if is_success(response.status_code()) || response.status_code() == 404 => {
                Ok(())
            }
            Ok(response) => Err(StorageError::backend(
                self.name,
                format!("DELETE {key} returned HTTP {}", response.status_code()),
            )),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(()),
            Err(e) => Err(StorageError::backend(self.name, e)),
        }
    }
}

#[async_trait]
impl RawBlobBackend for S3BlobBackend {
    async fn put_raw(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let response = self
            .bucket
            .put_object(object_path(key), data)
            .await
            .map_err(|e| StorageError::backend(self.name, e))?;

        if !is_success(response.status_code()) {
            warn!(
                backend = self.name,
                status = response.status_code(),
                key,
                "Object upload rejected"
            );
            return Err(StorageError::backend(
                self.name,
                format!("PUT {key} returned HTTP {}", response.status_code()),
            ));
        }
        Ok(())
    }

    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match self.bucket.get_object(object_path(key)).await {
            Ok(response) if is_success(response.status_code()) => {
                Ok(Some(response.bytes().to_vec()))
            }
            Ok(response) if response.status_code() == 404 => Ok(None),
            Ok(response) => Err(StorageError::backend(
                self.name,
                format!("GET {key} returned HTTP {}", response.status_code()),
            )),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(None),
            Err(e) => Err(StorageError::backend(self.name, e)),
        }
    }
}
