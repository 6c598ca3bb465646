use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use super::error::StorageError;

/// Recognized values of the `storage.type` selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Generic S3-compatible object storage.
    Aws,
    /// Supabase Storage through its S3-compatible endpoint.
    Supabase,
    /// Vercel Blob with public-read access.
    Vercel,
    /// Local directory, for development.
    Filesystem,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Supabase => "supabase",
            Self::Vercel => "vercel",
            Self::Filesystem => "filesystem",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aws" => Ok(Self::Aws),
            "supabase" => Ok(Self::Supabase),
            "vercel" => Ok(Self::Vercel),
            "filesystem" => Ok(Self::Filesystem),
            "" => Err(StorageError::Config("storage provider not configured".into())),
            other => Err(StorageError::Config(format!(
                "unknown storage type '{other}' (expected aws, supabase, vercel or filesystem)"
            ))),
        }
    }
}

/// Credentials for an S3-compatible bucket.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct S3Credentials {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    /// Custom endpoint URL. Required for Supabase.
    pub endpoint: Option<String>,
}

/// Vercel Blob settings.
#[derive(Debug, Deserialize, Clone)]
pub struct VercelConfig {
    /// The store's read/write token (`BLOB_READ_WRITE_TOKEN`).
    pub token: Option<String>,
    /// Blob API base URL.
    #[serde(default = "default_vercel_api_url")]
    pub api_url: String,
}

fn default_vercel_api_url() -> String {
    "https://blob.vercel-storage.com".into()
}

impl Default for VercelConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_vercel_api_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilesystemConfig {
    #[serde(default = "default_filesystem_path")]
    pub path: PathBuf,
}

fn default_filesystem_path() -> PathBuf {
    PathBuf::from("./data/media")
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            path: default_filesystem_path(),
        }
    }
}

/// Storage section of the application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Backend selector: `aws`, `supabase`, `vercel` or `filesystem`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub aws: S3Credentials,
    #[serde(default)]
    pub supabase: S3Credentials,
    #[serde(default)]
    pub vercel: VercelConfig,
    #[serde(default)]
    pub filesystem: FilesystemConfig,
    /// Largest accepted upload in bytes. Default: 32 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_max_upload_size() -> u64 {
    32 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: None,
            aws: S3Credentials::default(),
            supabase: S3Credentials::default(),
            vercel: VercelConfig::default(),
            filesystem: FilesystemConfig::default(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

/// A fully resolved S3 credential set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedS3 {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
}

/// A fully resolved Vercel Blob configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVercel {
    pub token: String,
    pub api_url: String,
}

/// The selected backend together with its complete settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Aws(ResolvedS3),
    Supabase(ResolvedS3),
    Vercel(ResolvedVercel),
    Filesystem(ResolvedFilesystem),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFilesystem {
    pub path: PathBuf,
}

impl StorageConfig {
    /// Parse the selector, if any.
    pub fn kind(&self) -> Result<StorageKind, StorageError> {
        self.kind.as_deref().unwrap_or_default().parse()
    }

    /// Resolve the selector and check that the matching credential set is complete.
    pub fn backend(&self) -> Result<BackendConfig, StorageError> {
        match self.kind()? {
            StorageKind::Aws => Ok(BackendConfig::Aws(resolve_s3(
                &self.aws,
                StorageKind::Aws,
                false,
            )?)),
            StorageKind::Supabase => Ok(BackendConfig::Supabase(resolve_s3(
                &self.supabase,
                StorageKind::Supabase,
                true,
            )?)),
            StorageKind::Vercel => {
                let token = required(&self.vercel.token, StorageKind::Vercel, "token")?;
                Ok(BackendConfig::Vercel(ResolvedVercel {
                    token,
                    api_url: self.vercel.api_url.trim_end_matches('/').to_string(),
                }))
            }
            StorageKind::Filesystem => Ok(BackendConfig::Filesystem(ResolvedFilesystem {
                path: self.filesystem.path.clone(),
            })),
        }
    }
}

fn resolve_s3(
    creds: &S3Credentials,
    kind: StorageKind,
    endpoint_required: bool,
) -> Result<ResolvedS3, StorageError> {
    let endpoint = if endpoint_required {
        Some(required(&creds.endpoint, kind, "endpoint")?)
    } else {
        creds
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok(ResolvedS3 {
        access_key_id: required(&creds.access_key_id, kind, "access_key_id")?,
        secret_access_key: required(&creds.secret_access_key, kind, "secret_access_key")?,
        bucket: required(&creds.bucket, kind, "bucket")?,
        region: required(&creds.region, kind, "region")?,
        endpoint,
    })
}

fn required(value: &Option<String>, kind: StorageKind, field: &str) -> Result<String, StorageError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(StorageError::Config(format!(
            "storage.{kind}.{field} is required when storage.type = \"{kind}\""
        ))),
    }
}
