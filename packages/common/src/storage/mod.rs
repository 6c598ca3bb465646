mod config;
mod error;
mod key;
mod store;
mod traits;

pub mod filesystem;
pub mod memory;
pub mod s3;
pub mod vercel;

pub use config::{
    BackendConfig, FilesystemConfig, ResolvedFilesystem, ResolvedS3, ResolvedVercel,
    S3Credentials, StorageConfig, StorageKind, VercelConfig,
};
pub use error::StorageError;
pub use key::{STORAGE_KEY_PREFIX_LEN, storage_key};
pub use memory::{MemoryBlobBackend, MemoryTextBackend};
pub use store::MediaStore;
pub use traits::{BlobBackend, RawBlobBackend, TextBlobBackend};
