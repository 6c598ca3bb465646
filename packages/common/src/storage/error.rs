use thiserror::Error;

/// Errors that can occur during media storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The storage selector or a backend's credential set is missing or invalid.
    #[error("storage configuration error: {0}")]
    Config(String),

    /// The backend rejected or failed a request.
    #[error("{backend} backend error: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    /// A payload stored through the text path could not be decoded.
    #[error("corrupt payload under key '{key}': {message}")]
    Corrupt { key: String, message: String },

    /// The storage key cannot be mapped onto the backend.
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub(crate) fn backend(backend: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Backend {
            backend,
            message: err.to_string(),
        }
    }
}
