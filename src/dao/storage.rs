use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying implementation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend cannot be reached or refused the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human readable description of the failure.
        message: String,
        /// Underlying backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A document exists but could not be encoded or decoded.
    #[error("malformed document at `{path}`")]
    Codec {
        /// Path of the offending document.
        path: String,
        /// Serde failure raised while converting the payload.
        #[source]
        source: serde_json::Error,
    },
    /// The supplied path does not name a document or collection.
    #[error("invalid store path `{path}`")]
    InvalidPath {
        /// The rejected path.
        path: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a codec error for the document at `path`.
    pub fn codec(path: impl Into<String>, source: serde_json::Error) -> Self {
        StorageError::Codec {
            path: path.into(),
            source,
        }
    }
}
