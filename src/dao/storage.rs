use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A value was found at `path` but does not match the expected shape.
    #[error("malformed value stored at `{path}`")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
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

    /// Construct a malformed-data error for the value stored at `path`.
    pub fn malformed(path: impl Into<String>, source: serde_json::Error) -> Self {
        StorageError::Malformed {
            path: path.into(),
            source,
        }
    }
}
