use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while reading or writing pipeline artifacts.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Artifact file does not exist.
    #[error("artifact not found: {path}")]
    NotFound {
        /// Expected location.
        path: PathBuf,
    },

    /// IO error.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact exists but its bytes are not a valid archive of the expected type.
    #[error("artifact {path} is corrupt: {reason}")]
    Corrupt {
        /// File that failed validation.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type for artifact storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
