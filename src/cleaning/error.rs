use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning the raw Book-Crossing dump into clean tables.
#[derive(Debug, Error)]
pub enum CleaningError {
    /// A required raw input file is absent.
    #[error("raw input not found: {path}")]
    MissingInput { path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV writer or a header row failed.
    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl CleaningError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CleaningError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        CleaningError::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type CleaningResult<T> = Result<T, CleaningError>;
