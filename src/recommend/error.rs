use std::path::PathBuf;
use thiserror::Error;

use crate::scoring::ScoringError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("artifact not found: {path}")]
    ArtifactNotFound { path: PathBuf },

    #[error("artifact {path} is corrupt: {reason}")]
    ArtifactCorrupt { path: PathBuf, reason: String },

    #[error("artifacts are inconsistent: {reason}")]
    InconsistentArtifacts { reason: String },

    #[error("unknown user: '{user_id}'")]
    UnknownUser { user_id: String },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("scoring failed: {0}")]
    Scoring(#[from] ScoringError),
}

impl RecommendError {
    pub(crate) fn invalid_request(reason: impl Into<String>) -> Self {
        RecommendError::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// `true` for errors caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RecommendError::UnknownUser { .. } | RecommendError::InvalidRequest { .. }
        )
    }
}

impl From<StorageError> for RecommendError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { path } => RecommendError::ArtifactNotFound { path },
            StorageError::Corrupt { path, reason } => {
                RecommendError::ArtifactCorrupt { path, reason }
            }
            StorageError::Io { path, source } => RecommendError::ArtifactCorrupt {
                path,
                reason: source.to_string(),
            },
            StorageError::Serialization(reason) => RecommendError::ArtifactCorrupt {
                path: PathBuf::new(),
                reason,
            },
        }
    }
}

pub type RecommendResult<T> = Result<T, RecommendError>;
