use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("scoring model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load scoring model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("{device} device unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("scoring computation failed: {reason}")]
    ComputationFailed { reason: String },
}

impl From<candle_core::Error> for ScoringError {
    fn from(err: candle_core::Error) -> Self {
        ScoringError::ComputationFailed {
            reason: err.to_string(),
        }
    }
}
