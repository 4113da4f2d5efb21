use std::path::PathBuf;

use thiserror::Error;

use crate::cleaning::CleaningError;
use crate::config::ConfigError;
use crate::encoding::EncoderError;
use crate::scoring::ScoringError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] CleaningError),

    #[error(transparent)]
    Encoder(#[from] EncoderError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("tensor operation failed: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Nothing left to fit after filtering or splitting.
    #[error("training set is empty: {reason}")]
    EmptyTrainingSet { reason: String },

    /// Train set codes disagree with the persisted encoders.
    #[error("training data out of range: {reason}")]
    OutOfRange { reason: String },

    /// Writing an exported record file failed.
    #[error("failed to write {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("variable store lock poisoned")]
    LockPoisoned,
}

pub type TrainingResult<T> = Result<T, TrainingError>;
