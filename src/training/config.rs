use crate::config::{ConfigError, parse_from_env};
use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_EMBEDDING_DIM, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE,
    DEFAULT_PATIENCE, DEFAULT_SEED, DEFAULT_VALIDATION_SPLIT,
};

/// Trainer hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    /// Width of both embedding tables. Default: `2`.
    pub embedding_dim: usize,
    /// Upper bound on passes over the training split. Default: `100`.
    pub epochs: usize,
    /// Rows per optimiser step. Default: `67136`.
    pub batch_size: usize,
    /// Adam step size. Default: `0.001`.
    pub learning_rate: f64,
    /// Trailing fraction of the training set held out for early stopping. Default: `0.1`.
    pub validation_split: f64,
    /// Epochs without validation improvement before stopping. Default: `20`.
    pub patience: usize,
    /// Seed for shuffles and weight initialisation. Default: `42`.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            epochs: DEFAULT_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            learning_rate: DEFAULT_LEARNING_RATE,
            validation_split: DEFAULT_VALIDATION_SPLIT,
            patience: DEFAULT_PATIENCE,
            seed: DEFAULT_SEED,
        }
    }
}

impl TrainingConfig {
    const ENV_EMBEDDING_DIM: &'static str = "BOOKREC_EMBEDDING_DIM";
    const ENV_EPOCHS: &'static str = "BOOKREC_EPOCHS";
    const ENV_BATCH_SIZE: &'static str = "BOOKREC_BATCH_SIZE";
    const ENV_LEARNING_RATE: &'static str = "BOOKREC_LEARNING_RATE";
    const ENV_VALIDATION_SPLIT: &'static str = "BOOKREC_VALIDATION_SPLIT";
    const ENV_PATIENCE: &'static str = "BOOKREC_PATIENCE";
    const ENV_SEED: &'static str = "BOOKREC_SEED";

    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            embedding_dim: parse_from_env(Self::ENV_EMBEDDING_DIM, defaults.embedding_dim)?,
            epochs: parse_from_env(Self::ENV_EPOCHS, defaults.epochs)?,
            batch_size: parse_from_env(Self::ENV_BATCH_SIZE, defaults.batch_size)?,
            learning_rate: parse_from_env(Self::ENV_LEARNING_RATE, defaults.learning_rate)?,
            validation_split: parse_from_env(
                Self::ENV_VALIDATION_SPLIT,
                defaults.validation_split,
            )?,
            patience: parse_from_env(Self::ENV_PATIENCE, defaults.patience)?,
            seed: parse_from_env(Self::ENV_SEED, defaults.seed)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            (Self::ENV_EMBEDDING_DIM, self.embedding_dim),
            (Self::ENV_EPOCHS, self.epochs),
            (Self::ENV_BATCH_SIZE, self.batch_size),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    name,
                    reason: "must be at least 1".to_string(),
                });
            }
        }

        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_LEARNING_RATE,
                reason: format!("{} is not a positive number", self.learning_rate),
            });
        }

        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_VALIDATION_SPLIT,
                reason: format!("{} is outside [0, 1)", self.validation_split),
            });
        }

        Ok(())
    }

    /// Rows kept for training out of `total`; the rest is validation.
    pub fn train_len(&self, total: usize) -> usize {
        (total as f64 * (1.0 - self.validation_split)) as usize
    }
}
