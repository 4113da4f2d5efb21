//! Two-tower embedding model: `dense(item_emb * user_emb)`.

use std::path::Path;

use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{Embedding, Linear, VarBuilder, embedding, linear};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::device::{DevicePreference, select_device};
use super::error::ScoringError;
use super::model::{ScoringModel, check_batch};
use crate::constants::{MODEL_CONFIG_FILENAME, MODEL_WEIGHTS_FILENAME};

/// Shape of a trained model, persisted next to its weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub n_items: usize,
    pub n_users: usize,
    pub embedding_dim: usize,
}

impl ModelConfig {
    pub fn new(n_items: usize, n_users: usize, embedding_dim: usize) -> Self {
        Self {
            n_items,
            n_users,
            embedding_dim,
        }
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.embedding_dim == 0 {
            return Err(ScoringError::ModelLoadFailed {
                reason: "embedding_dim must be at least 1".to_string(),
            });
        }
        if self.n_items == 0 || self.n_users == 0 {
            return Err(ScoringError::ModelLoadFailed {
                reason: format!(
                    "model needs at least one item and one user, got {} items and {} users",
                    self.n_items, self.n_users
                ),
            });
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        if !path.exists() {
            return Err(ScoringError::ModelNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| ScoringError::ModelLoadFailed {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| ScoringError::ModelLoadFailed {
                reason: format!("failed to parse {}: {}", path.display(), e),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ScoringError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ScoringError::ModelLoadFailed {
                reason: e.to_string(),
            })?;
        std::fs::write(path, content).map_err(|e| ScoringError::ModelLoadFailed {
            reason: format!("failed to write {}: {}", path.display(), e),
        })
    }
}

/// Collaborative-filtering scorer with independent item and user towers.
///
/// Embedding tables have `cardinality + 1` rows; the last row is never
/// addressed by an encoder code.
pub struct TwoTowerModel {
    item_embedding: Embedding,
    user_embedding: Embedding,
    dense: Linear,
    config: ModelConfig,
    device: Device,
}

impl std::fmt::Debug for TwoTowerModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwoTowerModel")
            .field("config", &self.config)
            .field("device", &format!("{:?}", self.device))
            .finish()
    }
}

impl TwoTowerModel {
    /// Builds the model from `vb`; variables are created when `vb` is backed
    /// by a `VarMap`, and looked up when backed by loaded tensors.
    pub fn new(vb: VarBuilder, config: ModelConfig) -> candle_core::Result<Self> {
        let device = vb.device().clone();
        let item_embedding = embedding(
            config.n_items + 1,
            config.embedding_dim,
            vb.pp("item_embedding"),
        )?;
        let user_embedding = embedding(
            config.n_users + 1,
            config.embedding_dim,
            vb.pp("user_embedding"),
        )?;
        let dense = linear(config.embedding_dim, 1, vb.pp("dense"))?;

        Ok(Self {
            item_embedding,
            user_embedding,
            dense,
            config,
            device,
        })
    }

    /// Loads weights from a safetensors file.
    pub fn load(
        weights_path: &Path,
        config: ModelConfig,
        device: &Device,
    ) -> Result<Self, ScoringError> {
        config.validate()?;
        if !weights_path.exists() {
            return Err(ScoringError::ModelNotFound {
                path: weights_path.to_path_buf(),
            });
        }

        // SAFETY: The weights file is written once by the trainer and is not
        // modified while the model is loaded.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device).map_err(
                |e| ScoringError::ModelLoadFailed {
                    reason: format!("failed to map {}: {}", weights_path.display(), e),
                },
            )?
        };

        Self::new(vb, config).map_err(|e| ScoringError::ModelLoadFailed {
            reason: format!("weights do not match model config: {}", e),
        })
    }

    /// Loads `explicit_base.json` + `explicit_base.safetensors` from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, ScoringError> {
        let config = ModelConfig::load(&dir.join(MODEL_CONFIG_FILENAME))?;
        let device = select_device(DevicePreference::from_env())?;

        info!(
            dir = %dir.display(),
            n_items = config.n_items,
            n_users = config.n_users,
            embedding_dim = config.embedding_dim,
            "Loading two-tower scoring model"
        );

        Self::load(&dir.join(MODEL_WEIGHTS_FILENAME), config, &device)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Scores `(item_ids[i], user_ids[i])` pairs; both are `u32` tensors of
    /// shape `(batch,)` and the output has shape `(batch,)`.
    pub fn forward(&self, item_ids: &Tensor, user_ids: &Tensor) -> candle_core::Result<Tensor> {
        let items = self.item_embedding.forward(item_ids)?;
        let users = self.user_embedding.forward(user_ids)?;
        let interaction = (items * users)?;
        self.dense.forward(&interaction)?.squeeze(1)
    }

    fn check_range(&self, codes: &[u32], limit: usize, what: &str) -> Result<(), ScoringError> {
        if let Some(&code) = codes.iter().find(|&&c| c as usize > limit) {
            return Err(ScoringError::InvalidInput {
                reason: format!("{} code {} exceeds embedding table size {}", what, code, limit + 1),
            });
        }
        Ok(())
    }
}

impl ScoringModel for TwoTowerModel {
    fn batch_score(&self, items: &[u32], users: &[u32]) -> Result<Vec<f32>, ScoringError> {
        check_batch(items, users)?;
        if items.is_empty() {
            return Ok(Vec::new());
        }
        self.check_range(items, self.config.n_items, "item")?;
        self.check_range(users, self.config.n_users, "user")?;

        debug!(batch = items.len(), "Scoring batch");

        let item_ids = Tensor::from_slice(items, items.len(), &self.device)?;
        let user_ids = Tensor::from_slice(users, users.len(), &self.device)?;
        let scores = self
            .forward(&item_ids, &user_ids)?
            .to_dtype(DType::F32)?
            .to_vec1::<f32>()?;

        Ok(scores)
    }

    fn item_cardinality(&self) -> usize {
        self.config.n_items
    }

    fn user_cardinality(&self) -> usize {
        self.config.n_users
    }
}
