//! Mini-batch Adam training of the two-tower model with early stopping.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, instrument};

use super::config::TrainingConfig;
use super::dataset::{TrainRow, check_codes, load_train_set};
use super::error::{TrainingError, TrainingResult};
use crate::constants::{
    ITEM_ENCODER_FILENAME, MODEL_CONFIG_FILENAME, MODEL_WEIGHTS_FILENAME, TRAIN_SET_FILENAME,
    USER_ENCODER_FILENAME,
};
use crate::encoding::IdentifierEncoder;
use crate::hashing::seeded_rng;
use crate::scoring::{ModelConfig, TwoTowerModel};
use crate::storage::ArtifactStore;

const BATCH_ORDER_STREAM: &str = "batch-order";
const EMBEDDING_INIT_RANGE: f64 = 0.05;

/// Summary of one training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingReport {
    pub epochs_run: usize,
    /// 1-based epoch whose weights were kept.
    pub best_epoch: usize,
    /// Validation MAE of the kept weights (training MAE when nothing is held out).
    pub best_val_mae: f32,
    pub first_train_mae: f32,
    pub last_train_mae: f32,
    pub train_rows: usize,
    pub val_rows: usize,
}

/// Fitted weights plus the model that reads them.
pub struct TrainedModel {
    pub model: TwoTowerModel,
    pub varmap: VarMap,
    pub report: TrainingReport,
}

impl TrainedModel {
    /// Writes `explicit_base.safetensors` and `explicit_base.json` into `dir`.
    pub fn save(&self, dir: &Path) -> TrainingResult<()> {
        std::fs::create_dir_all(dir).map_err(|e| crate::storage::StorageError::io(dir, e))?;
        self.varmap.save(dir.join(MODEL_WEIGHTS_FILENAME))?;
        self.model.config().save(&dir.join(MODEL_CONFIG_FILENAME))?;
        info!(dir = %dir.display(), "Model saved");
        Ok(())
    }
}

/// Rows resident on the training device.
struct Split {
    items: Tensor,
    users: Tensor,
    ratings: Tensor,
    len: usize,
}

impl Split {
    fn new(rows: &[TrainRow], device: &Device) -> TrainingResult<Self> {
        let items: Vec<u32> = rows.iter().map(|r| r.book_id).collect();
        let users: Vec<u32> = rows.iter().map(|r| r.user_id).collect();
        let ratings: Vec<f32> = rows.iter().map(|r| r.rating).collect();
        Ok(Self {
            items: Tensor::from_vec(items, rows.len(), device)?,
            users: Tensor::from_vec(users, rows.len(), device)?,
            ratings: Tensor::from_vec(ratings, rows.len(), device)?,
            len: rows.len(),
        })
    }

    fn batch(&self, indices: &Tensor) -> TrainingResult<(Tensor, Tensor, Tensor)> {
        Ok((
            self.items.index_select(indices, 0)?,
            self.users.index_select(indices, 0)?,
            self.ratings.index_select(indices, 0)?,
        ))
    }
}

pub struct Trainer {
    config: TrainingConfig,
    device: Device,
}

impl Trainer {
    pub fn new(config: TrainingConfig, device: Device) -> TrainingResult<Self> {
        config.validate()?;
        Ok(Self { config, device })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fits a fresh model on `rows`. The trailing `validation_split` share of
    /// `rows` is held out and drives early stopping.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub fn fit(&self, rows: &[TrainRow], n_items: usize, n_users: usize) -> TrainingResult<TrainedModel> {
        check_codes(rows, n_items, n_users)?;
        let n_train = self.config.train_len(rows.len());
        if n_train == 0 {
            return Err(TrainingError::EmptyTrainingSet {
                reason: format!("{} rows leave nothing to train on", rows.len()),
            });
        }
        let (train_rows, val_rows) = rows.split_at(n_train);

        let model_config = ModelConfig::new(n_items, n_users, self.config.embedding_dim);
        model_config.validate()?;

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &self.device);
        let model = TwoTowerModel::new(vb, model_config)?;
        initialise(&varmap, self.config.seed)?;

        let train = Split::new(train_rows, &self.device)?;
        let val = if val_rows.is_empty() {
            None
        } else {
            Some(Split::new(val_rows, &self.device)?)
        };

        let params = ParamsAdamW {
            lr: self.config.learning_rate,
            weight_decay: 0.0,
            ..Default::default()
        };
        let mut optimizer = AdamW::new(varmap.all_vars(), params)?;

        info!(
            train_rows = train.len,
            val_rows = val_rows.len(),
            n_items,
            n_users,
            embedding_dim = self.config.embedding_dim,
            epochs = self.config.epochs,
            "Training started"
        );

        let mut best: Option<(usize, f32, HashMap<String, Tensor>)> = None;
        let mut since_best = 0usize;
        let mut first_train_mae = f32::NAN;
        let mut last_train_mae = f32::NAN;
        let mut epochs_run = 0usize;
        let mut rng = seeded_rng(self.config.seed, BATCH_ORDER_STREAM);

        for epoch in 1..=self.config.epochs {
            let train_mae = self.run_epoch(&model, &mut optimizer, &train, &mut rng)?;
            let monitored = match &val {
                Some(val) => self.evaluate(&model, val)?,
                None => self.evaluate(&model, &train)?,
            };
            epochs_run = epoch;
            if epoch == 1 {
                first_train_mae = train_mae;
            }
            last_train_mae = train_mae;

            debug!(epoch, train_mae, val_mae = monitored, "Epoch finished");

            let improved = best
                .as_ref()
                .is_none_or(|(_, best_mae, _)| monitored < *best_mae);
            if improved {
                best = Some((epoch, monitored, snapshot(&varmap)?));
                since_best = 0;
            } else {
                since_best += 1;
                if since_best >= self.config.patience {
                    info!(epoch, "Early stopping");
                    break;
                }
            }
        }

        let (best_epoch, best_val_mae) = match best {
            Some((epoch, mae, weights)) => {
                restore(&varmap, &weights)?;
                (epoch, mae)
            }
            None => (epochs_run, f32::NAN),
        };

        let report = TrainingReport {
            epochs_run,
            best_epoch,
            best_val_mae,
            first_train_mae,
            last_train_mae,
            train_rows: train.len,
            val_rows: val_rows.len(),
        };
        info!(
            epochs_run,
            best_epoch,
            best_val_mae,
            last_train_mae,
            "Training finished"
        );

        Ok(TrainedModel {
            model,
            varmap,
            report,
        })
    }

    /// One pass over `train` in seeded batch order; returns the mean batch MAE.
    fn run_epoch(
        &self,
        model: &TwoTowerModel,
        optimizer: &mut AdamW,
        train: &Split,
        rng: &mut StdRng,
    ) -> TrainingResult<f32> {
        let mut order: Vec<u32> = (0..train.len as u32).collect();
        order.shuffle(rng);

        let mut weighted_loss = 0f64;
        for chunk in order.chunks(self.config.batch_size) {
            let indices = Tensor::new(chunk, &self.device)?;
            let (items, users, ratings) = train.batch(&indices)?;
            let predictions = model.forward(&items, &users)?;
            let loss = mean_absolute_error(&predictions, &ratings)?;
            optimizer.backward_step(&loss)?;
            weighted_loss += loss.to_scalar::<f32>()? as f64 * chunk.len() as f64;
        }
        Ok((weighted_loss / train.len as f64) as f32)
    }

    /// MAE over a whole split without updating weights.
    fn evaluate(&self, model: &TwoTowerModel, split: &Split) -> TrainingResult<f32> {
        let mut total = 0f64;
        let mut start = 0usize;
        while start < split.len {
            let len = self.config.batch_size.min(split.len - start);
            let items = split.items.narrow(0, start, len)?;
            let users = split.users.narrow(0, start, len)?;
            let ratings = split.ratings.narrow(0, start, len)?;
            let predictions = model.forward(&items, &users)?;
            let errors = (predictions - ratings)?.abs()?.sum_all()?;
            total += errors.to_scalar::<f32>()? as f64;
            start += len;
        }
        Ok((total / split.len as f64) as f32)
    }
}

pub fn mean_absolute_error(predictions: &Tensor, targets: &Tensor) -> candle_core::Result<Tensor> {
    (predictions - targets)?.abs()?.mean_all()
}

/// Prepared train set + encoders in the usual places -> trained model on disk.
pub fn train_from_dirs(
    data_dir: &Path,
    artifact_dir: &Path,
    config: TrainingConfig,
    device: Device,
) -> TrainingResult<TrainingReport> {
    let store = ArtifactStore::new(artifact_dir);
    let item_encoder = IdentifierEncoder::try_from(store.read_encoder(ITEM_ENCODER_FILENAME)?)?;
    let user_encoder = IdentifierEncoder::try_from(store.read_encoder(USER_ENCODER_FILENAME)?)?;
    let rows = load_train_set(&data_dir.join(TRAIN_SET_FILENAME))?;

    let trainer = Trainer::new(config, device)?;
    let trained = trainer.fit(&rows, item_encoder.cardinality(), user_encoder.cardinality())?;
    trained.save(artifact_dir)?;
    Ok(trained.report)
}

/// Deterministic initial weights: embeddings uniform in +-0.05, dense kernel
/// Glorot-uniform, biases zero. Each variable draws from its own stream so
/// the result does not depend on map iteration order.
fn initialise(varmap: &VarMap, seed: u64) -> TrainingResult<()> {
    let data = varmap.data().lock().map_err(|_| TrainingError::LockPoisoned)?;
    for (name, var) in data.iter() {
        let dims = var.dims().to_vec();
        let count: usize = dims.iter().product();
        let limit = if name.ends_with("bias") {
            0.0
        } else if name.starts_with("dense") {
            let fan_in = dims.get(1).copied().unwrap_or(1);
            let fan_out = dims.first().copied().unwrap_or(1);
            (6.0 / (fan_in + fan_out) as f64).sqrt()
        } else {
            EMBEDDING_INIT_RANGE
        };

        let values: Vec<f32> = if limit > 0.0 {
            let uniform = Uniform::new_inclusive(-limit as f32, limit as f32);
            let mut rng = seeded_rng(seed, name);
            uniform.sample_iter(&mut rng).take(count).collect()
        } else {
            vec![0.0; count]
        };
        var.set(&Tensor::from_vec(values, dims, var.device())?)?;
    }
    Ok(())
}

fn snapshot(varmap: &VarMap) -> TrainingResult<HashMap<String, Tensor>> {
    let data = varmap.data().lock().map_err(|_| TrainingError::LockPoisoned)?;
    data.iter()
        .map(|(name, var)| Ok((name.clone(), var.as_tensor().copy()?)))
        .collect()
}

fn restore(varmap: &VarMap, weights: &HashMap<String, Tensor>) -> TrainingResult<()> {
    let data = varmap.data().lock().map_err(|_| TrainingError::LockPoisoned)?;
    for (name, var) in data.iter() {
        if let Some(tensor) = weights.get(name) {
            var.set(tensor)?;
        }
    }
    Ok(())
}
