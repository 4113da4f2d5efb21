//! Explicit-rating training set preparation.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{TrainingError, TrainingResult};
use crate::cleaning::{RatingRecord, read_csv, write_csv};
use crate::constants::{
    CLEAN_RATINGS_FILENAME, ITEM_ENCODER_FILENAME, MASK_MAPPING_FILENAME, TRAIN_SET_FILENAME,
    USER_ENCODER_FILENAME,
};
use crate::encoding::IdentifierEncoder;
use crate::hashing::seeded_rng;
use crate::mask::MaskMapping;
use crate::storage::ArtifactStore;

const TRAIN_SET_STREAM: &str = "train-set-shuffle";

/// One encoded explicit rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainRow {
    pub user_id: u32,
    pub book_id: u32,
    pub rating: f32,
}

/// Everything `prepare` produced.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub rows: Vec<TrainRow>,
    pub item_encoder: IdentifierEncoder,
    pub user_encoder: IdentifierEncoder,
    pub mask: MaskMapping,
    pub train_set_path: PathBuf,
}

/// Builds the explicit training set from `ratings_clean.csv` in `data_dir`.
///
/// Writes `explicit_train_set.csv` next to the clean tables and the two
/// encoders plus the mask mapping into `artifact_dir`.
pub fn prepare(data_dir: &Path, artifact_dir: &Path, seed: u64) -> TrainingResult<PreparedData> {
    let ratings: Vec<RatingRecord> = read_csv(&data_dir.join(CLEAN_RATINGS_FILENAME))?;
    let total = ratings.len();

    let mut explicit: Vec<&RatingRecord> = ratings.iter().filter(|r| r.rating != 0).collect();
    if explicit.is_empty() {
        return Err(TrainingError::EmptyTrainingSet {
            reason: format!("none of {} clean ratings is explicit", total),
        });
    }
    explicit.shuffle(&mut seeded_rng(seed, TRAIN_SET_STREAM));

    let user_encoder = IdentifierEncoder::fit(explicit.iter().map(|r| r.user_id.to_string()))?;
    let item_encoder = IdentifierEncoder::fit(explicit.iter().map(|r| r.isbn.as_str()))?;

    let rows = explicit
        .iter()
        .map(|r| {
            Ok(TrainRow {
                user_id: user_encoder.transform(&r.user_id.to_string())?,
                book_id: item_encoder.transform(&r.isbn)?,
                rating: r.rating as f32,
            })
        })
        .collect::<TrainingResult<Vec<_>>>()?;

    let mask = MaskMapping::from_pairs(ratings.iter().filter_map(|r| {
        let user = user_encoder.transform(&r.user_id.to_string()).ok()?;
        let item = item_encoder.transform(&r.isbn).ok()?;
        Some((user, item))
    }));

    let train_set_path = data_dir.join(TRAIN_SET_FILENAME);
    write_csv(&train_set_path, &rows)?;

    let store = ArtifactStore::new(artifact_dir);
    store.ensure_root()?;
    item_encoder.save(&store, ITEM_ENCODER_FILENAME)?;
    user_encoder.save(&store, USER_ENCODER_FILENAME)?;
    mask.save(&store, MASK_MAPPING_FILENAME)?;

    info!(
        ratings = total,
        explicit = rows.len(),
        n_users = user_encoder.cardinality(),
        n_items = item_encoder.cardinality(),
        masked_pairs = mask.pair_count(),
        "Training set prepared"
    );

    Ok(PreparedData {
        rows,
        item_encoder,
        user_encoder,
        mask,
        train_set_path,
    })
}

/// Reads `explicit_train_set.csv`.
pub fn load_train_set(path: &Path) -> TrainingResult<Vec<TrainRow>> {
    Ok(read_csv(path)?)
}

/// Fails when any row references a code outside the encoder ranges.
pub fn check_codes(rows: &[TrainRow], n_items: usize, n_users: usize) -> TrainingResult<()> {
    if let Some(row) = rows
        .iter()
        .find(|r| r.book_id as usize >= n_items || r.user_id as usize >= n_users)
    {
        return Err(TrainingError::OutOfRange {
            reason: format!(
                "row (user {}, book {}) outside {} users x {} items",
                row.user_id, row.book_id, n_users, n_items
            ),
        });
    }
    Ok(())
}
