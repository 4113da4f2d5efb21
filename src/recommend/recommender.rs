use std::cmp::Ordering;
use std::path::Path;

use bitvec::prelude::*;
use tracing::{debug, info, instrument};

use super::error::{RecommendError, RecommendResult};
use super::types::{RecommendRequest, Recommendation, ScoredItem};
use crate::constants::{
    ITEM_ENCODER_FILENAME, MASK_MAPPING_FILENAME, MODEL_CONFIG_FILENAME, MODEL_WEIGHTS_FILENAME,
    USER_ENCODER_FILENAME,
};
use crate::encoding::{EncoderError, IdentifierEncoder};
use crate::mask::MaskMapping;
use crate::scoring::{ScoringError, ScoringModel, TwoTowerModel};
use crate::storage::ArtifactStore;

/// Serves top-K items per user from a loaded model, encoders and mask store.
///
/// Everything is read-only after construction; share one instance across
/// request handlers behind an `Arc`.
pub struct Recommender {
    model: Box<dyn ScoringModel>,
    item_encoder: IdentifierEncoder,
    user_encoder: IdentifierEncoder,
    mask: MaskMapping,
}

impl std::fmt::Debug for Recommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recommender")
            .field("n_items", &self.item_encoder.cardinality())
            .field("n_users", &self.user_encoder.cardinality())
            .field("masked_users", &self.mask.len())
            .finish()
    }
}

impl Recommender {
    /// Assembles a recommender, checking that all parts describe the same
    /// item and user code spaces.
    pub fn new(
        model: Box<dyn ScoringModel>,
        item_encoder: IdentifierEncoder,
        user_encoder: IdentifierEncoder,
        mask: MaskMapping,
    ) -> RecommendResult<Self> {
        let n_items = item_encoder.cardinality();
        let n_users = user_encoder.cardinality();

        if model.item_cardinality() != n_items {
            return Err(RecommendError::InconsistentArtifacts {
                reason: format!(
                    "model was trained for {} items but item encoder has {}",
                    model.item_cardinality(),
                    n_items
                ),
            });
        }
        if model.user_cardinality() != n_users {
            return Err(RecommendError::InconsistentArtifacts {
                reason: format!(
                    "model was trained for {} users but user encoder has {}",
                    model.user_cardinality(),
                    n_users
                ),
            });
        }
        mask.validate(n_users, n_items)
            .map_err(|e| RecommendError::InconsistentArtifacts {
                reason: e.to_string(),
            })?;

        Ok(Self {
            model,
            item_encoder,
            user_encoder,
            mask,
        })
    }

    /// Loads every artifact from `dir` (see [`crate::constants`] for names).
    pub fn from_dir(dir: impl AsRef<Path>) -> RecommendResult<Self> {
        let dir = dir.as_ref();
        let store = ArtifactStore::new(dir);

        for name in [
            MODEL_WEIGHTS_FILENAME,
            MODEL_CONFIG_FILENAME,
            ITEM_ENCODER_FILENAME,
            USER_ENCODER_FILENAME,
            MASK_MAPPING_FILENAME,
        ] {
            store.require(name)?;
        }

        let item_encoder = load_encoder(&store, ITEM_ENCODER_FILENAME)?;
        let user_encoder = load_encoder(&store, USER_ENCODER_FILENAME)?;

        let mask = MaskMapping::try_from(store.read_mask(MASK_MAPPING_FILENAME)?).map_err(|e| {
            RecommendError::ArtifactCorrupt {
                path: store.path(MASK_MAPPING_FILENAME),
                reason: e.to_string(),
            }
        })?;

        let model = TwoTowerModel::from_dir(dir).map_err(|e| match e {
            ScoringError::ModelNotFound { path } => RecommendError::ArtifactNotFound { path },
            e @ ScoringError::DeviceUnavailable { .. } => RecommendError::Scoring(e),
            other => RecommendError::ArtifactCorrupt {
                path: store.path(MODEL_WEIGHTS_FILENAME),
                reason: other.to_string(),
            },
        })?;

        let recommender = Self::new(Box::new(model), item_encoder, user_encoder, mask).map_err(
            |e| match e {
                RecommendError::InconsistentArtifacts { reason } => {
                    RecommendError::ArtifactCorrupt {
                        path: dir.to_path_buf(),
                        reason,
                    }
                }
                other => other,
            },
        )?;

        info!(
            dir = %dir.display(),
            n_items = recommender.item_cardinality(),
            n_users = recommender.user_cardinality(),
            masked_users = recommender.mask.len(),
            "Recommender loaded"
        );

        Ok(recommender)
    }

    pub fn item_cardinality(&self) -> usize {
        self.item_encoder.cardinality()
    }

    pub fn user_cardinality(&self) -> usize {
        self.user_encoder.cardinality()
    }

    pub fn item_encoder(&self) -> &IdentifierEncoder {
        &self.item_encoder
    }

    pub fn user_encoder(&self) -> &IdentifierEncoder {
        &self.user_encoder
    }

    pub fn mask(&self) -> &MaskMapping {
        &self.mask
    }

    /// Returns up to `request.k` raw item ids the user has not rated yet,
    /// highest score first.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, k = request.k))]
    pub fn predict(&self, request: &RecommendRequest) -> RecommendResult<Recommendation> {
        request.validate()?;

        let user = self
            .user_encoder
            .transform(request.user_id.trim())
            .map_err(|_| RecommendError::UnknownUser {
                user_id: request.user_id.clone(),
            })?;

        let candidates = self.candidates(user);
        debug!(
            user,
            masked = self.mask.lookup(user).len(),
            candidates = candidates.len(),
            "Candidate set built"
        );

        if candidates.is_empty() {
            return Ok(Recommendation {
                user_id: request.user_id.clone(),
                items: Vec::new(),
                scores: Vec::new(),
            });
        }

        let users = vec![user; candidates.len()];
        let scores = self.model.batch_score(&candidates, &users)?;
        if scores.len() != candidates.len() {
            return Err(RecommendError::Scoring(ScoringError::ComputationFailed {
                reason: format!(
                    "model returned {} scores for {} candidates",
                    scores.len(),
                    candidates.len()
                ),
            }));
        }

        let ranked = rank(&candidates, &scores, request.k);
        let codes: Vec<u32> = ranked.iter().map(|s| s.item).collect();
        let items = self
            .item_encoder
            .inverse_transform(&codes)
            .map_err(|e: EncoderError| RecommendError::InconsistentArtifacts {
                reason: e.to_string(),
            })?;

        debug!(returned = items.len(), "Recommendation ranked");

        Ok(Recommendation {
            user_id: request.user_id.clone(),
            items,
            scores: ranked.iter().map(|s| s.score).collect(),
        })
    }

    /// Convenience wrapper returning only the ranked raw item ids.
    pub fn recommend(&self, user_id: &str, k: usize) -> RecommendResult<Vec<String>> {
        Ok(self.predict(&RecommendRequest::new(user_id, k))?.items)
    }

    /// Every item code not in the user's mask, ascending.
    pub fn candidates(&self, user: u32) -> Vec<u32> {
        let n_items = self.item_encoder.cardinality();
        let mut masked: BitVec = BitVec::repeat(false, n_items);
        for &item in self.mask.lookup(user) {
            if let Some(mut bit) = masked.get_mut(item as usize) {
                *bit = true;
            }
        }
        masked.iter_zeros().map(|i| i as u32).collect()
    }
}

fn load_encoder(store: &ArtifactStore, name: &str) -> RecommendResult<IdentifierEncoder> {
    IdentifierEncoder::try_from(store.read_encoder(name)?).map_err(|e| {
        RecommendError::ArtifactCorrupt {
            path: store.path(name),
            reason: e.to_string(),
        }
    })
}

/// Higher scores first, NaN last, then ascending item code.
fn rank_order(a: &ScoredItem, b: &ScoredItem) -> Ordering {
    let by_score = match (a.score.is_nan(), b.score.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal),
    };
    by_score.then(a.item.cmp(&b.item))
}

/// Pairs candidates with scores and keeps the best `k` in rank order.
pub(crate) fn rank(candidates: &[u32], scores: &[f32], k: usize) -> Vec<ScoredItem> {
    let mut ranked: Vec<ScoredItem> = candidates
        .iter()
        .zip(scores)
        .map(|(&item, &score)| ScoredItem { item, score })
        .collect();

    if k == 0 {
        return Vec::new();
    }
    if k < ranked.len() {
        ranked.select_nth_unstable_by(k - 1, rank_order);
        ranked.truncate(k);
    }
    ranked.sort_by(rank_order);
    ranked
}
