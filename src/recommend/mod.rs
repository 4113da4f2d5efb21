//! Top-K recommendation serving.
//!
//! `predict` decodes the raw user id, removes already-rated items from the
//! catalogue, scores the remaining candidates in one batch, ranks them and
//! decodes the winners back to raw item ids.
//!
//! # Mask keying
//!
//! The mask store is keyed by the **encoded** user index. Artifacts built by
//! `prepare` follow that convention and [`Recommender::new`] rejects a mask
//! whose keys or items fall outside the encoder ranges.

pub mod error;
pub mod recommender;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::{RecommendError, RecommendResult};
pub use recommender::Recommender;
pub use types::{RawIdentifier, RecommendRequest, Recommendation, ScoredItem};
