//! Table-driven scorer for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::error::ScoringError;
use super::model::{ScoringModel, check_batch};

/// Returns a fixed score per item (optionally per `(item, user)` pair).
#[derive(Debug, Default)]
pub struct StaticScorer {
    n_items: usize,
    n_users: usize,
    item_scores: HashMap<u32, f32>,
    pair_scores: HashMap<(u32, u32), f32>,
    default_score: f32,
    calls: AtomicUsize,
}

impl StaticScorer {
    pub fn new(n_items: usize, n_users: usize) -> Self {
        Self {
            n_items,
            n_users,
            ..Default::default()
        }
    }

    /// Scores item `i` with `scores[i]` for every user.
    pub fn from_item_scores(scores: &[f32], n_users: usize) -> Self {
        let mut scorer = Self::new(scores.len(), n_users);
        for (item, &score) in scores.iter().enumerate() {
            scorer.item_scores.insert(item as u32, score);
        }
        scorer
    }

    pub fn with_item_score(mut self, item: u32, score: f32) -> Self {
        self.item_scores.insert(item, score);
        self
    }

    pub fn with_pair_score(mut self, item: u32, user: u32, score: f32) -> Self {
        self.pair_scores.insert((item, user), score);
        self
    }

    pub fn with_default_score(mut self, score: f32) -> Self {
        self.default_score = score;
        self
    }

    /// Number of `batch_score` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ScoringModel for StaticScorer {
    fn batch_score(&self, items: &[u32], users: &[u32]) -> Result<Vec<f32>, ScoringError> {
        check_batch(items, users)?;
        self.calls.fetch_add(1, Ordering::SeqCst);

        Ok(items
            .iter()
            .zip(users)
            .map(|(&item, &user)| {
                self.pair_scores
                    .get(&(item, user))
                    .or_else(|| self.item_scores.get(&item))
                    .copied()
                    .unwrap_or(self.default_score)
            })
            .collect())
    }

    fn item_cardinality(&self) -> usize {
        self.n_items
    }

    fn user_cardinality(&self) -> usize {
        self.n_users
    }
}
