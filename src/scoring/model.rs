use super::error::ScoringError;

/// Batch scorer over `(item, user)` code pairs.
///
/// Implementations are immutable once constructed and shared across request
/// threads, hence the `Send + Sync` bound. Only the relative order of scores
/// is meaningful; scale and sign are model-specific.
pub trait ScoringModel: Send + Sync {
    /// Scores `items[i]` for `users[i]`. Both slices must have the same length;
    /// the output has that length and the same order.
    fn batch_score(&self, items: &[u32], users: &[u32]) -> Result<Vec<f32>, ScoringError>;

    /// Number of item codes the model was trained for.
    fn item_cardinality(&self) -> usize;

    /// Number of user codes the model was trained for.
    fn user_cardinality(&self) -> usize;
}

/// Rejects mismatched slices before any model work happens.
pub(crate) fn check_batch(items: &[u32], users: &[u32]) -> Result<(), ScoringError> {
    if items.len() != users.len() {
        return Err(ScoringError::InvalidInput {
            reason: format!(
                "item batch has {} entries but user batch has {}",
                items.len(),
                users.len()
            ),
        });
    }
    Ok(())
}
