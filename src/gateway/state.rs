use std::sync::Arc;

use crate::config::Config;
use crate::recommend::Recommender;

#[derive(Clone)]
pub struct HandlerState {
    pub recommender: Arc<Recommender>,

    /// Used when a request omits `k`.
    pub default_k: usize,

    /// Requests asking for more are rejected.
    pub max_k: usize,
}

impl HandlerState {
    pub fn new(recommender: Arc<Recommender>, default_k: usize, max_k: usize) -> Self {
        Self {
            recommender,
            default_k,
            max_k,
        }
    }

    pub fn from_config(recommender: Arc<Recommender>, config: &Config) -> Self {
        Self::new(recommender, config.default_k, config.max_k)
    }
}
