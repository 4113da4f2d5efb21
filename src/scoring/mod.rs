//! Scoring models for `(item, user)` pairs.
//!
//! The recommender only depends on the [`ScoringModel`] trait. The production
//! implementation is the candle [`TwoTowerModel`]; [`StaticScorer`] is a
//! table-driven stand-in available to tests and the `mock` feature.

pub mod device;
pub mod error;
pub mod model;
pub mod two_tower;

#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use device::{DevicePreference, select_device};
pub use error::ScoringError;
#[cfg(any(test, feature = "mock"))]
pub use mock::StaticScorer;
pub use model::ScoringModel;
pub use two_tower::{ModelConfig, TwoTowerModel};
