//! Book recommendation pipeline and serving library.
//!
//! Offline, raw Book-Crossing CSV dumps are [cleaned](cleaning), turned into
//! an encoded explicit-rating [training set](training::dataset) and fitted
//! with a two-tower embedding [model](scoring::TwoTowerModel). Online, a
//! [`Recommender`] loads the model, both identifier encoders and the mask
//! store, and answers top-K requests directly or through the HTTP
//! [gateway]. The explicit ratings can also be exported as a sparse matrix
//! in TFRecord form for WALS factorisation ([`training::wals`]).
//!
//! ## Test/Mock Support
//! [`StaticScorer`](scoring::StaticScorer) is available behind
//! `#[cfg(any(test, feature = "mock"))]`.

pub mod cleaning;
pub mod config;
pub mod constants;
pub mod encoding;
pub mod gateway;
pub mod hashing;
pub mod mask;
pub mod recommend;
pub mod scoring;
pub mod storage;
pub mod training;

pub use cleaning::{CleaningError, CleaningReport, clean_dir, to_isbn13};
pub use config::{Config, ConfigError};
pub use encoding::{EncoderError, IdentifierEncoder};
pub use gateway::{GatewayError, HandlerState, create_router_with_state};
pub use hashing::{hash_to_u64, seeded_rng};
pub use mask::{MaskError, MaskMapping};
pub use recommend::{
    RawIdentifier, RecommendError, RecommendRequest, RecommendResult, Recommendation, Recommender,
    ScoredItem,
};
#[cfg(any(test, feature = "mock"))]
pub use scoring::StaticScorer;
pub use scoring::{
    DevicePreference, ModelConfig, ScoringError, ScoringModel, TwoTowerModel, select_device,
};
pub use storage::{ArtifactStore, StorageError};
pub use training::{
    PreparedData, TrainRow, TrainedModel, Trainer, TrainingConfig, TrainingError, TrainingReport,
    WalsReport, prepare, prepare_wals, train_from_dirs,
};
