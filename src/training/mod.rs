//! Offline pipeline stages after cleaning: training set preparation, model
//! fitting and the WALS sparse-matrix export.

pub mod config;
pub mod dataset;
pub mod error;
pub mod trainer;
pub mod wals;

#[cfg(test)]
mod tests;

pub use config::TrainingConfig;
pub use dataset::{PreparedData, TrainRow, load_train_set, prepare};
pub use error::{TrainingError, TrainingResult};
pub use trainer::{TrainedModel, Trainer, TrainingReport, train_from_dirs};
pub use wals::{WalsReport, prepare_wals};
