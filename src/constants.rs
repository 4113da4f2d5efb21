//! Cross-cutting, shared constants.
//!
//! Artifact file names are part of the on-disk contract between `prepare`,
//! `train` and the serving side. Changing one invalidates existing artifact
//! directories.

/// Safetensors weights of the two-tower scoring model.
pub const MODEL_WEIGHTS_FILENAME: &str = "explicit_base.safetensors";

/// JSON hyperparameters (`ModelConfig`) of the scoring model.
pub const MODEL_CONFIG_FILENAME: &str = "explicit_base.json";

/// rkyv archive of the item (book) identifier encoder.
pub const ITEM_ENCODER_FILENAME: &str = "explicit_book.encoder";

/// rkyv archive of the user identifier encoder.
pub const USER_ENCODER_FILENAME: &str = "explicit_user.encoder";

/// rkyv archive of the per-user mask mapping.
pub const MASK_MAPPING_FILENAME: &str = "to_mask_items.mapping";

/// Encoded explicit training set written by `prepare`.
pub const TRAIN_SET_FILENAME: &str = "explicit_train_set.csv";

pub const RAW_BOOKS_FILENAME: &str = "books.csv";
pub const RAW_USERS_FILENAME: &str = "users.csv";
pub const RAW_RATINGS_FILENAME: &str = "ratings.csv";

pub const CLEAN_BOOKS_FILENAME: &str = "books_clean.csv";
pub const CLEAN_USERS_FILENAME: &str = "users_clean.csv";
pub const CLEAN_RATINGS_FILENAME: &str = "ratings_clean.csv";

/// Sparse-matrix export for WALS, written next to the clean tables.
pub const WALS_USERS_MAPPING_FILENAME: &str = "users_mapping.csv";
pub const WALS_BOOKS_MAPPING_FILENAME: &str = "books_mapping.csv";
pub const WALS_RATINGS_FILENAME: &str = "id_transformed_explicit_ratings.csv";
pub const USERS_FOR_ITEM_FILENAME: &str = "users_for_item.tfrecords";
pub const ITEMS_FOR_USER_FILENAME: &str = "items_for_user.tfrecords";

/// Number of recommendations returned when a request does not name `k`.
pub const DEFAULT_TOP_K: usize = 10;

/// Upper bound on `k` accepted by the HTTP gateway.
pub const DEFAULT_MAX_K: usize = 1000;

pub const DEFAULT_EMBEDDING_DIM: usize = 2;
pub const DEFAULT_EPOCHS: usize = 100;
pub const DEFAULT_BATCH_SIZE: usize = 4196 * 16;
pub const DEFAULT_LEARNING_RATE: f64 = 0.001;
pub const DEFAULT_VALIDATION_SPLIT: f64 = 0.1;
pub const DEFAULT_PATIENCE: usize = 20;
pub const DEFAULT_SEED: u64 = 42;

/// Response header carrying a short machine-readable outcome.
pub const BOOKREC_STATUS_HEADER: &str = "x-bookrec-status";
pub const BOOKREC_STATUS_HEALTHY: &str = "healthy";
pub const BOOKREC_STATUS_READY: &str = "ready";
pub const BOOKREC_STATUS_OK: &str = "ok";
