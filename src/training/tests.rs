use super::*;
use crate::cleaning::{RatingRecord, write_csv};
use crate::constants::{
    CLEAN_RATINGS_FILENAME, ITEM_ENCODER_FILENAME, MASK_MAPPING_FILENAME, MODEL_CONFIG_FILENAME,
    MODEL_WEIGHTS_FILENAME, TRAIN_SET_FILENAME, USER_ENCODER_FILENAME,
};
use crate::recommend::Recommender;
use crate::scoring::ScoringModel;
use candle_core::Device;
use tempfile::TempDir;

fn rating(user_id: u64, isbn: &str, rating: i32) -> RatingRecord {
    RatingRecord {
        user_id,
        isbn: isbn.to_string(),
        rating,
    }
}

fn clean_ratings() -> Vec<RatingRecord> {
    vec![
        rating(10, "9780000000002", 8),
        rating(10, "9780000000019", 0),
        rating(10, "9780000000026", 3),
        rating(20, "9780000000002", 9),
        rating(20, "9780000000033", 7),
        rating(30, "9780000000026", 2),
        rating(30, "9780000000033", 0),
        // user 40 only has implicit ratings
        rating(40, "9780000000002", 0),
    ]
}

fn toy_rows() -> Vec<TrainRow> {
    let mut rows = Vec::new();
    for user in 0..4u32 {
        for item in 0..5u32 {
            rows.push(TrainRow {
                user_id: user,
                book_id: item,
                rating: if (user + item) % 2 == 0 { 9.0 } else { 3.0 },
            });
        }
    }
    rows
}

fn fast_config() -> TrainingConfig {
    TrainingConfig {
        embedding_dim: 4,
        epochs: 60,
        batch_size: 8,
        learning_rate: 0.05,
        validation_split: 0.2,
        patience: 60,
        seed: 7,
    }
}

#[test]
fn test_prepare_filters_implicit_and_persists_artifacts() {
    let data = TempDir::new().unwrap();
    let artifacts = TempDir::new().unwrap();
    write_csv(&data.path().join(CLEAN_RATINGS_FILENAME), &clean_ratings()).unwrap();

    let prepared = prepare(data.path(), artifacts.path(), 42).expect("prepare");

    assert_eq!(prepared.rows.len(), 5);
    assert_eq!(prepared.user_encoder.classes(), ["10", "20", "30"]);
    assert_eq!(prepared.item_encoder.cardinality(), 3);
    assert!(!prepared.item_encoder.contains("9780000000019"));

    for name in [ITEM_ENCODER_FILENAME, USER_ENCODER_FILENAME, MASK_MAPPING_FILENAME] {
        assert!(artifacts.path().join(name).exists(), "{name}");
    }
    assert_eq!(prepared.train_set_path, data.path().join(TRAIN_SET_FILENAME));

    let reloaded = load_train_set(&prepared.train_set_path).expect("reload");
    assert_eq!(reloaded, prepared.rows);
}

#[test]
fn test_prepare_mask_includes_known_implicit_ratings() {
    let data = TempDir::new().unwrap();
    let artifacts = TempDir::new().unwrap();
    write_csv(&data.path().join(CLEAN_RATINGS_FILENAME), &clean_ratings()).unwrap();

    let prepared = prepare(data.path(), artifacts.path(), 42).expect("prepare");

    let user = prepared.user_encoder.transform("30").unwrap();
    let masked: Vec<&str> = prepared
        .mask
        .lookup(user)
        .iter()
        .map(|&code| prepared.item_encoder.decode(code).unwrap())
        .collect();
    // The implicit rating of 9780000000033 is masked as well.
    assert_eq!(masked, vec!["9780000000026", "9780000000033"]);
    assert_eq!(prepared.mask.pair_count(), 6);
}

#[test]
fn test_prepare_is_deterministic_per_seed() {
    let data = TempDir::new().unwrap();
    let artifacts = TempDir::new().unwrap();
    write_csv(&data.path().join(CLEAN_RATINGS_FILENAME), &clean_ratings()).unwrap();

    let first = prepare(data.path(), artifacts.path(), 42).unwrap().rows;
    let second = prepare(data.path(), artifacts.path(), 42).unwrap().rows;

    assert_eq!(first, second);
}

#[test]
fn test_prepare_without_explicit_ratings() {
    let data = TempDir::new().unwrap();
    let artifacts = TempDir::new().unwrap();
    write_csv(
        &data.path().join(CLEAN_RATINGS_FILENAME),
        &[rating(1, "9780000000002", 0)],
    )
    .unwrap();

    let err = prepare(data.path(), artifacts.path(), 42).unwrap_err();
    assert!(matches!(err, TrainingError::EmptyTrainingSet { .. }));
}

#[test]
fn test_training_loss_decreases() {
    let trainer = Trainer::new(fast_config(), Device::Cpu).unwrap();

    let trained = trainer.fit(&toy_rows(), 5, 4).expect("fit");

    let report = trained.report;
    assert_eq!(report.train_rows, 16);
    assert_eq!(report.val_rows, 4);
    assert!(
        report.last_train_mae < report.first_train_mae,
        "{} !< {}",
        report.last_train_mae,
        report.first_train_mae
    );
    assert!(report.best_epoch >= 1 && report.best_epoch <= report.epochs_run);
}

#[test]
fn test_best_weights_restored() {
    let trainer = Trainer::new(fast_config(), Device::Cpu).unwrap();
    let rows = toy_rows();

    let trained = trainer.fit(&rows, 5, 4).expect("fit");

    let val = &rows[16..];
    let items: Vec<u32> = val.iter().map(|r| r.book_id).collect();
    let users: Vec<u32> = val.iter().map(|r| r.user_id).collect();
    let scores = trained.model.batch_score(&items, &users).unwrap();
    let mae = scores
        .iter()
        .zip(val)
        .map(|(s, r)| (s - r.rating).abs())
        .sum::<f32>()
        / val.len() as f32;

    assert!((mae - trained.report.best_val_mae).abs() < 1e-4);
}

#[test]
fn test_training_is_deterministic() {
    let trainer = Trainer::new(fast_config(), Device::Cpu).unwrap();

    let a = trainer.fit(&toy_rows(), 5, 4).unwrap().report;
    let b = trainer.fit(&toy_rows(), 5, 4).unwrap().report;

    assert_eq!(a.best_val_mae, b.best_val_mae);
    assert_eq!(a.best_epoch, b.best_epoch);
}

#[test]
fn test_patience_stops_early() {
    let config = TrainingConfig {
        patience: 1,
        epochs: 500,
        ..fast_config()
    };
    let trainer = Trainer::new(config, Device::Cpu).unwrap();

    let report = trainer.fit(&toy_rows(), 5, 4).unwrap().report;

    assert!(report.epochs_run < 500);
    assert_eq!(report.epochs_run, report.best_epoch + 1);
}

#[test]
fn test_out_of_range_codes_rejected() {
    let trainer = Trainer::new(fast_config(), Device::Cpu).unwrap();

    let err = trainer.fit(&toy_rows(), 3, 4).err().expect("must fail");
    assert!(matches!(err, TrainingError::OutOfRange { .. }));
}

#[test]
fn test_single_row_with_split_is_empty() {
    let trainer = Trainer::new(fast_config(), Device::Cpu).unwrap();
    let rows = [TrainRow {
        user_id: 0,
        book_id: 0,
        rating: 5.0,
    }];

    let err = trainer.fit(&rows, 1, 1).err().expect("must fail");
    assert!(matches!(err, TrainingError::EmptyTrainingSet { .. }));
}

#[test]
fn test_prepare_train_serve() {
    let data = TempDir::new().unwrap();
    let artifacts = TempDir::new().unwrap();
    write_csv(&data.path().join(CLEAN_RATINGS_FILENAME), &clean_ratings()).unwrap();
    prepare(data.path(), artifacts.path(), 42).expect("prepare");

    let config = TrainingConfig {
        epochs: 5,
        validation_split: 0.0,
        ..fast_config()
    };
    let report =
        train_from_dirs(data.path(), artifacts.path(), config, Device::Cpu).expect("train");
    assert_eq!(report.epochs_run, 5);
    assert!(artifacts.path().join(MODEL_WEIGHTS_FILENAME).exists());
    assert!(artifacts.path().join(MODEL_CONFIG_FILENAME).exists());

    let recommender = Recommender::from_dir(artifacts.path()).expect("load");
    let items = recommender.recommend("10", 10).expect("predict");

    // User 10 rated 0002, 0019 (implicit, unknown item) and 0026.
    assert_eq!(items, vec!["9780000000033"]);
}
