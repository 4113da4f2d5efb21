use std::collections::HashSet;
use std::sync::Arc;

use super::recommender::rank;
use super::*;
use crate::encoding::IdentifierEncoder;
use crate::mask::MaskMapping;
use crate::scoring::{ScoringError, ScoringModel, StaticScorer};

fn encoders() -> (IdentifierEncoder, IdentifierEncoder) {
    let items = IdentifierEncoder::fit(["i1", "i2", "i3"]).expect("items");
    let users = IdentifierEncoder::fit(["u1", "u2"]).expect("users");
    (items, users)
}

/// users {"u1":0,"u2":1}, items {"i1":0,"i2":1,"i3":2}, mask(u1) = {0},
/// candidates [1, 2] score [0.2, 0.9].
fn scenario() -> Recommender {
    let (items, users) = encoders();
    let scorer = StaticScorer::from_item_scores(&[0.5, 0.2, 0.9], 2);
    let mask = MaskMapping::from_pairs([(0, 0)]);
    Recommender::new(Box::new(scorer), items, users, mask).expect("recommender")
}

fn catalogue(n_items: usize, n_users: usize, mask_pairs: &[(u32, u32)]) -> Recommender {
    let items = IdentifierEncoder::fit((0..n_items).map(|i| format!("item-{i:04}"))).unwrap();
    let users = IdentifierEncoder::fit((0..n_users).map(|u| format!("user-{u:04}"))).unwrap();
    // Deterministic, non-monotonic scores with ties every 7 items.
    let scores: Vec<f32> = (0..n_items).map(|i| ((i * 37) % 7) as f32).collect();
    let scorer = StaticScorer::from_item_scores(&scores, n_users);
    let mask = MaskMapping::from_pairs(mask_pairs.iter().copied());
    Recommender::new(Box::new(scorer), items, users, mask).unwrap()
}

#[test]
fn test_scenario_ranks_unmasked_items() {
    let recommender = scenario();

    let items = recommender.recommend("u1", 2).expect("predict");

    assert_eq!(items, vec!["i3", "i2"]);
}

#[test]
fn test_scenario_scores_returned_in_rank_order() {
    let recommender = scenario();

    let result = recommender
        .predict(&RecommendRequest::new("u1", 2))
        .expect("predict");

    assert_eq!(result.scores, vec![0.9, 0.2]);
    assert_eq!(result.user_id, "u1");
    let pairs: Vec<(&str, f32)> = result.iter().collect();
    assert_eq!(pairs, vec![("i3", 0.9), ("i2", 0.2)]);
}

#[test]
fn test_unmasked_user_sees_every_item() {
    let recommender = scenario();

    let items = recommender.recommend("u2", 10).expect("predict");

    assert_eq!(items, vec!["i3", "i1", "i2"]);
}

#[test]
fn test_k_exceeds_candidates() {
    let recommender = scenario();

    let items = recommender.recommend("u1", 50).expect("predict");

    assert_eq!(items, vec!["i3", "i2"]);
}

#[test]
fn test_unknown_user() {
    let recommender = scenario();

    let err = recommender.recommend("u9", 2).unwrap_err();

    assert!(matches!(err, RecommendError::UnknownUser { ref user_id } if user_id == "u9"));
    assert!(err.is_client_error());
}

#[test]
fn test_zero_k_is_invalid() {
    let recommender = scenario();

    let err = recommender.recommend("u1", 0).unwrap_err();
    assert!(matches!(err, RecommendError::InvalidRequest { .. }));
}

#[test]
fn test_blank_user_is_invalid() {
    let recommender = scenario();

    let err = recommender.recommend("   ", 3).unwrap_err();
    assert!(matches!(err, RecommendError::InvalidRequest { .. }));
}

#[test]
fn test_user_id_is_trimmed() {
    let recommender = scenario();

    assert_eq!(
        recommender.recommend(" u1 ", 1).expect("predict"),
        vec!["i3"]
    );
}

#[test]
fn test_fully_masked_user_skips_model() {
    let (items, users) = encoders();
    let scorer = Arc::new(StaticScorer::from_item_scores(&[0.1, 0.2, 0.3], 2));
    let mask = MaskMapping::from_pairs([(1, 0), (1, 1), (1, 2)]);

    struct Shared(Arc<StaticScorer>);
    impl ScoringModel for Shared {
        fn batch_score(&self, items: &[u32], users: &[u32]) -> Result<Vec<f32>, ScoringError> {
            self.0.batch_score(items, users)
        }
        fn item_cardinality(&self) -> usize {
            self.0.item_cardinality()
        }
        fn user_cardinality(&self) -> usize {
            self.0.user_cardinality()
        }
    }

    let recommender =
        Recommender::new(Box::new(Shared(scorer.clone())), items, users, mask).expect("new");

    let result = recommender
        .predict(&RecommendRequest::new("u2", 5))
        .expect("predict");

    assert!(result.is_empty());
    assert_eq!(scorer.calls(), 0);

    recommender.recommend("u1", 5).expect("predict");
    assert_eq!(scorer.calls(), 1);
}

#[test]
fn test_determinism() {
    let recommender = catalogue(200, 3, &[(1, 4), (1, 9), (1, 150)]);

    let first = recommender.recommend("user-0001", 25).expect("predict");
    let second = recommender.recommend("user-0001", 25).expect("predict");

    assert_eq!(first, second);
}

#[test]
fn test_cardinality_bound() {
    let mask: Vec<(u32, u32)> = (0..30).map(|i| (0, i * 2)).collect();
    let recommender = catalogue(100, 2, &mask);

    for k in [1, 10, 69, 70, 71, 500] {
        let items = recommender.recommend("user-0000", k).expect("predict");
        assert_eq!(items.len(), k.min(100 - 30), "k = {k}");
    }
}

#[test]
fn test_masked_items_never_returned() {
    let mask: Vec<(u32, u32)> = (0..50).map(|i| (2, i * 3)).collect();
    let recommender = catalogue(150, 3, &mask);

    let items = recommender.recommend("user-0002", 150).expect("predict");

    let masked: HashSet<u32> = recommender.mask().lookup(2).iter().copied().collect();
    for raw in &items {
        let code = recommender.item_encoder().transform(raw).expect("known item");
        assert!(!masked.contains(&code), "{raw} is masked");
    }
    assert_eq!(items.len(), 100);
}

#[test]
fn test_scores_non_increasing() {
    let recommender = catalogue(120, 1, &[]);

    let result = recommender
        .predict(&RecommendRequest::new("user-0000", 120))
        .expect("predict");

    for pair in result.scores.windows(2) {
        assert!(pair[0] >= pair[1], "{} before {}", pair[0], pair[1]);
    }
}

#[test]
fn test_ties_break_by_item_code() {
    let recommender = catalogue(21, 1, &[]);

    let result = recommender
        .predict(&RecommendRequest::new("user-0000", 3))
        .expect("predict");

    // score(i) = (37 i) mod 7 = 2 i mod 7; score 6 at i = 3, 10, 17.
    assert_eq!(result.items, vec!["item-0003", "item-0010", "item-0017"]);
}

#[test]
fn test_rank_nan_last() {
    let ranked = rank(&[0, 1, 2], &[f32::NAN, 0.5, -1.0], 3);

    let order: Vec<u32> = ranked.iter().map(|s| s.item).collect();
    assert_eq!(order, vec![1, 2, 0]);
}

#[test]
fn test_rank_partial_matches_full_sort() {
    let candidates: Vec<u32> = (0..500).collect();
    let scores: Vec<f32> = candidates.iter().map(|&i| ((i * 7919) % 101) as f32).collect();

    let full = rank(&candidates, &scores, candidates.len());
    let top = rank(&candidates, &scores, 40);

    assert_eq!(top, full[..40].to_vec());
}

#[test]
fn test_model_cardinality_mismatch() {
    let (items, users) = encoders();
    let scorer = StaticScorer::new(5, 2);

    let err = Recommender::new(Box::new(scorer), items, users, MaskMapping::new()).unwrap_err();
    assert!(matches!(err, RecommendError::InconsistentArtifacts { .. }));
}

#[test]
fn test_mask_out_of_range_rejected() {
    let (items, users) = encoders();
    let scorer = StaticScorer::new(3, 2);
    let mask = MaskMapping::from_pairs([(0, 3)]);

    let err = Recommender::new(Box::new(scorer), items, users, mask).unwrap_err();
    assert!(matches!(err, RecommendError::InconsistentArtifacts { .. }));
}

#[test]
fn test_mismatched_score_count_is_error() {
    struct Short;
    impl ScoringModel for Short {
        fn batch_score(&self, _: &[u32], _: &[u32]) -> Result<Vec<f32>, ScoringError> {
            Ok(vec![1.0])
        }
        fn item_cardinality(&self) -> usize {
            3
        }
        fn user_cardinality(&self) -> usize {
            2
        }
    }

    let (items, users) = encoders();
    let recommender = Recommender::new(Box::new(Short), items, users, MaskMapping::new()).unwrap();

    let err = recommender.recommend("u1", 2).unwrap_err();
    assert!(matches!(err, RecommendError::Scoring(_)));
}

#[test]
fn test_recommender_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Recommender>();

    let recommender = Arc::new(scenario());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let recommender = Arc::clone(&recommender);
            std::thread::spawn(move || recommender.recommend("u1", 2).expect("predict"))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("thread"), vec!["i3", "i2"]);
    }
}

#[test]
fn test_raw_identifier_from_json() {
    use serde_json::json;

    assert_eq!(
        RawIdentifier::from_json(&json!(276725)).unwrap().into_string(),
        "276725"
    );
    assert_eq!(
        RawIdentifier::from_json(&json!("u1")).unwrap().into_string(),
        "u1"
    );
    assert!(RawIdentifier::from_json(&json!(1.5)).is_err());
    assert!(RawIdentifier::from_json(&json!(["u1"])).is_err());
    assert!(RawIdentifier::from_json(&json!(null)).is_err());
}
