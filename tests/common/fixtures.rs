//! Test fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use bookrec::constants::{
    ITEM_ENCODER_FILENAME, MASK_MAPPING_FILENAME, MODEL_CONFIG_FILENAME, MODEL_WEIGHTS_FILENAME,
    RAW_BOOKS_FILENAME, RAW_RATINGS_FILENAME, RAW_USERS_FILENAME, USER_ENCODER_FILENAME,
};
use bookrec::{ArtifactStore, IdentifierEncoder, MaskMapping, ModelConfig};
use candle_core::{Device, Tensor};

pub const ITEMS: [&str; 3] = ["i1", "i2", "i3"];

pub const USERS: [&str; 2] = ["u1", "u2"];

/// Writes a complete artifact directory for [`ITEMS`] x [`USERS`].
///
/// Dense weight `[1, 0]`, bias `0`; user `u1` embeds to `[1, 0]` and `u2` to
/// `[-1, 0]`, items to `[0.5]`, `[0.2]`, `[0.9]` in their first component, so
/// `u1` scores `[0.5, 0.2, 0.9]` and `u2` the negation. `u1` has rated `i1`.
pub fn write_artifacts(dir: &Path) {
    ArtifactBuilder::new().write(dir);
}

pub struct ArtifactBuilder {
    items: Vec<String>,
    users: Vec<String>,
    mask_pairs: Vec<(u32, u32)>,
    model_items: usize,
}

impl Default for ArtifactBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactBuilder {
    pub fn new() -> Self {
        Self {
            items: ITEMS.iter().map(|s| s.to_string()).collect(),
            users: USERS.iter().map(|s| s.to_string()).collect(),
            mask_pairs: vec![(0, 0)],
            model_items: ITEMS.len(),
        }
    }

    pub fn items(mut self, items: &[&str]) -> Self {
        self.items = items.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn mask_pairs(mut self, pairs: &[(u32, u32)]) -> Self {
        self.mask_pairs = pairs.to_vec();
        self
    }

    pub fn write(self, dir: &Path) {
        let store = ArtifactStore::new(dir);
        store.ensure_root().unwrap();

        IdentifierEncoder::fit(&self.items)
            .unwrap()
            .save(&store, ITEM_ENCODER_FILENAME)
            .unwrap();
        IdentifierEncoder::fit(&self.users)
            .unwrap()
            .save(&store, USER_ENCODER_FILENAME)
            .unwrap();
        MaskMapping::from_pairs(self.mask_pairs.iter().copied())
            .save(&store, MASK_MAPPING_FILENAME)
            .unwrap();

        let config = ModelConfig::new(self.model_items, USERS.len(), 2);
        config.save(&dir.join(MODEL_CONFIG_FILENAME)).unwrap();
        candle_core::safetensors::save(
            &fixed_tensors(self.model_items),
            dir.join(MODEL_WEIGHTS_FILENAME),
        )
        .unwrap();
    }
}

fn fixed_tensors(n_items: usize) -> HashMap<String, Tensor> {
    let device = Device::Cpu;
    let item_values = [0.5f32, 0.2, 0.9];
    let mut items = Vec::with_capacity((n_items + 1) * 2);
    for i in 0..=n_items {
        items.push(item_values.get(i).copied().unwrap_or(0.0));
        items.push(0.0);
    }

    let mut tensors = HashMap::new();
    tensors.insert(
        "item_embedding.weight".to_string(),
        Tensor::from_vec(items, (n_items + 1, 2), &device).unwrap(),
    );
    tensors.insert(
        "user_embedding.weight".to_string(),
        Tensor::from_slice(&[1.0f32, 0.0, -1.0, 0.0, 0.0, 0.0], (3, 2), &device).unwrap(),
    );
    tensors.insert(
        "dense.weight".to_string(),
        Tensor::from_slice(&[1.0f32, 0.0], (1, 2), &device).unwrap(),
    );
    tensors.insert(
        "dense.bias".to_string(),
        Tensor::from_slice(&[0.0f32], 1, &device).unwrap(),
    );
    tensors
}

/// A valid ISBN-10 for a nine-digit body.
pub fn isbn10(body: u32) -> String {
    let digits = format!("{:09}", body);
    let sum: u32 = digits
        .bytes()
        .enumerate()
        .map(|(i, b)| (10 - i as u32) * (b - b'0') as u32)
        .sum();
    let check = (11 - sum % 11) % 11;
    if check == 10 {
        format!("{}X", digits)
    } else {
        format!("{}{}", digits, check)
    }
}

/// Raw Book-Crossing style dump: `n_books` books, `n_users` users and a
/// deterministic rating pattern where user `u` rates book `b` when
/// `(u + b) % 3 != 0`, implicitly (rating 0) when `(u * b) % 4 == 0`.
pub fn write_raw_dump(dir: &Path, n_books: u32, n_users: u32) {
    let mut books = String::from(
        "\"ISBN\";\"Book-Title\";\"Book-Author\";\"Year-Of-Publication\";\"Publisher\";\"Image-URL-S\";\"Image-URL-M\";\"Image-URL-L\"\n",
    );
    for b in 0..n_books {
        writeln!(
            books,
            "\"{}\";\"Title {}\";\"Author {}\";\"{}\";\"Publisher &amp; Sons\";\"s\";\"m\";\"l\"",
            isbn10(100_000 + b),
            b,
            b % 5,
            1980 + b
        )
        .unwrap();
    }

    let mut users = String::from("\"User-ID\";\"Location\";\"Age\"\n");
    for u in 1..=n_users {
        writeln!(users, "\"{}\";\"city {}, region, country {}\";\"{}\"", u, u, u % 2, 20 + u).unwrap();
    }

    let mut ratings = String::from("\"User-ID\";\"ISBN\";\"Book-Rating\"\n");
    for u in 1..=n_users {
        for b in 0..n_books {
            if (u + b) % 3 == 0 {
                continue;
            }
            let rating = if (u * b) % 4 == 0 { 0 } else { 1 + (u + 2 * b) % 10 };
            writeln!(ratings, "\"{}\";\"{}\";\"{}\"", u, isbn10(100_000 + b), rating).unwrap();
        }
    }

    std::fs::write(dir.join(RAW_BOOKS_FILENAME), books).unwrap();
    std::fs::write(dir.join(RAW_USERS_FILENAME), users).unwrap();
    std::fs::write(dir.join(RAW_RATINGS_FILENAME), ratings).unwrap();
}
