//! Sparse-matrix export of the explicit ratings for WALS factorisation.
//!
//! Ids are assigned in order of first appearance in `ratings_clean.csv`
//! (unlike the sorted [`IdentifierEncoder`](crate::encoding::IdentifierEncoder)
//! codes), and the matrix is written twice: one TFRecord row per item listing
//! its raters, and one per user listing the rated items.

pub mod example;
pub mod tfrecord;


pub use example::Example;
pub use tfrecord::{RecordError, RecordWriter, masked_crc32c, read_records};

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use prost::Message;
use serde::Serialize;
use tracing::{info, instrument};

use super::error::{TrainingError, TrainingResult};
use crate::cleaning::{CleaningError, RatingRecord, read_csv};
use crate::constants::{
    CLEAN_RATINGS_FILENAME, ITEMS_FOR_USER_FILENAME, USERS_FOR_ITEM_FILENAME,
    WALS_BOOKS_MAPPING_FILENAME, WALS_RATINGS_FILENAME, WALS_USERS_MAPPING_FILENAME,
};

/// Raw id -> dense id, numbered by first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppearanceMapping {
    values: Vec<String>,
    ids: HashMap<String, u32>,
}

impl AppearanceMapping {
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mapping = Self::default();
        for value in values {
            let value = value.as_ref();
            if !mapping.ids.contains_key(value) {
                mapping.ids.insert(value.to_string(), mapping.values.len() as u32);
                mapping.values.push(value.to_string());
            }
        }
        mapping
    }

    pub fn id(&self, value: &str) -> Option<u32> {
        self.ids.get(value).copied()
    }

    /// Values in id order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Headerless `value,id` lines.
    pub fn write(&self, path: &Path) -> TrainingResult<()> {
        let rows = self
            .values
            .iter()
            .enumerate()
            .map(|(id, value)| (value.as_str(), id));
        write_headerless(path, rows)
    }
}

/// One explicit rating in first-appearance id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalsRating {
    pub visitor_id: u32,
    pub item_id: u32,
    pub rating: i32,
}

/// One row of the sparse rating matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseRow {
    pub key: u32,
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseRow {
    pub fn to_example(&self) -> Example {
        Example::sparse_row(
            self.key as i64,
            self.indices.iter().map(|&i| i as i64).collect(),
            self.values.clone(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    /// Rows keyed by item, indices are visitors.
    Item,
    /// Rows keyed by visitor, indices are items.
    Visitor,
}

/// Groups ratings into rows sorted by key; within a row the input order is kept.
pub fn group_ratings(ratings: &[WalsRating], by: GroupBy) -> Vec<SparseRow> {
    let mut rows: BTreeMap<u32, SparseRow> = BTreeMap::new();
    for rating in ratings {
        let (key, index) = match by {
            GroupBy::Item => (rating.item_id, rating.visitor_id),
            GroupBy::Visitor => (rating.visitor_id, rating.item_id),
        };
        let row = rows.entry(key).or_insert_with(|| SparseRow {
            key,
            indices: Vec::new(),
            values: Vec::new(),
        });
        row.indices.push(index);
        row.values.push(rating.rating as f32);
    }
    rows.into_values().collect()
}

/// Counts and locations of one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalsReport {
    pub ratings: usize,
    pub n_users: usize,
    pub n_items: usize,
    pub users_for_item: PathBuf,
    pub items_for_user: PathBuf,
}

/// Writes the mappings, the id-transformed ratings and both TFRecord files
/// into `data_dir`, reading `ratings_clean.csv` from the same place.
#[instrument(skip_all, fields(data_dir = %data_dir.display()))]
pub fn prepare_wals(data_dir: &Path) -> TrainingResult<WalsReport> {
    let ratings: Vec<RatingRecord> = read_csv(&data_dir.join(CLEAN_RATINGS_FILENAME))?;
    let explicit: Vec<&RatingRecord> = ratings.iter().filter(|r| r.rating != 0).collect();
    if explicit.is_empty() {
        return Err(TrainingError::EmptyTrainingSet {
            reason: format!("none of {} clean ratings is explicit", ratings.len()),
        });
    }

    let users = AppearanceMapping::from_values(explicit.iter().map(|r| r.user_id.to_string()));
    let items = AppearanceMapping::from_values(explicit.iter().map(|r| r.isbn.as_str()));
    users.write(&data_dir.join(WALS_USERS_MAPPING_FILENAME))?;
    items.write(&data_dir.join(WALS_BOOKS_MAPPING_FILENAME))?;

    let transformed = explicit
        .iter()
        .map(|r| {
            let visitor_id = users.id(&r.user_id.to_string());
            let item_id = items.id(&r.isbn);
            match (visitor_id, item_id) {
                (Some(visitor_id), Some(item_id)) => Ok(WalsRating {
                    visitor_id,
                    item_id,
                    rating: r.rating,
                }),
                _ => Err(TrainingError::OutOfRange {
                    reason: format!("rating ({}, {}) missing from its mapping", r.user_id, r.isbn),
                }),
            }
        })
        .collect::<TrainingResult<Vec<_>>>()?;
    write_headerless(&data_dir.join(WALS_RATINGS_FILENAME), transformed.iter())?;

    let users_for_item = data_dir.join(USERS_FOR_ITEM_FILENAME);
    let items_for_user = data_dir.join(ITEMS_FOR_USER_FILENAME);
    let item_rows = write_sparse_rows(&users_for_item, &group_ratings(&transformed, GroupBy::Item))?;
    let user_rows =
        write_sparse_rows(&items_for_user, &group_ratings(&transformed, GroupBy::Visitor))?;

    info!(
        ratings = transformed.len(),
        n_users = users.len(),
        n_items = items.len(),
        item_rows,
        user_rows,
        "WALS inputs written"
    );

    Ok(WalsReport {
        ratings: transformed.len(),
        n_users: users.len(),
        n_items: items.len(),
        users_for_item,
        items_for_user,
    })
}

fn write_headerless<I, T>(path: &Path, rows: I) -> TrainingResult<()>
where
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| CleaningError::csv(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| CleaningError::csv(path, e))?;
    }
    writer.flush().map_err(|e| CleaningError::io(path, e))?;
    Ok(())
}

fn write_sparse_rows(path: &Path, rows: &[SparseRow]) -> TrainingResult<usize> {
    let export = |e| TrainingError::Export {
        path: path.to_path_buf(),
        source: e,
    };
    let file = File::create(path).map_err(export)?;
    let mut writer = RecordWriter::new(BufWriter::new(file));
    for row in rows {
        writer
            .write_record(&row.to_example().encode_to_vec())
            .map_err(export)?;
    }
    let written = writer.records();
    writer.finish().map_err(export)?;
    Ok(written)
}
