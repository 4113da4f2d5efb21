//! Clean table rows as written to the data directory.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    /// ISBN-13 digits.
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publication_year: i64,
    pub publisher: String,
    pub image_url_small: String,
    pub image_url_medium: String,
    pub image_url_large: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: u64,
    /// Last comma-separated component of the raw location.
    pub country: String,
    pub age: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: u64,
    /// ISBN-13 digits.
    pub isbn: String,
    /// `0` is an implicit interaction, `1..=10` an explicit rating.
    pub rating: i32,
}

/// Rows read and kept for one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableReport {
    pub read: usize,
    pub kept: usize,
}

impl TableReport {
    pub fn dropped(&self) -> usize {
        self.read - self.kept
    }
}

/// Outcome of one cleaning run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub books: TableReport,
    pub users: TableReport,
    pub ratings: TableReport,
    /// Ratings dropped because their ISBN is not in the clean book table.
    pub ratings_without_book: usize,
}
