//! Raw Book-Crossing dump -> clean comma-separated tables.
//!
//! The raw files are semicolon-delimited ISO-8859-1 with stray quotes in a
//! handful of book rows. Those are patched with literal replacements before
//! parsing; any row that still does not parse is skipped and counted.

pub mod error;
pub mod isbn;
pub mod records;


pub use error::{CleaningError, CleaningResult};
pub use isbn::to_isbn13;
pub use records::{BookRecord, CleaningReport, RatingRecord, TableReport, UserRecord};

use std::collections::HashSet;
use std::path::Path;

use csv::StringRecord;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::constants::{
    CLEAN_BOOKS_FILENAME, CLEAN_RATINGS_FILENAME, CLEAN_USERS_FILENAME, RAW_BOOKS_FILENAME,
    RAW_RATINGS_FILENAME, RAW_USERS_FILENAME,
};

/// Applied to the raw book file, in order, before parsing.
const BOOK_REPLACEMENTS: [(&str, &str); 7] = [
    ("&amp;", "&"),
    ("\"; ", "\" "),
    (" ; ", " "),
    ("'", ""),
    ("Raag\\\";\\\"Free", "Raag\\\" \\\"Free"),
    ("aders)\\\"", "aders)"),
    ("Bergers\\\"", "Bergers"),
];

/// Cleans `books.csv`, `users.csv` and `ratings.csv` from `input_dir` into
/// `*_clean.csv` files in `output_dir`.
pub fn clean_dir(input_dir: &Path, output_dir: &Path) -> CleaningResult<CleaningReport> {
    let books_raw = read_latin1(&input_dir.join(RAW_BOOKS_FILENAME))?;
    let users_raw = read_latin1(&input_dir.join(RAW_USERS_FILENAME))?;
    let ratings_raw = read_latin1(&input_dir.join(RAW_RATINGS_FILENAME))?;

    let (books, books_report) = clean_books(&books_raw);
    let (users, users_report) = clean_users(&users_raw);
    let (ratings, mut ratings_report) = clean_ratings(&ratings_raw);

    let known: HashSet<&str> = books.iter().map(|b| b.isbn.as_str()).collect();
    let before = ratings.len();
    let ratings: Vec<RatingRecord> = ratings
        .into_iter()
        .filter(|r| known.contains(r.isbn.as_str()))
        .collect();
    let ratings_without_book = before - ratings.len();
    ratings_report.kept = ratings.len();

    std::fs::create_dir_all(output_dir).map_err(|e| CleaningError::io(output_dir, e))?;
    write_csv(&output_dir.join(CLEAN_BOOKS_FILENAME), &books)?;
    write_csv(&output_dir.join(CLEAN_USERS_FILENAME), &users)?;
    write_csv(&output_dir.join(CLEAN_RATINGS_FILENAME), &ratings)?;

    let report = CleaningReport {
        books: books_report,
        users: users_report,
        ratings: ratings_report,
        ratings_without_book,
    };

    info!(
        books_read = report.books.read,
        books_kept = report.books.kept,
        users_read = report.users.read,
        users_kept = report.users.kept,
        ratings_read = report.ratings.read,
        ratings_kept = report.ratings.kept,
        ratings_without_book,
        output = %output_dir.display(),
        "Cleaning complete"
    );

    Ok(report)
}

/// Reads a file as ISO-8859-1; every byte maps to the code point of the same value.
pub fn read_latin1(path: &Path) -> CleaningResult<String> {
    if !path.exists() {
        return Err(CleaningError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path).map_err(|e| CleaningError::io(path, e))?;
    Ok(decode_latin1(&bytes))
}

pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Patches known quoting defects in the raw book file.
pub fn patch_book_text(raw: &str) -> String {
    BOOK_REPLACEMENTS
        .iter()
        .fold(raw.to_string(), |text, (from, to)| text.replace(from, to))
}

pub fn clean_books(raw: &str) -> (Vec<BookRecord>, TableReport) {
    let text = patch_book_text(raw);
    let mut report = TableReport::default();
    let mut books = Vec::new();
    let mut skipped = 0usize;

    for (line, record) in raw_records(&text) {
        report.read += 1;
        let Some(record) = record else {
            skipped += 1;
            continue;
        };
        match parse_book(&record) {
            Some(book) => books.push(book),
            None => {
                skipped += 1;
                debug!(line, "Skipping unparsable book row");
            }
        }
    }

    report.kept = books.len();
    if skipped > 0 {
        warn!(table = "books", skipped, "Skipped rows during cleaning");
    }
    (books, report)
}

pub fn clean_users(raw: &str) -> (Vec<UserRecord>, TableReport) {
    let mut report = TableReport::default();
    let mut users = Vec::new();
    let mut skipped = 0usize;

    for (line, record) in raw_records(raw) {
        report.read += 1;
        match record.as_ref().and_then(parse_user) {
            Some(user) => users.push(user),
            None => {
                skipped += 1;
                debug!(line, "Skipping unparsable user row");
            }
        }
    }

    report.kept = users.len();
    if skipped > 0 {
        warn!(table = "users", skipped, "Skipped rows during cleaning");
    }
    (users, report)
}

/// Parses ratings and canonicalises their ISBNs; `kept` counts rows with a
/// valid ISBN, before the join against the book table.
pub fn clean_ratings(raw: &str) -> (Vec<RatingRecord>, TableReport) {
    let mut report = TableReport::default();
    let mut ratings = Vec::new();
    let mut skipped = 0usize;

    for (line, record) in raw_records(raw) {
        report.read += 1;
        match record.as_ref().and_then(parse_rating) {
            Some(rating) => ratings.push(rating),
            None => {
                skipped += 1;
                debug!(line, "Skipping unparsable rating row");
            }
        }
    }

    report.kept = ratings.len();
    if skipped > 0 {
        warn!(table = "ratings", skipped, "Skipped rows during cleaning");
    }
    (ratings, report)
}

/// Data rows of a semicolon-delimited table with their line numbers; `None`
/// marks rows the CSV reader could not split.
fn raw_records(text: &str) -> impl Iterator<Item = (u64, Option<StringRecord>)> + '_ {
    csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes())
        .into_records()
        .map(|result| match result {
            Ok(record) => (record.position().map_or(0, |p| p.line()), Some(record)),
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                debug!(line, error = %e, "Malformed CSV row");
                (line, None)
            }
        })
}

fn field(record: &StringRecord, index: usize) -> Option<&str> {
    record.get(index)
}

fn parse_book(record: &StringRecord) -> Option<BookRecord> {
    if record.len() != 8 {
        return None;
    }
    let isbn = to_isbn13(field(record, 0)?)?;
    let publication_year = field(record, 3)?.trim().parse::<i64>().ok()?;

    Some(BookRecord {
        isbn,
        title: field(record, 1)?.to_string(),
        author: field(record, 2)?.to_string(),
        publication_year,
        publisher: field(record, 4)?.to_string(),
        image_url_small: field(record, 5)?.to_string(),
        image_url_medium: field(record, 6)?.to_string(),
        image_url_large: field(record, 7)?.to_string(),
    })
}

fn parse_user(record: &StringRecord) -> Option<UserRecord> {
    if record.len() != 3 {
        return None;
    }
    let user_id = field(record, 0)?.trim().parse::<u64>().ok()?;
    let location = field(record, 1)?;
    let country = location.rsplit(',').next().unwrap_or(location).to_string();
    let age = match field(record, 2)?.trim() {
        "" | "NULL" => None,
        value => Some(value.parse::<f64>().ok()?),
    };

    Some(UserRecord {
        user_id,
        country,
        age,
    })
}

fn parse_rating(record: &StringRecord) -> Option<RatingRecord> {
    if record.len() != 3 {
        return None;
    }
    let user_id = field(record, 0)?.trim().parse::<u64>().ok()?;
    let isbn = to_isbn13(field(record, 1)?)?;
    let rating = field(record, 2)?.trim().parse::<i32>().ok()?;

    Some(RatingRecord {
        user_id,
        isbn,
        rating,
    })
}

/// Writes `rows` as a comma-separated file with a header row.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> CleaningResult<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| CleaningError::csv(path, e))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| CleaningError::csv(path, e))?;
    }
    writer.flush().map_err(|e| CleaningError::io(path, e))?;
    debug!(path = %path.display(), rows = rows.len(), "Wrote clean table");
    Ok(())
}

/// Reads a clean table written by [`write_csv`].
pub fn read_csv<T: serde::de::DeserializeOwned>(path: &Path) -> CleaningResult<Vec<T>> {
    if !path.exists() {
        return Err(CleaningError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let mut reader = csv::Reader::from_path(path).map_err(|e| CleaningError::csv(path, e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| CleaningError::csv(path, e))
}
