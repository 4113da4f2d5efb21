//! Identifier encoding: raw user/item ids <-> dense codes.
//!
//! Classes are the distinct raw identifiers in byte order, so fitting the
//! same set of ids always yields the same codes regardless of input order.
//! The serving path only ever calls the read-side methods.

pub mod error;

pub use error::EncoderError;

use std::collections::{BTreeSet, HashMap};

use crate::storage::{ArtifactStore, EncoderArtifact, StorageResult};

/// Ordered bijection between raw identifiers and codes `0..cardinality`.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierEncoder {
    classes: Vec<String>,
    index: HashMap<String, u32>,
}

impl IdentifierEncoder {
    /// Fits an encoder on every distinct identifier in `ids`.
    pub fn fit<I, S>(ids: I) -> Result<Self, EncoderError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = ids.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::from_classes(distinct.into_iter().collect())
    }

    /// Rebuilds an encoder from an already-sorted class list.
    pub fn from_classes(classes: Vec<String>) -> Result<Self, EncoderError> {
        if u32::try_from(classes.len()).is_err() {
            return Err(EncoderError::TooManyClasses {
                cardinality: classes.len(),
            });
        }

        if let Some(position) = classes.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(EncoderError::UnsortedClasses {
                position: position + 1,
            });
        }

        let index = classes
            .iter()
            .enumerate()
            .map(|(code, id)| (id.clone(), code as u32))
            .collect();

        Ok(Self { classes, index })
    }

    /// Number of known identifiers.
    pub fn cardinality(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Known identifiers in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn contains(&self, raw_id: &str) -> bool {
        self.index.contains_key(raw_id)
    }

    /// Maps a raw identifier to its code.
    pub fn transform(&self, raw_id: &str) -> Result<u32, EncoderError> {
        self.index
            .get(raw_id)
            .copied()
            .ok_or_else(|| EncoderError::UnknownIdentifier {
                id: raw_id.to_string(),
            })
    }

    /// Maps every identifier, failing on the first unknown one.
    pub fn transform_many<I, S>(&self, raw_ids: I) -> Result<Vec<u32>, EncoderError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw_ids
            .into_iter()
            .map(|id| self.transform(id.as_ref()))
            .collect()
    }

    /// Maps a code back to its raw identifier.
    pub fn decode(&self, code: u32) -> Result<&str, EncoderError> {
        self.classes
            .get(code as usize)
            .map(String::as_str)
            .ok_or(EncoderError::IndexOutOfRange {
                index: code,
                cardinality: self.classes.len(),
            })
    }

    /// Maps codes back to raw identifiers, preserving order.
    pub fn inverse_transform(&self, codes: &[u32]) -> Result<Vec<String>, EncoderError> {
        codes
            .iter()
            .map(|&code| self.decode(code).map(str::to_string))
            .collect()
    }

    pub fn to_artifact(&self) -> EncoderArtifact {
        EncoderArtifact::new(self.classes.clone())
    }

    pub fn save(&self, store: &ArtifactStore, name: &str) -> StorageResult<()> {
        store.write_encoder(name, &self.to_artifact())?;
        Ok(())
    }
}

impl TryFrom<EncoderArtifact> for IdentifierEncoder {
    type Error = EncoderError;

    fn try_from(artifact: EncoderArtifact) -> Result<Self, Self::Error> {
        Self::from_classes(artifact.classes)
    }
}
