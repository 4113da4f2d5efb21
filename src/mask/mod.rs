//! Mask store: items each user already rated.
//!
//! Keys are **encoded user indices**, the codes produced by the user
//! [`IdentifierEncoder`](crate::encoding::IdentifierEncoder). Keying by raw id
//! would silently return empty masks after any re-encoding, so the mapping is
//! checked against both encoders before serving.

pub mod error;

pub use error::MaskError;

use std::collections::{BTreeSet, HashMap};

use crate::storage::{ArtifactStore, MaskArtifact, MaskRow, StorageResult};

static EMPTY: BTreeSet<u32> = BTreeSet::new();

/// Encoded user index -> encoded item indices already rated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaskMapping {
    rated: HashMap<u32, BTreeSet<u32>>,
}

impl MaskMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mapping from `(user, item)` interaction pairs.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut mapping = Self::new();
        for (user, item) in pairs {
            mapping.insert(user, item);
        }
        mapping
    }

    pub fn insert(&mut self, user: u32, item: u32) {
        self.rated.entry(user).or_default().insert(item);
    }

    /// Items rated by `user`; empty when the user has no recorded interactions.
    pub fn lookup(&self, user: u32) -> &BTreeSet<u32> {
        self.rated.get(&user).unwrap_or(&EMPTY)
    }

    /// Number of users with at least one masked item.
    pub fn len(&self) -> usize {
        self.rated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rated.is_empty()
    }

    /// Total masked `(user, item)` pairs.
    pub fn pair_count(&self) -> usize {
        self.rated.values().map(BTreeSet::len).sum()
    }

    /// Checks every key and item against the encoder cardinalities.
    pub fn validate(&self, n_users: usize, n_items: usize) -> Result<(), MaskError> {
        for (&user, items) in &self.rated {
            if user as usize >= n_users {
                return Err(MaskError::UserOutOfRange { user, n_users });
            }
            // BTreeSet is ordered, so the last item is the largest.
            if let Some(&item) = items.last()
                && item as usize >= n_items
            {
                return Err(MaskError::ItemOutOfRange {
                    user,
                    item,
                    n_items,
                });
            }
        }
        Ok(())
    }

    pub fn to_artifact(&self) -> MaskArtifact {
        let mut rows: Vec<MaskRow> = self
            .rated
            .iter()
            .map(|(&user, items)| MaskRow {
                user,
                items: items.iter().copied().collect(),
            })
            .collect();
        rows.sort_by_key(|row| row.user);
        MaskArtifact::new(rows)
    }

    pub fn save(&self, store: &ArtifactStore, name: &str) -> StorageResult<()> {
        store.write_mask(name, &self.to_artifact())?;
        Ok(())
    }
}

impl TryFrom<MaskArtifact> for MaskMapping {
    type Error = MaskError;

    fn try_from(artifact: MaskArtifact) -> Result<Self, Self::Error> {
        let mut rated = HashMap::with_capacity(artifact.rows.len());
        for row in artifact.rows {
            let user = row.user;
            if rated.insert(user, row.items.into_iter().collect()).is_some() {
                return Err(MaskError::DuplicateUser { user });
            }
        }
        Ok(Self { rated })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> MaskMapping {
        MaskMapping::from_pairs([(0, 0), (0, 2), (1, 1), (0, 2)])
    }

    #[test]
    fn test_lookup_known_user() {
        let mask = sample();

        let items: Vec<u32> = mask.lookup(0).iter().copied().collect();
        assert_eq!(items, vec![0, 2]);
        assert_eq!(mask.len(), 2);
        assert_eq!(mask.pair_count(), 3);
    }

    #[test]
    fn test_lookup_unknown_user_is_empty() {
        let mask = sample();

        assert!(mask.lookup(42).is_empty());
    }

    #[test]
    fn test_validate_in_range() {
        assert_eq!(sample().validate(2, 3), Ok(()));
    }

    #[test]
    fn test_validate_user_out_of_range() {
        assert_eq!(
            sample().validate(1, 3),
            Err(MaskError::UserOutOfRange {
                user: 1,
                n_users: 1
            })
        );
    }

    #[test]
    fn test_validate_item_out_of_range() {
        assert_eq!(
            sample().validate(2, 2),
            Err(MaskError::ItemOutOfRange {
                user: 0,
                item: 2,
                n_items: 2
            })
        );
    }

    #[test]
    fn test_artifact_rows_sorted() {
        let artifact = MaskMapping::from_pairs([(5, 1), (2, 3), (2, 0)]).to_artifact();

        let users: Vec<u32> = artifact.rows.iter().map(|r| r.user).collect();
        assert_eq!(users, vec![2, 5]);
        assert_eq!(artifact.rows[0].items, vec![0, 3]);
    }

    #[test]
    fn test_duplicate_rows_rejected() {
        let artifact = MaskArtifact::new(vec![
            MaskRow {
                user: 1,
                items: vec![0],
            },
            MaskRow {
                user: 1,
                items: vec![2],
            },
        ]);

        assert_eq!(
            MaskMapping::try_from(artifact),
            Err(MaskError::DuplicateUser { user: 1 })
        );
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().expect("tempdir");
        let store = ArtifactStore::new(dir.path());
        let mask = sample();

        mask.save(&store, "to_mask_items.mapping").expect("save");
        let reloaded =
            MaskMapping::try_from(store.read_mask("to_mask_items.mapping").expect("read"))
                .expect("valid");

        assert_eq!(reloaded, mask);
    }
}
