//! Archived artifact types.

use rkyv::{Archive, Deserialize, Serialize};

/// Format tag stored in every [`EncoderArtifact`].
pub const ENCODER_FORMAT: u32 = 0x454E_4301;

/// Format tag stored in every [`MaskArtifact`].
pub const MASK_FORMAT: u32 = 0x4D53_4B01;

/// Persisted identifier encoder: the sorted class list, position = code.
///
/// # Example
/// ```rust
/// use bookrec::storage::{ENCODER_FORMAT, EncoderArtifact};
///
/// let artifact = EncoderArtifact::new(vec!["a".into(), "b".into()]);
/// assert_eq!(artifact.format, ENCODER_FORMAT);
/// ```
#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Clone)]
pub struct EncoderArtifact {
    /// Format tag, always [`ENCODER_FORMAT`].
    pub format: u32,
    /// Raw identifiers in code order.
    pub classes: Vec<String>,
}

impl EncoderArtifact {
    pub fn new(classes: Vec<String>) -> Self {
        Self {
            format: ENCODER_FORMAT,
            classes,
        }
    }
}

/// Items already rated by one encoded user.
#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Clone)]
pub struct MaskRow {
    /// Encoded user index.
    pub user: u32,
    /// Encoded item indices, ascending.
    pub items: Vec<u32>,
}

/// Persisted mask mapping, one row per user with at least one rated item.
#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Clone)]
pub struct MaskArtifact {
    /// Format tag, always [`MASK_FORMAT`].
    pub format: u32,
    pub rows: Vec<MaskRow>,
}

impl MaskArtifact {
    pub fn new(rows: Vec<MaskRow>) -> Self {
        Self {
            format: MASK_FORMAT,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rkyv::rancor::Error;
    use rkyv::{access, from_bytes, to_bytes};

    fn sample_mask() -> MaskArtifact {
        MaskArtifact::new(vec![
            MaskRow {
                user: 0,
                items: vec![0, 4, 9],
            },
            MaskRow {
                user: 3,
                items: vec![2],
            },
        ])
    }

    #[test]
    fn test_encoder_artifact_serialization() {
        let original = EncoderArtifact::new(vec![
            "9780002005012".to_string(),
            "9780060973131".to_string(),
        ]);

        let bytes = to_bytes::<Error>(&original).expect("serialization should succeed");
        let restored: EncoderArtifact =
            from_bytes::<EncoderArtifact, Error>(&bytes).expect("deserialization should succeed");

        assert_eq!(original, restored);
    }

    #[test]
    fn test_mask_artifact_zero_copy_access() {
        let original = sample_mask();

        let bytes = to_bytes::<Error>(&original).expect("serialization should succeed");
        let archived =
            access::<ArchivedMaskArtifact, Error>(&bytes).expect("archive access should succeed");

        assert_eq!(archived.format.to_native(), MASK_FORMAT);
        assert_eq!(archived.rows.len(), 2);
        assert_eq!(archived.rows[0].user.to_native(), 0u32);
        assert_eq!(archived.rows[0].items.len(), 3);
        assert_eq!(archived.rows[1].items[0].to_native(), 2u32);
    }

    #[test]
    fn test_format_tags_differ() {
        assert_ne!(ENCODER_FORMAT, MASK_FORMAT);
    }

    #[test]
    fn test_garbage_bytes_fail_validation() {
        let mut bytes = to_bytes::<Error>(&sample_mask()).expect("serialization should succeed");
        for byte in bytes.iter_mut() {
            *byte = 0xFF;
        }

        assert!(from_bytes::<MaskArtifact, Error>(&bytes).is_err());
    }
}
