//! Artifact persistence (rkyv archives, mmap reads, atomic writes).

pub mod artifact;
pub mod error;
pub mod mapped;
mod model;


pub use artifact::ArtifactStore;
pub use error::{StorageError, StorageResult};
pub use mapped::MappedArtifact;
pub use model::{
    ArchivedEncoderArtifact, ArchivedMaskArtifact, ArchivedMaskRow, ENCODER_FORMAT,
    EncoderArtifact, MASK_FORMAT, MaskArtifact, MaskRow,
};
