//! Artifact directory: atomic writes and validated, memory-mapped reads.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use rkyv::rancor::Error as RkyvError;
use rkyv::to_bytes;
use tracing::debug;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::mapped::MappedArtifact;
use crate::storage::model::{
    ArchivedEncoderArtifact, ArchivedMaskArtifact, ENCODER_FORMAT, EncoderArtifact, MASK_FORMAT,
    MaskArtifact,
};

const TEMP_SUFFIX: &str = "tmp";

#[derive(Debug, Clone)]
/// Reads and writes named artifacts under a single directory.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the full path of artifact `name`.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Returns `true` if artifact `name` exists.
    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    /// Ensures the root directory exists.
    pub fn ensure_root(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.root).map_err(|e| StorageError::io(&self.root, e))
    }

    /// Fails with [`StorageError::NotFound`] unless artifact `name` exists.
    pub fn require(&self, name: &str) -> StorageResult<PathBuf> {
        let path = self.path(name);
        if !path.is_file() {
            return Err(StorageError::NotFound { path });
        }
        Ok(path)
    }

    /// Writes `bytes` to `name` via a temp file and rename, so readers never
    /// observe a partially written artifact.
    pub fn write_bytes(&self, name: &str, bytes: &[u8]) -> StorageResult<PathBuf> {
        self.ensure_root()?;

        let final_path = self.path(name);
        let temp_path = self.path(&format!("{}.{}", name, TEMP_SUFFIX));

        {
            let mut file = File::create(&temp_path).map_err(|e| StorageError::io(&temp_path, e))?;
            file.write_all(bytes)
                .map_err(|e| StorageError::io(&temp_path, e))?;
            file.sync_all().map_err(|e| StorageError::io(&temp_path, e))?;
        }

        fs::rename(&temp_path, &final_path).map_err(|e| StorageError::io(&final_path, e))?;

        debug!(path = %final_path.display(), bytes = bytes.len(), "Artifact written");
        Ok(final_path)
    }

    /// Reads artifact `name` fully into memory.
    pub fn read_bytes(&self, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.require(name)?;
        fs::read(&path).map_err(|e| StorageError::io(&path, e))
    }

    /// Opens a read-only mapping of artifact `name`.
    pub fn open(&self, name: &str) -> StorageResult<MappedArtifact> {
        MappedArtifact::open(&self.require(name)?)
    }

    pub fn write_encoder(&self, name: &str, artifact: &EncoderArtifact) -> StorageResult<PathBuf> {
        let bytes = to_bytes::<RkyvError>(artifact)
            .map_err(|e| StorageError::Serialization(format!("{:?}", e)))?;
        self.write_bytes(name, &bytes)
    }

    pub fn read_encoder(&self, name: &str) -> StorageResult<EncoderArtifact> {
        let map = self.open(name)?;
        let archived = map.archived::<ArchivedEncoderArtifact>()?;
        let artifact = rkyv::deserialize::<EncoderArtifact, RkyvError>(archived)
            .map_err(|e| map.corrupt(e.to_string()))?;

        if artifact.format != ENCODER_FORMAT {
            return Err(map.corrupt(format!(
                "unexpected format tag {:#010x}, expected encoder",
                artifact.format
            )));
        }

        Ok(artifact)
    }

    pub fn write_mask(&self, name: &str, artifact: &MaskArtifact) -> StorageResult<PathBuf> {
        let bytes = to_bytes::<RkyvError>(artifact)
            .map_err(|e| StorageError::Serialization(format!("{:?}", e)))?;
        self.write_bytes(name, &bytes)
    }

    pub fn read_mask(&self, name: &str) -> StorageResult<MaskArtifact> {
        let map = self.open(name)?;
        let archived = map.archived::<ArchivedMaskArtifact>()?;
        let artifact = rkyv::deserialize::<MaskArtifact, RkyvError>(archived)
            .map_err(|e| map.corrupt(e.to_string()))?;

        if artifact.format != MASK_FORMAT {
            return Err(map.corrupt(format!(
                "unexpected format tag {:#010x}, expected mask mapping",
                artifact.format
            )));
        }

        Ok(artifact)
    }
}
