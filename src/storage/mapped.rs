//! Read-only memory maps over validated rkyv archives.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use rkyv::Portable;
use rkyv::api::high::{HighValidator, access};
use rkyv::bytecheck::CheckBytes;
use rkyv::rancor::Error as RkyvError;

use super::error::{StorageError, StorageResult};

/// Archive roots must start on this boundary.
pub const ARCHIVE_ALIGNMENT: usize = 16;

/// An artifact file mapped into memory for the duration of one read.
pub struct MappedArtifact {
    map: Mmap,
    path: PathBuf,
}

impl std::fmt::Debug for MappedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedArtifact")
            .field("path", &self.path)
            .field("len", &self.map.len())
            .finish()
    }
}

impl MappedArtifact {
    /// Maps `path`; a missing file is `NotFound`, an empty one `Corrupt`.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound {
                path: path.to_path_buf(),
            },
            _ => StorageError::io(path, e),
        })?;

        let len = file.metadata().map_err(|e| StorageError::io(path, e))?.len();
        if len == 0 {
            return Err(StorageError::Corrupt {
                path: path.to_path_buf(),
                reason: "file is empty".to_string(),
            });
        }

        // SAFETY: Artifacts are written once via temp-file + rename and never
        // modified in place, so the mapped bytes cannot change underneath us.
        let map = unsafe { Mmap::map(&file) }.map_err(|e| StorageError::io(path, e))?;

        Ok(Self {
            map,
            path: path.to_path_buf(),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.map
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn corrupt(&self, reason: impl Into<String>) -> StorageError {
        StorageError::Corrupt {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    /// Validates the bytes as an archive of `T` and returns its root.
    pub fn archived<T>(&self) -> StorageResult<&T>
    where
        T: Portable + for<'a> CheckBytes<HighValidator<'a, RkyvError>>,
    {
        let data = self.bytes();
        if (data.as_ptr() as usize) % ARCHIVE_ALIGNMENT != 0 {
            return Err(self.corrupt(format!(
                "mapping is not aligned to {} bytes",
                ARCHIVE_ALIGNMENT
            )));
        }

        access::<T, RkyvError>(data).map_err(|e| self.corrupt(format!("archive validation failed: {}", e)))
    }
}
