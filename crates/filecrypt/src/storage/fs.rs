//! [`FsStore`]: artifacts stored as plain files in the processed directory.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{download_url, naming, ArtifactStore, StoreError, StoredArtifact};

/// Filesystem-backed [`ArtifactStore`].
#[derive(Debug, Clone)]
pub struct FsStore {
    processed_dir: PathBuf,
}

impl FsStore {
    /// Create the upload and processed directories (if missing) and return a
    /// store writing into `processed_dir`.
    ///
    /// Called once at startup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if either directory cannot be created.
    pub fn init(upload_dir: &Path, processed_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(upload_dir)?;
        std::fs::create_dir_all(processed_dir)?;
        info!(
            upload_dir = %upload_dir.display(),
            processed_dir = %processed_dir.display(),
            "storage directories ready"
        );
        Ok(Self::new(processed_dir))
    }

    /// Wrap an existing directory without creating anything.
    pub fn new(processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            processed_dir: processed_dir.into(),
        }
    }

    fn checked_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        if !naming::is_safe(name) {
            return Err(StoreError::InvalidName(name.to_owned()));
        }
        Ok(self.processed_dir.join(name))
    }
}

impl ArtifactStore for FsStore {
    fn persist(&self, name: &str, bytes: &[u8]) -> Result<StoredArtifact, StoreError> {
        let path = self.checked_path(name)?;
        std::fs::write(&path, bytes)?;
        debug!(filename = name, size = bytes.len(), "artifact written");
        Ok(StoredArtifact {
            filename: name.to_owned(),
            size: bytes.len() as u64,
            download_url: download_url(name),
        })
    }

    fn locate(&self, name: &str) -> Result<PathBuf, StoreError> {
        let path = self.checked_path(name)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(StoreError::NotFound(name.to_owned()))
        }
    }

    fn is_ready(&self) -> bool {
        self.processed_dir.is_dir()
    }
}
