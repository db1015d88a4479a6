//! Persistence of transform results and lookup for downloads.
//!
//! The crypto layer never touches storage. Handlers pass its output to an
//! [`ArtifactStore`], which writes it and hands back a download location.

pub mod fs;
pub mod naming;

use std::path::PathBuf;

use thiserror::Error;

pub use fs::FsStore;

/// Errors produced by the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The name is not a single safe path component.
    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    /// No artifact with this name exists.
    #[error("no such file: {0}")]
    NotFound(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of persisting a transform output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub filename: String,
    pub size: u64,
    pub download_url: String,
}

/// A sink for transform results.
///
/// Methods are blocking; async callers run them on the blocking pool.
#[cfg_attr(test, mockall::automock)]
pub trait ArtifactStore: Send + Sync {
    /// Write `bytes` under `name`, replacing any existing artifact.
    fn persist(&self, name: &str, bytes: &[u8]) -> Result<StoredArtifact, StoreError>;

    /// Resolve `name` to the path of an existing artifact.
    fn locate(&self, name: &str) -> Result<PathBuf, StoreError>;

    /// Whether the store can currently accept writes.
    fn is_ready(&self) -> bool;
}

/// Relative URL under which `name` is served.
pub fn download_url(name: &str) -> String {
    format!("/processed/{name}")
}
