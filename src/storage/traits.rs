//! Storage traits and error types
//!
//! This module defines the trait interface for checkpoint backends and
//! associated error types.

use crate::catalog::Catalog;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("No checkpoint found at {0}")]
    NotFound(PathBuf),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error in {path}: {source}")]
    Serialization {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for checkpoint backend implementations
///
/// A backend holds one self-contained snapshot of the catalog. Each write
/// replaces the previous snapshot as a whole; a reader sees either the old
/// snapshot or the new one.
pub trait CheckpointStore: Send {
    /// Replaces the checkpoint with `catalog`
    fn write_catalog(&self, catalog: &Catalog) -> StorageResult<()>;

    /// Loads the checkpoint written by `write_catalog`
    fn load_checkpoint(&self) -> StorageResult<Catalog>;

    /// Loads the most recent partial-progress snapshot
    ///
    /// Backends may consult a separate progress source first and fall back
    /// to the checkpoint. Fails with `StorageError::NotFound` when neither exists.
    fn load_latest(&self) -> StorageResult<Catalog>;
}
