//! JSON file checkpoint backend
//!
//! The catalog is written pretty-printed to a temporary sibling file and
//! renamed over the checkpoint, so the checkpoint path always holds a
//! complete document.

use crate::catalog::Catalog;
use crate::storage::traits::{CheckpointStore, StorageError, StorageResult};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Checkpoint store over a JSON file, with an optional read-only progress file
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    catalog_path: PathBuf,
    progress_path: Option<PathBuf>,
}

impl JsonCheckpointStore {
    pub fn new(catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            progress_path: None,
        }
    }

    /// Adds a progress file consulted before the checkpoint by `load_latest`
    pub fn with_progress_path(mut self, progress_path: impl Into<PathBuf>) -> Self {
        self.progress_path = Some(progress_path.into());
        self
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .catalog_path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("catalog"));
        name.push(".tmp");
        self.catalog_path.with_file_name(name)
    }
}

/// Serializes a catalog exactly as it is written to disk
pub fn to_checkpoint_bytes(catalog: &Catalog) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec_pretty(catalog)
}

/// Reads a catalog from a JSON file
pub fn read_catalog(path: &Path) -> StorageResult<Catalog> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StorageError::NotFound(path.to_path_buf()))
        }
        Err(source) => {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_slice(&content).map_err(|source| StorageError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError {
    let path = path.to_path_buf();
    move |source| StorageError::Io { path, source }
}

impl CheckpointStore for JsonCheckpointStore {
    fn write_catalog(&self, catalog: &Catalog) -> StorageResult<()> {
        let bytes = to_checkpoint_bytes(catalog).map_err(|source| StorageError::Serialization {
            path: self.catalog_path.clone(),
            source,
        })?;

        if let Some(parent) = self.catalog_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_error(parent))?;
            }
        }

        let temp_path = self.temp_path();
        {
            let mut file = File::create(&temp_path).map_err(io_error(&temp_path))?;
            file.write_all(&bytes).map_err(io_error(&temp_path))?;
            file.sync_all().map_err(io_error(&temp_path))?;
        }

        fs::rename(&temp_path, &self.catalog_path).map_err(io_error(&self.catalog_path))?;

        tracing::debug!(
            "Wrote checkpoint {} ({} pages, {} bytes)",
            self.catalog_path.display(),
            catalog.len(),
            bytes.len()
        );
        Ok(())
    }

    fn load_checkpoint(&self) -> StorageResult<Catalog> {
        read_catalog(&self.catalog_path)
    }

    fn load_latest(&self) -> StorageResult<Catalog> {
        if let Some(progress_path) = &self.progress_path {
            match read_catalog(progress_path) {
                Ok(catalog) => {
                    tracing::info!(
                        "Recovered {} pages from progress file {}",
                        catalog.len(),
                        progress_path.display()
                    );
                    return Ok(catalog);
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!("No progress file at {}", progress_path.display());
                }
                Err(e) => {
                    tracing::warn!("Ignoring unreadable progress file: {}", e);
                }
            }
        }

        self.load_checkpoint()
    }
}
