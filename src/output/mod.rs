//! Output module for reporting on a catalog checkpoint
//!
//! This module handles:
//! - Loading the checkpoint a report is built from
//! - Computing and printing catalog statistics
//! - Generating markdown summaries

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{compute_statistics, print_statistics, CatalogStatistics};

use crate::catalog::Catalog;
use crate::config::OutputConfig;
use crate::storage::{open_store, CheckpointStore, StorageError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("No checkpoint at {}, run a crawl first", .0.display())]
    NoCheckpoint(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Loads the checkpoint named by the output configuration
///
/// A missing checkpoint is reported as `OutputError::NoCheckpoint`, since
/// there is nothing to report on yet.
pub fn load_checkpoint(config: &OutputConfig) -> OutputResult<Catalog> {
    match open_store(config).load_checkpoint() {
        Ok(catalog) => Ok(catalog),
        Err(StorageError::NotFound(path)) => Err(OutputError::NoCheckpoint(path)),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Page;
    use tempfile::TempDir;

    fn output_config(dir: &TempDir) -> OutputConfig {
        OutputConfig {
            catalog_path: dir.path().join("catalog.json").display().to_string(),
            progress_path: dir.path().join("progress.json").display().to_string(),
            summary_path: dir.path().join("summary.md").display().to_string(),
        }
    }

    #[test]
    fn test_load_checkpoint() {
        let dir = TempDir::new().unwrap();
        let config = output_config(&dir);
        let catalog = Catalog::from_pages(vec![Page::new(1, vec![])]);
        open_store(&config).write_catalog(&catalog).unwrap();

        assert_eq!(load_checkpoint(&config).unwrap(), catalog);
    }

    #[test]
    fn test_load_missing_checkpoint() {
        let dir = TempDir::new().unwrap();
        let config = output_config(&dir);
        match load_checkpoint(&config) {
            Err(OutputError::NoCheckpoint(path)) => {
                assert_eq!(path, PathBuf::from(&config.catalog_path));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_load_corrupt_checkpoint_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let config = output_config(&dir);
        std::fs::write(&config.catalog_path, "{not json").unwrap();

        let result = load_checkpoint(&config);
        assert!(matches!(result, Err(OutputError::Storage(_))));
    }
}
