//! Storage module for persisting the catalog
//!
//! This module handles checkpointing for the crawler:
//! - Whole-catalog snapshots written after every completed page
//! - Loading the last checkpoint to resume a crawl
//! - Loading a partial-progress snapshot on the recovery path

mod json;
mod traits;

pub use json::{read_catalog, to_checkpoint_bytes, JsonCheckpointStore};
pub use traits::{CheckpointStore, StorageError, StorageResult};

use crate::config::OutputConfig;

/// Opens the JSON checkpoint store described by the output configuration
pub fn open_store(config: &OutputConfig) -> JsonCheckpointStore {
    JsonCheckpointStore::new(&config.catalog_path).with_progress_path(&config.progress_path)
}
