//! Catalog-Harvest: a resumable listing catalog crawler
//!
//! This crate walks the paginated listing of a content site, enriches every
//! listed item from its own detail page, and checkpoints the growing catalog
//! to disk after each page so an interrupted run loses at most one page of work.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod fetcher;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Page fetcher error: {0}")]
    Fetch(#[from] fetcher::FetchError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Giving up after {consecutive} consecutive failed listing pages")]
    TooManyFailures { consecutive: u32 },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogQuery, EnrichedItem, ItemStub, Page};
pub use config::Config;
pub use crawler::{run_crawl, Coordinator, CrawlReport};
pub use fetcher::{FetchError, PageFetcher, PageHandle};
