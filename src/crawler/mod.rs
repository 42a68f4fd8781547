//! Crawler module for listing extraction and enrichment
//!
//! This module contains the core crawling logic, including:
//! - HTML extraction of listing, detail, and pagination documents
//! - Pagination discovery on the listing root
//! - Listing page extraction with the end-of-listing sentinel
//! - Batched detail enrichment with bounded concurrency
//! - Overall crawl coordination, checkpointing, and recovery

mod coordinator;
mod discovery;
mod enricher;
mod listing;
mod parser;

pub use coordinator::{run_crawl, Coordinator, CrawlReport, Phase};
pub use discovery::PaginationDiscoverer;
pub use enricher::{DetailEnricher, EnrichOutcome};
pub use listing::{ListingError, ListingExtractor};
pub use parser::{
    parse_detail, parse_listing, parse_page_count, DetailFields, DetailSelectors,
    ListingSelectors, PaginationSelectors,
};
