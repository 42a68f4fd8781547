//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that drives the crawl, including:
//! - Loading the checkpoint to resume an interrupted crawl
//! - Discovering the page count once
//! - Extracting, enriching, and checkpointing listing pages strictly in order
//! - Recovering and persisting a best-effort result when the crawl aborts

use crate::catalog::{Catalog, Page};
use crate::config::{Config, CrawlerConfig};
use crate::crawler::discovery::PaginationDiscoverer;
use crate::crawler::enricher::{DetailEnricher, EnrichOutcome};
use crate::crawler::listing::{ListingError, ListingExtractor};
use crate::fetcher::{FetchError, HttpFetcher, PageFetcher};
use crate::storage::{open_store, CheckpointStore, StorageResult};
use crate::{HarvestError, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Where the coordinator is in the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discovering,
    Extracting(u32),
    Enriching(u32),
    Checkpointing(u32),
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Discovering => write!(f, "discovering"),
            Phase::Extracting(page) => write!(f, "extracting page {}", page),
            Phase::Enriching(page) => write!(f, "enriching page {}", page),
            Phase::Checkpointing(page) => write!(f, "checkpointing page {}", page),
            Phase::Done => write!(f, "done"),
        }
    }
}

/// Final result of a crawl
#[derive(Debug)]
pub struct CrawlReport {
    /// The catalog as last persisted
    pub catalog: Catalog,

    /// True if the crawl reached a normal termination
    pub completed: bool,

    /// The error that aborted the crawl, or a failure of the final checkpoint
    pub error: Option<HarvestError>,
}

impl CrawlReport {
    pub fn is_success(&self) -> bool {
        self.completed && self.error.is_none()
    }
}

/// What became of one listing page
#[derive(Debug)]
enum PageStep {
    /// Enriched and added to the catalog
    Added,
    /// Cards were present but none was an item
    Empty,
    NoContent,
    /// Transient fetch failure
    Skipped(FetchError),
}

/// Main crawler coordinator structure
pub struct Coordinator {
    crawler: CrawlerConfig,
    discoverer: PaginationDiscoverer,
    extractor: ListingExtractor,
    enricher: DetailEnricher,
    store: Box<dyn CheckpointStore>,
    catalog: Catalog,
    gaps: Vec<u32>,
    start_page: u32,
    phase: Phase,
}

impl Coordinator {
    /// Creates a coordinator over HTTP and the configured checkpoint files
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fresh` - Whether to ignore any existing checkpoint and start at page 1
    pub fn new(config: Config, fresh: bool) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.user_agent)?;
        let store = open_store(&config.output);
        Self::with_parts(&config, Arc::new(fetcher), Box::new(store), fresh)
    }

    /// Creates a coordinator from an explicit fetcher and checkpoint store
    ///
    /// Unless `fresh` is set, the checkpoint is loaded and the crawl resumes
    /// after its highest page. A checkpoint that exists but cannot be read is
    /// an error rather than a silent fresh start.
    pub fn with_parts(
        config: &Config,
        fetcher: Arc<dyn PageFetcher>,
        store: Box<dyn CheckpointStore>,
        fresh: bool,
    ) -> Result<Self> {
        let catalog = if fresh {
            tracing::info!("Starting fresh crawl");
            Catalog::new()
        } else {
            match store.load_checkpoint() {
                Ok(catalog) => {
                    tracing::info!(
                        "Resuming from checkpoint with {} pages ({} items)",
                        catalog.len(),
                        catalog.item_count()
                    );
                    catalog
                }
                Err(e) if e.is_not_found() => {
                    tracing::info!("No checkpoint found, starting new crawl");
                    Catalog::new()
                }
                Err(e) => return Err(e.into()),
            }
        };

        let start_page = catalog.last_page_number().map_or(1, |last| last + 1);
        let gaps = catalog.missing_pages();
        if !gaps.is_empty() {
            tracing::info!("Checkpoint is missing pages {:?}", gaps);
        }

        Ok(Self {
            crawler: config.crawler.clone(),
            discoverer: PaginationDiscoverer::new(config, Arc::clone(&fetcher))?,
            extractor: ListingExtractor::new(config, Arc::clone(&fetcher))?,
            enricher: DetailEnricher::new(config, fetcher)?,
            store,
            catalog,
            gaps,
            start_page,
            phase: Phase::Discovering,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// First listing page after the checkpointed ones
    pub fn start_page(&self) -> u32 {
        self.start_page
    }

    /// Checkpoint gaps this run revisits before `start_page`
    pub fn gaps(&self) -> &[u32] {
        &self.gaps
    }

    /// Runs the main crawl loop
    ///
    /// Pages missing from a resumed checkpoint are revisited first, then the
    /// crawl continues after the highest checkpointed page. Returns Ok on
    /// normal termination: the last page was reached or a page had no
    /// content. Transient page failures are skipped. Returns Err when the
    /// fetcher is unusable, or when the page count is unknown and too many
    /// consecutive pages failed.
    pub async fn run(&mut self) -> Result<()> {
        let started = Instant::now();

        self.phase = Phase::Discovering;
        let discovered = match self.discoverer.discover_page_count().await {
            Ok(count) => count.filter(|n| *n > 0),
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                tracing::warn!("Pagination discovery failed, page count unknown: {}", e);
                None
            }
        };

        let last_page = match (discovered, self.crawler.max_pages) {
            (Some(count), Some(cap)) => Some(count.min(cap)),
            (count, cap) => count.or(cap),
        };
        let total = last_page.map_or_else(|| "?".to_string(), |n| n.to_string());
        let mut pages_done = 0;

        let gaps: Vec<u32> = self
            .gaps
            .iter()
            .copied()
            .filter(|p| last_page.map_or(true, |last| *p <= last))
            .collect();
        if !gaps.is_empty() {
            tracing::info!("Revisiting {} pages missing from the checkpoint", gaps.len());
        }
        for page in gaps {
            tracing::info!("Revisiting page {}/{}", page, total);
            match self.process_page(page).await? {
                PageStep::Added => pages_done += 1,
                PageStep::Empty | PageStep::NoContent => {
                    tracing::warn!("Missing page {} still has no items", page)
                }
                PageStep::Skipped(e) => tracing::warn!("Missing page {} failed again: {}", page, e),
            }
        }

        let mut page = self.start_page;
        let mut consecutive_failures = 0;

        loop {
            if let Some(last) = last_page {
                if page > last {
                    tracing::info!("Reached last listing page {}", last);
                    break;
                }
            }

            tracing::info!("Processing page {}/{}", page, total);

            match self.process_page(page).await? {
                PageStep::Added => {
                    consecutive_failures = 0;
                    pages_done += 1;
                }
                PageStep::Empty => consecutive_failures = 0,
                PageStep::NoContent => {
                    tracing::info!("Listing page {} has no content, end of listing", page);
                    break;
                }
                PageStep::Skipped(e) => {
                    consecutive_failures += 1;
                    tracing::warn!("Skipping listing page {}: {}", page, e);
                    // A known last page bounds the crawl on its own
                    if last_page.is_none()
                        && consecutive_failures > self.crawler.max_consecutive_failures
                    {
                        return Err(HarvestError::TooManyFailures {
                            consecutive: consecutive_failures,
                        });
                    }
                }
            }

            page += 1;
        }

        self.phase = Phase::Done;
        tracing::info!(
            "Crawl completed: {} pages processed in {:?}, {} items in catalog",
            pages_done,
            started.elapsed(),
            self.catalog.item_count()
        );

        Ok(())
    }

    /// Extracts, enriches, and checkpoints one listing page
    ///
    /// Only errors that must abort the crawl are returned as Err.
    async fn process_page(&mut self, page: u32) -> Result<PageStep> {
        self.phase = Phase::Extracting(page);
        let stubs = match self.extractor.extract_listing_page(page).await {
            Ok(stubs) => stubs,
            Err(ListingError::NoContent { .. }) => return Ok(PageStep::NoContent),
            Err(ListingError::Fetch(e)) if e.is_fatal() => return Err(e.into()),
            Err(ListingError::Fetch(e)) => return Ok(PageStep::Skipped(e)),
        };

        if stubs.is_empty() {
            tracing::info!("Listing page {} has no items, skipping", page);
            return Ok(PageStep::Empty);
        }

        self.phase = Phase::Enriching(page);
        tracing::debug!("Enriching {} items from page {}", stubs.len(), page);
        let outcomes = self.enricher.enrich_outcomes(&stubs).await;

        if let Some(EnrichOutcome::Degraded { reason, .. }) =
            outcomes.iter().find(|outcome| outcome.is_fatal())
        {
            return Err(reason.clone().into());
        }

        let degraded = outcomes.iter().filter(|o| o.is_degraded()).count();
        if degraded > 0 {
            tracing::warn!(
                "{} of {} items on page {} kept their listing data only",
                degraded,
                outcomes.len(),
                page
            );
        }

        let items = outcomes.into_iter().map(EnrichOutcome::into_item).collect();

        self.phase = Phase::Checkpointing(page);
        if let Err(e) = self.append_page(Page::new(page, items)) {
            tracing::error!(
                "Checkpoint after page {} failed, keeping it in memory: {}",
                page,
                e
            );
        }

        Ok(PageStep::Added)
    }

    /// Adds a page to the catalog and rewrites the checkpoint once
    pub fn append_page(&mut self, page: Page) -> StorageResult<()> {
        let page_number = page.page_number;
        self.catalog.insert_page(page);
        self.store.write_catalog(&self.catalog)?;

        tracing::info!(
            "✓ Checkpoint updated after page {} ({} total items scraped)",
            page_number,
            self.catalog.item_count()
        );
        Ok(())
    }

    /// Merges the latest partial-progress snapshot into the in-memory catalog
    ///
    /// Pages already in memory are kept. Returns the number of pages added.
    pub fn recover(&mut self) -> usize {
        match self.store.load_latest() {
            Ok(snapshot) => {
                let added = self.catalog.merge_missing(snapshot);
                tracing::info!(
                    "Recovered {} pages from progress snapshot, catalog has {} pages",
                    added,
                    self.catalog.len()
                );
                added
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("No progress snapshot to recover from");
                0
            }
            Err(e) => {
                tracing::error!("Failed to load progress snapshot: {}", e);
                0
            }
        }
    }

    /// Writes the in-memory catalog one last time
    ///
    /// An empty catalog is written too, so a valid checkpoint exists however
    /// the crawl ended.
    pub fn persist_final(&self) -> StorageResult<()> {
        self.store.write_catalog(&self.catalog)?;
        tracing::info!(
            "Final checkpoint written ({} pages, {} items)",
            self.catalog.len(),
            self.catalog.item_count()
        );
        Ok(())
    }

    /// Runs the crawl, applying the recovery path if it aborts
    pub async fn run_to_completion(mut self) -> CrawlReport {
        let mut error = match self.run().await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!("Crawl aborted while {}: {}", self.phase, e);
                self.recover();
                Some(e)
            }
        };
        let completed = error.is_none();

        if let Err(e) = self.persist_final() {
            tracing::error!("Final checkpoint failed: {}", e);
            error.get_or_insert(e.into());
        }

        CrawlReport {
            catalog: self.catalog,
            completed,
            error,
        }
    }
}

/// Runs the main crawl operation
///
/// Resumes from the configured checkpoint unless `fresh` is set. Setup
/// errors (configuration, HTTP client, unreadable checkpoint) are returned
/// as Err; everything after setup is reported through the `CrawlReport`.
///
/// # Example
///
/// ```no_run
/// use catalog_harvest::config::load_config;
/// use catalog_harvest::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let report = run_crawl(config, false).await?;
/// println!("{} pages", report.catalog.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, fresh: bool) -> Result<CrawlReport> {
    let coordinator = Coordinator::new(config, fresh)?;
    Ok(coordinator.run_to_completion().await)
}
