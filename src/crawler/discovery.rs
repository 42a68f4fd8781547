//! Pagination discovery
//!
//! Reads the total listing page count once, from the pagination control on
//! the listing root.

use crate::config::{Config, PaginationStrategy};
use crate::crawler::parser::{parse_page_count, PaginationSelectors};
use crate::fetcher::{evaluate, navigate_within, release_page, FetchResult, PageFetcher, PageHandle};
use crate::ConfigResult;
use std::sync::Arc;
use std::time::Duration;

/// Determines how many listing pages the site has
pub struct PaginationDiscoverer {
    fetcher: Arc<dyn PageFetcher>,
    selectors: PaginationSelectors,
    listing_root: String,
    navigation_timeout: Duration,
}

impl PaginationDiscoverer {
    pub fn new(config: &Config, fetcher: Arc<dyn PageFetcher>) -> ConfigResult<Self> {
        Ok(Self {
            fetcher,
            selectors: PaginationSelectors::compile(&config.pagination)?,
            listing_root: config.site.listing_root(),
            navigation_timeout: config.crawler.navigation_timeout(),
        })
    }

    /// Returns the page count, or None when it cannot be determined
    ///
    /// A missing pagination control is not an error. Errors are returned
    /// only when the listing root itself could not be loaded.
    pub async fn discover_page_count(&self) -> FetchResult<Option<u32>> {
        if self.selectors.strategy() == PaginationStrategy::Disabled {
            tracing::info!("Pagination discovery disabled, crawling until a page has no content");
            return Ok(None);
        }

        let mut page = self.fetcher.open_page().await?;
        let result = self.read_page_count(page.as_mut()).await;
        release_page(page).await;

        match &result {
            Ok(Some(count)) => tracing::info!("Discovered {} listing pages", count),
            Ok(None) => tracing::warn!(
                "No pagination control found on {}, page count unknown",
                self.listing_root
            ),
            Err(_) => {}
        }

        result
    }

    async fn read_page_count(&self, page: &mut dyn PageHandle) -> FetchResult<Option<u32>> {
        tracing::debug!("Navigating to listing root {}", self.listing_root);
        navigate_within(page, &self.listing_root, self.navigation_timeout).await?;

        let selectors = &self.selectors;
        evaluate(page, |document| parse_page_count(document, selectors)).await
    }
}
