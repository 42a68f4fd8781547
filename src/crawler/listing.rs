//! Listing page extraction
//!
//! Turns one page-indexed listing URL into item stubs. A page whose item
//! cards never appear is the end-of-listing sentinel, not a failure.

use crate::catalog::ItemStub;
use crate::config::{Config, SiteConfig};
use crate::crawler::parser::{parse_listing, ListingSelectors};
use crate::fetcher::{
    evaluate, navigate_within, release_page, wait_within, FetchError, PageFetcher, PageHandle,
};
use crate::url::SiteLinks;
use crate::HarvestError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Outcome of a listing page that yielded no stubs
#[derive(Debug, Clone, Error)]
pub enum ListingError {
    /// The listing is exhausted
    #[error("Listing page {page} has no content")]
    NoContent { page: u32 },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ListingError {
    pub fn is_no_content(&self) -> bool {
        matches!(self, Self::NoContent { .. })
    }
}

/// Extracts item stubs from listing pages
pub struct ListingExtractor {
    fetcher: Arc<dyn PageFetcher>,
    site: SiteConfig,
    links: SiteLinks,
    selectors: ListingSelectors,
    item_card: String,
    navigation_timeout: Duration,
    content_wait_timeout: Duration,
}

impl ListingExtractor {
    pub fn new(config: &Config, fetcher: Arc<dyn PageFetcher>) -> Result<Self, HarvestError> {
        Ok(Self {
            fetcher,
            site: config.site.clone(),
            links: SiteLinks::from_config(&config.site)?,
            selectors: ListingSelectors::compile(&config.selectors)?,
            item_card: config.selectors.item_card.clone(),
            navigation_timeout: config.crawler.navigation_timeout(),
            content_wait_timeout: config.crawler.content_wait_timeout(),
        })
    }

    /// URL of the given listing page
    pub fn page_url(&self, page: u32) -> String {
        self.site.listing_page_url(page)
    }

    /// Extracts the stubs of listing page `page`, in listing order
    ///
    /// Fails with `ListingError::NoContent` when the item cards do not appear
    /// within the content wait, or when the page does not exist.
    pub async fn extract_listing_page(&self, page: u32) -> Result<Vec<ItemStub>, ListingError> {
        let url = self.page_url(page);
        let mut handle = self.fetcher.open_page().await?;
        let result = self.extract_from(handle.as_mut(), page, &url).await;
        release_page(handle).await;

        if let Ok(stubs) = &result {
            tracing::debug!("Extracted {} stubs from {}", stubs.len(), url);
        }
        result
    }

    async fn extract_from(
        &self,
        handle: &mut dyn PageHandle,
        page: u32,
        url: &str,
    ) -> Result<Vec<ItemStub>, ListingError> {
        match navigate_within(handle, url, self.navigation_timeout).await {
            Ok(()) => {}
            Err(FetchError::Status { status: 404, .. }) => {
                return Err(ListingError::NoContent { page })
            }
            Err(e) => return Err(e.into()),
        }

        match wait_within(handle, &self.item_card, self.content_wait_timeout).await {
            Ok(()) => {}
            Err(FetchError::SelectorTimeout { .. }) => {
                tracing::debug!(
                    "No '{}' on listing page {} within {:?}",
                    self.item_card,
                    page,
                    self.content_wait_timeout
                );
                return Err(ListingError::NoContent { page });
            }
            Err(e) => return Err(e.into()),
        }

        let page_url = Url::parse(url).unwrap_or_else(|_| self.links.base().clone());
        let selectors = &self.selectors;
        let links = &self.links;
        let stubs = evaluate(handle, |document| {
            parse_listing(document, selectors, links, &page_url)
        })
        .await?;

        Ok(stubs)
    }
}
