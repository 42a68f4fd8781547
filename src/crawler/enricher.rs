//! Detail page enrichment
//!
//! Stubs are enriched in consecutive batches. All items of a batch run
//! concurrently and the batch ends when every item has finished, so no more
//! than `batch_size` detail pages are ever open at once. Results keep the
//! position of their stub regardless of completion order.

use crate::catalog::{EnrichedItem, ItemStub};
use crate::config::Config;
use crate::crawler::parser::{parse_detail, DetailFields, DetailSelectors};
use crate::fetcher::{
    evaluate, navigate_within, release_page, FetchError, FetchResult, PageFetcher, PageHandle,
};
use crate::ConfigResult;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Result of enriching a single stub
#[derive(Debug, Clone)]
pub enum EnrichOutcome {
    Enriched(EnrichedItem),

    /// The detail page could not be used; `item` is the fallback record
    Degraded { item: EnrichedItem, reason: FetchError },
}

impl EnrichOutcome {
    pub fn item(&self) -> &EnrichedItem {
        match self {
            Self::Enriched(item) | Self::Degraded { item, .. } => item,
        }
    }

    pub fn into_item(self) -> EnrichedItem {
        match self {
            Self::Enriched(item) | Self::Degraded { item, .. } => item,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Returns true if the item degraded because the fetcher itself is gone
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Degraded { reason, .. } if reason.is_fatal())
    }
}

/// Visits detail pages to complete item stubs
pub struct DetailEnricher {
    fetcher: Arc<dyn PageFetcher>,
    selectors: DetailSelectors,
    batch_size: usize,
    batch_delay: Duration,
    navigation_timeout: Duration,
}

impl DetailEnricher {
    pub fn new(config: &Config, fetcher: Arc<dyn PageFetcher>) -> ConfigResult<Self> {
        Ok(Self {
            fetcher,
            selectors: DetailSelectors::compile(&config.selectors)?,
            batch_size: config.crawler.batch_size.max(1),
            batch_delay: config.crawler.batch_delay(),
            navigation_timeout: config.crawler.navigation_timeout(),
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Enriches `stubs`, returning one item per stub in stub order
    ///
    /// Never fails: an item whose detail page cannot be used keeps the
    /// listing title and an empty category.
    pub async fn enrich(&self, stubs: &[ItemStub]) -> Vec<EnrichedItem> {
        self.enrich_outcomes(stubs)
            .await
            .into_iter()
            .map(EnrichOutcome::into_item)
            .collect()
    }

    /// Like `enrich`, but reports which items degraded and why
    pub async fn enrich_outcomes(&self, stubs: &[ItemStub]) -> Vec<EnrichOutcome> {
        let total_batches = stubs.len().div_ceil(self.batch_size);
        let mut outcomes = Vec::with_capacity(stubs.len());

        for (index, batch) in stubs.chunks(self.batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.batch_delay).await;
            }

            tracing::info!(
                "Processing batch {}/{} ({} items)",
                index + 1,
                total_batches,
                batch.len()
            );

            let results = join_all(batch.iter().map(|stub| self.enrich_one(stub))).await;

            for outcome in &results {
                if let EnrichOutcome::Degraded { item, reason } = outcome {
                    tracing::warn!("Failed to enrich '{}': {}", item.title, reason);
                }
            }
            outcomes.extend(results);
        }

        outcomes
    }

    /// Enriches one stub from its detail page
    ///
    /// The page opened for the stub is closed before this returns.
    pub async fn enrich_one(&self, stub: &ItemStub) -> EnrichOutcome {
        if stub.canonical_url.is_empty() {
            return EnrichOutcome::Degraded {
                item: EnrichedItem::degraded(stub),
                reason: FetchError::Navigation {
                    url: stub.source_href.clone(),
                    message: "item has no detail URL".to_string(),
                },
            };
        }

        let result = match self.fetcher.open_page().await {
            Ok(mut page) => {
                let fields = self.read_detail(page.as_mut(), &stub.canonical_url).await;
                release_page(page).await;
                fields
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(fields) => {
                tracing::trace!("Enriched {}", stub.canonical_url);
                EnrichOutcome::Enriched(EnrichedItem::from_stub(
                    stub,
                    fields.full_title.as_deref(),
                    &fields.category,
                ))
            }
            Err(reason) => EnrichOutcome::Degraded {
                item: EnrichedItem::degraded(stub),
                reason,
            },
        }
    }

    async fn read_detail(&self, page: &mut dyn PageHandle, url: &str) -> FetchResult<DetailFields> {
        navigate_within(page, url, self.navigation_timeout).await?;

        let selectors = &self.selectors;
        evaluate(page, |document| parse_detail(document, selectors)).await
    }
}
