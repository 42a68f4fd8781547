//! In-memory page fetcher
//!
//! Serves canned documents keyed by URL. Failures and delays can be attached
//! to individual URLs, and the fetcher counts open pages so callers can check
//! that every page is released and how many were open at once.

use super::{
    document_matches, FetchError, FetchResult, NavigateOptions, PageFetcher, PageHandle,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Routes {
    documents: HashMap<String, String>,
    failures: HashMap<String, FetchError>,
    delays: HashMap<String, Duration>,
}

#[derive(Default)]
struct Counters {
    unavailable: AtomicBool,
    open: AtomicUsize,
    peak_open: AtomicUsize,
    opened_total: AtomicUsize,
    navigations: Mutex<Vec<String>>,
}

impl Counters {
    fn record_navigation(&self, url: &str) {
        if let Ok(mut log) = self.navigations.lock() {
            log.push(url.to_string());
        }
    }
}

/// Page fetcher backed by a URL -> document map
///
/// Cloning is cheap and clones share counters.
#[derive(Clone, Default)]
pub struct MemoryFetcher {
    routes: Arc<Routes>,
    counters: Arc<Counters>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `html` for `url`
    pub fn with_document(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.routes)
            .documents
            .insert(url.into(), html.into());
        self
    }

    /// Fails every navigation to `url` with `error`
    pub fn with_failure(mut self, url: impl Into<String>, error: FetchError) -> Self {
        Arc::make_mut(&mut self.routes)
            .failures
            .insert(url.into(), error);
        self
    }

    /// Delays every navigation to `url`; a delay beyond the navigation timeout times out
    pub fn with_delay(mut self, url: impl Into<String>, delay: Duration) -> Self {
        Arc::make_mut(&mut self.routes)
            .delays
            .insert(url.into(), delay);
        self
    }

    /// Makes `open_page` fail as if the browsing context had died
    pub fn set_unavailable(&self, unavailable: bool) {
        self.counters.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Pages opened and not yet closed
    pub fn open_pages(&self) -> usize {
        self.counters.open.load(Ordering::SeqCst)
    }

    /// Highest number of pages open at the same time
    pub fn peak_open_pages(&self) -> usize {
        self.counters.peak_open.load(Ordering::SeqCst)
    }

    /// Pages opened over the fetcher's lifetime
    pub fn opened_total(&self) -> usize {
        self.counters.opened_total.load(Ordering::SeqCst)
    }

    /// URLs navigated to, in call order
    pub fn navigations(&self) -> Vec<String> {
        match self.counters.navigations.lock() {
            Ok(log) => log.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of navigations to `url`
    pub fn navigation_count(&self, url: &str) -> usize {
        self.navigations().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl PageFetcher for MemoryFetcher {
    async fn open_page(&self) -> FetchResult<Box<dyn PageHandle>> {
        if self.counters.unavailable.load(Ordering::SeqCst) {
            return Err(FetchError::Unavailable(
                "browsing context closed".to_string(),
            ));
        }

        let open = self.counters.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak_open.fetch_max(open, Ordering::SeqCst);
        self.counters.opened_total.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MemoryPage {
            routes: Arc::clone(&self.routes),
            counters: Arc::clone(&self.counters),
            body: None,
        }))
    }
}

struct MemoryPage {
    routes: Arc<Routes>,
    counters: Arc<Counters>,
    body: Option<String>,
}

#[async_trait]
impl PageHandle for MemoryPage {
    async fn navigate(&mut self, url: &str, options: NavigateOptions) -> FetchResult<()> {
        self.body = None;
        self.counters.record_navigation(url);

        if let Some(delay) = self.routes.delays.get(url).copied() {
            if delay > options.timeout {
                tokio::time::sleep(options.timeout).await;
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout: options.timeout,
                });
            }
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.routes.failures.get(url) {
            return Err(error.clone());
        }

        match self.routes.documents.get(url) {
            Some(html) => {
                self.body = Some(html.clone());
                Ok(())
            }
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> FetchResult<()> {
        let body = self.body.as_deref().ok_or(FetchError::NotLoaded)?;
        if document_matches(body, selector)? {
            Ok(())
        } else {
            Err(FetchError::SelectorTimeout {
                selector: selector.to_string(),
                timeout,
            })
        }
    }

    async fn content(&self) -> FetchResult<String> {
        self.body.clone().ok_or(FetchError::NotLoaded)
    }

    async fn close(self: Box<Self>) -> FetchResult<()> {
        self.counters.open.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
