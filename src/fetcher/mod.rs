//! Page fetcher capability
//!
//! The crawler never talks to the network directly. It opens a page through a
//! [`PageFetcher`], navigates it, waits for content, evaluates an extraction
//! routine against the rendered document, and closes the page again.
//!
//! Two implementations ship with the crate:
//! - [`HttpFetcher`]: plain HTTP over a shared `reqwest` client
//! - [`MemoryFetcher`]: canned documents keyed by URL, for replay and tests

mod http;
mod memory;

pub use http::{build_http_client, HttpFetcher};
pub use memory::MemoryFetcher;

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a page fetcher
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Navigation to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Selector '{selector}' not found within {timeout:?}")]
    SelectorTimeout { selector: String, timeout: Duration },

    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("No document loaded")]
    NotLoaded,

    #[error("Page fetcher unavailable: {0}")]
    Unavailable(String),
}

impl FetchError {
    /// Returns true if the fetcher as a whole can no longer be used
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Returns true if the error is a timeout of any kind
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::SelectorTimeout { .. })
    }
}

/// Result type for fetcher operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Load milestone a navigation waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitUntil {
    #[default]
    DomContentLoaded,
    Load,
    NetworkIdle,
}

/// Options for a single navigation
#[derive(Debug, Clone, Copy)]
pub struct NavigateOptions {
    pub wait_until: WaitUntil,
    pub timeout: Duration,
}

impl NavigateOptions {
    pub fn dom_content_loaded(timeout: Duration) -> Self {
        Self {
            wait_until: WaitUntil::DomContentLoaded,
            timeout,
        }
    }
}

/// Factory for page resources sharing one underlying browsing context
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Opens a new page; the caller must `close` it on every exit path
    async fn open_page(&self) -> FetchResult<Box<dyn PageHandle>>;
}

/// One open page
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Loads `url` into the page
    async fn navigate(&mut self, url: &str, options: NavigateOptions) -> FetchResult<()>;

    /// Waits until `selector` matches in the loaded document
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> FetchResult<()>;

    /// The rendered document of the current navigation
    async fn content(&self) -> FetchResult<String>;

    /// Releases the page
    async fn close(self: Box<Self>) -> FetchResult<()>;
}

/// Evaluates an extraction routine against the page's rendered document
pub async fn evaluate<T, F>(page: &dyn PageHandle, extract: F) -> FetchResult<T>
where
    F: FnOnce(&Html) -> T,
{
    let body = page.content().await?;
    let document = Html::parse_document(&body);
    Ok(extract(&document))
}

/// Bounds `operation` by `deadline`, mapping expiry to the error built by `on_elapsed`
pub async fn with_deadline<T, Fut, E>(deadline: Duration, on_elapsed: E, operation: Fut) -> FetchResult<T>
where
    Fut: Future<Output = FetchResult<T>>,
    E: FnOnce() -> FetchError,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => Err(on_elapsed()),
    }
}

/// Navigates with `DOMContentLoaded` semantics, bounded even if the page ignores its timeout
pub async fn navigate_within(page: &mut dyn PageHandle, url: &str, timeout: Duration) -> FetchResult<()> {
    with_deadline(
        timeout,
        || FetchError::Timeout {
            url: url.to_string(),
            timeout,
        },
        page.navigate(url, NavigateOptions::dom_content_loaded(timeout)),
    )
    .await
}

/// Waits for `selector`, bounded even if the page ignores its timeout
pub async fn wait_within(
    page: &mut dyn PageHandle,
    selector: &str,
    timeout: Duration,
) -> FetchResult<()> {
    with_deadline(
        timeout,
        || FetchError::SelectorTimeout {
            selector: selector.to_string(),
            timeout,
        },
        page.wait_for_selector(selector, timeout),
    )
    .await
}

/// Closes a page, logging instead of failing when the close itself errors
pub async fn release_page(page: Box<dyn PageHandle>) {
    if let Err(e) = page.close().await {
        tracing::warn!("Error closing page: {}", e);
    }
}

/// Returns true if `selector` matches anything in `body`
pub(crate) fn document_matches(body: &str, selector: &str) -> FetchResult<bool> {
    let parsed =
        Selector::parse(selector).map_err(|_| FetchError::InvalidSelector(selector.to_string()))?;
    let document = Html::parse_document(body);
    let found = document.select(&parsed).next().is_some();
    Ok(found)
}
