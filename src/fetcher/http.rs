//! HTTP page fetcher
//!
//! Pages are lightweight views over one shared `reqwest` client. A navigation
//! is a GET bounded by its own timeout; the body becomes the page's document.
//! Documents are static, so a selector missing after load is reported at once
//! instead of after polling for the full wait bound.

use super::{
    document_matches, FetchError, FetchResult, NavigateOptions, PageFetcher, PageHandle,
};
use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use catalog_harvest::config::UserAgentConfig;
/// use catalog_harvest::fetcher::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "CatalogHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page fetcher over plain HTTP
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn open_page(&self) -> FetchResult<Box<dyn PageHandle>> {
        Ok(Box::new(HttpPage {
            client: self.client.clone(),
            body: None,
        }))
    }
}

struct HttpPage {
    client: Client,
    body: Option<String>,
}

#[async_trait]
impl PageHandle for HttpPage {
    async fn navigate(&mut self, url: &str, options: NavigateOptions) -> FetchResult<()> {
        self.body = None;

        let response = self
            .client
            .get(url)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, e, options.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, e, options.timeout))?;

        tracing::trace!("Loaded {} ({} bytes)", url, body.len());
        self.body = Some(body);
        Ok(())
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
        Ok(())
    }
}

/// Maps a transport error onto the fetcher taxonomy
fn classify_error(url: &str, error: reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else if error.is_connect() {
        FetchError::Navigation {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        FetchError::Navigation {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
