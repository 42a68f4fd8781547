use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Site layout: where the listing lives and how its URLs are built
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Origin that relative detail links are resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Listing root carrying the pagination control
    #[serde(rename = "listing-root")]
    pub listing_root: Option<String>,

    /// Page-indexed listing URL; `{page}` is replaced with the 1-based page number
    #[serde(rename = "listing-page-pattern")]
    pub listing_page_pattern: Option<String>,

    /// Download URL; `{id}` is replaced with the item id taken from the detail href
    #[serde(rename = "download-pattern")]
    pub download_pattern: Option<String>,

    /// First path segment of a detail href (`/<segment>/<id>/...`)
    #[serde(rename = "detail-segment", default = "default_detail_segment")]
    pub detail_segment: String,
}

impl SiteConfig {
    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Listing root URL, defaulting to `{base-url}/latest/`
    pub fn listing_root(&self) -> String {
        self.listing_root
            .clone()
            .unwrap_or_else(|| format!("{}/latest/", self.base()))
    }

    /// Listing page pattern, defaulting to `{base-url}/latest/{page}/`
    pub fn listing_page_pattern(&self) -> String {
        self.listing_page_pattern
            .clone()
            .unwrap_or_else(|| format!("{}/latest/{{page}}/", self.base()))
    }

    /// Download pattern, defaulting to `{base-url}/download/{id}/`
    pub fn download_pattern(&self) -> String {
        self.download_pattern
            .clone()
            .unwrap_or_else(|| format!("{}/download/{{id}}/", self.base()))
    }

    /// URL of the given 1-based listing page
    pub fn listing_page_url(&self, page: u32) -> String {
        self.listing_page_pattern()
            .replace("{page}", &page.to_string())
    }
}

fn default_detail_segment() -> String {
    "schematic".to_string()
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of detail pages enriched concurrently
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Pause between two enrichment batches of the same listing page (milliseconds)
    #[serde(rename = "batch-delay-ms")]
    pub batch_delay_ms: u64,

    /// Bound on a single navigation (milliseconds)
    #[serde(rename = "navigation-timeout-ms")]
    pub navigation_timeout_ms: u64,

    /// Bound on waiting for the item-card selector (milliseconds)
    #[serde(rename = "content-wait-timeout-ms")]
    pub content_wait_timeout_ms: u64,

    /// Highest listing page number visited
    #[serde(rename = "max-pages")]
    pub max_pages: Option<u32>,

    /// Consecutive skipped listing pages tolerated before the crawl gives up
    #[serde(rename = "max-consecutive-failures")]
    pub max_consecutive_failures: u32,
}

impl CrawlerConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn content_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.content_wait_timeout_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            batch_size: 18,
            batch_delay_ms: 500,
            navigation_timeout_ms: 15_000,
            content_wait_timeout_ms: 10_000,
            max_pages: None,
            max_consecutive_failures: 5,
        }
    }
}

/// How the total page count is read from the pagination control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaginationStrategy {
    /// The label of the second-to-last control (the last one is a "next" link)
    SecondToLast,
    /// The largest numeric label anywhere in the control
    MaxNumeric,
    /// Skip discovery and iterate until a listing page has no content
    Disabled,
}

/// Pagination discovery configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub strategy: PaginationStrategy,

    /// Selector of the pagination control itself
    pub container: String,

    /// Selector of the individual page-number controls
    pub item: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            strategy: PaginationStrategy::SecondToLast,
            container: ".pagination".to_string(),
            item: ".pagination ul li".to_string(),
        }
    }
}

/// CSS selectors used against listing and detail pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// One element per listed item
    #[serde(rename = "item-card")]
    pub item_card: String,

    /// Title link inside an item card
    #[serde(rename = "title-link")]
    pub title_link: String,

    /// Preview image inside an item card
    pub image: String,

    /// Category cell on a detail page
    pub category: String,

    /// Full-title candidates on a detail page, tried in order
    #[serde(rename = "full-title")]
    pub full_title: Vec<String>,

    /// Separator after which the document `<title>` is cut
    #[serde(rename = "document-title-separator")]
    pub document_title_separator: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            item_card: ".span4".to_string(),
            title_link: "h3 a".to_string(),
            image: "img".to_string(),
            category: ".span5 table tbody tr:first-child td:nth-child(2)".to_string(),
            full_title: vec![
                "h1".to_string(),
                ".page-header h1".to_string(),
                ".schematic-title".to_string(),
            ],
            document_title_separator: "|".to_string(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Checkpoint file holding the catalog
    #[serde(rename = "catalog-path")]
    pub catalog_path: String,

    /// Partial-progress snapshot consulted on the recovery path
    #[serde(rename = "progress-path")]
    pub progress_path: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            catalog_path: "catalog.json".to_string(),
            progress_path: "catalog-progress.json".to_string(),
            summary_path: "catalog-summary.md".to_string(),
        }
    }
}
