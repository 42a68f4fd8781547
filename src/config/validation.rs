use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, PaginationConfig, SelectorConfig, SiteConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_pagination_config(&config.pagination)?;
    validate_selector_config(&config.selectors)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the site layout and URL patterns
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;
    validate_http_url("listing-root", &config.listing_root())?;

    let listing = config.listing_page_pattern();
    if !listing.contains("{page}") {
        return Err(ConfigError::Validation(format!(
            "listing-page-pattern must contain '{{page}}', got '{}'",
            listing
        )));
    }
    validate_http_url("listing-page-pattern", &config.listing_page_url(1))?;

    let download = config.download_pattern();
    if !download.contains("{id}") {
        return Err(ConfigError::Validation(format!(
            "download-pattern must contain '{{id}}', got '{}'",
            download
        )));
    }

    if config.detail_segment.is_empty() || config.detail_segment.contains('/') {
        return Err(ConfigError::Validation(format!(
            "detail-segment must be a single non-empty path segment, got '{}'",
            config.detail_segment
        )));
    }

    Ok(())
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", key, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            key, value
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 || config.batch_size > 100 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be between 1 and 100, got {}",
            config.batch_size
        )));
    }

    if config.navigation_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "navigation-timeout-ms must be >= 100ms, got {}ms",
            config.navigation_timeout_ms
        )));
    }

    if config.content_wait_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "content-wait-timeout-ms must be >= 100ms, got {}ms",
            config.content_wait_timeout_ms
        )));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1 when set".to_string(),
        ));
    }

    if config.max_consecutive_failures < 1 {
        return Err(ConfigError::Validation(format!(
            "max-consecutive-failures must be >= 1, got {}",
            config.max_consecutive_failures
        )));
    }

    Ok(())
}

/// Validates pagination selectors
fn validate_pagination_config(config: &PaginationConfig) -> Result<(), ConfigError> {
    compile_selector(&config.container)?;
    compile_selector(&config.item)?;
    Ok(())
}

/// Validates that every configured selector parses
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    compile_selector(&config.item_card)?;
    compile_selector(&config.title_link)?;
    compile_selector(&config.image)?;
    compile_selector(&config.category)?;

    if config.full_title.is_empty() {
        return Err(ConfigError::Validation(
            "full-title must list at least one selector".to_string(),
        ));
    }
    for selector in &config.full_title {
        compile_selector(selector)?;
    }

    if config.document_title_separator.is_empty() {
        return Err(ConfigError::Validation(
            "document-title-separator cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Parses a selector, mapping the parser error into a config error
pub(crate) fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.catalog_path.is_empty() {
        return Err(ConfigError::Validation(
            "catalog-path cannot be empty".to_string(),
        ));
    }

    if config.progress_path.is_empty() {
        return Err(ConfigError::Validation(
            "progress-path cannot be empty".to_string(),
        ));
    }

    if config.catalog_path == config.progress_path {
        return Err(ConfigError::Validation(
            "catalog-path and progress-path must differ".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Must contain exactly one @ with text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
