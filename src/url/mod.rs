//! URL handling for listing and detail links
//!
//! This module resolves listing hrefs against the site base and derives
//! download links from detail hrefs.

use crate::config::SiteConfig;
use url::Url;

/// Link rules of one site: where hrefs resolve and how download links are built
#[derive(Debug, Clone)]
pub struct SiteLinks {
    base: Url,
    detail_segment: String,
    download_pattern: String,
}

impl SiteLinks {
    pub fn from_config(site: &SiteConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(&site.base_url)?,
            detail_segment: site.detail_segment.clone(),
            download_pattern: site.download_pattern(),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Detail href resolved against the site base, or an empty string
    pub fn canonical_url(&self, href: &str) -> String {
        resolve_link(href, &self.base).unwrap_or_default()
    }

    /// Download link derived from a detail href, or an empty string
    pub fn download_link(&self, href: &str) -> String {
        download_link_for(href, &self.detail_segment, &self.download_pattern)
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Extracts the item id from a detail href of shape `/<segment>/<id>/...`
///
/// Absolute hrefs are accepted; only their path is inspected.
pub fn detail_id<'a>(href: &'a str, segment: &str) -> Option<&'a str> {
    let href = href.trim();
    let path = match href.find("://") {
        Some(scheme_end) => {
            let rest = &href[scheme_end + 3..];
            &rest[rest.find('/')?..]
        }
        None => href,
    };

    let mut parts = path.strip_prefix('/')?.split('/');
    if parts.next()? != segment {
        return None;
    }
    parts.next().filter(|id| !id.is_empty())
}

/// Derives the download link for a detail href, or an empty string if the href has no id
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::download_link_for;
///
/// let link = download_link_for(
///     "/schematic/12345/tiny-house/",
///     "schematic",
///     "https://example.com/download/{id}/",
/// );
/// assert_eq!(link, "https://example.com/download/12345/");
/// ```
pub fn download_link_for(href: &str, segment: &str, pattern: &str) -> String {
    detail_id(href, segment)
        .map(|id| pattern.replace("{id}", id))
        .unwrap_or_default()
}
