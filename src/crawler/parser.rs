//! HTML extraction for listing, detail, and pagination documents
//!
//! Selectors come from configuration and are compiled once per component.
//! Parsing never fails on missing secondary fields: absent values become
//! empty strings or `None`.

use crate::catalog::ItemStub;
use crate::config::{compile_selector, PaginationConfig, PaginationStrategy, SelectorConfig};
use crate::url::{resolve_link, SiteLinks};
use crate::ConfigResult;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compiled selectors for a listing page
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    item_card: Selector,
    title_link: Selector,
    image: Selector,
}

impl ListingSelectors {
    pub fn compile(config: &SelectorConfig) -> ConfigResult<Self> {
        Ok(Self {
            item_card: compile_selector(&config.item_card)?,
            title_link: compile_selector(&config.title_link)?,
            image: compile_selector(&config.image)?,
        })
    }
}

/// Compiled selectors for a detail page
#[derive(Debug, Clone)]
pub struct DetailSelectors {
    category: Selector,
    full_title: Vec<Selector>,
    document_title: Selector,
    separator: String,
}

impl DetailSelectors {
    pub fn compile(config: &SelectorConfig) -> ConfigResult<Self> {
        Ok(Self {
            category: compile_selector(&config.category)?,
            full_title: config
                .full_title
                .iter()
                .map(|s| compile_selector(s))
                .collect::<ConfigResult<Vec<_>>>()?,
            document_title: compile_selector("title")?,
            separator: config.document_title_separator.clone(),
        })
    }
}

/// Compiled selectors for the pagination control
#[derive(Debug, Clone)]
pub struct PaginationSelectors {
    strategy: PaginationStrategy,
    container: Selector,
    item: Selector,
    link: Selector,
}

impl PaginationSelectors {
    pub fn compile(config: &PaginationConfig) -> ConfigResult<Self> {
        Ok(Self {
            strategy: config.strategy,
            container: compile_selector(&config.container)?,
            item: compile_selector(&config.item)?,
            link: compile_selector("a")?,
        })
    }

    pub fn strategy(&self) -> PaginationStrategy {
        self.strategy
    }
}

/// Fields read from a detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub category: String,
    pub full_title: Option<String>,
}

/// Extracts one stub per item card
///
/// Cards without a title link are not items. Every other card yields a stub,
/// with empty strings for the fields it does not carry.
///
/// # Arguments
///
/// * `document` - The rendered listing page
/// * `selectors` - Compiled listing selectors
/// * `links` - Site link rules for detail and download links
/// * `page_url` - URL of the listing page, used to resolve image references
pub fn parse_listing(
    document: &Html,
    selectors: &ListingSelectors,
    links: &SiteLinks,
    page_url: &Url,
) -> Vec<ItemStub> {
    let mut stubs = Vec::new();

    for card in document.select(&selectors.item_card) {
        let Some(title_element) = card.select(&selectors.title_link).next() else {
            continue;
        };

        let title = title_element
            .value()
            .attr("title")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| element_text(&title_element));

        let source_href = title_element
            .value()
            .attr("href")
            .map(|h| h.trim().to_string())
            .unwrap_or_default();

        let image_ref = card
            .select(&selectors.image)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| resolve_link(src, page_url))
            .unwrap_or_default();

        stubs.push(ItemStub {
            title,
            detail_link: links.download_link(&source_href),
            image_ref,
            canonical_url: links.canonical_url(&source_href),
            source_href,
        });
    }

    stubs
}

/// Extracts category and full title from a detail page
///
/// The full title is the first non-empty match among the configured
/// selectors, then the document `<title>` cut at the separator.
pub fn parse_detail(document: &Html, selectors: &DetailSelectors) -> DetailFields {
    let category = document
        .select(&selectors.category)
        .next()
        .map(|e| element_text(&e))
        .unwrap_or_default();

    let full_title = selectors
        .full_title
        .iter()
        .filter_map(|selector| document.select(selector).next())
        .map(|e| element_text(&e))
        .find(|t| !t.is_empty())
        .or_else(|| {
            document
                .select(&selectors.document_title)
                .next()
                .map(|e| element_text(&e))
                .and_then(|t| {
                    t.split(selectors.separator.as_str())
                        .next()
                        .map(|head| head.trim().to_string())
                })
                .filter(|t| !t.is_empty())
        });

    DetailFields {
        category,
        full_title,
    }
}

/// Returns true if the listing document carries the pagination control
pub fn has_pagination(document: &Html, selectors: &PaginationSelectors) -> bool {
    document.select(&selectors.container).next().is_some()
}

/// Reads the total page count from the pagination control
///
/// Returns None when the control is absent, the chosen label is not a
/// number, or the strategy is disabled.
pub fn parse_page_count(document: &Html, selectors: &PaginationSelectors) -> Option<u32> {
    if !has_pagination(document, selectors) {
        return None;
    }

    let controls: Vec<ElementRef> = document.select(&selectors.item).collect();

    let count = match selectors.strategy {
        PaginationStrategy::SecondToLast => {
            let index = controls.len().checked_sub(2)?;
            let link = controls[index].select(&selectors.link).next()?;
            parse_page_label(&element_text(&link))
        }
        PaginationStrategy::MaxNumeric => controls
            .iter()
            .filter_map(|control| {
                let label = match control.select(&selectors.link).next() {
                    Some(link) => element_text(&link),
                    None => element_text(control),
                };
                parse_page_label(&label)
            })
            .max(),
        PaginationStrategy::Disabled => None,
    };

    count.filter(|n| *n > 0)
}

/// Parses the leading digits of a page label ("12", " 12 ", "12 »")
fn parse_page_label(label: &str) -> Option<u32> {
    let digits: String = label
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Collects the trimmed text content of an element
fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
