//! Statistics over a catalog checkpoint
//!
//! This module provides functionality for computing and displaying
//! statistics of a catalog, optionally restricted by a query.

use crate::catalog::{Catalog, CatalogQuery};
use std::collections::{BTreeMap, BTreeSet};

/// Catalog statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStatistics {
    /// Number of pages holding at least one matching item
    pub total_pages: usize,

    /// Number of matching items
    pub total_items: usize,

    /// Matching items per non-empty category
    pub items_by_category: BTreeMap<String, usize>,

    /// Matching items without a category (degraded or uncategorized)
    pub uncategorized: usize,

    /// Matching items without a download link
    pub missing_download_links: usize,

    /// Page numbers absent from the checkpoint between 1 and its last page
    pub missing_pages: Vec<u32>,

    /// Highest page number in the checkpoint
    pub last_page: Option<u32>,
}

impl CatalogStatistics {
    /// Categories sorted by item count, largest first, then by name
    pub fn categories_by_count(&self) -> Vec<(&str, usize)> {
        let mut categories: Vec<(&str, usize)> = self
            .items_by_category
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        categories.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        categories
    }
}

/// Computes statistics of the items of `catalog` matching `query`
///
/// Missing pages are always reported against the whole catalog.
pub fn compute_statistics(catalog: &Catalog, query: &CatalogQuery) -> CatalogStatistics {
    let mut stats = CatalogStatistics {
        missing_pages: catalog.missing_pages(),
        last_page: catalog.last_page_number(),
        ..CatalogStatistics::default()
    };

    let mut pages = BTreeSet::new();
    for entry in query.apply(catalog) {
        pages.insert(entry.page_number);
        stats.total_items += 1;

        if entry.item.is_uncategorized() {
            stats.uncategorized += 1;
        } else {
            *stats
                .items_by_category
                .entry(entry.item.category.clone())
                .or_insert(0) += 1;
        }

        if entry.item.download_link.is_empty() {
            stats.missing_download_links += 1;
        }
    }
    stats.total_pages = pages.len();

    stats
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Pages with items: {}", stats.total_pages);
    println!("  Total items: {}", stats.total_items);
    if let Some(last) = stats.last_page {
        println!("  Last checkpointed page: {}", last);
    }
    println!();

    if !stats.items_by_category.is_empty() {
        println!("Items by Category:");
        for (category, count) in stats.categories_by_count() {
            let percentage = if stats.total_items > 0 {
                (count as f64 / stats.total_items as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", category, count, percentage);
        }
        println!();
    }

    println!("Incomplete Items:");
    println!("  Without category: {}", stats.uncategorized);
    println!("  Without download link: {}", stats.missing_download_links);
    println!();

    if !stats.missing_pages.is_empty() {
        println!("Missing Pages ({}):", stats.missing_pages.len());
        let listed: Vec<String> = stats
            .missing_pages
            .iter()
            .take(50)
            .map(|n| n.to_string())
            .collect();
        println!("  {}", listed.join(", "));
        if stats.missing_pages.len() > 50 {
            println!("  ... and {} more", stats.missing_pages.len() - 50);
        }
        println!();
    }

    let enriched = stats.total_items - stats.uncategorized;
    let enrichment_rate = if stats.total_items > 0 {
        (enriched as f64 / stats.total_items as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Enrichment Rate: {:.1}% ({} / {} items with a category)",
        enrichment_rate, enriched, stats.total_items
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EnrichedItem, Page};

    fn item(title: &str, category: &str, download: &str) -> EnrichedItem {
        EnrichedItem {
            title: title.to_string(),
            download_link: download.to_string(),
            image_ref: String::new(),
            canonical_url: String::new(),
            category: category.to_string(),
        }
    }

    fn create_test_catalog() -> Catalog {
        Catalog::from_pages(vec![
            Page::new(
                1,
                vec![
                    item("Stone Castle", "Medieval", "https://e.com/download/1/"),
                    item("Oak House", "Houses", "https://e.com/download/2/"),
                ],
            ),
            Page::new(
                3,
                vec![
                    item("Castle Ruins", "Medieval", ""),
                    item("Unknown", "", "https://e.com/download/4/"),
                ],
            ),
        ])
    }

    #[test]
    fn test_compute_statistics() {
        let stats = compute_statistics(&create_test_catalog(), &CatalogQuery::default());

        assert_eq!(stats.total_pages, 2);
        assert_eq!(stats.total_items, 4);
        assert_eq!(stats.items_by_category.get("Medieval"), Some(&2));
        assert_eq!(stats.items_by_category.get("Houses"), Some(&1));
        assert_eq!(stats.uncategorized, 1);
        assert_eq!(stats.missing_download_links, 1);
        assert_eq!(stats.missing_pages, vec![2]);
        assert_eq!(stats.last_page, Some(3));
    }

    #[test]
    fn test_statistics_respect_query() {
        let query = CatalogQuery::new("castle", vec![]);
        let stats = compute_statistics(&create_test_catalog(), &query);

        assert_eq!(stats.total_items, 2);
        assert_eq!(stats.total_pages, 2);
        assert_eq!(stats.items_by_category.len(), 1);
        // Gaps describe the checkpoint, not the filtered view
        assert_eq!(stats.missing_pages, vec![2]);
    }

    #[test]
    fn test_categories_by_count() {
        let stats = compute_statistics(&create_test_catalog(), &CatalogQuery::default());
        assert_eq!(
            stats.categories_by_count(),
            vec![("Medieval", 2), ("Houses", 1)]
        );
    }

    #[test]
    fn test_empty_catalog() {
        let stats = compute_statistics(&Catalog::new(), &CatalogQuery::default());
        assert_eq!(stats, CatalogStatistics::default());
    }
}
