//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a catalog
//! checkpoint: statistics, category breakdown, gaps, and the item listing.

use crate::catalog::{Catalog, CatalogQuery};
use crate::output::stats::compute_statistics;
use crate::output::OutputResult;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

/// Writes a markdown summary of `catalog`, restricted to items matching `query`
///
/// # Arguments
///
/// * `catalog` - The catalog to summarize
/// * `query` - Search and category filter; an empty query includes everything
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(
    catalog: &Catalog,
    query: &CatalogQuery,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(catalog, query, Utc::now());

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output_path, markdown)?;

    tracing::info!("Wrote summary to {}", output_path.display());
    Ok(())
}

/// Formats a catalog summary as markdown
pub fn format_markdown_summary(
    catalog: &Catalog,
    query: &CatalogQuery,
    generated_at: DateTime<Utc>,
) -> String {
    let stats = compute_statistics(catalog, query);
    let mut md = String::new();

    md.push_str("# Catalog Summary\n\n");
    md.push_str(&format!(
        "- **Generated**: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if !query.is_empty() {
        md.push_str(&format!("- **Filter**: {}\n", query));
    }
    md.push('\n');

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages**: {}\n", stats.total_pages));
    md.push_str(&format!("- **Items**: {}\n", stats.total_items));
    md.push_str(&format!("- **Without Category**: {}\n", stats.uncategorized));
    md.push_str(&format!(
        "- **Without Download Link**: {}\n\n",
        stats.missing_download_links
    ));

    if !stats.items_by_category.is_empty() {
        md.push_str("## Categories\n\n");
        md.push_str("| Category | Items |\n");
        md.push_str("|----------|-------|\n");
        for (category, count) in stats.categories_by_count() {
            md.push_str(&format!("| {} | {} |\n", escape_cell(category), count));
        }
        md.push('\n');
    }

    if !stats.missing_pages.is_empty() {
        md.push_str("## Missing Pages\n\n");
        let listed: Vec<String> = stats.missing_pages.iter().map(|n| n.to_string()).collect();
        md.push_str(&listed.join(", "));
        md.push_str("\n\n");
    }

    let entries = query.apply(catalog);
    if !entries.is_empty() {
        md.push_str("## Items\n\n");
        md.push_str("| Page | Title | Category | Download |\n");
        md.push_str("|------|-------|----------|----------|\n");
        for entry in entries {
            let title = if entry.item.canonical_url.is_empty() {
                escape_cell(&entry.item.title)
            } else {
                format!(
                    "[{}]({})",
                    escape_cell(&entry.item.title),
                    entry.item.canonical_url
                )
            };
            let download = if entry.item.download_link.is_empty() {
                "-".to_string()
            } else {
                format!("[download]({})", entry.item.download_link)
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                entry.page_number,
                title,
                escape_cell(&entry.item.category),
                download
            ));
        }
        md.push('\n');
    }

    md
}

/// Escapes characters that would break a markdown table cell
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EnrichedItem, Page};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn item(title: &str, category: &str) -> EnrichedItem {
        EnrichedItem {
            title: title.to_string(),
            download_link: format!("https://e.com/download/{}/", title.len()),
            image_ref: String::new(),
            canonical_url: format!("https://e.com/schematic/{}/", title.len()),
            category: category.to_string(),
        }
    }

    fn create_test_catalog() -> Catalog {
        Catalog::from_pages(vec![
            Page::new(1, vec![item("Stone Castle", "Medieval"), item("Barn", "")]),
            Page::new(3, vec![item("Tower | Tall", "Medieval")]),
        ])
    }

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_format_markdown_summary() {
        let markdown =
            format_markdown_summary(&create_test_catalog(), &CatalogQuery::default(), generated_at());

        assert!(markdown.contains("# Catalog Summary"));
        assert!(markdown.contains("2024-01-01 12:00:00 UTC"));
        assert!(markdown.contains("- **Items**: 3"));
        assert!(markdown.contains("| Medieval | 2 |"));
        assert!(markdown.contains("## Missing Pages\n\n2\n"));
        assert!(markdown.contains("[Tower \\| Tall](https://e.com/schematic/12/)"));
        assert!(!markdown.contains("**Filter**"));
    }

    #[test]
    fn test_markdown_with_filter() {
        let query = CatalogQuery::new("castle", vec![]);
        let markdown = format_markdown_summary(&create_test_catalog(), &query, generated_at());

        assert!(markdown.contains("**Filter**"));
        assert!(markdown.contains("Stone Castle"));
        assert!(!markdown.contains("Barn"));
    }

    #[test]
    fn test_generate_markdown_summary_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports/summary.md");

        generate_markdown_summary(&create_test_catalog(), &CatalogQuery::default(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Catalog Summary"));
    }
}
