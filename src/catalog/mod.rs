//! Catalog data model
//!
//! - `ItemStub`: what a listing page says about an item
//! - `EnrichedItem`: the persisted record after visiting the item's detail page
//! - `Page`: the enriched items of one listing page, in listing order
//! - `Catalog`: pages ordered by page number; the unit written to the checkpoint

mod item;

pub use item::{EnrichedItem, ItemStub};

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The enriched items of one listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based listing page number
    #[serde(rename = "page", alias = "pageNumber")]
    pub page_number: u32,

    /// Items in the order the listing returned them
    pub items: Vec<EnrichedItem>,
}

impl Page {
    pub fn new(page_number: u32, items: Vec<EnrichedItem>) -> Self {
        Self { page_number, items }
    }
}

/// Ordered set of pages, at most one per page number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    pages: Vec<Page>,
}

/// Loaded pages go through `from_pages`, so any order is accepted
impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<Page>::deserialize(deserializer).map(Self::from_pages)
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from pages in any order; for duplicate numbers the later page wins
    pub fn from_pages(pages: Vec<Page>) -> Self {
        let mut catalog = Self::new();
        for page in pages {
            catalog.insert_page(page);
        }
        catalog
    }

    /// Inserts a page at its position, replacing any page with the same number
    pub fn insert_page(&mut self, page: Page) {
        match self
            .pages
            .binary_search_by_key(&page.page_number, |p| p.page_number)
        {
            Ok(index) => self.pages[index] = page,
            Err(index) => self.pages.insert(index, page),
        }
    }

    /// Adds every page of `other` whose number is not present yet
    ///
    /// Returns the number of pages added.
    pub fn merge_missing(&mut self, other: Catalog) -> usize {
        let mut added = 0;
        for page in other.pages {
            if !self.contains_page(page.page_number) {
                self.insert_page(page);
                added += 1;
            }
        }
        added
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn contains_page(&self, page_number: u32) -> bool {
        self.pages
            .binary_search_by_key(&page_number, |p| p.page_number)
            .is_ok()
    }

    /// Number of pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Total number of items over all pages
    pub fn item_count(&self) -> usize {
        self.pages.iter().map(|p| p.items.len()).sum()
    }

    /// Highest page number present
    pub fn last_page_number(&self) -> Option<u32> {
        self.pages.last().map(|p| p.page_number)
    }

    /// Page numbers between 1 and the last page that are absent
    pub fn missing_pages(&self) -> Vec<u32> {
        let Some(last) = self.last_page_number() else {
            return Vec::new();
        };
        (1..=last).filter(|n| !self.contains_page(*n)).collect()
    }

    /// Flattened view of every item with the page it came from
    pub fn items(&self) -> impl Iterator<Item = CatalogEntry<'_>> {
        self.pages.iter().flat_map(|page| {
            page.items.iter().map(move |item| CatalogEntry {
                page_number: page.page_number,
                item,
            })
        })
    }
}

/// An item together with its page number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry<'a> {
    pub page_number: u32,
    pub item: &'a EnrichedItem,
}

/// Title search plus category filter over the flattened catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    search: String,
    categories: Vec<String>,
}

impl CatalogQuery {
    /// Creates a query; an empty search term and no categories match everything
    pub fn new(search: &str, categories: Vec<String>) -> Self {
        Self {
            search: search.trim().to_lowercase(),
            categories,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.categories.is_empty()
    }

    /// Case-insensitive title substring AND, when categories are given, category membership
    pub fn matches(&self, item: &EnrichedItem) -> bool {
        let matches_search =
            self.search.is_empty() || item.title.to_lowercase().contains(&self.search);
        let matches_category =
            self.categories.is_empty() || self.categories.iter().any(|c| *c == item.category);
        matches_search && matches_category
    }

    pub fn apply<'a>(&self, catalog: &'a Catalog) -> Vec<CatalogEntry<'a>> {
        catalog
            .items()
            .filter(|entry| self.matches(entry.item))
            .collect()
    }

    /// Restricts a catalog to matching items, dropping pages left empty
    pub fn filter_catalog(&self, catalog: &Catalog) -> Catalog {
        let pages = catalog
            .pages()
            .iter()
            .filter_map(|page| {
                let items: Vec<EnrichedItem> = page
                    .items
                    .iter()
                    .filter(|item| self.matches(item))
                    .cloned()
                    .collect();
                (!items.is_empty()).then(|| Page::new(page.page_number, items))
            })
            .collect();
        Catalog { pages }
    }
}

impl fmt::Display for CatalogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.search.is_empty(), self.categories.is_empty()) {
            (true, true) => write!(f, "all items"),
            (false, true) => write!(f, "title contains \"{}\"", self.search),
            (true, false) => write!(f, "category in [{}]", self.categories.join(", ")),
            (false, false) => write!(
                f,
                "title contains \"{}\" and category in [{}]",
                self.search,
                self.categories.join(", ")
            ),
        }
    }
}
