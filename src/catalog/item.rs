use serde::{Deserialize, Serialize};

/// A listing-page record before detail enrichment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStub {
    /// Title as shown on the listing (possibly truncated)
    pub title: String,

    /// Download link derived from the detail href, empty when it cannot be derived
    pub detail_link: String,

    /// Preview image reference, empty when the card has no image
    pub image_ref: String,

    /// Detail href resolved against the site base, empty when the card has no href
    pub canonical_url: String,

    /// Raw href as found on the listing
    pub source_href: String,
}

/// A catalog record after the detail page was visited (or the visit failed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedItem {
    pub title: String,

    #[serde(default)]
    pub download_link: String,

    #[serde(rename = "imageSrc", default)]
    pub image_ref: String,

    #[serde(rename = "fullUrl", default)]
    pub canonical_url: String,

    #[serde(default)]
    pub category: String,
}

impl EnrichedItem {
    /// Builds an item from a stub and what the detail page yielded
    ///
    /// The full title wins when it is non-empty; otherwise the listing title is kept.
    pub fn from_stub(stub: &ItemStub, full_title: Option<&str>, category: &str) -> Self {
        let title = match full_title.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => stub.title.clone(),
        };

        Self {
            title,
            download_link: stub.detail_link.clone(),
            image_ref: stub.image_ref.clone(),
            canonical_url: stub.canonical_url.clone(),
            category: category.trim().to_string(),
        }
    }

    /// The fallback record used when enrichment fails
    pub fn degraded(stub: &ItemStub) -> Self {
        Self::from_stub(stub, None, "")
    }

    /// Returns true if the item has no category
    pub fn is_uncategorized(&self) -> bool {
        self.category.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub() -> ItemStub {
        ItemStub {
            title: "Castle...".to_string(),
            detail_link: "https://example.com/download/7/".to_string(),
            image_ref: "https://example.com/7.png".to_string(),
            canonical_url: "https://example.com/schematic/7/castle/".to_string(),
            source_href: "/schematic/7/castle/".to_string(),
        }
    }

    #[test]
    fn test_full_title_preferred() {
        let item = EnrichedItem::from_stub(&stub(), Some("  Castle of the North  "), "Medieval");
        assert_eq!(item.title, "Castle of the North");
        assert_eq!(item.category, "Medieval");
        assert_eq!(item.download_link, "https://example.com/download/7/");
    }

    #[test]
    fn test_empty_full_title_falls_back() {
        let item = EnrichedItem::from_stub(&stub(), Some("   "), "Medieval");
        assert_eq!(item.title, "Castle...");
    }

    #[test]
    fn test_degraded_item() {
        let item = EnrichedItem::degraded(&stub());
        assert_eq!(item.title, "Castle...");
        assert_eq!(item.category, "");
        assert!(item.is_uncategorized());
        assert_eq!(item.canonical_url, "https://example.com/schematic/7/castle/");
    }

    #[test]
    fn test_wire_field_names() {
        let item = EnrichedItem::degraded(&stub());
        let json = serde_json::to_value(&item).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 5);
        assert!(object.contains_key("downloadLink"));
        assert!(object.contains_key("imageSrc"));
        assert!(object.contains_key("fullUrl"));
        assert_eq!(object["category"], "");
    }

    #[test]
    fn test_missing_category_reads_as_empty() {
        let item: EnrichedItem = serde_json::from_str(
            r#"{"title":"A","downloadLink":"","imageSrc":"","fullUrl":"https://x.com/a"}"#,
        )
        .unwrap();
        assert_eq!(item.category, "");
    }
}
