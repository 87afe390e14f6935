//! Hard filters applied to knowledge base queries

use serde::{Deserialize, Serialize};

use super::document::Document;

/// Equality filter on document metadata
///
/// Only the `city` key is filterable. A filter excludes non-matching
/// documents entirely; it never reweights them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    city: Option<String>,
}

impl DocumentFilter {
    /// A filter that matches every document
    pub fn none() -> Self {
        Self::default()
    }

    /// Restrict results to a single city (exact match)
    pub fn city(city: impl Into<String>) -> Self {
        Self {
            city: Some(city.into()),
        }
    }

    /// Build from an optional city, ignoring blank values
    pub fn from_city(city: Option<&str>) -> Self {
        match city.map(str::trim) {
            Some(c) if !c.is_empty() => Self::city(c),
            _ => Self::none(),
        }
    }

    pub fn city_value(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.city.is_none()
    }

    pub fn matches(&self, document: &Document) -> bool {
        match &self.city {
            Some(city) => document.city == *city,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(city: &str) -> Document {
        Document::new("id", city, "See", "text")
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = DocumentFilter::none();
        assert!(filter.is_empty());
        assert!(filter.matches(&doc("Cairo")));
        assert!(filter.matches(&doc("Rome")));
    }

    #[test]
    fn test_city_filter_is_exact() {
        let filter = DocumentFilter::city("Cairo");
        assert!(filter.matches(&doc("Cairo")));
        assert!(!filter.matches(&doc("cairo")));
        assert!(!filter.matches(&doc("London")));
    }

    #[test]
    fn test_from_city_ignores_blank() {
        assert!(DocumentFilter::from_city(None).is_empty());
        assert!(DocumentFilter::from_city(Some("  ")).is_empty());
        assert_eq!(
            DocumentFilter::from_city(Some(" Seoul ")).city_value(),
            Some("Seoul")
        );
    }
}
