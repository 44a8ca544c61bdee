//! Core data model: the canonical article shape, request context, and
//! response envelope shared by the adapters, the pipeline, and the HTTP
//! surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed category set articles are filed under. `All` is only meaningful
/// in requests ("query every category"); articles themselves carry one of the
/// concrete categories, with `General` as the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technology,
    Business,
    Science,
    Health,
    Sports,
    Entertainment,
    Politics,
    General,
    All,
}

impl Category {
    /// The concrete categories fanned out over when `all` is requested.
    pub const KNOWN: [Category; 7] = [
        Category::Technology,
        Category::Business,
        Category::Science,
        Category::Health,
        Category::Sports,
        Category::Entertainment,
        Category::Politics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::Business => "business",
            Category::Science => "science",
            Category::Health => "health",
            Category::Sports => "sports",
            Category::Entertainment => "entertainment",
            Category::Politics => "politics",
            Category::General => "general",
            Category::All => "all",
        }
    }

    /// Parse a query-string category, defaulting to `All` for anything
    /// unrecognized so a bad parameter never fails the request.
    pub fn parse(raw: &str) -> Category {
        match raw.trim().to_lowercase().as_str() {
            "technology" | "tech" => Category::Technology,
            "business" => Category::Business,
            "science" => Category::Science,
            "health" => Category::Health,
            "sports" => Category::Sports,
            "entertainment" => Category::Entertainment,
            "politics" => Category::Politics,
            "general" => Category::General,
            _ => Category::All,
        }
    }

    /// Whether an article filed under `self` matches a requested category.
    pub fn matches(&self, requested: Category) -> bool {
        requested == Category::All || *self == requested
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side sort modes for the merged article list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    Relevance,
    DateDesc,
    DateAsc,
    VolumeDesc,
    VolumeAsc,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Relevance => "relevance",
            SortMode::DateDesc => "date-desc",
            SortMode::DateAsc => "date-asc",
            SortMode::VolumeDesc => "volume-desc",
            SortMode::VolumeAsc => "volume-asc",
        }
    }

    pub fn parse(raw: &str) -> SortMode {
        match raw.trim().to_lowercase().as_str() {
            "date-desc" => SortMode::DateDesc,
            "date-asc" => SortMode::DateAsc,
            "volume-desc" => SortMode::VolumeDesc,
            "volume-asc" => SortMode::VolumeAsc,
            _ => SortMode::Relevance,
        }
    }
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which tier ultimately supplied the returned articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Live,
    Cache,
    Sample,
    Fallback,
}

/// Sentinel used as the dedupe key when an upstream record has no URL.
pub const NO_URL: &str = "#";

/// Placeholder title for records that omit one.
pub const UNTITLED: &str = "Untitled";

/// Maximum description length after normalization.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// The canonical unit flowing through the pipeline. Serialized camelCase to
/// match what the presentation layer consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub category: Category,
    pub author: Option<String>,
    pub importance: i64,
    pub views: u32,
}

impl Article {
    /// Deterministic id derivation: category + ordinal + URL, so two sources
    /// reporting different articles can never collide by index alone.
    pub fn derive_id(category: Category, index: usize, url: &str) -> String {
        format!("{}-{}-{}", category.as_str(), index, url)
    }
}

/// Immutable per-request context parsed from the query string.
#[derive(Debug, Clone)]
pub struct NewsQuery {
    pub category: Category,
    pub lang: String,
    pub sort: SortMode,
    pub refresh: bool,
}

impl Default for NewsQuery {
    fn default() -> Self {
        NewsQuery {
            category: Category::All,
            lang: "en".to_string(),
            sort: SortMode::Relevance,
            refresh: false,
        }
    }
}

/// The response envelope returned by `GET /news`.
#[derive(Debug, Clone, Serialize)]
pub struct NewsResponse {
    pub articles: Vec<Article>,
    pub cached: bool,
    pub count: usize,
    pub source: Tier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NewsResponse {
    pub fn new(articles: Vec<Article>, tier: Tier, error: Option<String>) -> Self {
        NewsResponse {
            count: articles.len(),
            cached: tier == Tier::Cache,
            articles,
            source: tier,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_defaults_to_all() {
        assert_eq!(Category::parse("technology"), Category::Technology);
        assert_eq!(Category::parse("SPORTS"), Category::Sports);
        assert_eq!(Category::parse("not-a-category"), Category::All);
        assert_eq!(Category::parse(""), Category::All);
    }

    #[test]
    fn test_sort_mode_parse_defaults_to_relevance() {
        assert_eq!(SortMode::parse("date-desc"), SortMode::DateDesc);
        assert_eq!(SortMode::parse("volume-asc"), SortMode::VolumeAsc);
        assert_eq!(SortMode::parse("relevance"), SortMode::Relevance);
        assert_eq!(SortMode::parse("bogus"), SortMode::Relevance);
    }

    #[test]
    fn test_derive_id_is_deterministic() {
        let a = Article::derive_id(Category::Technology, 3, "https://example.com/x");
        let b = Article::derive_id(Category::Technology, 3, "https://example.com/x");
        assert_eq!(a, b);
        assert_eq!(a, "technology-3-https://example.com/x");
    }

    #[test]
    fn test_category_matches() {
        assert!(Category::Sports.matches(Category::All));
        assert!(Category::Sports.matches(Category::Sports));
        assert!(!Category::Sports.matches(Category::Health));
    }

    #[test]
    fn test_tier_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Fallback).unwrap(), "\"fallback\"");
        assert_eq!(serde_json::to_string(&Tier::Live).unwrap(), "\"live\"");
    }
}
