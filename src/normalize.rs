//! Shared normalization helpers: source-name extraction, plain-text
//! truncation, multi-format date parsing, and keyword category inference.
//!
//! Every adapter runs its raw records through the same `Normalizer`, so the
//! canonical article shape is identical regardless of upstream. Normalization
//! is deterministic: the same raw record always yields the same fields.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use url::Url;
use urlnorm::UrlNormalizer;

use crate::model::Category;

/// Known domains mapped to display names. Anything not listed here falls back
/// to the bare-label heuristic (strip "www.", take the label before the first
/// dot).
static SOURCE_NAMES: &[(&str, &str)] = &[
    ("bbc.co.uk", "BBC News"),
    ("bbc.com", "BBC News"),
    ("cnn.com", "CNN"),
    ("nytimes.com", "The New York Times"),
    ("theguardian.com", "The Guardian"),
    ("reuters.com", "Reuters"),
    ("apnews.com", "Associated Press"),
    ("aljazeera.com", "Al Jazeera"),
    ("washingtonpost.com", "The Washington Post"),
    ("wsj.com", "The Wall Street Journal"),
    ("bloomberg.com", "Bloomberg"),
    ("ft.com", "Financial Times"),
    ("techcrunch.com", "TechCrunch"),
    ("theverge.com", "The Verge"),
    ("wired.com", "Wired"),
    ("arstechnica.com", "Ars Technica"),
    ("espn.com", "ESPN"),
    ("skysports.com", "Sky Sports"),
    ("nature.com", "Nature"),
    ("sciencedaily.com", "ScienceDaily"),
    ("statnews.com", "STAT"),
    ("variety.com", "Variety"),
    ("hollywoodreporter.com", "The Hollywood Reporter"),
    ("politico.com", "Politico"),
    ("thehill.com", "The Hill"),
];

/// Priority-ordered keyword table for category inference. The first category
/// with a matching keyword wins; no multi-label assignment.
static CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Technology,
        &[
            "technology",
            "software",
            "artificial intelligence",
            "smartphone",
            "semiconductor",
            "cybersecurity",
            "startup",
            "crypto",
            "gadget",
        ],
    ),
    (
        Category::Business,
        &[
            "business",
            "economy",
            "market",
            "finance",
            "stocks",
            "earnings",
            "inflation",
            "trade deal",
        ],
    ),
    (
        Category::Science,
        &[
            "science",
            "research",
            "discovery",
            "spacecraft",
            "astronomy",
            "physics",
            "climate study",
        ],
    ),
    (
        Category::Health,
        &[
            "health",
            "medical",
            "disease",
            "vaccine",
            "hospital",
            "doctors",
            "outbreak",
        ],
    ),
    (
        Category::Sports,
        &[
            "sports",
            "football",
            "soccer",
            "basketball",
            "tennis",
            "olympic",
            "championship",
            "league",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "entertainment",
            "movie",
            "film",
            "music",
            "celebrity",
            "box office",
            "television",
        ],
    ),
    (
        Category::Politics,
        &[
            "politics",
            "election",
            "government",
            "parliament",
            "senate",
            "president",
            "minister",
        ],
    ),
];

/// Shared normalization helpers, constructed over immutable lookup tables.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    source_names: &'static [(&'static str, &'static str)],
    category_keywords: &'static [(Category, &'static [&'static str])],
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer {
            source_names: SOURCE_NAMES,
            category_keywords: CATEGORY_KEYWORDS,
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Normalizer::default()
    }

    /// Derive a display name for an article's source from its URL. Known
    /// domains map to curated display names; unknown domains reduce to the
    /// bare label before the first dot, with any leading "www." stripped.
    pub fn source_name(&self, url: &str) -> String {
        let domain = match Url::parse(url).ok().and_then(|u| u.domain().map(String::from)) {
            Some(d) => d.to_lowercase(),
            None => return "Unknown".to_string(),
        };
        self.source_name_from_domain(&domain)
    }

    /// Same as `source_name`, for callers that already hold a bare domain
    /// (the events upstream reports one directly).
    pub fn source_name_from_domain(&self, domain: &str) -> String {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() {
            return "Unknown".to_string();
        }

        for (known, display) in self.source_names {
            if domain == *known || domain.ends_with(&format!(".{}", known)) {
                return display.to_string();
            }
        }

        let stripped = domain.strip_prefix("www.").unwrap_or(&domain);
        match stripped.split('.').next() {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => "Unknown".to_string(),
        }
    }

    /// Truncate free text to at most `max` characters, marking the cut with a
    /// single ellipsis character. Idempotent: truncating already-truncated
    /// text leaves it unchanged.
    pub fn truncate(&self, text: &str, max: usize) -> String {
        let text = text.trim();
        if text.chars().count() <= max {
            return text.to_string();
        }
        let mut truncated: String = text.chars().take(max.saturating_sub(1)).collect();
        truncated.push('…');
        truncated
    }

    /// Parse a date string in the formats our upstreams emit. Returns `None`
    /// rather than erroring; callers substitute the current time.
    pub fn parse_date(&self, raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        // The events upstream's compact form: 20251228T101500Z
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%SZ") {
            return Some(naive.and_utc());
        }

        if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
            return Some(date.with_timezone(&Utc));
        }

        if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
            return Some(date.with_timezone(&Utc));
        }

        // Real feeds frequently mislabel the weekday in their pubDate, which
        // strict RFC 2822 parsing rejects; retry without it.
        if let Some((_, rest)) = raw.split_once(", ") {
            if let Ok(date) = DateTime::parse_from_str(rest.trim(), "%d %b %Y %H:%M:%S %z") {
                return Some(date.with_timezone(&Utc));
            }
        }

        if let Ok(date) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
            return Some(date.with_timezone(&Utc));
        }

        // Zone-less formats are taken as UTC.
        for format in &["%Y-%m-%d %H:%M:%S", "%Y%m%d%H%M%S"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(naive.and_utc());
            }
        }

        for format in &["%Y-%m-%d", "%d/%m/%Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
                return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
            }
        }

        None
    }

    /// Canonical form of an article URL, used as the dedupe and cache key.
    /// Tracking parameters, trailing slashes, and scheme differences collapse
    /// to one key; unparseable URLs (including the no-URL sentinel) key on
    /// their raw text.
    pub fn canonical_url(&self, url: &str) -> String {
        match Url::parse(url) {
            Ok(parsed) => UrlNormalizer::default().compute_normalization_string(&parsed),
            Err(_) => url.to_string(),
        }
    }

    /// Infer a category from free text by priority-ordered keyword match.
    /// The first matching category wins; text matching nothing is `General`.
    pub fn infer_category(&self, text: &str) -> Category {
        let haystack = text.to_lowercase();
        for (category, keywords) in self.category_keywords {
            if keywords.iter().any(|kw| haystack.contains(kw)) {
                return *category;
            }
        }
        Category::General
    }
}
