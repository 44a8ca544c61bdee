//! Adapter for syndicated feed documents (RSS, Atom, and JSON feeds via
//! `feed-rs`).
//!
//! Real-world feeds are frequently malformed; parsing is attempted once
//! as-is and once more after XML cleanup before the feed is given up on.

use std::io::Cursor;

use anyhow::{bail, Result};
use feed_rs::parser;
use reqwest::header;
use tracing::{debug, warn};

use super::MAX_FEED_ENTRIES;
use crate::model::{Article, Category, MAX_DESCRIPTION_CHARS, NO_URL, UNTITLED};
use crate::normalize::Normalizer;
use crate::score::{placeholder_views, Scorer};
use crate::TARGET_WEB_REQUEST;

const ACCEPT_FEEDS: &str = "application/feed+json, application/json, application/rss+xml, \
     application/atom+xml, application/xml, text/xml, */*;q=0.9";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Clone)]
pub struct FeedAdapter {
    client: reqwest::Client,
    url: String,
    category: Category,
    normalizer: Normalizer,
    scorer: Scorer,
}

impl FeedAdapter {
    pub fn new(client: reqwest::Client, url: String, category: Category) -> Self {
        FeedAdapter {
            client,
            url,
            category,
            normalizer: Normalizer::new(),
            scorer: Scorer::new(),
        }
    }

    /// The category this feed is registered under.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Whether this feed should be fetched for a requested category. Feeds
    /// registered under `All` serve every category via keyword inference.
    pub fn registered_for(&self, category: Category) -> bool {
        self.category == Category::All || self.category == category
    }

    /// Fetch and normalize the feed. All failures are recovered to an empty
    /// list.
    pub async fn fetch(&self, category: Category) -> Vec<Article> {
        match self.try_fetch(category).await {
            Ok(articles) => {
                debug!(target: TARGET_WEB_REQUEST, "Feed {} returned {} articles", self.url, articles.len());
                articles
            }
            Err(err) => {
                warn!(target: TARGET_WEB_REQUEST, "Feed fetch from {} failed: {}", self.url, err);
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, category: Category) -> Result<Vec<Article>> {
        let response = self
            .client
            .get(&self.url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, ACCEPT_FEEDS)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("feed replied with status {}", response.status());
        }

        let body = response.text().await?;
        let feed = match parser::parse(Cursor::new(&body)) {
            Ok(feed) => feed,
            Err(first_err) => {
                // Try once more after cleaning up common XML defects.
                let cleaned = cleanup_xml(&body);
                if !cleaned.contains("<rss") && !cleaned.contains("<feed") {
                    bail!("content is not RSS or Atom: {}", first_err);
                }
                match parser::parse(Cursor::new(&cleaned)) {
                    Ok(feed) => {
                        debug!(target: TARGET_WEB_REQUEST, "Feed {} parsed after XML cleanup", self.url);
                        feed
                    }
                    Err(second_err) => bail!(
                        "feed parse failed even after cleanup: {} / {}",
                        first_err,
                        second_err
                    ),
                }
            }
        };

        let mut articles: Vec<Article> = feed
            .entries
            .into_iter()
            .take(MAX_FEED_ENTRIES)
            .enumerate()
            .map(|(index, entry)| self.normalize_entry(index, entry))
            .collect();

        // A catch-all feed serving a concrete category contributes only the
        // entries inferred to belong to it.
        if self.category == Category::All && category != Category::All {
            articles.retain(|article| article.category == category);
        }

        Ok(articles)
    }

    fn normalize_entry(&self, index: usize, entry: feed_rs::model::Entry) -> Article {
        let url = entry
            .links
            .first()
            .map(|link| link.href.clone())
            .filter(|href| !href.is_empty())
            .unwrap_or_else(|| NO_URL.to_string());

        let title = entry
            .title
            .map(|t| t.content)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let description = entry
            .summary
            .map(|s| self.normalizer.truncate(&s.content, MAX_DESCRIPTION_CHARS))
            .filter(|s| !s.is_empty());

        let published_at = entry
            .published
            .or(entry.updated)
            .unwrap_or_else(chrono::Utc::now);

        let author = entry
            .authors
            .first()
            .map(|person| person.name.clone())
            .filter(|name| !name.trim().is_empty());

        let image_url = entry
            .media
            .first()
            .and_then(|media| media.content.first())
            .and_then(|content| content.url.as_ref())
            .map(|u| u.to_string());

        let category = if self.category == Category::All {
            let haystack = format!("{} {}", title, description.as_deref().unwrap_or(""));
            self.normalizer.infer_category(&haystack)
        } else {
            self.category
        };

        let views = placeholder_views();
        let domain = url::Url::parse(&url)
            .ok()
            .and_then(|u| u.domain().map(String::from))
            .unwrap_or_default();
        let importance = self.scorer.importance(
            published_at,
            views,
            description.as_deref().map_or(0, |d| d.len()),
            &domain,
        );

        Article {
            id: Article::derive_id(category, index, &url),
            title,
            description,
            url,
            image_url,
            published_at,
            source: self.source_for(&domain),
            category,
            author,
            importance,
            views,
        }
    }

    /// Source display name from the entry's own domain, with the feed URL as
    /// the fallback when an entry carries no usable link.
    fn source_for(&self, domain: &str) -> String {
        if domain.is_empty() {
            self.normalizer.source_name(&self.url)
        } else {
            self.normalizer.source_name_from_domain(domain)
        }
    }
}

/// Clean up malformed XML enough for a second parse attempt: strip the BOM
/// and any junk before the document start, and rewrite HTML entities that
/// XML parsers reject.
fn cleanup_xml(xml: &str) -> String {
    let mut cleaned = xml.trim().trim_start_matches('\u{FEFF}').to_string();

    if let Some(start) = cleaned.find("<?xml") {
        cleaned = cleaned[start..].to_string();
    } else if let Some(start) = cleaned.find("<rss") {
        cleaned = cleaned[start..].to_string();
    } else if let Some(start) = cleaned.find("<feed") {
        cleaned = cleaned[start..].to_string();
    }

    cleaned
        .replace("&nbsp;", "&#160;")
        .replace("&ndash;", "&#8211;")
        .replace("&mdash;", "&#8212;")
        .replace("&rsquo;", "&#8217;")
        .replace("&lsquo;", "&#8216;")
        .replace("&rdquo;", "&#8221;")
        .replace("&ldquo;", "&#8220;")
        .replace("&amp;amp;", "&amp;")
        .replace("&apos;", "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(category: Category) -> FeedAdapter {
        FeedAdapter::new(
            reqwest::Client::new(),
            "https://feeds.bbci.co.uk/news/world/rss.xml".to_string(),
            category,
        )
    }

    #[test]
    fn test_registered_for() {
        assert!(adapter(Category::Sports).registered_for(Category::Sports));
        assert!(!adapter(Category::Sports).registered_for(Category::Health));
        assert!(adapter(Category::All).registered_for(Category::Health));
    }

    #[test]
    fn test_cleanup_xml_strips_junk_and_entities() {
        let dirty = "\u{FEFF}garbage<?xml version=\"1.0\"?><rss>a &nbsp; b &rsquo;</rss>";
        let cleaned = cleanup_xml(dirty);
        assert!(cleaned.starts_with("<?xml"));
        assert!(cleaned.contains("&#160;"));
        assert!(cleaned.contains("&#8217;"));
        assert!(!cleaned.contains("garbage"));
    }

    #[test]
    fn test_normalize_entry_defaults() {
        let rss = r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>T</title>
            <item><title>Vaccine rollout expands</title>
            <link>https://www.statnews.com/2026/08/29/vaccine</link>
            <description>Health officials said the program reaches ten more regions.</description>
            <pubDate>Sat, 29 Aug 2026 09:00:00 GMT</pubDate>
            </item></channel></rss>"#;
        let feed = parser::parse(Cursor::new(rss)).unwrap();
        let entry = feed.entries.into_iter().next().unwrap();

        let article = adapter(Category::Health).normalize_entry(0, entry);
        assert_eq!(article.category, Category::Health);
        assert_eq!(article.source, "STAT");
        assert_eq!(article.title, "Vaccine rollout expands");
        assert!(article.description.is_some());
        assert!(article.views >= 100);
        assert!((0..=100).contains(&article.importance));
    }

    #[test]
    fn test_catch_all_feed_keeps_general_entries() {
        let rss = r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>World</title>
            <item><title>Quiet day everywhere</title>
            <link>https://example.org/quiet-day</link>
            </item></channel></rss>"#;
        let feed = parser::parse(Cursor::new(rss)).unwrap();
        let entry = feed.entries.into_iter().next().unwrap();

        // An entry matching no category keywords files under General and
        // must survive an `all` fetch, where no inference filter applies.
        let article = adapter(Category::All).normalize_entry(0, entry);
        assert_eq!(article.category, Category::General);
    }

    #[test]
    fn test_catch_all_feed_infers_category() {
        let rss = r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>World</title>
            <item><title>Championship final draws record crowd</title>
            <link>https://example.org/sports-story</link>
            </item></channel></rss>"#;
        let feed = parser::parse(Cursor::new(rss)).unwrap();
        let entry = feed.entries.into_iter().next().unwrap();

        let article = adapter(Category::All).normalize_entry(0, entry);
        assert_eq!(article.category, Category::Sports);
        assert_eq!(article.title, "Championship final draws record crowd");
    }
}
