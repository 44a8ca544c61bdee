//! Adapter for the open-data event/article database (GDELT DOC 2.0 API).
//!
//! The upstream is queried in `artlist` JSON mode with a per-category
//! keyword query and a source-language filter. It is also the flakiest of
//! the upstreams: on errors it returns plain-text bodies with a 200 status,
//! so the body is sniffed before JSON parsing.

use anyhow::{bail, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use super::MAX_EVENT_RECORDS;
use crate::model::{Article, Category, NO_URL, UNTITLED};
use crate::normalize::Normalizer;
use crate::score::{placeholder_views, Scorer};
use crate::TARGET_WEB_REQUEST;

pub const DEFAULT_EVENTS_URL: &str = "https://api.gdeltproject.org/api/v2/doc/doc";

/// Views synthesized from mention counts are capped here.
const MAX_PROXIED_VIEWS: u32 = 2000;

/// Category to upstream keyword-query mapping.
static CATEGORY_QUERIES: &[(Category, &str)] = &[
    (Category::Technology, "technology"),
    (Category::Business, "business economy finance"),
    (Category::Science, "science research"),
    (Category::Health, "health medical"),
    (Category::Sports, "sports"),
    (Category::Entertainment, "entertainment movies music"),
    (Category::Politics, "politics election government"),
];

#[derive(Debug, Deserialize)]
struct EventsPayload {
    #[serde(default)]
    articles: Vec<EventRecord>,
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    url: Option<String>,
    title: Option<String>,
    seendate: Option<String>,
    socialimage: Option<String>,
    domain: Option<String>,
    tone: Option<f64>,
    goldsteinscale: Option<f64>,
    seenqty: Option<u32>,
}

#[derive(Clone)]
pub struct EventsAdapter {
    client: reqwest::Client,
    endpoint: String,
    normalizer: Normalizer,
    scorer: Scorer,
}

impl EventsAdapter {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        EventsAdapter {
            client,
            endpoint,
            normalizer: Normalizer::new(),
            scorer: Scorer::new(),
        }
    }

    /// Fetch event records for a category. All failures are recovered to an
    /// empty list.
    pub async fn fetch(&self, category: Category, lang: &str) -> Vec<Article> {
        match self.try_fetch(category, lang).await {
            Ok(articles) => {
                debug!(target: TARGET_WEB_REQUEST, "Events upstream returned {} articles for {}",
                       articles.len(), category);
                articles
            }
            Err(err) => {
                warn!(target: TARGET_WEB_REQUEST, "Events fetch for {} failed: {}", category, err);
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, category: Category, lang: &str) -> Result<Vec<Article>> {
        let query = format!("sourcelang:{} {}", source_lang(lang), category_query(category));
        let max_records = MAX_EVENT_RECORDS.to_string();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("mode", "artlist"),
                ("format", "json"),
                ("maxrecords", max_records.as_str()),
                ("sort", "hybridrel"),
                ("query", query.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("events upstream replied with status {}", response.status());
        }

        // The upstream reports errors as plain text with a 200 status.
        let body = response.text().await?;
        if !body.trim_start().starts_with('{') {
            bail!(
                "events upstream body is not JSON: {}",
                body.chars().take(100).collect::<String>()
            );
        }

        let payload: EventsPayload = serde_json::from_str(&body)?;

        let articles = payload
            .articles
            .into_iter()
            .take(MAX_EVENT_RECORDS)
            .enumerate()
            .map(|(index, record)| self.normalize_record(category, index, record))
            .collect();

        Ok(articles)
    }

    fn normalize_record(&self, category: Category, index: usize, record: EventRecord) -> Article {
        let url = record.url.filter(|u| !u.is_empty()).unwrap_or_else(|| NO_URL.to_string());
        let title = record
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let published_at = record
            .seendate
            .as_deref()
            .and_then(|raw| self.normalizer.parse_date(raw))
            .unwrap_or_else(chrono::Utc::now);

        let mentions = record.seenqty.unwrap_or(0);
        let views = if mentions > 0 {
            mentions.saturating_mul(10).min(MAX_PROXIED_VIEWS)
        } else {
            placeholder_views()
        };
        let description = record
            .seenqty
            .map(|qty| format!("{} mentions across global media", qty));

        let source = match &record.domain {
            Some(domain) if !domain.is_empty() => self.normalizer.source_name_from_domain(domain),
            _ => self.normalizer.source_name(&url),
        };

        let importance = self.scorer.event_impact(
            published_at,
            record.tone.unwrap_or(0.0),
            record.goldsteinscale.unwrap_or(0.0),
            mentions,
        );

        let category = if category == Category::All {
            self.normalizer.infer_category(&title)
        } else {
            category
        };

        Article {
            id: Article::derive_id(category, index, &url),
            title,
            description,
            url,
            image_url: record.socialimage.filter(|s| !s.is_empty()),
            published_at,
            source,
            category,
            author: None,
            importance,
            views,
        }
    }
}

fn category_query(category: Category) -> &'static str {
    CATEGORY_QUERIES
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, q)| *q)
        .unwrap_or("news")
}

/// Map a request language code to the upstream's source-language filter.
fn source_lang(lang: &str) -> &'static str {
    match lang.trim().to_lowercase().as_str() {
        "vi" => "vietnamese",
        "es" => "spanish",
        "fr" => "french",
        "de" => "german",
        "pt" => "portuguese",
        "ja" => "japanese",
        _ => "english",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_query_fallback() {
        assert_eq!(category_query(Category::Business), "business economy finance");
        assert_eq!(category_query(Category::All), "news");
        assert_eq!(category_query(Category::General), "news");
    }

    #[test]
    fn test_source_lang_mapping() {
        assert_eq!(source_lang("vi"), "vietnamese");
        assert_eq!(source_lang("EN"), "english");
        assert_eq!(source_lang("xx"), "english");
    }

    #[test]
    fn test_normalize_record_maps_fields() {
        let adapter = EventsAdapter::new(reqwest::Client::new(), DEFAULT_EVENTS_URL.to_string());
        let record = EventRecord {
            url: Some("https://www.bbc.co.uk/news/world-1".to_string()),
            title: Some("Markets rally".to_string()),
            seendate: Some("20260829T101500Z".to_string()),
            socialimage: Some("https://img.example.com/1.jpg".to_string()),
            domain: Some("bbc.co.uk".to_string()),
            tone: Some(2.0),
            goldsteinscale: Some(1.5),
            seenqty: Some(40),
        };

        let article = adapter.normalize_record(Category::Business, 0, record);
        assert_eq!(article.source, "BBC News");
        assert_eq!(article.category, Category::Business);
        assert_eq!(article.views, 400);
        assert_eq!(
            article.description.as_deref(),
            Some("40 mentions across global media")
        );
        assert!((0..=100).contains(&article.importance));
        assert_eq!(article.id, "business-0-https://www.bbc.co.uk/news/world-1");
    }

    #[test]
    fn test_normalize_record_defaults() {
        let adapter = EventsAdapter::new(reqwest::Client::new(), DEFAULT_EVENTS_URL.to_string());
        let record = EventRecord {
            url: None,
            title: None,
            seendate: Some("garbage".to_string()),
            socialimage: None,
            domain: None,
            tone: None,
            goldsteinscale: None,
            seenqty: None,
        };

        let article = adapter.normalize_record(Category::All, 3, record);
        assert_eq!(article.url, NO_URL);
        assert_eq!(article.title, UNTITLED);
        assert_eq!(article.category, Category::General);
        assert!(article.views >= 100);
        assert!(article.description.is_none());
    }
}
