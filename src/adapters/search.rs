//! Adapter for an external web-search function.
//!
//! The collaborator exposes `invoke(query, result_count)` as a JSON HTTP
//! endpoint returning `{results: [{title, snippet, url, date}]}`. The
//! adapter is only registered when `NEWSWIRE_SEARCH_URL` is configured.

use anyhow::{bail, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use super::MAX_SEARCH_RESULTS;
use crate::model::{Article, Category, MAX_DESCRIPTION_CHARS, NO_URL, UNTITLED};
use crate::normalize::Normalizer;
use crate::score::{placeholder_views, Scorer};
use crate::TARGET_WEB_REQUEST;

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    title: Option<String>,
    snippet: Option<String>,
    url: Option<String>,
    date: Option<String>,
}

#[derive(Clone)]
pub struct SearchAdapter {
    client: reqwest::Client,
    endpoint: String,
    normalizer: Normalizer,
    scorer: Scorer,
}

impl SearchAdapter {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        SearchAdapter {
            client,
            endpoint,
            normalizer: Normalizer::new(),
            scorer: Scorer::new(),
        }
    }

    /// Invoke the search function for a category. All failures are recovered
    /// to an empty list.
    pub async fn fetch(&self, category: Category) -> Vec<Article> {
        match self.try_fetch(category).await {
            Ok(articles) => {
                debug!(target: TARGET_WEB_REQUEST, "Search upstream returned {} articles for {}",
                       articles.len(), category);
                articles
            }
            Err(err) => {
                warn!(target: TARGET_WEB_REQUEST, "Search fetch for {} failed: {}", category, err);
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, category: Category) -> Result<Vec<Article>> {
        let query = match category {
            Category::All | Category::General => "latest news".to_string(),
            other => format!("latest {} news", other.as_str()),
        };
        let count = MAX_SEARCH_RESULTS.to_string();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query.as_str()), ("count", count.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("search upstream replied with status {}", response.status());
        }

        let payload: SearchPayload = response.json().await?;

        let articles = payload
            .results
            .into_iter()
            .take(MAX_SEARCH_RESULTS)
            .enumerate()
            .map(|(index, result)| self.normalize_result(category, index, result))
            .collect();

        Ok(articles)
    }

    fn normalize_result(&self, category: Category, index: usize, result: SearchResult) -> Article {
        let url = result
            .url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| NO_URL.to_string());

        let title = result
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let description = result
            .snippet
            .map(|s| self.normalizer.truncate(&s, MAX_DESCRIPTION_CHARS))
            .filter(|s| !s.is_empty());

        let published_at = result
            .date
            .as_deref()
            .and_then(|raw| self.normalizer.parse_date(raw))
            .unwrap_or_else(chrono::Utc::now);

        let category = if category == Category::All {
            let haystack = format!("{} {}", title, description.as_deref().unwrap_or(""));
            self.normalizer.infer_category(&haystack)
        } else {
            category
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
            image_url: None,
            published_at,
            source: self.normalizer.source_name_from_domain(&domain),
            category,
            author: None,
            importance,
            views,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_result_maps_fields() {
        let adapter = SearchAdapter::new(
            reqwest::Client::new(),
            "http://localhost:9000/search".to_string(),
        );
        let result = SearchResult {
            title: Some("Election results certified".to_string()),
            snippet: Some("Officials certified the final tally on Friday.".to_string()),
            url: Some("https://www.politico.com/story/1".to_string()),
            date: Some("2026-08-28".to_string()),
        };

        let article = adapter.normalize_result(Category::Politics, 2, result);
        assert_eq!(article.category, Category::Politics);
        assert_eq!(article.source, "Politico");
        assert_eq!(article.id, "politics-2-https://www.politico.com/story/1");
        assert!((0..=100).contains(&article.importance));
    }

    #[test]
    fn test_normalize_result_defaults_and_inference() {
        let adapter = SearchAdapter::new(
            reqwest::Client::new(),
            "http://localhost:9000/search".to_string(),
        );
        let result = SearchResult {
            title: Some("Vaccine stockpile doubled before winter".to_string()),
            snippet: None,
            url: None,
            date: None,
        };

        let article = adapter.normalize_result(Category::All, 0, result);
        assert_eq!(article.url, NO_URL);
        assert_eq!(article.category, Category::Health);
        assert_eq!(article.source, "Unknown");
    }
}
