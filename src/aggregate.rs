//! The aggregation pipeline: concurrent fan-out across configured source
//! adapters, merge, sort, dedupe, truncate, and multi-tier fallback.
//!
//! `aggregate()` is infallible by construction: every internal failure
//! degrades to a lower tier (cache, then the fixed sample set) rather than
//! surfacing to the caller.

use std::collections::HashSet;

use anyhow::Result;
use futures::future::join_all;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

use crate::adapters::{AdapterSet, FETCH_TIMEOUT};
use crate::db::Database;
use crate::model::{Article, NewsQuery, NewsResponse, SortMode, Tier};
use crate::normalize::Normalizer;
use crate::sample::sample_articles;
use crate::score::Scorer;
use crate::TARGET_AGGREGATOR;

/// Hard cap on the number of articles in a response.
pub const MAX_RESULTS: usize = 100;
/// Below this many live articles, the response is served from a lower tier.
pub const MIN_LIVE_RESULTS: usize = 5;
/// Ceiling on the whole fan-out, even if individual calls never settle.
pub const REQUEST_DEADLINE: Duration = Duration::from_secs(30);

pub struct Aggregator {
    adapters: AdapterSet,
    db: Option<Database>,
    scorer: Scorer,
}

impl Aggregator {
    pub fn new(adapters: AdapterSet, db: Option<Database>) -> Self {
        Aggregator {
            adapters,
            db,
            scorer: Scorer::new(),
        }
    }

    /// Run the full pipeline for one request. Never fails outward: on a
    /// total pipeline failure the response degrades to the sample set with
    /// `source: "fallback"` and a human-readable error.
    pub async fn aggregate(&self, query: &NewsQuery) -> NewsResponse {
        match self.try_aggregate(query).await {
            Ok(response) => response,
            Err(err) => {
                error!(target: TARGET_AGGREGATOR, "Pipeline failure, degrading to sample data: {}", err);
                sample_response(
                    query,
                    Tier::Fallback,
                    Some(format!("news aggregation failed: {}", err)),
                )
            }
        }
    }

    async fn try_aggregate(&self, query: &NewsQuery) -> Result<NewsResponse> {
        // Cache tier first, unless a refresh was forced.
        if let Some(db) = &self.db {
            if !query.refresh {
                match db.cache_lookup(query.category, &self.scorer).await {
                    Ok(Some(mut articles)) => {
                        debug!(target: TARGET_AGGREGATOR, "Cache hit for {}: {} articles",
                               query.category, articles.len());
                        if query.sort != SortMode::Relevance {
                            sort_articles(&mut articles, query.sort);
                        }
                        articles.truncate(MAX_RESULTS);
                        return Ok(NewsResponse::new(articles, Tier::Cache, None));
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!(target: TARGET_AGGREGATOR, "Cache lookup failed, falling through to live fetch: {}", err);
                    }
                }
            }
        }

        let fetched = self.fetch_all(query).await;
        let articles = finalize(fetched, query.sort, MAX_RESULTS);

        if articles.len() < MIN_LIVE_RESULTS {
            info!(target: TARGET_AGGREGATOR, "Live fetch for {} produced only {} articles, degrading",
                  query.category, articles.len());

            // Stale cached data beats canned sample data.
            if let Some(db) = &self.db {
                match db.fallback_lookup(query.category, MAX_RESULTS).await {
                    Ok(cached) if cached.len() >= MIN_LIVE_RESULTS => {
                        let mut cached = cached;
                        if query.sort != SortMode::Relevance {
                            sort_articles(&mut cached, query.sort);
                        }
                        return Ok(NewsResponse::new(cached, Tier::Cache, None));
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(target: TARGET_AGGREGATOR, "Cache fallback failed: {}", err);
                    }
                }
            }

            return Ok(sample_response(query, Tier::Sample, None));
        }

        // Persist best-effort; storage failures never abort the request.
        if let Some(db) = &self.db {
            match db.persist_articles(&articles, &self.scorer).await {
                Ok(inserted) => {
                    debug!(target: TARGET_AGGREGATOR, "Persisted {} new cached articles", inserted)
                }
                Err(err) => {
                    warn!(target: TARGET_AGGREGATOR, "Persisting articles failed, serving live result: {}", err)
                }
            }
        }

        info!(target: TARGET_AGGREGATOR, "Serving {} live articles for {}",
              articles.len(), query.category);
        Ok(NewsResponse::new(articles, Tier::Live, None))
    }

    /// Fan out over every planned (category, adapter) call concurrently and
    /// join with per-call isolation: a slow, failing, or panicking call
    /// contributes an empty list without poisoning the others.
    async fn fetch_all(&self, query: &NewsQuery) -> Vec<Article> {
        let mut tasks = Vec::new();
        for (category, adapter) in self.adapters.fan_out(query.category) {
            let lang = query.lang.clone();
            tasks.push(tokio::spawn(async move {
                let kind = adapter.kind();
                match timeout(FETCH_TIMEOUT, adapter.fetch(category, &lang)).await {
                    Ok(articles) => articles,
                    Err(_) => {
                        warn!(target: TARGET_AGGREGATOR, "{} adapter timed out for {}", kind, category);
                        Vec::new()
                    }
                }
            }));
        }

        let task_count = tasks.len();
        let settled = match timeout(REQUEST_DEADLINE, join_all(tasks)).await {
            Ok(settled) => settled,
            Err(_) => {
                error!(target: TARGET_AGGREGATOR, "Request deadline hit waiting on {} adapter calls", task_count);
                return Vec::new();
            }
        };

        settled
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(articles) => Some(articles),
                Err(err) => {
                    error!(target: TARGET_AGGREGATOR, "Adapter task panicked: {}", err);
                    None
                }
            })
            .flatten()
            .collect()
    }
}

/// Merge-phase core, factored out of the async path: sort by the requested
/// mode, dedupe by canonical URL keeping the first occurrence, truncate to
/// the cap. Sorting happens before dedup so under the default relevance
/// order the surviving duplicate is always the highest-scored one.
pub fn finalize(mut articles: Vec<Article>, sort: SortMode, cap: usize) -> Vec<Article> {
    sort_articles(&mut articles, sort);
    let mut articles = dedupe_by_url(articles);
    articles.truncate(cap);
    articles
}

/// Stable sort, so equal keys keep their insertion order.
pub fn sort_articles(articles: &mut [Article], mode: SortMode) {
    match mode {
        SortMode::Relevance => articles.sort_by(|a, b| b.importance.cmp(&a.importance)),
        SortMode::DateDesc => articles.sort_by(|a, b| b.published_at.cmp(&a.published_at)),
        SortMode::DateAsc => articles.sort_by(|a, b| a.published_at.cmp(&b.published_at)),
        SortMode::VolumeDesc => articles.sort_by(|a, b| b.views.cmp(&a.views)),
        SortMode::VolumeAsc => articles.sort_by(|a, b| a.views.cmp(&b.views)),
    }
}

/// Drop every article whose canonical URL was already seen. First occurrence
/// wins; run this on an already-sorted list.
pub fn dedupe_by_url(articles: Vec<Article>) -> Vec<Article> {
    let normalizer = Normalizer::new();
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| seen.insert(normalizer.canonical_url(&article.url)))
        .collect()
}

fn sample_response(query: &NewsQuery, tier: Tier, error: Option<String>) -> NewsResponse {
    let mut articles = sample_articles(query.category);
    sort_articles(&mut articles, query.sort);
    NewsResponse::new(articles, tier, error)
}
