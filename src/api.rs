//! HTTP surface: a single aggregated news endpoint plus a liveness probe.
//!
//! `GET /news` always answers 200 with a JSON body; degradation shows up in
//! the body's `source` and `error` fields, never as an HTTP error.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::aggregate::Aggregator;
use crate::model::{Category, NewsQuery, NewsResponse, SortMode};
use crate::TARGET_WEB_REQUEST;

/// Raw query parameters for `GET /news`. Everything is optional and
/// free-text; unknown values fall back to defaults rather than rejecting
/// the request.
#[derive(Debug, Default, Deserialize)]
pub struct NewsParams {
    category: Option<String>,
    lang: Option<String>,
    sort: Option<String>,
    refresh: Option<String>,
}

impl NewsParams {
    fn into_query(self) -> NewsQuery {
        NewsQuery {
            category: Category::parse(self.category.as_deref().unwrap_or("")),
            lang: self
                .lang
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| "en".to_string()),
            sort: SortMode::parse(self.sort.as_deref().unwrap_or("")),
            refresh: matches!(self.refresh.as_deref(), Some("true") | Some("1")),
        }
    }
}

async fn news_handler(
    State(aggregator): State<Arc<Aggregator>>,
    Query(params): Query<NewsParams>,
) -> Json<NewsResponse> {
    let query = params.into_query();
    info!(target: TARGET_WEB_REQUEST, "GET /news category={} lang={} sort={} refresh={}",
          query.category, query.lang, query.sort, query.refresh);
    Json(aggregator.aggregate(&query).await)
}

async fn status_handler() -> &'static str {
    "OK"
}

pub fn router(aggregator: Arc<Aggregator>) -> Router {
    Router::new()
        .route("/news", get(news_handler))
        .route("/status", get(status_handler))
        .with_state(aggregator)
}

/// Bind and serve until the process is stopped.
pub async fn serve(aggregator: Arc<Aggregator>, port: u16) -> Result<()> {
    let app = router(aggregator);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(target: TARGET_WEB_REQUEST, "Listening on port {}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_defaults() {
        let query = NewsParams::default().into_query();
        assert_eq!(query.category, Category::All);
        assert_eq!(query.lang, "en");
        assert_eq!(query.sort, SortMode::Relevance);
        assert!(!query.refresh);
    }

    #[test]
    fn test_params_parsing() {
        let params = NewsParams {
            category: Some("sports".to_string()),
            lang: Some("vi".to_string()),
            sort: Some("date-desc".to_string()),
            refresh: Some("true".to_string()),
        };
        let query = params.into_query();
        assert_eq!(query.category, Category::Sports);
        assert_eq!(query.lang, "vi");
        assert_eq!(query.sort, SortMode::DateDesc);
        assert!(query.refresh);
    }

    #[test]
    fn test_unknown_values_fall_back() {
        let params = NewsParams {
            category: Some("astrology".to_string()),
            lang: Some("  ".to_string()),
            sort: Some("sideways".to_string()),
            refresh: Some("yes".to_string()),
        };
        let query = params.into_query();
        assert_eq!(query.category, Category::All);
        assert_eq!(query.lang, "en");
        assert_eq!(query.sort, SortMode::Relevance);
        assert!(!query.refresh);
    }
}
