//! Cache queries for articles: freshness-gated lookup, best-effort
//! persistence after a live fetch, and the stale fallback scan.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, warn};

use crate::db::core::Database;
use crate::model::{Article, Category};
use crate::normalize::Normalizer;
use crate::score::Scorer;
use crate::TARGET_DB;

/// A cached category is fresh for this long after its last fetch.
pub const CACHE_FRESH_HOURS: i64 = 6;
/// A cache hit requires strictly more than this many fresh rows.
pub const CACHE_MIN_ROWS: i64 = 10;

impl Database {
    /// Look up fresh cached articles for a category. Returns `Some` only
    /// when the cache holds more than `CACHE_MIN_ROWS` rows fetched within
    /// the freshness window; a thin or stale cache is treated as a miss so
    /// the caller goes live. Hits are rescored first, so recency decay stays
    /// current even when rows are hours old.
    pub async fn cache_lookup(
        &self,
        category: Category,
        scorer: &Scorer,
    ) -> Result<Option<Vec<Article>>> {
        let cutoff = (Utc::now() - Duration::hours(CACHE_FRESH_HOURS)).timestamp();

        let count: i64 = if category == Category::All {
            sqlx::query_scalar("SELECT COUNT(*) FROM cached_articles WHERE fetched_at >= ?1")
                .bind(cutoff)
                .fetch_one(self.pool())
                .await?
        } else {
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM cached_articles WHERE category = ?1 AND fetched_at >= ?2",
            )
            .bind(category.as_str())
            .bind(cutoff)
            .fetch_one(self.pool())
            .await?
        };

        if count <= CACHE_MIN_ROWS {
            debug!(target: TARGET_DB, "Cache miss for {}: {} fresh rows", category, count);
            return Ok(None);
        }

        self.refresh_scores(cutoff, scorer).await?;

        let rows = if category == Category::All {
            sqlx::query(
                "SELECT article_id, url, title, description, image_url, published_at, source, \
                 category, author, importance, views \
                 FROM cached_articles WHERE fetched_at >= ?1 \
                 ORDER BY importance DESC, published_at DESC",
            )
            .bind(cutoff)
            .fetch_all(self.pool())
            .await?
        } else {
            sqlx::query(
                "SELECT article_id, url, title, description, image_url, published_at, source, \
                 category, author, importance, views \
                 FROM cached_articles WHERE category = ?1 AND fetched_at >= ?2 \
                 ORDER BY importance DESC, published_at DESC",
            )
            .bind(category.as_str())
            .bind(cutoff)
            .fetch_all(self.pool())
            .await?
        };

        Ok(Some(rows.iter().map(article_from_row).collect()))
    }

    /// Persist a live fetch result. An article whose canonical URL is
    /// already cached gets its view count bumped, its score refreshed, and
    /// its fetch timestamp renewed; anything else is inserted with a
    /// provisional zero score, recomputed on the next cache read. Returns
    /// the number of newly inserted rows.
    pub async fn persist_articles(&self, articles: &[Article], scorer: &Scorer) -> Result<usize> {
        let normalizer = Normalizer::new();
        let now = Utc::now().timestamp();
        let mut inserted = 0;

        for article in articles {
            let normalized_url = normalizer.canonical_url(&article.url);

            let existing = sqlx::query(
                "SELECT id, views, published_at, description, url FROM cached_articles \
                 WHERE normalized_url = ?1",
            )
            .bind(&normalized_url)
            .fetch_optional(self.pool())
            .await?;

            match existing {
                Some(row) => {
                    let row_id: i64 = row.try_get("id")?;
                    let views: i64 = row.try_get("views")?;
                    let views = (views + 1).max(0) as u32;
                    let published_at = parse_stored_date(row.try_get("published_at")?);
                    let description: Option<String> = row.try_get("description")?;
                    let url: String = row.try_get("url")?;
                    let importance = rescore(scorer, published_at, views, &description, &url);

                    sqlx::query(
                        "UPDATE cached_articles SET views = ?1, importance = ?2, fetched_at = ?3 \
                         WHERE id = ?4",
                    )
                    .bind(views as i64)
                    .bind(importance)
                    .bind(now)
                    .bind(row_id)
                    .execute(self.pool())
                    .await?;
                }
                None => {
                    sqlx::query(
                        "INSERT INTO cached_articles (article_id, url, normalized_url, title, \
                         description, image_url, published_at, source, category, author, \
                         importance, views, fetched_at) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    )
                    .bind(&article.id)
                    .bind(&article.url)
                    .bind(&normalized_url)
                    .bind(&article.title)
                    .bind(&article.description)
                    .bind(&article.image_url)
                    .bind(article.published_at.to_rfc3339())
                    .bind(&article.source)
                    .bind(article.category.as_str())
                    .bind(&article.author)
                    .bind(0i64)
                    .bind(article.views as i64)
                    .bind(now)
                    .execute(self.pool())
                    .await?;
                    inserted += 1;
                }
            }
        }

        Ok(inserted)
    }

    /// Last-resort cache scan ignoring the freshness window, used when a
    /// live fetch came up empty. Stale articles beat canned samples.
    pub async fn fallback_lookup(&self, category: Category, limit: usize) -> Result<Vec<Article>> {
        let rows = if category == Category::All {
            sqlx::query(
                "SELECT article_id, url, title, description, image_url, published_at, source, \
                 category, author, importance, views \
                 FROM cached_articles \
                 ORDER BY importance DESC, published_at DESC LIMIT ?1",
            )
            .bind(limit as i64)
            .fetch_all(self.pool())
            .await?
        } else {
            sqlx::query(
                "SELECT article_id, url, title, description, image_url, published_at, source, \
                 category, author, importance, views \
                 FROM cached_articles WHERE category = ?1 \
                 ORDER BY importance DESC, published_at DESC LIMIT ?2",
            )
            .bind(category.as_str())
            .bind(limit as i64)
            .fetch_all(self.pool())
            .await?
        };

        Ok(rows.iter().map(article_from_row).collect())
    }

    /// Recompute the stored score of every fresh row, so cached responses
    /// reflect current recency decay rather than the decay at fetch time.
    async fn refresh_scores(&self, cutoff: i64, scorer: &Scorer) -> Result<()> {
        let rows = sqlx::query(
            "SELECT id, url, description, published_at, views, importance FROM cached_articles \
             WHERE fetched_at >= ?1",
        )
        .bind(cutoff)
        .fetch_all(self.pool())
        .await?;

        let mut updated = 0;
        for row in rows {
            let row_id: i64 = row.try_get("id")?;
            let url: String = row.try_get("url")?;
            let description: Option<String> = row.try_get("description")?;
            let published_at = parse_stored_date(row.try_get("published_at")?);
            let views: i64 = row.try_get("views")?;
            let stored: i64 = row.try_get("importance")?;

            let importance = rescore(scorer, published_at, views.max(0) as u32, &description, &url);
            if importance != stored {
                sqlx::query("UPDATE cached_articles SET importance = ?1 WHERE id = ?2")
                    .bind(importance)
                    .bind(row_id)
                    .execute(self.pool())
                    .await?;
                updated += 1;
            }
        }

        if updated > 0 {
            debug!(target: TARGET_DB, "Refreshed scores on {} cached articles", updated);
        }
        Ok(())
    }
}

fn rescore(
    scorer: &Scorer,
    published_at: DateTime<Utc>,
    views: u32,
    description: &Option<String>,
    url: &str,
) -> i64 {
    let domain = url::Url::parse(url)
        .ok()
        .and_then(|u| u.domain().map(String::from))
        .unwrap_or_default();
    scorer.importance(
        published_at,
        views,
        description.as_deref().map_or(0, |d| d.len()),
        &domain,
    )
}

/// Stored dates are RFC 3339; a corrupted value degrades to now rather than
/// failing the whole lookup.
fn parse_stored_date(raw: String) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(err) => {
            warn!(target: TARGET_DB, "Unparseable stored date {:?}: {}", raw, err);
            Utc::now()
        }
    }
}

fn article_from_row(row: &SqliteRow) -> Article {
    let category: String = row.try_get("category").unwrap_or_default();
    let views: i64 = row.try_get("views").unwrap_or(0);

    Article {
        id: row.try_get("article_id").unwrap_or_default(),
        title: row.try_get("title").unwrap_or_default(),
        description: row.try_get("description").unwrap_or(None),
        url: row.try_get("url").unwrap_or_default(),
        image_url: row.try_get("image_url").unwrap_or(None),
        published_at: parse_stored_date(row.try_get("published_at").unwrap_or_default()),
        source: row.try_get("source").unwrap_or_default(),
        category: Category::parse(&category),
        author: row.try_get("author").unwrap_or(None),
        importance: row.try_get("importance").unwrap_or(0),
        views: views.max(0) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NO_URL;
    use chrono::Duration as ChronoDuration;

    fn article(url: &str, category: Category, importance: i64, age_hours: i64) -> Article {
        Article {
            id: Article::derive_id(category, 0, url),
            title: format!("Story at {}", url),
            description: Some("A reasonably detailed description of the story.".to_string()),
            url: url.to_string(),
            image_url: None,
            published_at: Utc::now() - ChronoDuration::hours(age_hours),
            source: "Example".to_string(),
            category,
            author: None,
            importance,
            views: 150,
        }
    }

    #[tokio::test]
    async fn test_persist_then_cache_lookup() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let scorer = Scorer::new();

        let articles: Vec<Article> = (0..15)
            .map(|i| {
                article(
                    &format!("https://example.com/tech/{}", i),
                    Category::Technology,
                    50,
                    2,
                )
            })
            .collect();
        let inserted = db.persist_articles(&articles, &scorer).await.unwrap();
        assert_eq!(inserted, 15);

        let hit = db
            .cache_lookup(Category::Technology, &scorer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.len(), 15);
        // Rescored on read, and sorted by importance.
        assert!(hit.windows(2).all(|w| w[0].importance >= w[1].importance));
        assert!(hit.iter().all(|a| a.category == Category::Technology));

        // A different category is still a miss.
        let miss = db.cache_lookup(Category::Sports, &scorer).await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_thin_cache_is_a_miss() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let scorer = Scorer::new();

        let articles: Vec<Article> = (0..5)
            .map(|i| article(&format!("https://example.com/{}", i), Category::Health, 40, 1))
            .collect();
        db.persist_articles(&articles, &scorer).await.unwrap();

        assert!(db
            .cache_lookup(Category::Health, &scorer)
            .await
            .unwrap()
            .is_none());

        // But the stale fallback still serves what it has.
        let stale = db.fallback_lookup(Category::Health, 100).await.unwrap();
        assert_eq!(stale.len(), 5);
    }

    #[tokio::test]
    async fn test_duplicate_persist_bumps_views() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let scorer = Scorer::new();

        let first = vec![article("https://example.com/story", Category::Business, 50, 1)];
        assert_eq!(db.persist_articles(&first, &scorer).await.unwrap(), 1);

        // Same story, URL dressed with tracking params: recognized as a dup.
        let second = vec![article(
            "https://example.com/story?utm_source=feed",
            Category::Business,
            70,
            1,
        )];
        assert_eq!(db.persist_articles(&second, &scorer).await.unwrap(), 0);

        let rows = db.fallback_lookup(Category::Business, 100).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].views, 151);
    }

    #[tokio::test]
    async fn test_no_url_articles_share_one_row() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let scorer = Scorer::new();

        let batch = vec![article(NO_URL, Category::General, 30, 1)];
        assert_eq!(db.persist_articles(&batch, &scorer).await.unwrap(), 1);
        assert_eq!(db.persist_articles(&batch, &scorer).await.unwrap(), 0);

        let rows = db.fallback_lookup(Category::General, 100).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].url, NO_URL);
    }
}
