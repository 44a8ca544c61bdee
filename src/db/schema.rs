use anyhow::Result;
use sqlx::sqlite::SqlitePool;

/// Create the cache tables and indexes if they do not exist.
///
/// `published_at` is stored as RFC 3339 text and `fetched_at` as unix epoch
/// seconds; `normalized_url` is the canonical dedupe key, unique across the
/// cache.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cached_articles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            article_id TEXT NOT NULL,
            url TEXT NOT NULL,
            normalized_url TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            description TEXT,
            image_url TEXT,
            published_at TEXT NOT NULL,
            source TEXT NOT NULL,
            category TEXT NOT NULL,
            author TEXT,
            importance INTEGER NOT NULL DEFAULT 0,
            views INTEGER NOT NULL DEFAULT 0,
            fetched_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_cached_articles_category_fetched \
         ON cached_articles (category, fetched_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_cached_articles_fetched \
         ON cached_articles (fetched_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
