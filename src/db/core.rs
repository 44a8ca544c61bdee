use anyhow::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::db::schema;
use crate::TARGET_DB;

/// Handle to the sqlite article cache. Cloning shares the pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database at the given path or
    /// connection string, and ensure the schema exists. Accepts either a
    /// filesystem path like `newswire.db` or a full connection string like
    /// `sqlite::memory:`.
    pub async fn new(database: &str) -> Result<Self> {
        let conn_str = if database.starts_with("sqlite:") {
            database.to_string()
        } else {
            format!("sqlite://{}?mode=rwc", database)
        };

        let max_connections = if conn_str.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&conn_str)
            .await?;

        schema::init_tables(&pool).await?;

        info!(target: TARGET_DB, "Database ready at {}", database);
        Ok(Database { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
