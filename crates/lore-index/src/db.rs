//! `SQLite` pool setup shared by the state and FTS stores.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::Result;

/// Open (or create) the `SQLite` database and run embedded migrations.
///
/// Pass `":memory:"` for an ephemeral database (tests, dry runs).
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrations fail.
pub async fn open_pool(path: &str) -> Result<SqlitePool> {
    let in_memory = path == ":memory:";
    let url = if in_memory {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite:{path}?mode=rwc")
    };

    let opts = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

    // Each connection to ":memory:" opens its own database, so the pool
    // must stay at a single connection there.
    let pool = SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 5 })
        .connect_with(opts)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| crate::error::IndexError::Other(format!("migration failed: {e}")))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_pool_migrates() {
        let pool = open_pool(":memory:").await.unwrap();
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type IN ('table') AND name IN ('file_index_state', 'knowledge_fts')",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(tables.len(), 2);
    }
}
