//! File index state: the authoritative record that a file has been indexed.

use sqlx::SqlitePool;

use crate::error::Result;

/// One row per successfully indexed `(user_id, file_path)` pair.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileIndexState {
    pub id: String,
    pub user_id: String,
    pub file_path: String,
    pub content_hash: String,
    pub last_modified_at: i64,
    pub file_size: i64,
}

/// Store for [`FileIndexState`] rows; the deletion sweep's source of truth.
#[derive(Debug, Clone)]
pub struct StateStore {
    pool: SqlitePool,
}

impl StateStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up the state row for a file, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get(&self, user_id: &str, file_path: &str) -> Result<Option<FileIndexState>> {
        let row = sqlx::query_as::<_, FileIndexState>(
            "SELECT id, user_id, file_path, content_hash, last_modified_at, file_size \
             FROM file_index_state WHERE user_id = ? AND file_path = ?",
        )
        .bind(user_id)
        .bind(file_path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Insert a fresh state row.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (including unique violations).
    pub async fn insert(&self, state: &FileIndexState) -> Result<()> {
        sqlx::query(
            "INSERT INTO file_index_state \
             (id, user_id, file_path, content_hash, last_modified_at, file_size) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&state.id)
        .bind(&state.user_id)
        .bind(&state.file_path)
        .bind(&state.content_hash)
        .bind(state.last_modified_at)
        .bind(state.file_size)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Update hash, size and timestamp of an existing row.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update(&self, state: &FileIndexState) -> Result<()> {
        sqlx::query(
            "UPDATE file_index_state \
             SET content_hash = ?, last_modified_at = ?, file_size = ? \
             WHERE id = ?",
        )
        .bind(&state.content_hash)
        .bind(state.last_modified_at)
        .bind(state.file_size)
        .bind(&state.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All state rows for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<FileIndexState>> {
        let rows = sqlx::query_as::<_, FileIndexState>(
            "SELECT id, user_id, file_path, content_hash, last_modified_at, file_size \
             FROM file_index_state WHERE user_id = ? ORDER BY file_path",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Delete a state row by primary key.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM file_index_state WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
