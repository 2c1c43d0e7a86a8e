//! Lexical full-text store over `SQLite` FTS5.

use sqlx::SqlitePool;

use crate::chunk::{HitSource, KnowledgeChunk, KnowledgeHit};
use crate::enrich::fts_content;
use crate::error::Result;

/// Stop words removed from queries before building the match expression.
const STOP_WORDS: &[&str] = &[
    "是", "的", "了", "在", "有", "这", "那", "和", "与", "怎么", "如何", "什么", "哪些",
    "为什么",
];

/// Whitespace and CJK punctuation used to tokenize the raw query.
const TERM_BREAKS: &str = "　,，。？?！!、；;";

/// Tenant-scoped full-text CRUD keyed by chunk id.
#[derive(Debug, Clone)]
pub struct FtsStore {
    pool: SqlitePool,
}

impl FtsStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert chunks for a user; idempotent on chunk id (old rows for the
    /// same id are replaced inside one transaction).
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub async fn batch_insert(&self, user_id: &str, chunks: &[KnowledgeChunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for chunk in chunks {
            sqlx::query("DELETE FROM knowledge_fts WHERE id = ?")
                .bind(&chunk.id)
                .execute(&mut *tx)
                .await?;
            sqlx::query(
                "INSERT INTO knowledge_fts (id, user_id, file_path, content, start_line, end_line) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&chunk.id)
            .bind(user_id)
            .bind(&chunk.file_path)
            .bind(fts_content(chunk))
            .bind(i64::from(chunk.start_line))
            .bind(i64::from(chunk.end_line))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::debug!(user_id, count = chunks.len(), "FTS rows written");
        Ok(())
    }

    /// Keyword search scoped to a user, ordered by descending relevance.
    /// Only rows that actually match (positive relevance) are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails (including malformed match
    /// expressions for exotic input).
    pub async fn full_text_search(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<KnowledgeHit>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let match_expr = build_match_query(query);
        tracing::debug!(user_id, match_expr, limit, "FTS search");

        let rows: Vec<(String, String, String, i64, i64, f64)> = sqlx::query_as(
            "SELECT id, file_path, content, start_line, end_line, -bm25(knowledge_fts) AS score \
             FROM knowledge_fts \
             WHERE knowledge_fts MATCH ? AND user_id = ? \
             ORDER BY score DESC \
             LIMIT ?",
        )
        .bind(&match_expr)
        .bind(user_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, file_path, content, start, end, score)| {
                #[allow(clippy::cast_possible_truncation)]
                let score = score as f32;
                KnowledgeHit {
                    id,
                    content,
                    file_path,
                    start_line: u32::try_from(start).unwrap_or(0),
                    end_line: u32::try_from(end).unwrap_or(0),
                    score,
                    source: HitSource::Fts,
                }
            })
            .collect())
    }

    /// Remove all rows for a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_by_file_path(&self, user_id: &str, file_path: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM knowledge_fts WHERE user_id = ? AND file_path = ?")
            .bind(user_id)
            .bind(file_path)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Remove every row belonging to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_by_user(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM knowledge_fts WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Count rows for a (user, file) pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_for_file(&self, user_id: &str, file_path: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM knowledge_fts WHERE user_id = ? AND file_path = ?",
        )
        .bind(user_id)
        .bind(file_path)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }
}

/// Build the FTS5 match expression from a raw user query.
///
/// Terms are split on whitespace and CJK punctuation, stop words dropped.
/// One surviving term is passed alone; two or more become a conjunction
/// (the equivalent of boolean-mode `+term` prefixes); a fully filtered
/// query falls back to the raw input. Terms are quoted for FTS5 safety.
#[must_use]
pub fn build_match_query(query: &str) -> String {
    let terms: Vec<&str> = query
        .trim()
        .split(|c: char| c.is_whitespace() || TERM_BREAKS.contains(c))
        .map(str::trim)
        .filter(|t| !t.is_empty() && !STOP_WORDS.contains(t))
        .collect();

    if terms.is_empty() {
        return quote(query.trim());
    }
    if terms.len() == 1 {
        return quote(terms[0]);
    }
    terms.iter().map(|t| quote(t)).collect::<Vec<_>>().join(" AND ")
}

fn quote(term: &str) -> String {
    format!("\"{}\"", term.replace('"', "\"\""))
}
