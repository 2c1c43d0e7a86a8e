//! Hybrid retrieval: quota-split sub-queries, union, dedup, truncation.

use std::collections::HashSet;
use std::sync::Arc;

use crate::category::FileCategory;
use crate::chunk::KnowledgeHit;
use crate::error::Result;
use crate::fts::FtsStore;
use crate::vector::KnowledgeVectorStore;

/// Fraction of the final quota served from dense retrieval.
const EMBEDDINGS_SHARE: f64 = 0.50;
/// Fraction served from the lexical store.
const FTS_SHARE: f64 = 0.25;

/// Hybrid searcher over the vector and lexical stores.
pub struct KnowledgeRetriever {
    vector: Arc<KnowledgeVectorStore>,
    fts: FtsStore,
}

impl KnowledgeRetriever {
    #[must_use]
    pub fn new(vector: Arc<KnowledgeVectorStore>, fts: FtsStore) -> Self {
        Self { vector, fts }
    }

    /// Whether the dense store has a real backend; collaborators use this
    /// to skip context injection entirely.
    #[must_use]
    pub fn vector_available(&self) -> bool {
        self.vector.available()
    }

    /// Fused search across both stores. Sub-query failures are logged and
    /// contribute nothing; the result never exceeds `n_final`.
    pub async fn search(&self, user_id: &str, query: &str, n_final: usize) -> Vec<KnowledgeHit> {
        let (embeddings_n, fts_n, recent_n) = quotas(n_final);

        let (vector_result, fts_result) = tokio::join!(
            self.vector.search(user_id, query, embeddings_n, None),
            self.fts.full_text_search(user_id, query, fts_n),
        );

        let mut merged = Vec::new();

        match vector_result {
            Ok(hits) => {
                tracing::debug!(user_id, count = hits.len(), "vector sub-query");
                merged.extend(hits);
            }
            Err(e) => tracing::warn!("vector search failed: {e:#}"),
        }

        match fts_result {
            Ok(hits) => {
                tracing::debug!(user_id, count = hits.len(), "fts sub-query");
                merged.extend(hits);
            }
            Err(e) => tracing::warn!("fts search failed: {e:#}"),
        }

        merged.extend(self.recently_indexed(user_id, recent_n));

        fuse(merged, n_final)
    }

    /// The reserved quarter of the quota: a freshness-based source that is
    /// wired into the fusion but serves nothing yet.
    #[allow(clippy::unused_self)]
    fn recently_indexed(&self, _user_id: &str, _limit: usize) -> Vec<KnowledgeHit> {
        Vec::new()
    }

    /// Category-filtered search goes straight to the vector store; the
    /// lexical store is not consulted and `top_k` is honored verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or the vector search fails.
    pub async fn search_by_category(
        &self,
        user_id: &str,
        query: &str,
        category: FileCategory,
        top_k: usize,
    ) -> Result<Vec<KnowledgeHit>> {
        self.vector
            .search(user_id, query, top_k, Some(category))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if embedding or the vector search fails.
    pub async fn search_code(
        &self,
        user_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<KnowledgeHit>> {
        self.search_by_category(user_id, query, FileCategory::Code, top_k)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if embedding or the vector search fails.
    pub async fn search_documents(
        &self,
        user_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<KnowledgeHit>> {
        self.search_by_category(user_id, query, FileCategory::Document, top_k)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if embedding or the vector search fails.
    pub async fn search_config(
        &self,
        user_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<KnowledgeHit>> {
        self.search_by_category(user_id, query, FileCategory::Config, top_k)
            .await
    }
}

/// Quota split for the fused search. Both active shares get at least one
/// slot; the remainder stays reserved for the recently-indexed source.
fn quotas(n_final: usize) -> (usize, usize, usize) {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let embeddings_n = ((n_final as f64 * EMBEDDINGS_SHARE) as usize).max(1);
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let fts_n = ((n_final as f64 * FTS_SHARE) as usize).max(1);
    let recent_n = n_final.saturating_sub(embeddings_n + fts_n);
    (embeddings_n, fts_n, recent_n)
}

/// De-duplicate by `(file_path, start_line, end_line)`, keeping the first
/// occurrence (vector hits precede lexical ones), then truncate.
fn fuse(hits: Vec<KnowledgeHit>, n_final: usize) -> Vec<KnowledgeHit> {
    let mut seen: HashSet<(String, u32, u32)> = HashSet::with_capacity(hits.len());
    let mut out = Vec::new();

    for hit in hits {
        let key = (hit.file_path.clone(), hit.start_line, hit.end_line);
        if seen.insert(key) {
            out.push(hit);
        }
        if out.len() == n_final {
            break;
        }
    }
    out
}

/// Render hits as a prompt-ready context block.
#[must_use]
pub fn format_as_context(hits: &[KnowledgeHit]) -> String {
    hits.iter()
        .map(|hit| {
            let path = if hit.file_path.is_empty() {
                "unknown"
            } else {
                hit.file_path.as_str()
            };
            format!("文件: {path}\n内容:\n{}", hit.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::HitSource;

    fn hit(path: &str, range: (u32, u32), source: HitSource) -> KnowledgeHit {
        KnowledgeHit {
            id: format!("{path}-{}-{}", range.0, range.1),
            content: format!("content of {path}"),
            file_path: path.to_string(),
            start_line: range.0,
            end_line: range.1,
            score: 0.5,
            source,
        }
    }

    #[test]
    fn quotas_split_half_and_quarter() {
        assert_eq!(quotas(25), (12, 6, 7));
        assert_eq!(quotas(4), (2, 1, 1));
        // Both active sources keep at least one slot.
        assert_eq!(quotas(1), (1, 1, 0));
        assert_eq!(quotas(0), (1, 1, 0));
    }

    #[test]
    fn fuse_dedups_by_path_and_range_keeping_vector() {
        // 2 vector + 2 fts hits with one overlap: exactly 3 survive and the
        // duplicate retained is the vector-originated one.
        let merged = vec![
            hit("/a.java", (1, 10), HitSource::Vector),
            hit("/b.java", (5, 20), HitSource::Vector),
            hit("/a.java", (1, 10), HitSource::Fts),
            hit("/c.md", (1, 4), HitSource::Fts),
        ];
        let fused = fuse(merged, 4);
        assert_eq!(fused.len(), 3);
        let a = fused.iter().find(|h| h.file_path == "/a.java").unwrap();
        assert_eq!(a.source, HitSource::Vector);
    }

    #[test]
    fn fuse_same_path_different_range_kept() {
        let merged = vec![
            hit("/a.java", (1, 10), HitSource::Vector),
            hit("/a.java", (11, 20), HitSource::Fts),
        ];
        assert_eq!(fuse(merged, 10).len(), 2);
    }

    #[test]
    fn fuse_truncates_to_n_final() {
        let merged = (0..10)
            .map(|i| hit(&format!("/f{i}.rs"), (1, 2), HitSource::Vector))
            .collect();
        assert_eq!(fuse(merged, 3).len(), 3);
    }

    #[test]
    fn format_renders_path_and_content() {
        let hits = vec![
            hit("/ws/Main.java", (1, 3), HitSource::Vector),
            hit("/ws/README.md", (1, 9), HitSource::Fts),
        ];
        let text = format_as_context(&hits);
        assert!(text.starts_with("文件: /ws/Main.java\n内容:\ncontent of /ws/Main.java"));
        assert!(text.contains("\n\n---\n\n"));
        assert!(text.contains("文件: /ws/README.md"));
    }

    #[test]
    fn format_missing_path_renders_unknown() {
        let mut h = hit("", (1, 1), HitSource::Fts);
        h.content = "body".into();
        assert_eq!(format_as_context(&[h]), "文件: unknown\n内容:\nbody");
    }

    #[test]
    fn format_empty_is_empty() {
        assert_eq!(format_as_context(&[]), "");
    }
}
