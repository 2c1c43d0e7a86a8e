//! Vector store adaptor: Qdrant-backed dense retrieval with tenant
//! isolation, an in-memory variant for tests and qdrant-less runs, and a
//! no-op variant installed when the backend is unreachable at startup so
//! the rest of the system keeps serving (retrieval degrades to lexical).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, DeletePointsBuilder,
    Distance, FieldType, Filter, PointId, PointStruct, PointsIdsList, ScoredPoint,
    ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
    point_id::PointIdOptions,
};

use lore_llm::{AnyEmbedder, EmbeddingProvider};

use crate::category::FileCategory;
use crate::chunk::{HitSource, KnowledgeChunk, KnowledgeHit};
use crate::enrich::embedding_content;
use crate::error::Result;

/// Scan cap for the per-file filtered delete; fine while files stay well
/// below this many chunks.
const FILE_DELETE_SCAN_LIMIT: u32 = 1_000;
/// Scan cap for the per-user filtered delete.
const USER_DELETE_SCAN_LIMIT: u32 = 10_000;

/// Tenant-scoped dense embedding store, selected at construction.
pub enum KnowledgeVectorStore {
    Qdrant(QdrantKnowledgeStore),
    Memory(MemoryKnowledgeStore),
    Noop,
}

impl std::fmt::Debug for KnowledgeVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match self {
            Self::Qdrant(_) => "Qdrant",
            Self::Memory(_) => "Memory",
            Self::Noop => "Noop",
        };
        f.debug_tuple("KnowledgeVectorStore").field(&variant).finish()
    }
}

impl KnowledgeVectorStore {
    /// Connect to Qdrant and initialize the collection schema. When the
    /// backend is unreachable the `Noop` variant is installed instead and
    /// the application keeps starting.
    pub async fn connect(
        url: &str,
        collection: &str,
        dimension: u64,
        embedder: Arc<AnyEmbedder>,
    ) -> Self {
        match QdrantKnowledgeStore::connect(url, collection, dimension, embedder).await {
            Ok(store) => {
                tracing::info!(collection, dimension, "vector store connected");
                Self::Qdrant(store)
            }
            Err(e) => {
                tracing::warn!("vector store unavailable, knowledge search degrades to lexical: {e:#}");
                Self::Noop
            }
        }
    }

    /// In-memory variant (tests, qdrant-less development).
    #[must_use]
    pub fn memory(embedder: Arc<AnyEmbedder>) -> Self {
        Self::Memory(MemoryKnowledgeStore::new(embedder))
    }

    /// Whether a real backend is behind this handle. Consulted by upstream
    /// collaborators to skip context injection.
    #[must_use]
    pub fn available(&self) -> bool {
        !matches!(self, Self::Noop)
    }

    /// Embed and persist a batch of chunks for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or the upsert fails.
    pub async fn add(&self, user_id: &str, chunks: &[KnowledgeChunk]) -> Result<()> {
        match self {
            Self::Qdrant(store) => store.add(user_id, chunks).await,
            Self::Memory(store) => store.add(user_id, chunks).await,
            Self::Noop => Ok(()),
        }
    }

    /// Similarity search filtered server-side by `user_id` and optionally by
    /// category. No similarity threshold is applied here; thresholds are the
    /// caller's policy.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or the search fails.
    pub async fn search(
        &self,
        user_id: &str,
        query: &str,
        top_k: usize,
        category: Option<FileCategory>,
    ) -> Result<Vec<KnowledgeHit>> {
        match self {
            Self::Qdrant(store) => store.search(user_id, query, top_k, category).await,
            Self::Memory(store) => store.search(user_id, query, top_k, category).await,
            Self::Noop => Ok(Vec::new()),
        }
    }

    /// Delete points by primary key.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete(&self, ids: Vec<String>) -> Result<()> {
        match self {
            Self::Qdrant(store) => store.delete(ids).await,
            Self::Memory(store) => {
                store.delete(&ids);
                Ok(())
            }
            Self::Noop => Ok(()),
        }
    }

    /// Delete every chunk of one file via a broad filtered scan followed by
    /// a batch delete. Returns the number of removed points.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan or delete fails.
    pub async fn delete_by_file_path(&self, user_id: &str, file_path: &str) -> Result<usize> {
        match self {
            Self::Qdrant(store) => {
                store
                    .delete_by_filter(
                        tenant_filter(user_id, Some(file_path), None),
                        FILE_DELETE_SCAN_LIMIT,
                    )
                    .await
            }
            Self::Memory(store) => Ok(store.delete_where(|p| {
                p.user_id == user_id && p.file_path == file_path
            })),
            Self::Noop => Ok(0),
        }
    }

    /// Delete every chunk belonging to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan or delete fails.
    pub async fn delete_by_user(&self, user_id: &str) -> Result<usize> {
        match self {
            Self::Qdrant(store) => {
                store
                    .delete_by_filter(tenant_filter(user_id, None, None), USER_DELETE_SCAN_LIMIT)
                    .await
            }
            Self::Memory(store) => Ok(store.delete_where(|p| p.user_id == user_id)),
            Self::Noop => Ok(0),
        }
    }
}

fn tenant_filter(
    user_id: &str,
    file_path: Option<&str>,
    category: Option<FileCategory>,
) -> Filter {
    let mut conditions = vec![Condition::matches("user_id", user_id.to_string())];
    if let Some(path) = file_path {
        conditions.push(Condition::matches("file_path", path.to_string()));
    }
    if let Some(cat) = category {
        conditions.push(Condition::matches("file_type", cat.as_str().to_string()));
    }
    Filter::must(conditions)
}

// ---------------------------------------------------------------------------
// Qdrant variant
// ---------------------------------------------------------------------------

pub struct QdrantKnowledgeStore {
    client: Qdrant,
    collection: String,
    embedder: Arc<AnyEmbedder>,
}

impl QdrantKnowledgeStore {
    async fn connect(
        url: &str,
        collection: &str,
        dimension: u64,
        embedder: Arc<AnyEmbedder>,
    ) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Box::new)?;

        // Probe reachability before committing to this variant.
        let exists = client.collection_exists(collection).await.map_err(Box::new)?;
        if !exists {
            client
                .create_collection(
                    CreateCollectionBuilder::new(collection)
                        .vectors_config(VectorParamsBuilder::new(dimension, Distance::Cosine)),
                )
                .await
                .map_err(Box::new)?;

            for field in ["user_id", "file_path", "file_type"] {
                client
                    .create_field_index(CreateFieldIndexCollectionBuilder::new(
                        collection,
                        field,
                        FieldType::Keyword,
                    ))
                    .await
                    .map_err(Box::new)?;
            }
        }

        Ok(Self {
            client,
            collection: collection.to_string(),
            embedder,
        })
    }

    async fn add(&self, user_id: &str, chunks: &[KnowledgeChunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut points = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let enriched = embedding_content(chunk);
            let vector = self.embedder.embed(&enriched).await?;

            let mut payload = serde_json::json!({
                "user_id": user_id,
                "file_path": chunk.file_path,
                "file_type": chunk.category.as_str(),
                "language": chunk.language,
                "start_line": chunk.start_line,
                "end_line": chunk.end_line,
                "chunk_index": chunk.chunk_index,
                "content_hash": chunk.content_hash,
                "created_at": chunk.created_at,
                "content": enriched,
            });
            if let Some(symbol) = &chunk.symbol {
                payload["symbol_name"] = serde_json::json!(symbol.name);
                payload["symbol_kind"] = serde_json::json!(symbol.kind.as_str());
                if let Some(parent) = &symbol.parent {
                    payload["symbol_parent"] = serde_json::json!(parent);
                }
            }
            let payload: HashMap<String, qdrant_client::qdrant::Value> =
                serde_json::from_value(payload)?;

            points.push(PointStruct::new(chunk.id.clone(), vector, payload));
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points))
            .await
            .map_err(Box::new)?;
        Ok(())
    }

    async fn search(
        &self,
        user_id: &str,
        query: &str,
        top_k: usize,
        category: Option<FileCategory>,
    ) -> Result<Vec<KnowledgeHit>> {
        let vector = self.embedder.embed(query).await?;

        let builder = SearchPointsBuilder::new(&self.collection, vector, top_k as u64)
            .with_payload(true)
            .filter(tenant_filter(user_id, None, category));

        let results = self.client.search_points(builder).await.map_err(Box::new)?;

        Ok(results
            .result
            .iter()
            .filter_map(hit_from_scored_point)
            .collect())
    }

    async fn delete(&self, ids: Vec<String>) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let ids: Vec<PointId> = ids.into_iter().map(Into::into).collect();
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection).points(PointsIdsList { ids }),
            )
            .await
            .map_err(Box::new)?;
        Ok(())
    }

    /// Filtered-delete emulation: scan matching point ids (capped), then
    /// batch delete. Correct while match counts stay below the cap.
    async fn delete_by_filter(&self, filter: Filter, limit: u32) -> Result<usize> {
        let response = self
            .client
            .scroll(
                ScrollPointsBuilder::new(&self.collection)
                    .filter(filter)
                    .limit(limit)
                    .with_payload(false)
                    .with_vectors(false),
            )
            .await
            .map_err(Box::new)?;

        let ids: Vec<PointId> = response
            .result
            .into_iter()
            .filter_map(|p| p.id)
            .collect();
        let count = ids.len();
        if count == 0 {
            return Ok(0);
        }

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection).points(PointsIdsList { ids }),
            )
            .await
            .map_err(Box::new)?;
        Ok(count)
    }
}

fn hit_from_scored_point(point: &ScoredPoint) -> Option<KnowledgeHit> {
    let p = &point.payload;
    let get_str = |key: &str| {
        p.get(key)
            .and_then(qdrant_client::qdrant::Value::as_str)
            .cloned()
    };
    let get_u32 = |key: &str| {
        p.get(key)
            .and_then(qdrant_client::qdrant::Value::as_integer)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0)
    };

    Some(KnowledgeHit {
        id: point.id.as_ref().map(point_id_string)?,
        content: get_str("content")?,
        file_path: get_str("file_path")?,
        start_line: get_u32("start_line"),
        end_line: get_u32("end_line"),
        score: point.score,
        source: HitSource::Vector,
    })
}

fn point_id_string(id: &PointId) -> String {
    match &id.point_id_options {
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// In-memory variant
// ---------------------------------------------------------------------------

struct StoredPoint {
    user_id: String,
    file_path: String,
    file_type: FileCategory,
    content: String,
    start_line: u32,
    end_line: u32,
    vector: Vec<f32>,
}

pub struct MemoryKnowledgeStore {
    points: RwLock<HashMap<String, StoredPoint>>,
    embedder: Arc<AnyEmbedder>,
}

impl MemoryKnowledgeStore {
    #[must_use]
    fn new(embedder: Arc<AnyEmbedder>) -> Self {
        Self {
            points: RwLock::new(HashMap::new()),
            embedder,
        }
    }

    async fn add(&self, user_id: &str, chunks: &[KnowledgeChunk]) -> Result<()> {
        let mut prepared = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let enriched = embedding_content(chunk);
            let vector = self.embedder.embed(&enriched).await?;
            prepared.push((
                chunk.id.clone(),
                StoredPoint {
                    user_id: user_id.to_string(),
                    file_path: chunk.file_path.clone(),
                    file_type: chunk.category,
                    content: enriched,
                    start_line: chunk.start_line,
                    end_line: chunk.end_line,
                    vector,
                },
            ));
        }

        let mut points = self
            .points
            .write()
            .map_err(|e| crate::error::IndexError::Other(e.to_string()))?;
        for (id, point) in prepared {
            points.insert(id, point);
        }
        Ok(())
    }

    async fn search(
        &self,
        user_id: &str,
        query: &str,
        top_k: usize,
        category: Option<FileCategory>,
    ) -> Result<Vec<KnowledgeHit>> {
        let vector = self.embedder.embed(query).await?;

        let points = self
            .points
            .read()
            .map_err(|e| crate::error::IndexError::Other(e.to_string()))?;

        let mut hits: Vec<KnowledgeHit> = points
            .iter()
            .filter(|(_, p)| {
                p.user_id == user_id && category.is_none_or(|c| p.file_type == c)
            })
            .map(|(id, p)| KnowledgeHit {
                id: id.clone(),
                content: p.content.clone(),
                file_path: p.file_path.clone(),
                start_line: p.start_line,
                end_line: p.end_line,
                score: cosine_similarity(&vector, &p.vector),
                source: HitSource::Vector,
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    fn delete(&self, ids: &[String]) {
        if let Ok(mut points) = self.points.write() {
            for id in ids {
                points.remove(id);
            }
        }
    }

    fn delete_where(&self, predicate: impl Fn(&StoredPoint) -> bool) -> usize {
        let Ok(mut points) = self.points.write() else {
            return 0;
        };
        let before = points.len();
        points.retain(|_, p| !predicate(p));
        before - points.len()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
