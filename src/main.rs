mod config;

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;

use config::Config;
use lore_gateway::{AppState, GatewayServer, SessionStore};
use lore_index::{
    FtsStore, KnowledgeIndexer, KnowledgeVectorStore, SplitterConfig, SplitterFactory,
    StateStore, db::open_pool,
};
use lore_llm::AnyEmbedder;
use lore_llm::openai::OpenAiEmbedder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load(Path::new("config/default.toml"))?;

    let api_key = std::env::var("LORE_EMBED_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!("LORE_EMBED_API_KEY not set, embedding requests will be unauthenticated");
    }
    let dimension = usize::try_from(config.index.embedding_dimension)?;
    let embedder = Arc::new(AnyEmbedder::OpenAi(OpenAiEmbedder::new(
        api_key,
        config.embedding.base_url.clone(),
        config.embedding.model.clone(),
        dimension,
    )));

    let pool = open_pool(&config.index.sqlite_path).await?;
    let fts = FtsStore::new(pool.clone());
    let state = StateStore::new(pool);

    // Degrades to a no-op store when Qdrant is unreachable; the gateway
    // still serves and retrieval falls back to lexical-only.
    let vector = Arc::new(
        KnowledgeVectorStore::connect(
            &config.index.qdrant_url,
            &config.index.collection,
            config.index.embedding_dimension,
            embedder,
        )
        .await,
    );

    let splitters = SplitterFactory::new(SplitterConfig {
        chunk_size: config.splitter.chunk_size,
        min_chunk_size: config.splitter.min_chunk_size,
        doc_chunk_size: config.splitter.doc_chunk_size,
        chunk_overlap: config.splitter.chunk_overlap,
    });

    tracing::info!(
        vector_available = vector.available(),
        "knowledge services initialized"
    );
    let indexer = Arc::new(KnowledgeIndexer::new(vector, fts, state, splitters));

    let sessions = Arc::new(SessionStore::new());
    match &config.gateway.auth_token {
        Some(token) => sessions.insert(token, &config.gateway.user_id),
        None => tracing::warn!("no auth token configured, gateway will reject all requests"),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let server = GatewayServer::new(
        &config.gateway.bind,
        config.gateway.port,
        AppState { indexer, sessions },
        shutdown_rx,
    );
    server.serve().await?;

    Ok(())
}
