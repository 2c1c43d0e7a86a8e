//! Per-user codebase knowledge index.
//!
//! Scans a workspace, splits files into symbol-granular chunks, mirrors
//! them into a Qdrant collection and a `SQLite` FTS5 table, and serves
//! hybrid (dense + lexical) retrieval for prompt context injection.

pub mod category;
pub mod chunk;
pub mod db;
pub mod enrich;
pub mod error;
pub mod fts;
pub mod indexer;
pub mod retriever;
pub mod scanner;
pub mod splitter;
pub mod state;
pub mod vector;

pub use category::FileCategory;
pub use chunk::{HitSource, KnowledgeChunk, KnowledgeHit, Symbol, SymbolKind};
pub use error::{IndexError, Result};
pub use fts::FtsStore;
pub use indexer::{KnowledgeIndexer, RefreshReport};
pub use retriever::{KnowledgeRetriever, format_as_context};
pub use splitter::{SplitterConfig, SplitterFactory};
pub use state::StateStore;
pub use vector::KnowledgeVectorStore;
