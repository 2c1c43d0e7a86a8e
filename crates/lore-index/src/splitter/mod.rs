//! Splitter pipeline: file bytes → ordered chunks with semantic metadata.
//!
//! A factory picks the splitter variant by file extension; every variant
//! shares the `split(content, path) → Vec<KnowledgeChunk>` contract and
//! assigns `chunk_index` in emission order.

mod java_ast;
mod recursive;
mod sentence;
mod token;

pub use recursive::split_recursive;
pub use sentence::split_sentences;
pub use token::estimate_tokens;

use crate::chunk::KnowledgeChunk;

/// Splitter selection strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitterKind {
    /// AST symbol splitter for Java sources; falls back to `Token` on
    /// parse failure so no file is dropped.
    JavaAst,
    /// Approximate-token splitter on line boundaries.
    Token,
    /// Hierarchical-separator character splitter with overlap.
    RecursiveCharacter,
    /// Sentence-boundary aggregation.
    Sentence,
}

/// Extension registry consulted by the factory; anything unlisted takes
/// the token splitter.
const REGISTRY: &[(&[&str], SplitterKind)] = &[
    (&["java"], SplitterKind::JavaAst),
    (&["md", "markdown"], SplitterKind::RecursiveCharacter),
    (&["txt", "doc", "docx", "pdf"], SplitterKind::Sentence),
];

/// Splitter tuning knobs.
#[derive(Debug, Clone)]
pub struct SplitterConfig {
    /// Token splitter target size in approximate tokens.
    pub chunk_size: usize,
    /// Token splitter minimum; a smaller trailing piece merges backwards.
    pub min_chunk_size: usize,
    /// Character target for the document splitters.
    pub doc_chunk_size: usize,
    /// Overlap in characters for the recursive splitter.
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            min_chunk_size: 100,
            doc_chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

/// Factory mapping file paths to splitter implementations.
#[derive(Debug, Clone, Default)]
pub struct SplitterFactory {
    config: SplitterConfig,
}

impl SplitterFactory {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    /// Pick the splitter for a path by extension.
    #[must_use]
    pub fn kind_for_path(path: &str) -> SplitterKind {
        let ext = std::path::Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        REGISTRY
            .iter()
            .find(|(exts, _)| exts.contains(&ext.as_str()))
            .map_or(SplitterKind::Token, |(_, kind)| *kind)
    }

    /// Split file content into chunks, applying the fallback chain.
    #[must_use]
    pub fn split(&self, content: &str, file_path: &str) -> Vec<KnowledgeChunk> {
        match Self::kind_for_path(file_path) {
            SplitterKind::JavaAst => java_ast::split(content, file_path).unwrap_or_else(|| {
                tracing::warn!("AST split failed for {file_path}, using token splitter");
                token::split(content, file_path, &self.config)
            }),
            SplitterKind::Token => token::split(content, file_path, &self.config),
            SplitterKind::RecursiveCharacter => recursive::split(content, file_path, &self.config),
            SplitterKind::Sentence => sentence::split(content, file_path, &self.config),
        }
    }
}
