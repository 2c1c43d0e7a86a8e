//! Knowledge chunk model: the smallest retrievable unit.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::category::FileCategory;

/// Kind of the code symbol a chunk represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SymbolKind {
    Class,
    Interface,
    Method,
    Field,
    Enum,
    Annotation,
}

impl SymbolKind {
    /// Identifier stored in payload metadata.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "CLASS",
            Self::Interface => "INTERFACE",
            Self::Method => "METHOD",
            Self::Field => "FIELD",
            Self::Enum => "ENUM",
            Self::Annotation => "ANNOTATION",
        }
    }

    /// Chinese descriptor used in the embedding enrichment header.
    #[must_use]
    pub fn descriptor(self) -> &'static str {
        match self {
            Self::Class => "类",
            Self::Interface => "接口",
            Self::Method => "方法",
            Self::Field => "字段",
            Self::Enum => "枚举",
            Self::Annotation => "注解",
        }
    }
}

/// Code symbol metadata attached to AST-derived chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Enclosing context: `"class Foo"` for methods, the package name for types.
    pub parent: Option<String>,
}

/// One unit of retrievable knowledge produced by a splitter.
///
/// `content_hash` carries the MD5 of the whole originating file (identical
/// across the file's chunks) and is filled in by the orchestrator after
/// splitting, together with `user_id`.
#[derive(Debug, Clone)]
pub struct KnowledgeChunk {
    pub id: String,
    pub user_id: String,
    pub file_path: String,
    pub category: FileCategory,
    pub language: String,
    pub content: String,
    pub symbol: Option<Symbol>,
    /// 1-based inclusive line range; `(1, 1)` when unknown.
    pub start_line: u32,
    pub end_line: u32,
    pub content_hash: String,
    pub chunk_index: u32,
    pub created_at: i64,
}

impl KnowledgeChunk {
    /// Construct a chunk with a fresh id and timestamp.
    #[must_use]
    pub fn new(
        content: String,
        file_path: &str,
        category: FileCategory,
        language: &str,
        range: (u32, u32),
        symbol: Option<Symbol>,
        chunk_index: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: String::new(),
            file_path: file_path.to_string(),
            category,
            language: language.to_string(),
            content,
            symbol,
            start_line: range.0,
            end_line: range.1,
            content_hash: String::new(),
            chunk_index,
            created_at: epoch_millis(),
        }
    }
}

/// Where a retrieval hit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSource {
    Vector,
    Fts,
}

/// A retrieval result as seen by the fuser and formatters.
#[derive(Debug, Clone)]
pub struct KnowledgeHit {
    pub id: String,
    pub content: String,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub score: f32,
    pub source: HitSource,
}

pub(crate) fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_chunk_gets_unique_id_and_timestamp() {
        let a = KnowledgeChunk::new(
            "fn x() {}".into(),
            "src/lib.rs",
            FileCategory::Code,
            "Rust",
            (1, 3),
            None,
            0,
        );
        let b = KnowledgeChunk::new(
            "fn y() {}".into(),
            "src/lib.rs",
            FileCategory::Code,
            "Rust",
            (4, 6),
            None,
            1,
        );
        assert_ne!(a.id, b.id);
        assert!(a.created_at > 0);
        assert!(a.user_id.is_empty());
        assert!(a.content_hash.is_empty());
    }

    #[test]
    fn symbol_kind_identifiers() {
        assert_eq!(SymbolKind::Class.as_str(), "CLASS");
        assert_eq!(SymbolKind::Method.as_str(), "METHOD");
        assert_eq!(SymbolKind::Class.descriptor(), "类");
        assert_eq!(SymbolKind::Interface.descriptor(), "接口");
    }
}
