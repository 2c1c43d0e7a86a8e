//! Content projections for the two stores.
//!
//! Embedding raw code alone retrieves poorly for natural-language queries,
//! especially across languages (Chinese query vs English identifiers).
//! The vector store therefore receives the chunk prefixed with a Chinese
//! descriptor header; the FTS store receives basename and symbol terms ahead
//! of the body so they gain term-frequency weight.

use std::fmt::Write;

use crate::chunk::KnowledgeChunk;

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Text handed to the embedder and stored as vector payload content.
/// The header is part of the stored content and is not stripped at retrieval.
#[must_use]
pub fn embedding_content(chunk: &KnowledgeChunk) -> String {
    let mut prefix = String::new();
    let _ = write!(prefix, "文件: {}", basename(&chunk.file_path));

    if let Some(symbol) = &chunk.symbol {
        let _ = write!(prefix, " | 类型: {}", symbol.kind.descriptor());
        let _ = write!(prefix, " | 符号: {}", symbol.name);
        if let Some(parent) = &symbol.parent {
            let _ = write!(prefix, " | 所属: {parent}");
        }
    }

    format!("{prefix}\n{}", chunk.content)
}

/// Text stored in the FTS index: basename first, then symbol terms, then body.
#[must_use]
pub fn fts_content(chunk: &KnowledgeChunk) -> String {
    let mut out = String::new();
    out.push_str(basename(&chunk.file_path));
    out.push('\n');

    if let Some(symbol) = &chunk.symbol {
        out.push_str(&symbol.name);
        out.push(' ');
        out.push_str(symbol.kind.as_str());
        if let Some(parent) = &symbol.parent {
            out.push(' ');
            out.push_str(parent);
        }
        out.push('\n');
    }

    out.push_str(&chunk.content);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::FileCategory;
    use crate::chunk::{Symbol, SymbolKind};

    fn class_chunk() -> KnowledgeChunk {
        KnowledgeChunk::new(
            "public class Foo { }".into(),
            "/ws/src/com/acme/Foo.java",
            FileCategory::Code,
            "Java",
            (1, 10),
            Some(Symbol {
                name: "Foo".into(),
                kind: SymbolKind::Class,
                parent: Some("com.acme".into()),
            }),
            0,
        )
    }

    #[test]
    fn embedding_header_has_descriptors() {
        let text = embedding_content(&class_chunk());
        assert!(text.starts_with("文件: Foo.java | 类型: 类 | 符号: Foo | 所属: com.acme\n"));
        assert!(text.ends_with("public class Foo { }"));
    }

    #[test]
    fn embedding_header_without_symbol() {
        let mut chunk = class_chunk();
        chunk.symbol = None;
        let text = embedding_content(&chunk);
        assert!(text.starts_with("文件: Foo.java\n"));
        assert!(!text.contains("类型"));
    }

    #[test]
    fn fts_content_leads_with_basename() {
        let text = fts_content(&class_chunk());
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Foo.java"));
        assert_eq!(lines.next(), Some("Foo CLASS com.acme"));
        assert_eq!(lines.next(), Some("public class Foo { }"));
    }

    #[test]
    fn fts_content_without_symbol_skips_symbol_line() {
        let mut chunk = class_chunk();
        chunk.symbol = None;
        let text = fts_content(&chunk);
        assert_eq!(text, "Foo.java\npublic class Foo { }");
    }

    #[test]
    fn basename_handles_windows_separators() {
        assert_eq!(basename(r"C:\ws\Foo.java"), "Foo.java");
        assert_eq!(basename("plain.txt"), "plain.txt");
    }
}
