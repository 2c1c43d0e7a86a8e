//! AST symbol splitter for Java sources via tree-sitter.
//!
//! Emits, in file order, one chunk per top-level class or interface carrying
//! the type's signature (method bodies erased) and one chunk per method
//! carrying its full text. Returns `None` when the source does not parse so
//! the caller can fall back to the token splitter.

use tree_sitter::{Node, Parser};

use crate::category::FileCategory;
use crate::chunk::{KnowledgeChunk, Symbol, SymbolKind};

pub(super) fn split(content: &str, file_path: &str) -> Option<Vec<KnowledgeChunk>> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .ok()?;

    let tree = parser.parse(content, None)?;
    let root = tree.root_node();
    if root.has_error() {
        return None;
    }

    let package = package_name(&root, content);
    let mut chunks = Vec::new();
    let mut index: u32 = 0;

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        let kind = match child.kind() {
            "class_declaration" => SymbolKind::Class,
            "interface_declaration" => SymbolKind::Interface,
            _ => continue,
        };
        visit_type(
            &child,
            kind,
            content,
            file_path,
            package.as_deref(),
            &mut chunks,
            &mut index,
        );
    }

    if chunks.is_empty() {
        return None;
    }
    Some(chunks)
}

fn visit_type(
    decl: &Node,
    kind: SymbolKind,
    source: &str,
    file_path: &str,
    package: Option<&str>,
    chunks: &mut Vec<KnowledgeChunk>,
    index: &mut u32,
) {
    let Some(name_node) = decl.child_by_field_name("name") else {
        return;
    };
    let type_name = source[name_node.byte_range()].to_string();

    let methods = member_methods(decl);

    chunks.push(make_chunk(
        erase_method_bodies(decl, &methods, source),
        file_path,
        Symbol {
            name: type_name.clone(),
            kind,
            parent: package.map(str::to_string),
        },
        node_lines(decl),
        *index,
    ));
    *index += 1;

    let parent = format!("class {type_name}");
    for method in &methods {
        let Some(name_node) = method.child_by_field_name("name") else {
            continue;
        };
        chunks.push(make_chunk(
            source[method.byte_range()].to_string(),
            file_path,
            Symbol {
                name: source[name_node.byte_range()].to_string(),
                kind: SymbolKind::Method,
                parent: Some(parent.clone()),
            },
            node_lines(method),
            *index,
        ));
        *index += 1;
    }
}

/// Direct method declarations of a type body, excluding nested types.
fn member_methods<'a>(decl: &Node<'a>) -> Vec<Node<'a>> {
    let Some(body) = decl.child_by_field_name("body") else {
        return Vec::new();
    };
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter(|n| n.kind() == "method_declaration")
        .collect()
}

/// The type's text with every member method body replaced by `;`,
/// keeping fields and method signatures intact.
fn erase_method_bodies(decl: &Node, methods: &[Node], source: &str) -> String {
    let start = decl.start_byte();
    let mut bodies: Vec<(usize, usize)> = methods
        .iter()
        .filter_map(|m| m.child_by_field_name("body"))
        .map(|b| (b.start_byte(), b.end_byte()))
        .collect();
    bodies.sort_unstable();

    let mut out = String::new();
    let mut pos = start;
    for (body_start, body_end) in bodies {
        out.push_str(source[pos..body_start].trim_end());
        out.push(';');
        pos = body_end;
    }
    out.push_str(&source[pos..decl.end_byte()]);
    out
}

fn package_name(root: &Node, source: &str) -> Option<String> {
    let mut cursor = root.walk();
    let pkg = root
        .named_children(&mut cursor)
        .find(|n| n.kind() == "package_declaration")?;
    let mut inner = pkg.walk();
    let name = pkg
        .named_children(&mut inner)
        .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))?;
    Some(source[name.byte_range()].to_string())
}

fn node_lines(node: &Node) -> (u32, u32) {
    let start = u32::try_from(node.start_position().row + 1).unwrap_or(1);
    let end = u32::try_from(node.end_position().row + 1).unwrap_or(1);
    (start, end)
}

fn make_chunk(
    content: String,
    file_path: &str,
    symbol: Symbol,
    range: (u32, u32),
    index: u32,
) -> KnowledgeChunk {
    KnowledgeChunk::new(
        content,
        file_path,
        FileCategory::Code,
        "Java",
        range,
        Some(symbol),
        index,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r"package com.acme;

public class Foo {
    private int counter;

    public int bar() {
        return counter;
    }

    public String baz(String input) {
        return input.trim();
    }
}
";

    #[test]
    fn emits_class_and_method_chunks_in_order() {
        let chunks = split(SOURCE, "src/Foo.java").unwrap();
        assert_eq!(chunks.len(), 3);

        let class = &chunks[0];
        assert_eq!(class.symbol.as_ref().unwrap().kind, SymbolKind::Class);
        assert_eq!(class.symbol.as_ref().unwrap().name, "Foo");
        assert_eq!(
            class.symbol.as_ref().unwrap().parent.as_deref(),
            Some("com.acme")
        );

        let kinds: Vec<SymbolKind> = chunks
            .iter()
            .map(|c| c.symbol.as_ref().unwrap().kind)
            .collect();
        assert_eq!(
            kinds,
            vec![SymbolKind::Class, SymbolKind::Method, SymbolKind::Method]
        );
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index as usize, i);
        }
    }

    #[test]
    fn class_chunk_erases_method_bodies() {
        let chunks = split(SOURCE, "src/Foo.java").unwrap();
        let class = &chunks[0];
        assert!(class.content.contains("private int counter"));
        assert!(class.content.contains("public int bar()"));
        assert!(!class.content.contains("return counter"));
        assert!(!class.content.contains("input.trim()"));
    }

    #[test]
    fn method_chunks_carry_full_text_and_parent() {
        let chunks = split(SOURCE, "src/Foo.java").unwrap();
        let bar = &chunks[1];
        assert_eq!(bar.symbol.as_ref().unwrap().name, "bar");
        assert_eq!(
            bar.symbol.as_ref().unwrap().parent.as_deref(),
            Some("class Foo")
        );
        assert!(bar.content.contains("return counter;"));
    }

    #[test]
    fn line_ranges_come_from_ast() {
        let chunks = split(SOURCE, "src/Foo.java").unwrap();
        let class = &chunks[0];
        assert_eq!(class.start_line, 3);
        assert!(class.end_line > class.start_line);

        let bar = &chunks[1];
        assert_eq!(bar.start_line, 6);
        assert_eq!(bar.end_line, 8);
    }

    #[test]
    fn interface_methods_without_bodies() {
        let source = r"package com.acme;

public interface Greeter {
    String greet(String name);
}
";
        let chunks = split(source, "Greeter.java").unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[0].symbol.as_ref().unwrap().kind,
            SymbolKind::Interface
        );
        assert!(chunks[0].content.contains("String greet(String name);"));
    }

    #[test]
    fn no_package_yields_none_parent() {
        let source = "public class Bare { void x() {} }\n";
        let chunks = split(source, "Bare.java").unwrap();
        assert!(chunks[0].symbol.as_ref().unwrap().parent.is_none());
    }

    #[test]
    fn broken_source_returns_none() {
        assert!(split("public class {{{", "Broken.java").is_none());
    }

    #[test]
    fn source_without_types_returns_none() {
        assert!(split("// just a comment\n", "Empty.java").is_none());
    }

    #[test]
    fn deterministic_boundaries() {
        let a = split(SOURCE, "Foo.java").unwrap();
        let b = split(SOURCE, "Foo.java").unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.content, y.content);
            assert_eq!((x.start_line, x.end_line), (y.start_line, y.end_line));
        }
    }
}
