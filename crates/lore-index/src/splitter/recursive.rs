//! Recursive-character splitter for markdown and similar prose.

use super::SplitterConfig;
use crate::category::FileCategory;
use crate::chunk::KnowledgeChunk;

/// Separator hierarchy: paragraph break, line break, CJK sentence
/// terminators, comma, space.
const SEPARATORS: &[&str] = &["\n\n", "\n", "。", "！", "？", "；", "，", ",", " "];

/// Split text into pieces no larger than `chunk_size` characters, walking
/// down the separator hierarchy and keeping each separator attached to the
/// piece it terminates.
#[must_use]
pub fn split_recursive(text: &str, chunk_size: usize) -> Vec<String> {
    split_with(text, SEPARATORS, chunk_size)
}

fn split_with(text: &str, separators: &[&str], chunk_size: usize) -> Vec<String> {
    if text.chars().count() <= chunk_size {
        return vec![text.to_string()];
    }

    let Some((sep, rest)) = separators.split_first() else {
        return hard_split(text, chunk_size);
    };

    if !text.contains(sep) {
        return split_with(text, rest, chunk_size);
    }

    let mut out = Vec::new();
    for piece in split_keep(text, sep) {
        if piece.chars().count() <= chunk_size {
            out.push(piece);
        } else {
            out.extend(split_with(&piece, rest, chunk_size));
        }
    }
    out
}

/// Split on `sep`, keeping the separator at the end of each piece.
fn split_keep(text: &str, sep: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(idx) = rest.find(sep) {
        let end = idx + sep.len();
        out.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        out.push(rest.to_string());
    }
    out
}

fn hard_split(text: &str, chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.max(1);
    chars
        .chunks(step)
        .map(|c| c.iter().collect())
        .collect()
}

/// Merge pieces into chunks near `chunk_size`, carrying `overlap` characters
/// of trailing context into each following chunk.
fn merge_pieces(pieces: &[String], chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut window_start = 0;

    for (idx, piece) in pieces.iter().enumerate() {
        if !current.is_empty()
            && current.chars().count() + piece.chars().count() > chunk_size
        {
            chunks.push(current.clone());

            // Rebuild the tail of the previous chunk as overlap.
            current.clear();
            let mut overlap_len = 0;
            let mut overlap_start = idx;
            for i in (window_start..idx).rev() {
                if overlap_len + pieces[i].chars().count() > overlap {
                    break;
                }
                overlap_len += pieces[i].chars().count();
                overlap_start = i;
            }
            for p in &pieces[overlap_start..idx] {
                current.push_str(p);
            }
            window_start = overlap_start;
        }

        current.push_str(piece);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Split a document into overlapping character chunks, dropping
/// whitespace-only output. Falls back to a single whole-file chunk when
/// nothing survives but the content is non-empty.
#[must_use]
pub fn split(content: &str, file_path: &str, config: &SplitterConfig) -> Vec<KnowledgeChunk> {
    let pieces = split_recursive(content, config.doc_chunk_size);
    let merged = merge_pieces(&pieces, config.doc_chunk_size, config.chunk_overlap);

    let chunks: Vec<KnowledgeChunk> = merged
        .into_iter()
        .filter(|c| !c.trim().is_empty())
        .enumerate()
        .map(|(i, piece)| make_chunk(piece, file_path, u32::try_from(i).unwrap_or(u32::MAX)))
        .collect();

    if chunks.is_empty() && !content.trim().is_empty() {
        return vec![make_chunk(content.to_string(), file_path, 0)];
    }
    chunks
}

fn make_chunk(content: String, file_path: &str, index: u32) -> KnowledgeChunk {
    KnowledgeChunk::new(
        content,
        file_path,
        FileCategory::Document,
        "markdown",
        (1, 1),
        None,
        index,
    )
}
