//! Approximate-token splitter: the universal fallback.

use super::SplitterConfig;
use crate::category::{classify, detect_language};
use crate::chunk::KnowledgeChunk;

/// Estimate token count using the chars/4 heuristic.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Split on approximate token count, respecting line boundaries and
/// preserving separators. Line ranges stay at `(1, 1)` since pieces are
/// not tracked against the source.
#[must_use]
pub fn split(content: &str, file_path: &str, config: &SplitterConfig) -> Vec<KnowledgeChunk> {
    let category = classify(file_path);
    let language = detect_language(file_path);

    let mut pieces: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in content.split_inclusive('\n') {
        if !current.is_empty()
            && estimate_tokens(&current) + estimate_tokens(line) > config.chunk_size
        {
            pieces.push(std::mem::take(&mut current));
        }
        current.push_str(line);
    }
    if !current.trim().is_empty() {
        // A trailing fragment below the minimum merges backwards.
        if estimate_tokens(&current) < config.min_chunk_size
            && let Some(last) = pieces.last_mut()
        {
            last.push_str(&current);
        } else {
            pieces.push(current);
        }
    }

    pieces
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .enumerate()
        .map(|(i, piece)| {
            KnowledgeChunk::new(
                piece,
                file_path,
                category,
                language,
                (1, 1),
                None,
                u32::try_from(i).unwrap_or(u32::MAX),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::FileCategory;

    fn config() -> SplitterConfig {
        SplitterConfig::default()
    }

    #[test]
    fn small_content_single_chunk() {
        let chunks = split("short content\n", "notes.cfg", &config());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "short content\n");
        assert_eq!((chunks[0].start_line, chunks[0].end_line), (1, 1));
    }

    #[test]
    fn empty_content_no_chunks() {
        assert!(split("", "a.txt", &config()).is_empty());
        assert!(split("   \n  \n", "a.txt", &config()).is_empty());
    }

    #[test]
    fn long_content_splits_on_lines() {
        let content = "a line of filler text that repeats\n".repeat(1000);
        let chunks = split(&content, "big.log", &config());
        assert!(chunks.len() > 1);
        // Separators preserved: every chunk still ends with the newline.
        for chunk in &chunks {
            assert!(chunk.content.ends_with('\n'));
        }
        let total: usize = chunks.iter().map(|c| c.content.len()).sum();
        assert_eq!(total, content.len());
    }

    #[test]
    fn trailing_fragment_merges_into_previous() {
        let config = SplitterConfig {
            chunk_size: 10,
            min_chunk_size: 5,
            ..SplitterConfig::default()
        };
        let content = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\nbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb\ncc\n";
        let chunks = split(content, "x.txt", &config);
        assert!(chunks.len() >= 2);
        assert!(chunks.last().unwrap().content.contains("cc"));
        // The tiny "cc" piece must not stand alone.
        assert!(chunks.last().unwrap().content.len() > 3);
    }

    #[test]
    fn classifies_by_path() {
        let chunks = split("select 1;\n", "query.sql", &config());
        assert_eq!(chunks[0].category, FileCategory::Code);
        assert_eq!(chunks[0].language, "SQL");
        assert!(chunks[0].symbol.is_none());
    }

    #[test]
    fn estimate_tokens_chars_over_four() {
        assert_eq!(estimate_tokens("abcdefgh"), 2);
        assert_eq!(estimate_tokens(""), 0);
    }

    mod proptest_token {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_panics_and_indices_sequential(
                content in "\\PC{0,3000}",
                chunk_size in 1usize..500,
                min_chunk_size in 0usize..100,
            ) {
                let config = SplitterConfig {
                    chunk_size,
                    min_chunk_size,
                    ..SplitterConfig::default()
                };
                let chunks = split(&content, "f.txt", &config);
                for (i, chunk) in chunks.iter().enumerate() {
                    prop_assert_eq!(chunk.chunk_index as usize, i);
                    prop_assert!(!chunk.content.trim().is_empty());
                }
            }
        }
    }
}
