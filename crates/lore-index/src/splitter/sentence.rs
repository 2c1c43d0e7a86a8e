//! Sentence-boundary splitter for plain-text documents.

use super::SplitterConfig;
use crate::category::FileCategory;
use crate::chunk::KnowledgeChunk;

/// Split text into sentences on paragraph breaks, Latin terminators
/// followed by whitespace, and CJK terminators.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        current.push(chars[i]);

        let boundary = match chars[i] {
            '。' | '！' | '？' => true,
            '.' | '?' | '!' => chars.get(i + 1).is_some_and(|c| c.is_whitespace()),
            '\n' => chars.get(i + 1) == Some(&'\n'),
            _ => false,
        };

        if boundary && !current.trim().is_empty() {
            sentences.push(std::mem::take(&mut current));
        }

        i += 1;
    }

    if !current.trim().is_empty() {
        sentences.push(current);
    }

    sentences
}

/// Aggregate adjacent sentences until the target chunk size is reached,
/// never splitting mid-sentence. A single oversized sentence stays whole.
#[must_use]
pub fn split(content: &str, file_path: &str, config: &SplitterConfig) -> Vec<KnowledgeChunk> {
    let sentences = split_sentences(content);

    let mut pieces = Vec::new();
    let mut current = String::new();
    for sentence in &sentences {
        if !current.is_empty()
            && current.chars().count() + sentence.chars().count() > config.doc_chunk_size
        {
            pieces.push(std::mem::take(&mut current));
        }
        current.push_str(sentence);
    }
    if !current.trim().is_empty() {
        pieces.push(current);
    }

    let chunks: Vec<KnowledgeChunk> = pieces
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .enumerate()
        .map(|(i, piece)| make_chunk(piece, file_path, u32::try_from(i).unwrap_or(u32::MAX)))
        .collect();

    if chunks.is_empty() && !content.trim().is_empty() {
        return vec![make_chunk(content.to_string(), file_path, 0)];
    }
    chunks
}

fn make_chunk(content: String, file_path: &str, index: u32) -> KnowledgeChunk {
    let language = detect_text_language(&content);
    KnowledgeChunk::new(
        content,
        file_path,
        FileCategory::Document,
        language,
        (1, 1),
        None,
        index,
    )
}

/// Coarse text language detection: `"zh"` when CJK ideographs are present.
fn detect_text_language(content: &str) -> &'static str {
    if content.is_empty() {
        return "unknown";
    }
    let has_cjk = content
        .chars()
        .any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c));
    if has_cjk { "zh" } else { "en" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SplitterConfig {
        SplitterConfig::default()
    }

    #[test]
    fn latin_sentences_split_on_terminator_space() {
        let sentences = split_sentences("First one. Second one? Third!");
        assert_eq!(sentences.len(), 3);
        assert_eq!(sentences[0], "First one.");
    }

    #[test]
    fn cjk_sentences_split_without_space() {
        let sentences = split_sentences("第一句。第二句！第三句？尾部");
        assert_eq!(sentences.len(), 4);
        assert_eq!(sentences[0], "第一句。");
        assert_eq!(sentences[3], "尾部");
    }

    #[test]
    fn decimal_points_do_not_split() {
        let sentences = split_sentences("Version 1.2 shipped today. Done.");
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].contains("1.2"));
    }

    #[test]
    fn aggregates_up_to_chunk_size() {
        let text = "A sentence of reasonable length sits here. ".repeat(40);
        let chunks = split(&text, "notes.txt", &config());
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            // Never bigger than target plus one sentence.
            assert!(chunk.content.chars().count() <= 500 + 50);
        }
    }

    #[test]
    fn never_splits_mid_sentence() {
        let long_sentence = format!("{} end.", "word ".repeat(200));
        let chunks = split(&long_sentence, "notes.txt", &config());
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].content.contains("end."));
    }

    #[test]
    fn detects_chinese_content() {
        let chunks = split("这是中文内容。", "zh.txt", &config());
        assert_eq!(chunks[0].language, "zh");
        let chunks = split("English only.", "en.txt", &config());
        assert_eq!(chunks[0].language, "en");
    }

    #[test]
    fn empty_content_no_chunks() {
        assert!(split("", "e.txt", &config()).is_empty());
        assert!(split("  \n \n ", "e.txt", &config()).is_empty());
    }
}
