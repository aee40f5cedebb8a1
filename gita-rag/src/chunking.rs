//! Recursive text chunking for commentary records.
//!
//! [`RecursiveChunker`] splits a commentary into windows of at most
//! `chunk_size` characters, preferring to break at paragraph
//! boundaries, then sentence boundaries, then word boundaries, and
//! only then at raw character positions. Consecutive chunks share a
//! `chunk_overlap`-character overlap taken from the tail of the
//! previous chunk's source text.
//!
//! All limits are measured in *characters*, not bytes: the corpus is
//! Devanagari-heavy and byte slicing would split codepoints.
//! Splitting is a pure function of `(text, chunk_size, chunk_overlap)`.

use crate::corpus::CommentaryRecord;
use crate::document::{Chunk, ChunkMetadata};

/// Boundary units tried in order, largest first. The final fallback is
/// raw character splitting.
const SEPARATORS: [&str; 5] = ["\n\n", ". ", "! ", "? ", " "];

/// Splits commentary text hierarchically with overlap between chunks.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — characters shared between consecutive chunks;
    ///   must be less than `chunk_size`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }

    /// Split raw text into an ordered chunk sequence.
    ///
    /// Text of at most `chunk_size` characters yields exactly one
    /// chunk with no overlap applied. Empty text yields no chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        self.split_recursive(text, &SEPARATORS)
    }

    /// Split one commentary record into provenance-tagged chunks with
    /// contiguous 0-based indices in emission order.
    pub fn chunk_commentary(&self, record: &CommentaryRecord) -> Vec<Chunk> {
        let author_slug = slug(&record.author);
        self.split(&record.commentary_text)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk {
                id: format!(
                    "{}_{}_{}_{i}",
                    record.shloka_id,
                    author_slug,
                    record.commentary_type.as_str()
                ),
                text,
                embedding: Vec::new(),
                metadata: ChunkMetadata {
                    author: record.author.clone(),
                    chapter: record.chapter,
                    verse: record.verse,
                    shloka_id: record.shloka_id.clone(),
                    commentary_type: record.commentary_type,
                    shloka_sanskrit: record.shloka_sanskrit.clone(),
                    chunk_index: i,
                },
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }
        let Some((separator, rest)) = separators.split_first() else {
            return self.split_by_size(text);
        };

        let segments = split_keeping_separator(text, separator);
        if segments.len() <= 1 {
            // Separator not present at this level, try the next one.
            return self.split_recursive(text, rest);
        }

        let mut chunks = Vec::new();
        // `carry` is the overlap prefix inherited from the previous
        // chunk; `body` is the newly added source text. Overlap is
        // always computed from `body` alone so it never compounds.
        let mut carry = String::new();
        let mut body = String::new();

        for segment in segments {
            let fits =
                char_len(&carry) + char_len(&body) + char_len(segment) <= self.chunk_size;
            if body.is_empty() || fits {
                body.push_str(segment);
            } else {
                self.flush(&mut chunks, &carry, &body, rest);
                carry = tail_chars(&body, self.chunk_overlap).to_string();
                body = segment.to_string();
            }
        }
        if !body.is_empty() {
            self.flush(&mut chunks, &carry, &body, rest);
        }

        chunks
    }

    /// Emit one merged piece, recursing to finer separators if it still
    /// exceeds the chunk size (a single over-long segment).
    fn flush(&self, chunks: &mut Vec<String>, carry: &str, body: &str, rest: &[&str]) {
        let mut piece = String::with_capacity(carry.len() + body.len());
        piece.push_str(carry);
        piece.push_str(body);
        if char_len(&piece) > self.chunk_size {
            chunks.extend(self.split_recursive(&piece, rest));
        } else {
            chunks.push(piece);
        }
    }

    /// Raw character-window splitting with overlap, the final fallback.
    fn split_by_size(&self, text: &str) -> Vec<String> {
        let boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let total = boundaries.len();
        let byte_at = |pos: usize| if pos >= total { text.len() } else { boundaries[pos] };

        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(total);
            chunks.push(text[byte_at(start)..byte_at(end)].to_string());
            if end == total {
                break;
            }
            let step = self.chunk_size.saturating_sub(self.chunk_overlap);
            if step == 0 {
                break;
            }
            start += step;
        }
        chunks
    }
}

/// Number of characters (codepoints) in a string.
fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// The last `n` characters of a string, on a codepoint boundary.
fn tail_chars(s: &str, n: usize) -> &str {
    let len = char_len(s);
    if n >= len {
        return s;
    }
    let boundary = s.char_indices().nth(len - n).map(|(i, _)| i).unwrap_or(0);
    &s[boundary..]
}

/// Split text at a separator while keeping the separator attached to
/// the preceding segment, so rejoining segments reconstructs the input.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Lowercased, hyphen-joined form of an author name for chunk ids.
fn slug(author: &str) -> String {
    author
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CommentaryType;

    fn chunker(size: usize, overlap: usize) -> RecursiveChunker {
        RecursiveChunker::new(size, overlap)
    }

    fn record(text: &str) -> CommentaryRecord {
        CommentaryRecord {
            shloka_id: "BG2.47".to_string(),
            chapter: 2,
            verse: 47,
            shloka_sanskrit: "कर्मण्येवाधिकारस्ते".to_string(),
            shloka_transliteration: None,
            author: "Swami Sivananda".to_string(),
            commentary_type: CommentaryType::EnglishCommentary,
            commentary_text: text.to_string(),
        }
    }

    #[test]
    fn short_text_yields_single_chunk_without_overlap() {
        let chunks = chunker(1000, 100).split("a short commentary");
        assert_eq!(chunks, vec!["a short commentary".to_string()]);
    }

    #[test]
    fn unbroken_text_splits_into_overlapping_windows() {
        let text = "a".repeat(1500);
        let chunks = chunker(1000, 100).split(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 1000);
        assert_eq!(chunks[1].chars().count(), 600);
        // The seam: the second chunk starts with the last 100
        // characters of the first.
        assert_eq!(&chunks[1][..100], &chunks[0][900..]);
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let para_a = "x".repeat(600);
        let para_b = "y".repeat(600);
        let text = format!("{para_a}\n\n{para_b}");
        let chunks = chunker(1000, 100).split(&text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with('x'));
        assert!(chunks[1].ends_with('y'));
        // Overlap from the first paragraph's tail carries into the
        // second chunk.
        assert!(chunks[1].starts_with(&"x".repeat(98)));
    }

    #[test]
    fn prefers_sentence_boundaries_within_a_paragraph() {
        let sentence = format!("{}. ", "w".repeat(98));
        let text = sentence.repeat(12); // 1200 chars, no paragraph breaks
        let chunks = chunker(500, 50).split(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 500);
        }
    }

    #[test]
    fn devanagari_text_never_splits_mid_codepoint() {
        let text = "कर्मण्येवाधिकारस्ते मा फलेषु कदाचन ".repeat(40);
        let chunks = chunker(200, 20).split(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 200);
            // Slicing on a non-boundary would have panicked above;
            // re-validate the chunk is well-formed UTF-8 text.
            assert!(!chunk.is_empty());
        }
    }

    #[test]
    fn splitting_is_deterministic() {
        let text = format!("{}. {}\n\n{}", "a".repeat(300), "b".repeat(400), "c".repeat(500));
        let c = chunker(250, 40);
        assert_eq!(c.split(&text), c.split(&text));
    }

    #[test]
    fn commentary_chunks_carry_provenance_and_contiguous_indices() {
        let chunks = chunker(100, 10).chunk_commentary(&record(&"z".repeat(350)));
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata.chunk_index, i);
            assert_eq!(chunk.metadata.author, "Swami Sivananda");
            assert_eq!(chunk.metadata.shloka_id, "BG2.47");
            assert_eq!(chunk.metadata.commentary_type, CommentaryType::EnglishCommentary);
            assert!(chunk.embedding.is_empty());
        }
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunker(100, 10).split("").is_empty());
    }
}
