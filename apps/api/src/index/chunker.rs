//! Splits documents into bounded, overlapping chunks — the atomic unit of
//! embedding and retrieval.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Target chunk size in characters.
pub const CHUNK_SIZE: usize = 500;
/// Characters of overlap carried from the tail of one chunk into the next.
pub const CHUNK_OVERLAP: usize = 50;

/// A bounded slice of a source document.
///
/// `(source_id, chunk_index)` is the idempotency key: re-indexing a source
/// replaces entries with the same key instead of duplicating them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_id: String,
    pub chunk_index: usize,
    pub tags: BTreeSet<String>,
}

/// Splits `text` into chunks of at most [`CHUNK_SIZE`] characters with
/// [`CHUNK_OVERLAP`] characters of overlap, preferring to break on whitespace
/// so words stay intact. Empty or whitespace-only input yields no chunks.
pub fn chunk_text(text: &str, source_id: &str, tags: &BTreeSet<String>) -> Vec<Chunk> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut chunk_index = 0;

    while start < chars.len() {
        let mut end = (start + CHUNK_SIZE).min(chars.len());

        // Break on whitespace when possible, but never shrink the chunk
        // below half its target size.
        if end < chars.len() {
            let floor = start + CHUNK_SIZE / 2;
            if let Some(ws) = (floor..end).rev().find(|&i| chars[i].is_whitespace()) {
                end = ws;
            }
        }

        let slice: String = chars[start..end].iter().collect();
        let slice = slice.trim();
        if !slice.is_empty() {
            chunks.push(Chunk {
                text: slice.to_string(),
                source_id: source_id.to_string(),
                chunk_index,
                tags: tags.clone(),
            });
            chunk_index += 1;
        }

        if end >= chars.len() {
            break;
        }
        start = end.saturating_sub(CHUNK_OVERLAP);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> BTreeSet<String> {
        BTreeSet::from(["resume".to_string()])
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(chunk_text("", "c1", &tags()).is_empty());
        assert!(chunk_text("   \n\t ", "c1", &tags()).is_empty());
    }

    #[test]
    fn test_short_input_is_single_chunk() {
        let chunks = chunk_text("A short resume.", "c1", &tags());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "A short resume.");
        assert_eq!(chunks[0].source_id, "c1");
        assert_eq!(chunks[0].chunk_index, 0);
    }

    #[test]
    fn test_chunks_are_bounded_and_indexed_sequentially() {
        let text = "word ".repeat(400); // 2000 chars
        let chunks = chunk_text(&text, "c1", &tags());

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert!(chunk.text.chars().count() <= CHUNK_SIZE);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text = "word ".repeat(400);
        let chunks = chunk_text(&text, "c1", &tags());

        for pair in chunks.windows(2) {
            let head: String = pair[1].text.chars().take(4).collect();
            assert!(
                pair[0].text.contains(&head),
                "chunk {} does not share its head with the previous tail",
                pair[1].chunk_index
            );
        }
    }

    #[test]
    fn test_breaks_on_whitespace() {
        let text = "word ".repeat(400);
        let chunks = chunk_text(&text, "c1", &tags());
        for chunk in &chunks {
            assert!(!chunk.text.starts_with("ord"), "split mid-word: {}", chunk.text);
        }
    }

    #[test]
    fn test_tags_carried_on_every_chunk() {
        let text = "word ".repeat(400);
        let chunks = chunk_text(&text, "c1", &tags());
        assert!(chunks.iter().all(|c| c.tags.contains("resume")));
    }
}
