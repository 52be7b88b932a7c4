//! In-memory vector index with cosine similarity search.
//!
//! One logical index per deployment: loaded (or rebuilt) at startup, mutated
//! through `upsert`, and persisted via [`crate::index::storage`]. Writers must
//! serialize through the `RwLock` the index lives behind in `AppState`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::index::chunker::Chunk;

/// A chunk together with its embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// One search result: the matched chunk and its cosine similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub similarity: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// In-memory store of `(Chunk, embedding)` entries keyed by
/// `(source_id, chunk_index)`.
///
/// Entries keep insertion order; an upsert with an existing key replaces the
/// entry in place, so re-indexing a document is idempotent.
pub struct VectorIndex {
    dimensions: usize,
    entries: Vec<IndexEntry>,
    positions: HashMap<(String, usize), usize>,
}

impl VectorIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Inserts a chunk, or replaces the existing entry with the same
    /// `(source_id, chunk_index)` key. Replacement keeps the original
    /// insertion position, so search tie-breaks stay stable.
    pub fn upsert(&mut self, chunk: Chunk, embedding: Vec<f32>) -> Result<(), IndexError> {
        if embedding.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: embedding.len(),
            });
        }

        let key = (chunk.source_id.clone(), chunk.chunk_index);
        let entry = IndexEntry { chunk, embedding };

        match self.positions.get(&key) {
            Some(&pos) => self.entries[pos] = entry,
            None => {
                self.positions.insert(key, self.entries.len());
                self.entries.push(entry);
            }
        }
        Ok(())
    }

    /// Removes every chunk belonging to `source_id`, returning how many were
    /// dropped. Used before re-indexing a changed document.
    pub fn remove_source(&mut self, source_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.chunk.source_id != source_id);

        self.positions.clear();
        for (pos, entry) in self.entries.iter().enumerate() {
            self.positions
                .insert((entry.chunk.source_id.clone(), entry.chunk.chunk_index), pos);
        }

        before - self.entries.len()
    }

    /// Returns the `k` nearest chunks by cosine similarity, descending.
    /// Ties break by insertion order (the sort is stable). An empty index,
    /// `k == 0`, or a query of the wrong dimensionality all yield an empty
    /// result rather than an error.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        if k == 0 || self.entries.is_empty() || query.len() != self.dimensions {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                chunk: entry.chunk.clone(),
                similarity: cosine_similarity(query, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        hits
    }
}

/// Cosine similarity between two vectors. Zero-norm input scores 0.0 —
/// a degenerate vector should never look similar to anything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn chunk(source_id: &str, chunk_index: usize, text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            source_id: source_id.to_string(),
            chunk_index,
            tags: BTreeSet::new(),
        }
    }

    #[test]
    fn test_new_index_is_empty() {
        let index = VectorIndex::new(3);
        assert!(index.is_empty());
        assert_eq!(index.dimensions(), 3);
    }

    #[test]
    fn test_upsert_dimension_mismatch() {
        let mut index = VectorIndex::new(3);
        let result = index.upsert(chunk("a", 0, "x"), vec![1.0, 0.0]);
        assert!(matches!(result, Err(IndexError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_upsert_same_key_replaces_not_duplicates() {
        let mut index = VectorIndex::new(3);
        index.upsert(chunk("a", 0, "old"), vec![1.0, 0.0, 0.0]).unwrap();
        index.upsert(chunk("a", 0, "new"), vec![0.0, 1.0, 0.0]).unwrap();

        assert_eq!(index.len(), 1);
        let hits = index.search(&[0.0, 1.0, 0.0], 1);
        assert_eq!(hits[0].chunk.text, "new");
    }

    #[test]
    fn test_upsert_distinct_keys_append() {
        let mut index = VectorIndex::new(3);
        index.upsert(chunk("a", 0, "x"), vec![1.0, 0.0, 0.0]).unwrap();
        index.upsert(chunk("a", 1, "y"), vec![0.0, 1.0, 0.0]).unwrap();
        index.upsert(chunk("b", 0, "z"), vec![0.0, 0.0, 1.0]).unwrap();
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_search_orders_by_similarity_descending() {
        let mut index = VectorIndex::new(3);
        index.upsert(chunk("a", 0, "far"), vec![0.0, 1.0, 0.0]).unwrap();
        index.upsert(chunk("a", 1, "near"), vec![1.0, 0.1, 0.0]).unwrap();

        let hits = index.search(&[1.0, 0.0, 0.0], 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "near");
        assert!(hits[0].similarity > hits[1].similarity);
    }

    #[test]
    fn test_search_returns_at_most_k() {
        let mut index = VectorIndex::new(3);
        for i in 0..10 {
            index
                .upsert(chunk("a", i, "x"), vec![1.0, i as f32 * 0.1, 0.0])
                .unwrap();
        }
        assert_eq!(index.search(&[1.0, 0.0, 0.0], 3).len(), 3);
    }

    #[test]
    fn test_search_ties_break_by_insertion_order() {
        let mut index = VectorIndex::new(3);
        index.upsert(chunk("first", 0, "first"), vec![1.0, 0.0, 0.0]).unwrap();
        index.upsert(chunk("second", 0, "second"), vec![2.0, 0.0, 0.0]).unwrap();

        // Identical direction, identical cosine — insertion order decides.
        let hits = index.search(&[1.0, 0.0, 0.0], 2);
        assert_eq!(hits[0].chunk.text, "first");
        assert_eq!(hits[1].chunk.text, "second");
    }

    #[test]
    fn test_search_empty_index_returns_empty() {
        let index = VectorIndex::new(3);
        assert!(index.search(&[1.0, 0.0, 0.0], 5).is_empty());
    }

    #[test]
    fn test_search_k_zero_returns_empty() {
        let mut index = VectorIndex::new(3);
        index.upsert(chunk("a", 0, "x"), vec![1.0, 0.0, 0.0]).unwrap();
        assert!(index.search(&[1.0, 0.0, 0.0], 0).is_empty());
    }

    #[test]
    fn test_remove_source_drops_all_its_chunks() {
        let mut index = VectorIndex::new(3);
        index.upsert(chunk("a", 0, "x"), vec![1.0, 0.0, 0.0]).unwrap();
        index.upsert(chunk("a", 1, "y"), vec![0.0, 1.0, 0.0]).unwrap();
        index.upsert(chunk("b", 0, "z"), vec![0.0, 0.0, 1.0]).unwrap();

        assert_eq!(index.remove_source("a"), 2);
        assert_eq!(index.len(), 1);

        // The survivor is still reachable under its key.
        index.upsert(chunk("b", 0, "z2"), vec![0.0, 0.0, 1.0]).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let v = vec![0.5, 0.5, 0.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_zero_norm_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
