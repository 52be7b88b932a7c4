//! Document ingestion pipeline: extract text, chunk it, embed the chunks,
//! and keep the process-wide vector index (and its on-disk copy) current.

pub mod extract;
pub mod handlers;

use std::collections::BTreeSet;
use std::path::Path;

use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::db;
use crate::index::chunker::{chunk_text, Chunk};
use crate::index::embedder::Embedder;
use crate::index::storage;
use crate::index::vector_index::VectorIndex;
use crate::models::candidate::CandidateRow;

/// Chunks for one candidate: the resume body, plus the interview transcript
/// (when present) under its own source id so either can be replaced alone.
pub fn candidate_chunks(candidate: &CandidateRow) -> Vec<Chunk> {
    let name_tag = candidate.name.to_lowercase();

    let resume_tags: BTreeSet<String> = BTreeSet::from(["resume".to_string(), name_tag.clone()]);
    let mut chunks = chunk_text(
        &candidate.resume_text,
        &candidate.id.to_string(),
        &resume_tags,
    );

    if let Some(transcript) = candidate.video_transcript.as_deref() {
        if !transcript.trim().is_empty() {
            let transcript_tags: BTreeSet<String> =
                BTreeSet::from(["transcript".to_string(), name_tag]);
            chunks.extend(chunk_text(
                transcript,
                &transcript_source_id(candidate),
                &transcript_tags,
            ));
        }
    }

    chunks
}

fn transcript_source_id(candidate: &CandidateRow) -> String {
    format!("{}/transcript", candidate.id)
}

/// Replaces a candidate's chunks in the index and persists the result.
///
/// Fails soft: an embedding outage leaves the candidate stored but
/// unsearchable (logged, 0 returned) rather than failing the request.
/// Returns the number of chunks now indexed for this candidate.
pub async fn index_candidate(
    embedder: &dyn Embedder,
    index: &RwLock<VectorIndex>,
    index_dir: &Path,
    candidate: &CandidateRow,
) -> usize {
    let chunks = candidate_chunks(candidate);

    if chunks.is_empty() {
        let mut idx = index.write().await;
        idx.remove_source(&candidate.id.to_string());
        idx.remove_source(&transcript_source_id(candidate));
        persist(&idx, index_dir);
        return 0;
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = match embedder.embed_batch(&texts).await {
        Ok(v) if v.len() == chunks.len() => v,
        Ok(v) => {
            warn!(
                "Embedding returned {} vectors for {} chunks; candidate {} left unindexed",
                v.len(),
                chunks.len(),
                candidate.id
            );
            return 0;
        }
        Err(e) => {
            warn!("Embedding failed; candidate {} left unindexed: {e}", candidate.id);
            return 0;
        }
    };

    let mut idx = index.write().await;
    idx.remove_source(&candidate.id.to_string());
    idx.remove_source(&transcript_source_id(candidate));

    let mut indexed = 0;
    for (chunk, vector) in chunks.into_iter().zip(vectors) {
        match idx.upsert(chunk, vector) {
            Ok(()) => indexed += 1,
            Err(e) => warn!("Chunk rejected by index: {e}"),
        }
    }

    persist(&idx, index_dir);
    indexed
}

/// Loads the vector index from disk, or rebuilds it from the stored
/// candidate pool when the file is missing, corrupt, or was built for a
/// different embedding dimensionality. Called once at startup.
pub async fn bootstrap_index(
    pool: &PgPool,
    embedder: &dyn Embedder,
    index_dir: &Path,
) -> anyhow::Result<VectorIndex> {
    match storage::load(index_dir) {
        Ok(Some(index)) if index.dimensions() == embedder.dimensions() => {
            info!("Loaded vector index with {} chunks", index.len());
            return Ok(index);
        }
        Ok(Some(index)) => warn!(
            "Vector index dimensionality {} does not match embedder ({}); rebuilding",
            index.dimensions(),
            embedder.dimensions()
        ),
        Ok(None) => info!("No vector index on disk yet; building from stored candidates"),
        Err(e) => warn!("Could not load vector index ({e}); rebuilding"),
    }

    let mut index = VectorIndex::new(embedder.dimensions());
    let candidates = db::list_candidates(pool).await?;

    for candidate in &candidates {
        let chunks = candidate_chunks(candidate);
        if chunks.is_empty() {
            continue;
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        match embedder.embed_batch(&texts).await {
            Ok(vectors) if vectors.len() == chunks.len() => {
                for (chunk, vector) in chunks.into_iter().zip(vectors) {
                    if let Err(e) = index.upsert(chunk, vector) {
                        warn!("Chunk rejected by index: {e}");
                    }
                }
            }
            Ok(_) | Err(_) => {
                warn!("Skipping candidate {} during index rebuild", candidate.id);
            }
        }
    }

    info!(
        "Built vector index with {} chunks from {} candidates",
        index.len(),
        candidates.len()
    );
    persist(&index, index_dir);
    Ok(index)
}

fn persist(index: &VectorIndex, index_dir: &Path) {
    if let Err(e) = storage::save(index, index_dir) {
        error!("Failed to persist vector index: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::embedder::EmbedError;
    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        fn dimensions(&self) -> usize {
            2
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn dimensions(&self) -> usize {
            2
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
            Err(EmbedError::Shape("down".to_string()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
            Err(EmbedError::Shape("down".to_string()))
        }
    }

    fn candidate(resume: &str, transcript: Option<&str>) -> CandidateRow {
        CandidateRow {
            id: Uuid::from_u128(7),
            name: "Jane Doe".to_string(),
            email: None,
            phone: None,
            resume_text: resume.to_string(),
            video_transcript: transcript.map(str::to_string),
            skills: vec![],
            experience_years: None,
            education: "none".to_string(),
            certifications: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_candidate_chunks_tagged_by_origin() {
        let row = candidate("Resume body text.", Some("Transcript text."));
        let chunks = candidate_chunks(&row);

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].tags.contains("resume"));
        assert!(chunks[0].tags.contains("jane doe"));
        assert!(chunks[1].tags.contains("transcript"));
        assert_ne!(chunks[0].source_id, chunks[1].source_id);
    }

    #[test]
    fn test_candidate_chunks_without_transcript() {
        let row = candidate("Resume body text.", None);
        let chunks = candidate_chunks(&row);
        assert_eq!(chunks.len(), 1);
    }

    #[tokio::test]
    async fn test_index_candidate_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let index = RwLock::new(VectorIndex::new(2));
        let row = candidate("Resume body text.", None);

        let first = index_candidate(&StubEmbedder, &index, dir.path(), &row).await;
        let second = index_candidate(&StubEmbedder, &index, dir.path(), &row).await;

        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(index.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_index_candidate_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let index = RwLock::new(VectorIndex::new(2));
        let row = candidate("Resume body text.", None);

        index_candidate(&StubEmbedder, &index, dir.path(), &row).await;

        let restored = storage::load(dir.path()).unwrap().expect("index saved");
        assert_eq!(restored.len(), 1);
    }

    #[tokio::test]
    async fn test_index_candidate_fails_soft_on_embedding_outage() {
        let dir = tempfile::tempdir().unwrap();
        let index = RwLock::new(VectorIndex::new(2));
        let row = candidate("Resume body text.", None);

        let indexed = index_candidate(&FailingEmbedder, &index, dir.path(), &row).await;

        assert_eq!(indexed, 0);
        assert!(index.read().await.is_empty());
    }
}
