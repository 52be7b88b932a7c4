//! Retrieval QA — answers free-text questions about the candidate pool,
//! grounded in chunks retrieved from the vector index.
//!
//! This module never returns an error to its caller: an empty index yields a
//! fixed sentinel answer, and a failed model call yields a human-readable
//! explanation (logged, so operators can still tell the cases apart).

pub mod handlers;
pub mod prompts;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::index::chunker::Chunk;
use crate::index::embedder::Embedder;
use crate::index::vector_index::{SearchHit, VectorIndex};
use crate::llm_client::LlmClient;
use crate::qa::prompts::{QA_PROMPT_TEMPLATE, QA_SYSTEM};

/// Fixed answer reported when there is nothing to retrieve from.
pub const NO_INDEX_ANSWER: &str =
    "No candidate documents have been indexed yet. Upload resumes before asking questions about the pool.";

#[derive(Debug, Serialize)]
pub struct QaAnswer {
    pub answer: String,
    pub sources: Vec<Chunk>,
}

impl QaAnswer {
    fn sentinel() -> Self {
        Self {
            answer: NO_INDEX_ANSWER.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Answers a question over the indexed pool: retrieve top-k chunks, forward
/// them with the question to the generative model, return the model's text
/// verbatim plus the chunks used as sources.
pub async fn answer_question(
    question: &str,
    embedder: &dyn Embedder,
    index: &RwLock<VectorIndex>,
    llm: &LlmClient,
    top_k: usize,
) -> QaAnswer {
    if top_k == 0 || index.read().await.is_empty() {
        return QaAnswer::sentinel();
    }

    let query_vector = match embedder.embed(question).await {
        Ok(v) => v,
        Err(e) => {
            warn!("Could not embed question, reporting no-index state: {e}");
            return QaAnswer::sentinel();
        }
    };

    let hits = index.read().await.search(&query_vector, top_k);
    if hits.is_empty() {
        return QaAnswer::sentinel();
    }

    let prompt = build_prompt(question, &hits);

    match llm.call_text(&prompt, QA_SYSTEM).await {
        Ok(answer) => {
            info!("Answered question with {} source chunks", hits.len());
            QaAnswer {
                answer,
                sources: hits.into_iter().map(|h| h.chunk).collect(),
            }
        }
        Err(e) => {
            error!("QA model call failed: {e}");
            QaAnswer {
                answer: format!("Error processing question: {e}"),
                sources: Vec::new(),
            }
        }
    }
}

fn build_prompt(question: &str, hits: &[SearchHit]) -> String {
    let context = hits
        .iter()
        .map(|hit| {
            format!(
                "[source {} chunk {}]\n{}",
                hit.chunk.source_id, hit.chunk.chunk_index, hit.chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    QA_PROMPT_TEMPLATE
        .replace("{context}", &context)
        .replace("{question}", question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::embedder::EmbedError;
    use async_trait::async_trait;
    use std::collections::BTreeSet;

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

    fn chunk(source_id: &str, chunk_index: usize, text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            source_id: source_id.to_string(),
            chunk_index,
            tags: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn test_empty_index_returns_sentinel() {
        let index = RwLock::new(VectorIndex::new(2));
        let llm = LlmClient::new("test-key".to_string());

        let result =
            answer_question("Who knows Python?", &StubEmbedder, &index, &llm, 5).await;

        assert_eq!(result.answer, NO_INDEX_ANSWER);
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn test_top_k_zero_returns_sentinel() {
        let mut idx = VectorIndex::new(2);
        idx.upsert(chunk("a", 0, "text"), vec![1.0, 0.0]).unwrap();
        let index = RwLock::new(idx);
        let llm = LlmClient::new("test-key".to_string());

        let result = answer_question("Who knows Python?", &StubEmbedder, &index, &llm, 0).await;

        assert_eq!(result.answer, NO_INDEX_ANSWER);
    }

    #[test]
    fn test_build_prompt_cites_sources_and_question() {
        let hits = vec![
            SearchHit {
                chunk: chunk("candidate-1", 0, "Jane knows Python."),
                similarity: 0.9,
            },
            SearchHit {
                chunk: chunk("candidate-2", 3, "John knows Django."),
                similarity: 0.8,
            },
        ];

        let prompt = build_prompt("Who knows Python?", &hits);

        assert!(prompt.contains("[source candidate-1 chunk 0]"));
        assert!(prompt.contains("Jane knows Python."));
        assert!(prompt.contains("[source candidate-2 chunk 3]"));
        assert!(prompt.ends_with("Who knows Python?"));
        assert!(!prompt.contains("{context}"));
        assert!(!prompt.contains("{question}"));
    }
}
