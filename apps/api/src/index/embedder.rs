//! Embedding client — the single point of entry for all embedding-model calls.
//!
//! The model is an external black box: text in, fixed-length float vector out.
//! Failures stay `Result`s here; callers convert to a 0.0 similarity (with a
//! log line) only at the score-computation boundary, so a failed embedding
//! remains distinguishable from a genuinely dissimilar pair.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response shape: {0}")]
    Shape(String),
}

/// Produces embedding vectors for text. Constructed once at startup and
/// injected wherever embeddings are needed (`Arc<dyn Embedder>` in
/// `AppState`) — there is no process-global model handle.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Fixed dimensionality of every vector this embedder returns.
    fn dimensions(&self) -> usize;

    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Embeds a batch in one request. Batch ranking must use this instead of
    /// issuing one call per candidate.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
/// Retries on 429 and 5xx with exponential backoff; every request carries a
/// bounded timeout so a stalled model service cannot hang the pipeline.
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl HttpEmbedder {
    pub fn new(
        base_url: &str,
        api_key: String,
        model: String,
        dimensions: usize,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key,
            model,
            dimensions,
        }
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let request_body = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.dimensions,
        };

        let mut last_error: Option<EmbedError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Embedding call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(EmbedError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Embedding API returned {}: {}", status, body);
                last_error = Some(EmbedError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(EmbedError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let mut parsed: EmbeddingResponse = response.json().await?;
            parsed.data.sort_by_key(|d| d.index);

            if parsed.data.len() != texts.len() {
                return Err(EmbedError::Shape(format!(
                    "{} embeddings returned for {} inputs",
                    parsed.data.len(),
                    texts.len()
                )));
            }

            let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();
            if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
                return Err(EmbedError::Shape(format!(
                    "vector of dimension {} (expected {})",
                    bad.len(),
                    self.dimensions
                )));
            }

            debug!("Embedded {} texts", vectors.len());
            return Ok(vectors);
        }

        Err(last_error.unwrap_or(EmbedError::Shape(
            "embedding request exhausted retries".to_string(),
        )))
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let input = [text.to_string()];
        let vectors = self.request(&input).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Shape("no embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let embedder = HttpEmbedder::new(
            "https://api.example.com/v1/",
            "key".to_string(),
            "test-model".to_string(),
            8,
            std::time::Duration::from_secs(5),
        );
        assert_eq!(embedder.endpoint, "https://api.example.com/v1/embeddings");
    }

    #[test]
    fn test_response_shape_deserializes() {
        let json = r#"{"data": [{"index": 1, "embedding": [0.1, 0.2]}, {"index": 0, "embedding": [0.3, 0.4]}]}"#;
        let mut parsed: EmbeddingResponse = serde_json::from_str(json).unwrap();
        parsed.data.sort_by_key(|d| d.index);
        assert_eq!(parsed.data[0].embedding, vec![0.3, 0.4]);
        assert_eq!(parsed.data[1].index, 1);
    }
}
