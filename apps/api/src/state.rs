use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::index::embedder::Embedder;
use crate::index::vector_index::VectorIndex;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum
/// extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    /// Embedding service, constructed once at startup and injected — never a
    /// process-global model handle.
    pub embedder: Arc<dyn Embedder>,
    /// The one logical vector index for this deployment. Writers serialize
    /// through the lock; the underlying structure is not concurrency-safe.
    pub index: Arc<RwLock<VectorIndex>>,
    pub config: Config,
}
