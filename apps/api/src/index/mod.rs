// Embedding Index: chunking, embedding client, in-memory cosine index,
// durable storage. One logical index per deployment, behind a RwLock in
// AppState; all model calls go through the Embedder trait.

pub mod chunker;
pub mod embedder;
pub mod storage;
pub mod vector_index;
