use std::sync::Arc;

use crate::embeddings::EmbeddingsClient;
use crate::vectorstore::VectorStore;

/// Shared application state injected into all route handlers via Axum
/// extractors.
#[derive(Clone)]
pub struct AppState {
    pub embeddings: EmbeddingsClient,
    pub store: Arc<VectorStore>,
}
