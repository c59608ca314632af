//! Search API: embeds the query text and returns ranked chunk matches.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::state::AppState;
use crate::vectorstore::QueryFilter;

const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub text: String,
    pub top_k: Option<usize>,
    /// Exact-equality metadata constraints, e.g. {"location_country": "India"}.
    #[serde(default)]
    pub filters: QueryFilter,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub chunk_id: String,
    pub score: f32,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// Which embedding model produced the query vector; "local-fallback"
    /// signals a degraded (offline) answer.
    pub model: String,
    pub hits: Vec<SearchHit>,
}

/// POST /api/v1/search
pub async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }

    let mut embedded = state
        .embeddings
        .embed(std::slice::from_ref(&request.text))
        .await;
    let query = embedded.remove(0);

    let filter = (!request.filters.is_empty()).then_some(&request.filters);
    let hits = state
        .store
        .query(&query.vector, request.top_k.unwrap_or(DEFAULT_TOP_K), filter)?;

    Ok(Json(SearchResponse {
        model: query.model,
        hits: hits
            .into_iter()
            .map(|hit| SearchHit {
                chunk_id: hit.record.chunk_id,
                score: hit.score,
                metadata: hit.record.metadata,
            })
            .collect(),
    }))
}
