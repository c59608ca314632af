//! Embeddings client, the single point of entry for vector generation.
//!
//! No other module may call the embedding provider directly. `embed` never
//! fails: remote batches are retried with exponential backoff, and a batch
//! that exhausts its budget degrades text-by-text to a deterministic
//! hash-derived vector so the pipeline always produces a full result set,
//! online or offline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{Config, EmbeddingProviderKind};

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
/// The model requested from the remote provider.
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Model tag carried by deterministic fallback vectors.
pub const FALLBACK_MODEL: &str = "local-fallback";
/// Length of every fallback vector.
pub const PSEUDO_VECTOR_DIM: usize = 256;
/// Texts per provider request.
const BATCH_SIZE: usize = 64;
/// Attempts per batch before degrading to fallback vectors.
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("provider returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
}

/// One embedded text. Vector length is constant per code path within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResult {
    pub vector: Vec<f32>,
    pub model: String,
}

/// Retry pacing: delay = base × 2^attempt.
///
/// A plain value separate from the sleep primitive, so the schedule can be
/// asserted in tests without waiting on it.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub base: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
        }
    }
}

impl Backoff {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base * 2u32.pow(attempt)
    }
}

/// A remote embedding backend. Swappable behind `Arc<dyn _>` so tests can
/// inject failure modes without a network.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Model tag recorded on successful results.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// OpenAI-compatible embeddings endpoint.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request_body = EmbeddingsRequest {
            input: texts,
            model: EMBEDDING_MODEL,
        };

        let response = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: EmbeddingsResponse = response.json().await?;
        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                got: parsed.data.len(),
            });
        }

        debug!("Embedded batch of {} texts", texts.len());
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }

    fn model(&self) -> &str {
        EMBEDDING_MODEL
    }
}

/// The embeddings client used by the pipeline and the query surface.
///
/// Batches run sequentially within one `embed` call. That keeps provider
/// rate limits predictable and result ordering trivially stable. The retry
/// policy does not distinguish error classes: auth failures and timeouts
/// alike consume one attempt each before the batch falls back.
#[derive(Clone)]
pub struct EmbeddingsClient {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    backoff: Backoff,
}

impl EmbeddingsClient {
    pub fn from_config(config: &Config) -> Self {
        let provider = match (&config.embedding_provider, &config.openai_api_key) {
            (EmbeddingProviderKind::OpenAi, Some(key)) => Some(
                Arc::new(OpenAiProvider::new(key.clone())) as Arc<dyn EmbeddingProvider>
            ),
            _ => None,
        };
        Self {
            provider,
            backoff: Backoff::default(),
        }
    }

    /// A client that never touches the network.
    pub fn local() -> Self {
        Self {
            provider: None,
            backoff: Backoff::default(),
        }
    }

    pub fn with_provider(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider: Some(provider),
            backoff: Backoff::default(),
        }
    }

    /// Embeds every text, one result per input in input order.
    pub async fn embed(&self, texts: &[String]) -> Vec<EmbeddingResult> {
        let Some(provider) = self.provider.clone() else {
            return texts.iter().map(|t| fallback_result(t)).collect();
        };

        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            self.embed_batch_with_retry(provider.as_ref(), batch, &mut results)
                .await;
        }
        results
    }

    async fn embed_batch_with_retry(
        &self,
        provider: &dyn EmbeddingProvider,
        batch: &[String],
        results: &mut Vec<EmbeddingResult>,
    ) {
        for attempt in 1..=MAX_RETRIES {
            match provider.embed_batch(batch).await {
                Ok(vectors) => {
                    let model = provider.model().to_string();
                    results.extend(vectors.into_iter().map(|vector| EmbeddingResult {
                        vector,
                        model: model.clone(),
                    }));
                    return;
                }
                Err(e) => {
                    warn!("Embedding batch attempt {attempt} failed: {e}");
                    if attempt < MAX_RETRIES {
                        tokio::time::sleep(self.backoff.delay_for(attempt)).await;
                    }
                }
            }
        }

        warn!(
            "Embedding retries exhausted; using pseudo vectors for {} texts",
            batch.len()
        );
        results.extend(batch.iter().map(|t| fallback_result(t)));
    }
}

/// Deterministic hash-derived vector: SHA-256 digest bytes, cycled to 256
/// components, mapped into [-1, 1]. Identical text always yields an
/// identical vector, independent of network state.
pub fn pseudo_vector(text: &str) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    (0..PSEUDO_VECTOR_DIM)
        .map(|i| {
            let byte = digest[i % digest.len()];
            (byte as f32 / 255.0) * 2.0 - 1.0
        })
        .collect()
}

fn fallback_result(text: &str) -> EmbeddingResult {
    EmbeddingResult {
        vector: pseudo_vector(text),
        model: FALLBACK_MODEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct FailingProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(EmbeddingError::Api {
                status: 429,
                message: "rate limited".into(),
            })
        }

        fn model(&self) -> &str {
            "failing-test-model"
        }
    }

    struct EchoProvider;

    #[async_trait]
    impl EmbeddingProvider for EchoProvider {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32, 1.0, 0.0])
                .collect())
        }

        fn model(&self) -> &str {
            "echo-test-model"
        }
    }

    #[test]
    fn test_pseudo_vector_is_deterministic() {
        let a = pseudo_vector("python intern");
        let b = pseudo_vector("python intern");
        assert_eq!(a, b);
        assert_ne!(a, pseudo_vector("rust intern"));
    }

    #[test]
    fn test_pseudo_vector_fixed_length_and_range() {
        let v = pseudo_vector("anything at all");
        assert_eq!(v.len(), PSEUDO_VECTOR_DIM);
        assert!(v.iter().all(|x| (-1.0..=1.0).contains(x)));
    }

    #[test]
    fn test_backoff_schedule_doubles() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay_for(1), Duration::from_millis(1000));
        assert_eq!(backoff.delay_for(2), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_local_client_returns_one_result_per_input() {
        let client = EmbeddingsClient::local();
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let results = client.embed(&texts).await;

        assert_eq!(results.len(), texts.len());
        for result in &results {
            assert_eq!(result.model, FALLBACK_MODEL);
            assert_eq!(result.vector.len(), PSEUDO_VECTOR_DIM);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_degrade_to_fallback() {
        let provider = Arc::new(FailingProvider {
            calls: AtomicU32::new(0),
        });
        let client = EmbeddingsClient::with_provider(provider.clone());
        let texts = vec!["x".to_string(), "y".to_string()];
        let results = client.embed(&texts).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.model == FALLBACK_MODEL));
        assert_eq!(results[0].vector, pseudo_vector("x"));
    }

    #[tokio::test]
    async fn test_successful_provider_preserves_order_and_tag() {
        let client = EmbeddingsClient::with_provider(Arc::new(EchoProvider));
        let texts = vec!["one".to_string(), "three".to_string()];
        let results = client.embed(&texts).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].vector[0], 3.0);
        assert_eq!(results[1].vector[0], 5.0);
        assert!(results.iter().all(|r| r.model == "echo-test-model"));
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_output() {
        let client = EmbeddingsClient::local();
        assert!(client.embed(&[]).await.is_empty());
    }
}
