//! Retrieval Skill: embeds a query, asks the vector store for the top-k
//! passages — optionally restricted to a domain — and coalesces identical concurrent requests
//! into a single upstream call.
//!
//! The embedding/vector-store boundary mirrors the `EmbeddingsBuilder` /
//! `VectorStoreIndex` split (`rig-core/src/vector_store/mod.rs`, `rig-core/src/embeddings/mod.rs`):
//! an `EmbeddingClient` turns text into vectors, a `VectorStoreClient` turns a vector into ranked
//! chunks, and neither knows about the other.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};

use crate::chunk::{Domain, RetrievedPassage};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Failure embedding a query or querying the vector store. Kept string-based (no wrapped source
/// error) so the whole `Result` broadcast to single-flight waiters stays cheaply `Clone`.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum RetrievalError {
    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),
    #[error("vector store unavailable: {0}")]
    VectorStoreUnavailable(String),
}

/// Turns query text into an embedding vector.
pub trait EmbeddingClient: Send + Sync {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RetrievalError>>;
}

/// Request shape for one retrieval call. `domain_filter: None` means every chunk is
/// eligible — the fallback agent's unrestricted search.
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    pub embedding: Vec<f32>,
    pub domain_filter: Option<Domain>,
    pub limit: usize,
    pub score_floor: f64,
}

/// Returns passages ranked by descending similarity, already truncated to `limit` and filtered
/// against `score_floor`.
pub trait VectorStoreClient: Send + Sync {
    fn query<'a>(
        &'a self,
        request: RetrievalRequest,
    ) -> BoxFuture<'a, Result<Vec<RetrievedPassage>, RetrievalError>>;
}

type SharedResult = Result<Vec<RetrievedPassage>, RetrievalError>;
type InflightKey = (Option<Domain>, usize, u64, String);

/// The Retrieval Skill: embeds, queries, and single-flights concurrent identical requests.
///
/// Coalescing key is the normalized `(domain_filter, limit, score_floor, query text)` quadruple —
/// `score_floor` is keyed on its IEEE-754 bit pattern (`f64::to_bits`) since `f64` is neither `Eq`
/// nor `Hash`, and normalization lowercases the query and collapses internal whitespace. Waiters
/// that join an in-flight call all receive the leader's result via a broadcast channel; only the
/// leader's future ever calls the embedder/store. A waiter dropping its future does not cancel the
/// leader — canceling the downstream call only when the last waiter cancels would need a
/// refcounted cancellation token; this trades that precision for a cache that never leaves an
/// orphaned, half-cancelled fetch behind.
pub struct RetrievalSkill {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStoreClient>,
    inflight: Mutex<HashMap<InflightKey, broadcast::Sender<SharedResult>>>,
}

impl RetrievalSkill {
    pub fn new(embedder: Arc<dyn EmbeddingClient>, store: Arc<dyn VectorStoreClient>) -> Self {
        Self {
            embedder,
            store,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn retrieve(
        &self,
        query: &str,
        domain_filter: Option<Domain>,
        limit: usize,
        score_floor: f64,
    ) -> SharedResult {
        let key = (domain_filter, limit, score_floor.to_bits(), normalize_query(query));

        let mut receiver = {
            let mut inflight = self.inflight.lock().await;
            if let Some(tx) = inflight.get(&key) {
                tracing::debug!(?domain_filter, limit, score_floor, "retrieval cache hit; joining in-flight request");
                Some(tx.subscribe())
            } else {
                tracing::debug!(?domain_filter, limit, score_floor, "retrieval cache miss; issuing new request");
                let (tx, _rx) = broadcast::channel(1);
                inflight.insert(key.clone(), tx);
                None
            }
        };

        if let Some(rx) = receiver.take() {
            return wait_for_broadcast(rx).await;
        }

        let result = self.fetch(query, domain_filter, limit, score_floor).await;

        let mut inflight = self.inflight.lock().await;
        if let Some(tx) = inflight.remove(&key) {
            let _ = tx.send(result.clone());
        }
        result
    }

    #[tracing::instrument(skip(self, query), fields(domain = ?domain_filter, limit, score_floor))]
    async fn fetch(
        &self,
        query: &str,
        domain_filter: Option<Domain>,
        limit: usize,
        score_floor: f64,
    ) -> SharedResult {
        let embedding = self.embedder.embed(query).await?;
        self.store
            .query(RetrievalRequest {
                embedding,
                domain_filter,
                limit,
                score_floor,
            })
            .await
    }
}

fn normalize_query(query: &str) -> String {
    query.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

async fn wait_for_broadcast(mut rx: broadcast::Receiver<SharedResult>) -> SharedResult {
    match rx.recv().await {
        Ok(result) => result,
        Err(_) => Err(RetrievalError::VectorStoreUnavailable(
            "single-flight leader dropped its result without sending".to_string(),
        )),
    }
}
