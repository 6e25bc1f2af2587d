// Embedding backend trait — the swap-ready abstraction, mirroring how the
// teacher keeps ToxicityScorer and TopicExtractor behind traits so the
// concrete model implementation can change without touching callers.

use async_trait::async_trait;

use crate::error::EngineError;

pub const EMBEDDING_DIM: usize = 384;

/// A backend capable of turning text into L2-normalized dense vectors.
/// Implementations own whatever model runtime they need; the cache/dedup
/// layer in `embedding::cache` is backend-agnostic.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a batch of texts, returning one 384-dim L2-normalized vector
    /// per input in the same order. Implementations should reject batches
    /// whose model output cannot be reshaped into exactly `texts.len()`
    /// equal-length vectors with `EngineError::EmbeddingShapeMismatch`.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError>;

    /// Whether the backend's model has already been loaded. Used by the
    /// caching service to emit exactly one init progress event on the
    /// false-to-true transition.
    fn is_initialized(&self) -> bool;
}
