// Embedding cache, in-flight deduplication, and batch dispatch. Grounded on
// the teacher's Arc<Mutex<...>> shared-state pattern (toxicity/onnx.rs,
// toxicity/rate_limiter.rs) generalized from "one API call in flight" to
// "many concurrent callers sharing one batched model call per cache miss".
//
// Cache-insert happens strictly before the in-flight entry fires, so a
// waiter woken by the singleflight broadcast always observes the value
// already in the cache. A broadcast channel (not `Notify`) gates the wait:
// each waiter subscribes while still holding the `in_flight` lock, so the
// subscription is registered before the owning call can possibly send --
// `Notify::notify_waiters` would lose the wakeup for any waiter that
// hadn't yet polled its `notified()` future at send time.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};

use crate::error::EngineError;
use crate::progress::ProgressSender;

use super::traits::EmbeddingBackend;

const DEFAULT_BATCH_SIZE: usize = 8;

struct InFlight {
    done: broadcast::Sender<()>,
}

/// Caches embeddings for the engine's lifetime, deduplicates concurrent
/// requests for the same uncached text, and batches cache misses into
/// fixed-size calls to the backend.
pub struct EmbeddingService {
    backend: Arc<dyn EmbeddingBackend>,
    cache: Mutex<HashMap<String, Vec<f32>>>,
    in_flight: Mutex<HashMap<String, Arc<InFlight>>>,
    batch_size: usize,
}

impl EmbeddingService {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self::with_batch_size(backend, DEFAULT_BATCH_SIZE)
    }

    pub fn with_batch_size(backend: Arc<dyn EmbeddingBackend>, batch_size: usize) -> Self {
        Self {
            backend,
            cache: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            batch_size: batch_size.max(1),
        }
    }

    /// Reset the process-lifetime cache. Does not cancel any in-flight
    /// computation.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }

    /// Embed `texts`, returning one vector per input in the same order.
    /// Cache hits are served directly; misses are deduplicated by string
    /// key and dispatched in batches of `batch_size`.
    pub async fn embed_batch(
        &self,
        texts: &[String],
        progress: &ProgressSender,
    ) -> Result<Vec<Vec<f32>>, EngineError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let was_initialized = self.backend.is_initialized();

        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut misses: Vec<usize> = Vec::new();

        {
            let cache = self.cache.lock().await;
            for (i, text) in texts.iter().enumerate() {
                if let Some(v) = cache.get(text) {
                    results[i] = Some(v.clone());
                } else {
                    misses.push(i);
                }
            }
        }

        if !misses.is_empty() {
            self.resolve_misses(texts, &misses, &mut results).await?;
        }

        if !was_initialized && self.backend.is_initialized() {
            progress.emit_forced("embedding_model_init", None, None).await;
        }

        Ok(results.into_iter().map(|r| r.expect("every index resolved")).collect())
    }

    async fn resolve_misses(
        &self,
        texts: &[String],
        misses: &[usize],
        results: &mut [Option<Vec<f32>>],
    ) -> Result<(), EngineError> {
        // Claim ownership of each miss key: either we become the
        // computing party, or we find an existing in-flight computation
        // and wait on it. `owned` holds only the indices this call must
        // actually dispatch to the backend.
        let mut owned: Vec<usize> = Vec::new();
        let mut waiting: Vec<(usize, broadcast::Receiver<()>)> = Vec::new();

        {
            let mut in_flight = self.in_flight.lock().await;
            for &i in misses {
                let key = &texts[i];
                if let Some(existing) = in_flight.get(key) {
                    waiting.push((i, existing.done.subscribe()));
                } else {
                    let (done, _) = broadcast::channel(1);
                    owned.push(i);
                    in_flight.insert(key.clone(), Arc::new(InFlight { done }));
                }
            }
        }

        // Dispatch owned misses in fixed-size batches.
        for chunk in owned.chunks(self.batch_size) {
            let chunk_texts: Vec<String> = chunk.iter().map(|&i| texts[i].clone()).collect();
            let vectors = self.backend.embed_batch(&chunk_texts).await;

            match vectors {
                Ok(vectors) => {
                    let mut cache = self.cache.lock().await;
                    let mut in_flight = self.in_flight.lock().await;
                    for (&i, vector) in chunk.iter().zip(vectors.into_iter()) {
                        cache.insert(texts[i].clone(), vector.clone());
                        results[i] = Some(vector);
                        if let Some(entry) = in_flight.remove(&texts[i]) {
                            let _ = entry.done.send(());
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, batch_len = chunk.len(), "embedding batch failed");
                    // Release the claims so a retrying caller isn't
                    // deadlocked waiting on a computation that never
                    // completes, then propagate the terminal error.
                    let mut in_flight = self.in_flight.lock().await;
                    for &i in chunk {
                        if let Some(entry) = in_flight.remove(&texts[i]) {
                            let _ = entry.done.send(());
                        }
                    }
                    return Err(e);
                }
            }
        }

        // Wait for the in-flight computations this call deduplicated
        // against, then read the now-cached values. The subscription was
        // taken while holding the `in_flight` lock above, before the owner
        // could possibly have sent -- so this recv cannot miss the signal.
        for (i, mut rx) in waiting {
            let _ = rx.recv().await;
            let cache = self.cache.lock().await;
            if let Some(v) = cache.get(&texts[i]) {
                results[i] = Some(v.clone());
            } else {
                // The owning call failed and released the claim without
                // producing a value; report it rather than panicking on
                // the `expect` in embed_batch.
                return Err(EngineError::Internal(format!(
                    "embedding computation for shared text at index {i} did not complete"
                )));
            }
        }

        Ok(())
    }
}
