// ONNX MiniLM-class sentence embedder. Adapted from the teacher's
// SentenceEmbedder (topics/embeddings.rs): same Arc<Mutex<Session>> +
// Arc<Tokenizer> + spawn_blocking shape, generalized with lazy
// initialization, L2 normalization of the output (the teacher's mean pool
// wasn't normalized — this contract requires unit vectors), and dual
// tensor-shape reshape handling.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::EngineError;

use super::traits::{EmbeddingBackend, EMBEDDING_DIM};

struct LoadedModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
}

/// ONNX-backed sentence embedder. The model is not loaded at construction —
/// the first call to `embed_batch` loads it, matching the "lazily
/// initialized on first call" contract; `loaded` flags the transition so
/// the caching service can emit exactly one init progress event.
pub struct OnnxSentenceEmbedder {
    model_dir: PathBuf,
    state: Mutex<Option<LoadedModel>>,
    loaded: AtomicBool,
}

impl OnnxSentenceEmbedder {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self { model_dir: model_dir.into(), state: Mutex::new(None), loaded: AtomicBool::new(false) }
    }

    async fn ensure_loaded(&self) -> Result<Arc<LoadedModelHandle>, EngineError> {
        let mut guard = self.state.lock().await;
        if guard.is_none() {
            let model_dir = self.model_dir.clone();
            let loaded = tokio::task::spawn_blocking(move || load_model(&model_dir))
                .await
                .map_err(|e| EngineError::EmbeddingModelUnavailable(format!("load task panicked: {e}")))?
                .map_err(|e| EngineError::EmbeddingModelUnavailable(e.to_string()))?;
            *guard = Some(loaded);
            self.loaded.store(true, Ordering::SeqCst);
        }
        let model = guard.as_ref().expect("just initialized");
        Ok(Arc::new(LoadedModelHandle {
            session: Arc::clone(&model.session),
            tokenizer: Arc::clone(&model.tokenizer),
        }))
    }
}

struct LoadedModelHandle {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
}

fn load_model(model_dir: &std::path::Path) -> anyhow::Result<LoadedModel> {
    let model_path = model_dir.join("model.onnx");
    let tokenizer_path = model_dir.join("tokenizer.json");

    if !model_path.exists() {
        anyhow::bail!("embedding model not found: {}", model_path.display());
    }
    if !tokenizer_path.exists() {
        anyhow::bail!("embedding tokenizer not found: {}", tokenizer_path.display());
    }

    let session = Session::builder()
        .context("failed to create ONNX session builder")?
        .commit_from_file(&model_path)
        .with_context(|| format!("failed to load embedding model from {}", model_path.display()))?;

    let tokenizer = Tokenizer::from_file(&tokenizer_path)
        .map_err(|e| anyhow::anyhow!("failed to load embedding tokenizer: {e}"))?;

    debug!(dir = %model_dir.display(), "loaded sentence embedding model");

    Ok(LoadedModel { session: Arc::new(Mutex::new(session)), tokenizer: Arc::new(tokenizer) })
}

#[async_trait]
impl EmbeddingBackend for OnnxSentenceEmbedder {
    fn is_initialized(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let handle = self.ensure_loaded().await?;
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || embed_sync(&handle.session, &handle.tokenizer, &texts))
            .await
            .map_err(|e| EngineError::Internal(format!("embedding task panicked: {e}")))?
    }
}

fn embed_sync(
    session: &Arc<Mutex<Session>>,
    tokenizer: &Arc<Tokenizer>,
    texts: &[String],
) -> Result<Vec<Vec<f32>>, EngineError> {
    let encodings: Vec<_> = texts
        .iter()
        .map(|t| {
            tokenizer
                .encode(t.as_str(), true)
                .map_err(|e| EngineError::Internal(format!("tokenization failed: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let batch_size = encodings.len();
    let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);

    if max_len == 0 {
        return Ok(vec![vec![0.0_f32; EMBEDDING_DIM]; batch_size]);
    }

    let mut input_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
    let mut attention_mask_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
    let mut token_type_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);

    for enc in &encodings {
        let ids = enc.get_ids();
        let mask = enc.get_attention_mask();
        let seq_len = ids.len();

        input_ids_flat.extend(ids.iter().map(|&id| id as i64));
        attention_mask_flat.extend(mask.iter().map(|&m| m as i64));
        token_type_ids_flat.extend(std::iter::repeat_n(0i64, seq_len));

        let pad_len = max_len - seq_len;
        input_ids_flat.extend(std::iter::repeat_n(0i64, pad_len));
        attention_mask_flat.extend(std::iter::repeat_n(0i64, pad_len));
        token_type_ids_flat.extend(std::iter::repeat_n(0i64, pad_len));
    }

    let shape = [batch_size as i64, max_len as i64];

    let input_ids_tensor = Tensor::from_array((shape, input_ids_flat))
        .map_err(|e| EngineError::Internal(format!("input_ids tensor: {e}")))?;
    let attention_mask_tensor = Tensor::from_array((shape, attention_mask_flat.clone()))
        .map_err(|e| EngineError::Internal(format!("attention_mask tensor: {e}")))?;
    let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids_flat))
        .map_err(|e| EngineError::Internal(format!("token_type_ids tensor: {e}")))?;

    // This runs inside `spawn_blocking`, so blocking on the session lock is
    // fine — and necessary: two concurrent `embed_batch` calls for
    // different uncached texts aren't deduplicated by the in-flight map
    // (different keys), so they legitimately race for the same session and
    // must queue rather than one of them failing outright.
    let mut session = session.blocking_lock();

    let outputs = session
        .run(ort::inputs! {
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor,
            "token_type_ids" => token_type_ids_tensor
        })
        .map_err(|e| EngineError::Internal(format!("embedding inference failed: {e}")))?;

    let mut embeddings = reshape_outputs(&outputs, batch_size, max_len, &attention_mask_flat)?;

    for v in &mut embeddings {
        l2_normalize(v);
    }

    debug!(batch_size, dim = EMBEDDING_DIM, "computed sentence embeddings");
    Ok(embeddings)
}

/// Dual-shape reshape: the model may return one packed `batch x seq x dim`
/// (or already-pooled `batch x dim`) tensor, or a list of `batch` per-item
/// tensors. Anything else is an `EmbeddingShapeMismatch`.
fn reshape_outputs(
    outputs: &ort::session::SessionOutputs,
    batch_size: usize,
    max_len: usize,
    attention_mask_flat: &[i64],
) -> Result<Vec<Vec<f32>>, EngineError> {
    if outputs.len() == 1 {
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EngineError::EmbeddingShapeMismatch(format!("could not extract output tensor: {e}")))?;

        match shape.len() {
            3 => {
                let (b, seq, dim) = (shape[0] as usize, shape[1] as usize, shape[2] as usize);
                if b != batch_size || dim != EMBEDDING_DIM {
                    return Err(EngineError::EmbeddingShapeMismatch(format!(
                        "expected [{batch_size}, seq, {EMBEDDING_DIM}], got {shape:?}"
                    )));
                }
                Ok(mean_pool_packed(data, attention_mask_flat, b, max_len, dim))
            }
            2 => {
                let (b, dim) = (shape[0] as usize, shape[1] as usize);
                if b != batch_size || dim != EMBEDDING_DIM {
                    return Err(EngineError::EmbeddingShapeMismatch(format!(
                        "expected [{batch_size}, {EMBEDDING_DIM}], got {shape:?}"
                    )));
                }
                Ok(data.chunks_exact(dim).map(|c| c.to_vec()).collect())
            }
            _ => Err(EngineError::EmbeddingShapeMismatch(format!("unsupported output rank {:?}", shape))),
        }
    } else if outputs.len() == batch_size {
        let mut vecs = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let (shape, data) = outputs[i]
                .try_extract_tensor::<f32>()
                .map_err(|e| EngineError::EmbeddingShapeMismatch(format!("item {i}: {e}")))?;

            let v = match shape.len() {
                1 if shape[0] as usize == EMBEDDING_DIM => data.to_vec(),
                2 => {
                    let (seq, dim) = (shape[0] as usize, shape[1] as usize);
                    if dim != EMBEDDING_DIM {
                        return Err(EngineError::EmbeddingShapeMismatch(format!(
                            "item {i}: expected dim {EMBEDDING_DIM}, got {dim}"
                        )));
                    }
                    let mask = &attention_mask_flat[i * max_len..i * max_len + seq.min(max_len)];
                    mean_pool_single(data, mask, seq.min(max_len), dim)
                }
                _ => {
                    return Err(EngineError::EmbeddingShapeMismatch(format!(
                        "item {i}: unsupported shape {:?}",
                        shape
                    )))
                }
            };
            vecs.push(v);
        }
        Ok(vecs)
    } else {
        Err(EngineError::EmbeddingShapeMismatch(format!(
            "expected 1 packed output or {batch_size} per-item outputs, got {}",
            outputs.len()
        )))
    }
}

fn mean_pool_packed(hidden: &[f32], attention_mask_flat: &[i64], batch: usize, max_len: usize, dim: usize) -> Vec<Vec<f32>> {
    let mut out = Vec::with_capacity(batch);
    for i in 0..batch {
        let mask = &attention_mask_flat[i * max_len..(i + 1) * max_len];
        let offset = i * max_len * dim;
        out.push(mean_pool_single(&hidden[offset..offset + max_len * dim], mask, max_len, dim));
    }
    out
}

fn mean_pool_single(hidden: &[f32], mask: &[i64], seq_len: usize, dim: usize) -> Vec<f32> {
    let mut sum = vec![0.0_f32; dim];
    let mut mask_sum = 0.0_f32;

    for j in 0..seq_len.min(mask.len()) {
        let m = mask[j] as f32;
        if m > 0.0 {
            mask_sum += m;
            let offset = j * dim;
            for k in 0..dim {
                sum[k] += hidden[offset + k] * m;
            }
        }
    }

    if mask_sum > 0.0 {
        for v in &mut sum {
            *v /= mask_sum;
        }
    }
    sum
}

fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
