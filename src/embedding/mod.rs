pub mod cache;
pub mod onnx;
pub mod traits;

pub use cache::EmbeddingService;
pub use onnx::OnnxSentenceEmbedder;
pub use traits::{EmbeddingBackend, EMBEDDING_DIM};

/// `cosine_similarity(a, b) = sum(a_i * b_i)` — valid without re-normalizing
/// because embedding vectors are already L2-unit.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| *x as f64 * *y as f64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_unit_vectors_is_symmetric() {
        let a = vec![0.6, 0.8, 0.0];
        let b = vec![0.0, 0.6, 0.8];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn cosine_of_identical_unit_vector_is_one() {
        let a = vec![1.0_f32, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_empty_is_zero() {
        let a: Vec<f32> = vec![];
        assert_eq!(cosine_similarity(&a, &a), 0.0);
    }
}
