// Indicator 8 — semantic caption similarity. Only runs when
// params.semantic_enabled. Selects posts with caption length >= 20,
// embeds them via the embedding service, and flags every pair whose
// cosine similarity clears params.semantic_threshold.

use crate::embedding::{cosine_similarity, EmbeddingService};
use crate::error::EngineError;
use crate::model::{IndicatorEvidence, PairScore, Params, PostsByUser};
use crate::progress::ProgressSender;

const MIN_CAPTION_LEN: usize = 20;

pub async fn detect(
    posts_by_user: &PostsByUser,
    params: &Params,
    embeddings: &EmbeddingService,
    progress: &ProgressSender,
    evidence: &mut IndicatorEvidence,
) -> Result<(), EngineError> {
    if !params.semantic_enabled {
        return Ok(());
    }

    // One entry per eligible post, author attached, in iteration order.
    let mut authors: Vec<String> = Vec::new();
    let mut captions: Vec<String> = Vec::new();
    for author_id in posts_by_user.users() {
        for post in posts_by_user.posts_of(author_id) {
            if post.caption.chars().count() >= MIN_CAPTION_LEN {
                authors.push(author_id.clone());
                captions.push(post.caption.clone());
            }
        }
    }

    if captions.is_empty() {
        return Ok(());
    }

    progress.stage_start("semantic_duplicates").await;
    let vectors = embeddings.embed_batch(&captions, progress).await?;
    progress.stage_done("semantic_duplicates", captions.len() as u64).await;

    for i in 0..vectors.len() {
        for j in (i + 1)..vectors.len() {
            let sim = cosine_similarity(&vectors[i], &vectors[j]);
            if sim >= params.semantic_threshold {
                evidence.semantic_pairs.push(PairScore {
                    u1: authors[i].clone(),
                    u2: authors[j].clone(),
                    score: sim,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cache::mock::MockEmbeddingBackend;
    use crate::model::Post;
    use std::sync::Arc;

    fn post(id: &str, author: &str, caption: &str) -> Post {
        Post {
            item_id: id.into(),
            author_id: author.into(),
            author_handle: String::new(),
            created_at: 0,
            account_created_at: None,
            caption: caption.into(),
            hashtags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn flags_near_identical_captions() {
        let posts = vec![
            post("1", "a", "the election results are clearly rigged against the people"),
            post("2", "b", "the election results are clearly rigged against the people"),
        ];
        let pbu = PostsByUser::build(&posts);
        let mut params = Params::default();
        params.semantic_enabled = true;
        params.semantic_threshold = 0.99;

        let service = EmbeddingService::new(Arc::new(MockEmbeddingBackend::default()));
        let (progress, _rx) = ProgressSender::channel(16);
        let mut evidence = IndicatorEvidence::default();

        detect(&pbu, &params, &service, &progress, &mut evidence).await.unwrap();
        assert_eq!(evidence.semantic_pairs.len(), 1);
    }

    #[tokio::test]
    async fn disabled_flag_skips_entirely() {
        let posts = vec![post("1", "a", "x".repeat(30).as_str()), post("2", "b", "x".repeat(30).as_str())];
        let pbu = PostsByUser::build(&posts);
        let mut params = Params::default();
        params.semantic_enabled = false;

        let service = EmbeddingService::new(Arc::new(MockEmbeddingBackend::default()));
        let (progress, _rx) = ProgressSender::channel(16);
        let mut evidence = IndicatorEvidence::default();

        detect(&pbu, &params, &service, &progress, &mut evidence).await.unwrap();
        assert!(evidence.semantic_pairs.is_empty());
    }

    #[tokio::test]
    async fn short_captions_excluded() {
        let posts = vec![post("1", "a", "too short"), post("2", "b", "too short")];
        let pbu = PostsByUser::build(&posts);
        let mut params = Params::default();
        params.semantic_enabled = true;

        let service = EmbeddingService::new(Arc::new(MockEmbeddingBackend::default()));
        let (progress, _rx) = ProgressSender::channel(16);
        let mut evidence = IndicatorEvidence::default();

        detect(&pbu, &params, &service, &progress, &mut evidence).await.unwrap();
        assert!(evidence.semantic_pairs.is_empty());
    }
}
