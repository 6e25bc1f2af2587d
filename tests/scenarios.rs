// End-to-end scenario tests against the public `run` entry point — the
// six concrete scenarios from spec §8 (S1-S6), driven through the whole
// pipeline rather than a single indicator module. Mirrors the teacher's
// `tests/composition.rs` split: unit tests live next to the code they
// cover, composition tests here exercise how the modules chain together.

use std::sync::Arc;

use async_trait::async_trait;
use cindersweep::embedding::{EmbeddingBackend, EmbeddingService, EMBEDDING_DIM};
use cindersweep::error::EngineError;
use cindersweep::model::Post;
use cindersweep::progress::ProgressSender;
use cindersweep::{run, Params};

/// Deterministic token-hash embedder for integration tests — the crate's
/// own `MockEmbeddingBackend` lives behind `#[cfg(test)]` inside the lib,
/// which isn't visible to this external test binary, so scenario S6 gets
/// its own small stand-in here.
struct HashEmbeddingBackend;

fn fnv1a(bytes: &[u8]) -> u32 {
    let mut h: u32 = 2166136261;
    for &b in bytes {
        h ^= b as u32;
        h = h.wrapping_mul(16777619);
    }
    h
}

fn encode(text: &str) -> Vec<f32> {
    let mut v = vec![0.0_f32; EMBEDDING_DIM];
    for token in text.to_lowercase().split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
        let idx = (fnv1a(token.as_bytes()) as usize) % EMBEDDING_DIM;
        v[idx] += 1.0;
    }
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

#[async_trait]
impl EmbeddingBackend for HashEmbeddingBackend {
    fn is_initialized(&self) -> bool {
        true
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        Ok(texts.iter().map(|t| encode(t)).collect())
    }
}

fn post(id: &str, author: &str, handle: &str, created_at: i64) -> Post {
    Post {
        item_id: id.into(),
        author_id: author.into(),
        author_handle: handle.into(),
        created_at,
        account_created_at: None,
        caption: String::new(),
        hashtags: Vec::new(),
    }
}

fn test_embeddings() -> EmbeddingService {
    EmbeddingService::new(Arc::new(HashEmbeddingBackend))
}

#[tokio::test]
async fn s1_synchronized_pair() {
    let posts = vec![
        post("1", "a", "handle_a", 1000),
        post("2", "a", "handle_a", 1100),
        post("3", "a", "handle_a", 1200),
        post("4", "b", "handle_b", 1000),
        post("5", "b", "handle_b", 1100),
        post("6", "b", "handle_b", 1200),
    ];
    let mut params = Params::default();
    params.min_sync_posts = 3;
    params.semantic_enabled = false;

    let embeddings = test_embeddings();
    let (progress, _rx) = ProgressSender::channel(16);
    let report = run(&posts, &params, 60, &embeddings, &progress).await.unwrap();

    assert!(report.suspicious_users.contains("a"));
    assert!(report.suspicious_users.contains("b"));
    assert_eq!(report.indicators.synchronized, 1);
    assert!(*report.user_scores.get("a").unwrap() >= 25);
    assert!(*report.user_scores.get("b").unwrap() >= 25);
}

#[tokio::test]
async fn s2_burst_and_rhythm_cross_amplification() {
    // One author posting at a perfectly regular 100s interval for 6 posts:
    // the first 5 fall inside a 500s burst window AND the whole sequence
    // is perfectly regular, so both indicators fire for the same author.
    let mut posts = Vec::new();
    for i in 0..6i64 {
        posts.push(post(&i.to_string(), "a", "handle_a", i * 100));
    }
    let mut params = Params::default();
    params.burst_posts = 5;
    params.rhythm_cv = 0.1;
    params.cross_multiplier = 0.3;
    params.semantic_enabled = false;

    let embeddings = test_embeddings();
    let (progress, _rx) = ProgressSender::channel(16);
    let report = run(&posts, &params, 500, &embeddings, &progress).await.unwrap();

    assert!(report.suspicious_users.contains("a"));
    let reasons = report.user_reasons.get("a").unwrap();
    assert!(reasons.iter().any(|r| r.contains("burst")));
    assert!(reasons.iter().any(|r| r.contains("regular")));
}

#[tokio::test]
async fn s3_username_and_creation_cluster_bonus() {
    let mut posts = vec![
        post("1", "a", "account_x1", 0),
        post("2", "b", "account_x2", 0),
        post("3", "c", "account_x3", 0),
    ];
    for (author, offset) in [("a", 0), ("x", 100), ("y", 200), ("z", 300), ("w", 400)] {
        let mut p = post(&format!("cc-{author}"), author, &format!("handle_{author}"), 0);
        p.account_created_at = Some(offset);
        posts.push(p);
    }

    let mut params = Params::default();
    params.username_threshold = 0.8;
    params.min_username_group_size = 2;
    params.cluster_size = 5;
    params.cross_multiplier = 0.3;
    params.semantic_enabled = false;

    let embeddings = test_embeddings();
    let (progress, _rx) = ProgressSender::channel(16);
    let report = run(&posts, &params, 60, &embeddings, &progress).await.unwrap();

    assert!(report.suspicious_users.contains("a"));
    let reasons = report.user_reasons.get("a").unwrap();
    assert!(reasons.iter().any(|r| r.contains("Similar username")));
    assert!(reasons.iter().any(|r| r.contains("created with")));
}

#[tokio::test]
async fn s4_rare_hashtag_combination() {
    let mut posts: Vec<Post> = (0..100)
        .map(|i| {
            let mut p = post(&i.to_string(), &format!("user{i}"), &format!("handle{i}"), 0);
            p.hashtags = vec!["x".to_string()];
            p
        })
        .collect();
    let mut u1 = post("u1", "u1", "handle_u1", 0);
    u1.hashtags = vec!["y".to_string(), "z".to_string()];
    let mut u2 = post("u2", "u2", "handle_u2", 0);
    u2.hashtags = vec!["y".to_string(), "z".to_string()];
    posts.push(u1);
    posts.push(u2);

    let mut params = Params::default();
    params.tfidf_threshold = 0.01;
    params.min_hashtag_group_size = 2;
    params.semantic_enabled = false;

    let embeddings = test_embeddings();
    let (progress, _rx) = ProgressSender::channel(16);
    let report = run(&posts, &params, 60, &embeddings, &progress).await.unwrap();

    assert_eq!(report.indicators.identical_hashtags, 2);
    assert!(report.suspicious_users.contains("u1"));
    assert!(report.suspicious_users.contains("u2"));
}

#[tokio::test]
async fn s5_night_posting_pattern() {
    let mut posts = Vec::new();
    let mut t = 0i64;
    for i in 0..(96 * 3) {
        posts.push(post(&i.to_string(), "a", "handle_a", t));
        t += 900;
    }
    let mut params = Params::default();
    params.night_gap = 7200;
    params.semantic_enabled = false;

    let embeddings = test_embeddings();
    let (progress, _rx) = ProgressSender::channel(16);
    let report = run(&posts, &params, 60, &embeddings, &progress).await.unwrap();

    assert!(report.suspicious_users.contains("a"));
    assert!(report.user_reasons.get("a").unwrap().iter().any(|r| r.contains("24/7")));
}

#[tokio::test]
async fn s6_semantic_duplicate_captions() {
    let mut p1 = post("1", "a", "handle_a", 0);
    p1.caption = "The election results are clearly rigged against the people".to_string();
    let mut p2 = post("2", "b", "handle_b", 0);
    p2.caption = "The election results are clearly rigged against the people".to_string();

    let mut params = Params::default();
    params.semantic_enabled = true;
    params.semantic_threshold = 0.99;

    let embeddings = test_embeddings();
    let (progress, _rx) = ProgressSender::channel(16);
    let report = run(&[p1, p2], &params, 60, &embeddings, &progress).await.unwrap();

    assert_eq!(report.indicators.semantic_duplicates, 1);
    assert!(report.suspicious_users.contains("a"));
    assert!(report.suspicious_users.contains("b"));
}

#[tokio::test]
async fn empty_input_yields_empty_report_and_no_panics() {
    let params = Params::default();
    let embeddings = test_embeddings();
    let (progress, _rx) = ProgressSender::channel(16);
    let report = run(&[], &params, 60, &embeddings, &progress).await.unwrap();

    assert!(report.suspicious_users.is_empty());
    assert_eq!(report.indicators.synchronized, 0);
}

#[tokio::test]
async fn invalid_params_is_rejected_before_any_work() {
    let mut params = Params::default();
    params.min_sync_posts = 0;

    let embeddings = test_embeddings();
    let (progress, _rx) = ProgressSender::channel(16);
    let result = run(&[], &params, 60, &embeddings, &progress).await;
    assert!(result.is_err());
}
