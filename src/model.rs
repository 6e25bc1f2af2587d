// Core data model: the input Post, the Params configuration surface, the
// read-only indexes the engine builds once, and the Report it produces.
//
// Indexing is eager and skip-silent: a post missing author_id or created_at
// is dropped during indexing rather than aborting the run (see error.rs's
// module doc — InvalidPost is a per-item policy, not a terminal error).

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// A single post as handed to the engine. Immutable once built; the engine
/// must not mutate the input collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub item_id: String,
    pub author_id: String,
    #[serde(default)]
    pub author_handle: String,
    pub created_at: i64,
    #[serde(default)]
    pub account_created_at: Option<i64>,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// Loosely-typed record as it might arrive from an ingestion layer, before
/// the strict `Post` invariants are checked. Fields that fail validation
/// cause the whole record to be dropped during indexing.
#[derive(Debug, Clone, Default)]
pub struct RawPost {
    pub item_id: String,
    pub author_id: Option<String>,
    pub author_handle: String,
    pub created_at: Option<i64>,
    pub account_created_at: Option<i64>,
    pub caption: String,
    pub hashtags: Vec<String>,
}

impl RawPost {
    /// Parse into a strict `Post`, or `None` if `author_id`/`created_at` are
    /// missing (§7 `InvalidPost` — skip silently).
    pub fn into_post(self) -> Option<Post> {
        let author_id = self.author_id?;
        let created_at = self.created_at?;
        Some(Post {
            item_id: self.item_id,
            author_id,
            author_handle: self.author_handle,
            created_at,
            account_created_at: self.account_created_at,
            caption: self.caption,
            hashtags: self.hashtags,
        })
    }
}

/// Tunable thresholds for the nine indicators and the cross-amplification
/// step. Constructed directly by the caller — there is no environment,
/// file, or CLI layer in this crate's scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    pub min_sync_posts: u32,
    pub tfidf_threshold: f64,
    pub min_hashtag_group_size: u32,
    pub username_threshold: f64,
    pub min_username_group_size: u32,
    pub min_high_volume_posts: u32,
    pub zscore_threshold: f64,
    pub burst_posts: u32,
    pub rhythm_cv: f64,
    pub night_gap: i64,
    pub semantic_enabled: bool,
    pub semantic_threshold: f64,
    pub ngram_threshold: f64,
    pub cluster_size: u32,
    pub cross_multiplier: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            min_sync_posts: 3,
            tfidf_threshold: 0.5,
            min_hashtag_group_size: 2,
            username_threshold: 0.85,
            min_username_group_size: 2,
            min_high_volume_posts: 5,
            zscore_threshold: 2.0,
            burst_posts: 5,
            rhythm_cv: 0.15,
            night_gap: 7200,
            semantic_enabled: true,
            semantic_threshold: 0.85,
            ngram_threshold: 0.6,
            cluster_size: 3,
            cross_multiplier: 0.3,
        }
    }
}

/// Error describing why a `Params` value was rejected.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid params: {0}")]
pub struct ParamsError(pub String);

impl Params {
    /// Validate the recognized-options constraints from spec §6
    /// (`minSyncPosts >= 1`, group sizes `>= 2`, thresholds in `[0,1]` where
    /// the spec calls for a ratio, etc). Rejected at construction time
    /// rather than letting the pipeline misbehave mid-run.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.min_sync_posts < 1 {
            return Err(ParamsError("min_sync_posts must be >= 1".into()));
        }
        if self.min_hashtag_group_size < 2 {
            return Err(ParamsError("min_hashtag_group_size must be >= 2".into()));
        }
        if !(0.0..=1.0).contains(&self.username_threshold) {
            return Err(ParamsError("username_threshold must be in [0,1]".into()));
        }
        if self.min_username_group_size < 2 {
            return Err(ParamsError("min_username_group_size must be >= 2".into()));
        }
        if self.min_high_volume_posts < 1 {
            return Err(ParamsError("min_high_volume_posts must be >= 1".into()));
        }
        if self.burst_posts < 2 {
            return Err(ParamsError("burst_posts must be >= 2".into()));
        }
        if self.rhythm_cv <= 0.0 {
            return Err(ParamsError("rhythm_cv must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.semantic_threshold) {
            return Err(ParamsError("semantic_threshold must be in [0,1]".into()));
        }
        if !(0.0..=1.0).contains(&self.ngram_threshold) {
            return Err(ParamsError("ngram_threshold must be in [0,1]".into()));
        }
        if self.cluster_size < 2 {
            return Err(ParamsError("cluster_size must be >= 2".into()));
        }
        if self.cross_multiplier < 0.0 {
            return Err(ParamsError("cross_multiplier must be >= 0".into()));
        }
        Ok(())
    }
}

/// Mapping from `author_id` to the author's posts, ordered as they appear
/// in the input. Built once; read-only thereafter.
///
/// Backed by `IndexMap` rather than `HashMap`: author iteration order here
/// feeds directly into partner-list ordering inside reason strings
/// downstream (§4.4), and the engine must be deterministic given identical
/// input (§1, §8) — std's randomized per-instance hasher cannot guarantee
/// that across repeated runs.
#[derive(Debug, Default)]
pub struct PostsByUser {
    inner: IndexMap<String, Vec<Post>>,
}

impl PostsByUser {
    pub fn build(posts: &[Post]) -> Self {
        let mut inner: IndexMap<String, Vec<Post>> = IndexMap::new();
        for post in posts {
            inner.entry(post.author_id.clone()).or_default().push(post.clone());
        }
        Self { inner }
    }

    pub fn users(&self) -> impl Iterator<Item = &String> {
        self.inner.keys()
    }

    pub fn posts_of(&self, author_id: &str) -> &[Post] {
        self.inner.get(author_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn created_at_seq(&self, author_id: &str) -> Vec<i64> {
        self.posts_of(author_id).iter().map(|p| p.created_at).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<Post>)> {
        self.inner.iter()
    }
}

/// Mapping from `author_id` to the multiset (insertion-ordered sequence) of
/// hashtags the author used across all their posts.
#[derive(Debug, Default)]
pub struct UserHashtagBag {
    inner: IndexMap<String, Vec<String>>,
}

impl UserHashtagBag {
    pub fn build(posts_by_user: &PostsByUser) -> Self {
        let mut inner: IndexMap<String, Vec<String>> = IndexMap::new();
        for (author_id, posts) in posts_by_user.iter() {
            let bag = inner.entry(author_id.clone()).or_default();
            for post in posts {
                bag.extend(post.hashtags.iter().cloned());
            }
        }
        Self { inner }
    }

    pub fn bag_of(&self, author_id: &str) -> &[String] {
        self.inner.get(author_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn as_set(&self, author_id: &str) -> HashSet<&str> {
        self.bag_of(author_id).iter().map(String::as_str).collect()
    }

    pub fn all_bags(&self) -> impl Iterator<Item = &Vec<String>> {
        self.inner.values()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

/// Mapping from `author_id` to handle, restricted to handles of length >= 4.
#[derive(Debug, Default)]
pub struct UsernameIndex {
    inner: IndexMap<String, String>,
}

impl UsernameIndex {
    pub fn build(posts: &[Post]) -> Self {
        let mut inner = IndexMap::new();
        for post in posts {
            if post.author_handle.chars().count() >= 4 {
                inner.entry(post.author_id.clone()).or_insert_with(|| post.author_handle.clone());
            }
        }
        Self { inner }
    }

    pub fn handle_of(&self, author_id: &str) -> Option<&str> {
        self.inner.get(author_id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.inner.iter()
    }
}

/// `{mean, stddev}` for a single distribution, population form.
#[derive(Debug, Clone, Copy, Default)]
pub struct Distribution {
    pub mean: f64,
    pub stddev: f64,
}

impl Distribution {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Self { mean, stddev: variance.sqrt() }
    }
}

/// Dataset-wide statistics over per-author post count and hashtag count.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetStats {
    pub posts: Distribution,
    pub hashtags: Distribution,
}

impl DatasetStats {
    pub fn compute(posts_by_user: &PostsByUser, hashtag_bag: &UserHashtagBag) -> Self {
        let post_counts: Vec<f64> =
            posts_by_user.users().map(|u| posts_by_user.posts_of(u).len() as f64).collect();
        let hashtag_counts: Vec<f64> =
            posts_by_user.users().map(|u| hashtag_bag.bag_of(u).len() as f64).collect();
        Self {
            posts: Distribution::from_samples(&post_counts),
            hashtags: Distribution::from_samples(&hashtag_counts),
        }
    }
}

/// Evidence accumulated by the indicator detectors, in the fixed order of
/// spec §4.3. Consumed by the score aggregator.
#[derive(Debug, Default)]
pub struct IndicatorEvidence {
    pub synch_pairs: Vec<SyncPair>,
    pub hashtag_groups: Vec<HashtagGroup>,
    pub username_groups: Vec<UsernameGroup>,
    pub high_volume: Vec<HighVolumeHit>,
    pub bursts: Vec<Burst>,
    pub regular_rhythm: Vec<RhythmHit>,
    pub night_activity: Vec<NightHit>,
    pub semantic_pairs: Vec<PairScore>,
    pub template_pairs: Vec<PairScore>,
    pub creation_clusters: Vec<HashSet<String>>,
}

#[derive(Debug, Clone)]
pub struct SyncPair {
    pub u1: String,
    pub u2: String,
    pub sync_count: u32,
}

// `users` is an `IndexSet` rather than a `HashSet`: the §4.4 reason
// strings list up to five partners "in insertion order", and the partner
// list's first five (and their relative order) must be stable across runs
// on identical input.
#[derive(Debug, Clone)]
pub struct HashtagGroup {
    pub key: String,
    pub users: IndexSet<String>,
}

#[derive(Debug, Clone)]
pub struct UsernameGroup {
    pub key: String,
    pub users: IndexSet<String>,
}

#[derive(Debug, Clone)]
pub struct HighVolumeHit {
    pub user_id: String,
    pub zscore: f64,
}

#[derive(Debug, Clone)]
pub struct Burst {
    pub user_id: String,
    pub window_start: i64,
    pub count: u32,
}

#[derive(Debug, Clone)]
pub struct RhythmHit {
    pub user_id: String,
    pub cv: f64,
}

#[derive(Debug, Clone)]
pub struct NightHit {
    pub user_id: String,
    pub avg_max_gap: f64,
}

#[derive(Debug, Clone)]
pub struct PairScore {
    pub u1: String,
    pub u2: String,
    pub score: f64,
}

/// Final result handed back to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub suspicious_users: HashSet<String>,
    pub indicators: IndicatorCounters,
    pub user_scores: HashMap<String, u32>,
    pub user_reasons: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorCounters {
    pub synchronized: u32,
    pub identical_hashtags: u32,
    pub similar_usernames: u32,
    pub high_volume: u32,
    pub temporal_bursts: u32,
    pub semantic_duplicates: u32,
    pub template_captions: u32,
    pub duplicate_captions: u32,
    pub account_creation_clusters: u32,
}
