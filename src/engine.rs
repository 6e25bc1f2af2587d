// Orchestrator — wires the indexes, the dataset statistics, the ten
// indicator detectors and the score aggregator into one `run` entry point.
// Grounded on the teacher's `pipeline/sweep.rs` top-level sweep function:
// build indexes once, run detectors in a fixed order, emit progress at
// phase boundaries, return one assembled result.

use tracing::info;

use crate::embedding::EmbeddingService;
use crate::error::EngineError;
use crate::indicators;
use crate::model::{DatasetStats, Params, Post, PostsByUser, Report, UserHashtagBag, UsernameIndex};
use crate::progress::ProgressSender;
use crate::scoring;

/// Run the full detection pipeline over `posts`, reporting progress on
/// `progress`. `time_window` is the synchronized-posting / burst-detection
/// window in seconds (spec §4.1/§4.3; not one of the tunable `Params`
/// thresholds because it doubles as the bucketing granularity).
pub async fn run(
    posts: &[Post],
    params: &Params,
    time_window: i64,
    embeddings: &EmbeddingService,
    progress: &ProgressSender,
) -> Result<Report, EngineError> {
    params.validate().map_err(|e| EngineError::Internal(e.to_string()))?;
    info!(posts = posts.len(), time_window, "starting CIB detection run");

    progress.stage_start("indexing").await;
    let posts_by_user = PostsByUser::build(posts);
    let hashtag_bag = UserHashtagBag::build(&posts_by_user);
    let username_index = UsernameIndex::build(posts);
    let stats = DatasetStats::compute(&posts_by_user, &hashtag_bag);
    progress.stage_done("indexing", posts_by_user.len() as u64).await;
    info!(authors = posts_by_user.len(), "indexed posts by author");

    progress.stage_start("indicators").await;
    let mut evidence = Default::default();
    indicators::run_synchronous(
        &posts_by_user,
        &hashtag_bag,
        &username_index,
        &stats,
        params,
        time_window,
        &mut evidence,
    );
    progress.stage_done("indicators", posts_by_user.len() as u64).await;
    info!(
        synchronized = evidence.synch_pairs.len(),
        bursts = evidence.bursts.len(),
        clusters = evidence.creation_clusters.len(),
        "synchronous indicators complete"
    );

    indicators::semantic::detect(&posts_by_user, params, embeddings, progress, &mut evidence).await?;
    info!(semantic_pairs = evidence.semantic_pairs.len(), "semantic indicator complete");

    progress.stage_start("scoring").await;
    let mut report = scoring::aggregate(&evidence, &username_index, params, time_window);
    report.indicators = count_indicators(&evidence);
    progress.stage_done("scoring", report.suspicious_users.len() as u64).await;
    info!(suspicious = report.suspicious_users.len(), "CIB detection run complete");

    Ok(report)
}

fn count_indicators(evidence: &crate::model::IndicatorEvidence) -> crate::model::IndicatorCounters {
    use std::collections::HashSet;

    let mut seen_hashtag_users: HashSet<&str> = HashSet::new();
    for group in &evidence.hashtag_groups {
        seen_hashtag_users.extend(group.users.iter().map(String::as_str));
    }

    let mut seen_username_users: HashSet<&str> = HashSet::new();
    for group in &evidence.username_groups {
        seen_username_users.extend(group.users.iter().map(String::as_str));
    }

    crate::model::IndicatorCounters {
        synchronized: evidence.synch_pairs.len() as u32,
        identical_hashtags: seen_hashtag_users.len() as u32,
        similar_usernames: seen_username_users.len() as u32,
        high_volume: evidence.high_volume.len() as u32,
        temporal_bursts: evidence.bursts.len() as u32,
        semantic_duplicates: evidence.semantic_pairs.len() as u32,
        template_captions: evidence.template_pairs.len() as u32,
        duplicate_captions: (evidence.semantic_pairs.len() + evidence.template_pairs.len()) as u32,
        account_creation_clusters: evidence.creation_clusters.len() as u32,
    }
}
