// Indicator 4 — high-volume posting via z-score against the dataset's
// per-author post-count distribution. Stddev of 0 is treated as 1 to avoid
// a division error (spec §7 NumericUnderflow policy).

use crate::model::{DatasetStats, HighVolumeHit, IndicatorEvidence, Params, PostsByUser};

pub fn detect(
    posts_by_user: &PostsByUser,
    stats: &DatasetStats,
    params: &Params,
    evidence: &mut IndicatorEvidence,
) {
    let stddev = if stats.posts.stddev == 0.0 { 1.0 } else { stats.posts.stddev };

    for user in posts_by_user.users() {
        let count = posts_by_user.posts_of(user).len() as u32;
        if count < params.min_high_volume_posts {
            continue;
        }
        let zscore = (count as f64 - stats.posts.mean) / stddev;
        if zscore > params.zscore_threshold {
            evidence.high_volume.push(HighVolumeHit { user_id: user.clone(), zscore });
        }
    }
}
