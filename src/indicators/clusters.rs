// Indicator 10 — account-creation clusters. Runs the §4.1 clustering
// primitive with window = 86400s, min_size = params.cluster_size.

use crate::model::{IndicatorEvidence, Params, PostsByUser};
use crate::temporal::creation_clusters;

const CLUSTER_WINDOW_SECS: i64 = 86400;

pub fn detect(posts_by_user: &PostsByUser, params: &Params, evidence: &mut IndicatorEvidence) {
    let mut accounts: Vec<(String, i64)> = Vec::new();
    for author_id in posts_by_user.users() {
        if let Some(post) = posts_by_user.posts_of(author_id).first() {
            if let Some(created_at) = post.account_created_at {
                accounts.push((author_id.clone(), created_at));
            }
        }
    }

    let clusters = creation_clusters(&accounts, CLUSTER_WINDOW_SECS, params.cluster_size as usize);
    evidence.creation_clusters.extend(clusters);
}
