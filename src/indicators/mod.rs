// The nine indicator detectors plus account-creation clustering, one
// module per detector per spec §4.3. `run_synchronous` runs every detector
// that needs no embedding service, in the fixed evidence-building order;
// the engine calls `semantic::detect` separately since it's async.

pub mod bursts;
pub mod clusters;
pub mod hashtags;
pub mod night;
pub mod rhythm;
pub mod semantic;
pub mod synchronized;
pub mod template;
pub mod usernames;
pub mod volume;

use crate::model::{DatasetStats, IndicatorEvidence, Params, PostsByUser, UserHashtagBag, UsernameIndex};

/// Runs indicators 1-7, 9, and 10 — everything except semantic similarity,
/// which requires the async embedding service and is invoked separately by
/// the engine, slotted into position 8 of the evidence order.
#[allow(clippy::too_many_arguments)]
pub fn run_synchronous(
    posts_by_user: &PostsByUser,
    hashtag_bag: &UserHashtagBag,
    username_index: &UsernameIndex,
    stats: &DatasetStats,
    params: &Params,
    time_window: i64,
    evidence: &mut IndicatorEvidence,
) {
    synchronized::detect(posts_by_user, params, time_window, evidence);
    hashtags::detect(posts_by_user, hashtag_bag, params, evidence);
    usernames::detect(username_index, params, evidence);
    volume::detect(posts_by_user, stats, params, evidence);
    bursts::detect(posts_by_user, params, time_window, evidence);
    rhythm::detect(posts_by_user, params, evidence);
    night::detect(posts_by_user, params, evidence);
    // semantic (8) runs separately — async, caller-driven
    template::detect(posts_by_user, params, evidence);
    clusters::detect(posts_by_user, params, evidence);
}
