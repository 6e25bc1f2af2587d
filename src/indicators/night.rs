// Indicator 7 — 24/7 activity: flag any author whose night-posting
// avg_max_gap is below params.night_gap.

use crate::model::{IndicatorEvidence, NightHit, Params, PostsByUser};
use crate::temporal::night_posting;

pub fn detect(posts_by_user: &PostsByUser, params: &Params, evidence: &mut IndicatorEvidence) {
    for user in posts_by_user.users() {
        let timestamps = posts_by_user.created_at_seq(user);
        if let Some(result) = night_posting(&timestamps, params.night_gap) {
            if result.suspicious {
                evidence.night_activity.push(NightHit { user_id: user.clone(), avg_max_gap: result.avg_max_gap });
            }
        }
    }
}
