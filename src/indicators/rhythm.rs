// Indicator 6 — regular rhythm: flag any author whose posting-rhythm CV is
// below params.rhythm_cv.

use crate::model::{IndicatorEvidence, Params, PostsByUser, RhythmHit};
use crate::temporal::posting_rhythm;

pub fn detect(posts_by_user: &PostsByUser, params: &Params, evidence: &mut IndicatorEvidence) {
    for user in posts_by_user.users() {
        let timestamps = posts_by_user.created_at_seq(user);
        if let Some(result) = posting_rhythm(&timestamps, params.rhythm_cv) {
            if result.regular {
                evidence.regular_rhythm.push(RhythmHit { user_id: user.clone(), cv: result.cv });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Post;

    fn post(id: &str, author: &str, created_at: i64) -> Post {
        Post {
            item_id: id.into(),
            author_id: author.into(),
            author_handle: String::new(),
            created_at,
            account_created_at: None,
            caption: String::new(),
            hashtags: Vec::new(),
        }
    }

    #[test]
    fn flags_metronomic_poster() {
        let posts: Vec<Post> = (0..6).map(|i| post(&i.to_string(), "a", i * 100)).collect();
        let pbu = PostsByUser::build(&posts);
        let mut params = Params::default();
        params.rhythm_cv = 0.1;
        let mut evidence = IndicatorEvidence::default();
        detect(&pbu, &params, &mut evidence);
        assert_eq!(evidence.regular_rhythm.len(), 1);
    }
}
