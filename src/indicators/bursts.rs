// Indicator 5 — temporal bursts: run the §4.1 burst detector per author
// with window = time_window, min_posts = params.burst_posts.

use crate::model::{Burst, IndicatorEvidence, Params, PostsByUser};
use crate::temporal::detect_bursts;

pub fn detect(
    posts_by_user: &PostsByUser,
    params: &Params,
    time_window: i64,
    evidence: &mut IndicatorEvidence,
) {
    for user in posts_by_user.users() {
        let timestamps = posts_by_user.created_at_seq(user);
        for burst in detect_bursts(&timestamps, time_window, params.burst_posts as usize) {
            evidence.bursts.push(Burst {
                user_id: user.clone(),
                window_start: burst.window_start,
                count: burst.count,
            });
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
    fn flags_author_with_burst() {
        let posts = vec![
            post("1", "a", 0),
            post("2", "a", 10),
            post("3", "a", 20),
            post("4", "a", 30),
            post("5", "a", 40),
        ];
        let pbu = PostsByUser::build(&posts);
        let mut params = Params::default();
        params.burst_posts = 5;
        let mut evidence = IndicatorEvidence::default();
        detect(&pbu, &params, 50, &mut evidence);
        assert_eq!(evidence.bursts.len(), 1);
        assert_eq!(evidence.bursts[0].user_id, "a");
    }
}
