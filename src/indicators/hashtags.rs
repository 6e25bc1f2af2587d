// Indicator 2 — rare hashtag combinations via TF-IDF.

use indexmap::{IndexMap, IndexSet};

use crate::model::{HashtagGroup, IndicatorEvidence, Params, PostsByUser, UserHashtagBag};
use crate::stats::mean_tfidf;

fn canonical_key(hashtags: &[String]) -> String {
    let mut distinct: Vec<String> = hashtags.iter().cloned().collect::<std::collections::HashSet<_>>().into_iter().collect();
    distinct.sort();
    distinct.join(",")
}

pub fn detect(
    posts_by_user: &PostsByUser,
    hashtag_bag: &UserHashtagBag,
    params: &Params,
    evidence: &mut IndicatorEvidence,
) {
    let all_bags: Vec<Vec<String>> = hashtag_bag.all_bags().cloned().collect();

    let mut buckets: IndexMap<String, IndexSet<String>> = IndexMap::new();

    for author_id in posts_by_user.users() {
        let user_bag = hashtag_bag.bag_of(author_id).to_vec();
        for post in posts_by_user.posts_of(author_id) {
            if post.hashtags.is_empty() {
                continue;
            }
            let mean = mean_tfidf(&post.hashtags, &user_bag, &all_bags);
            if mean > params.tfidf_threshold {
                let key = canonical_key(&post.hashtags);
                buckets.entry(key).or_default().insert(author_id.clone());
            }
        }
    }

    // Sort by key before emitting groups: `buckets`' own iteration order
    // already follows insertion (via `IndexMap`), but sorting pins the
    // group order to the canonical key itself rather than to whichever
    // post happened to trigger the bucket first, so the order in which an
    // author's multiple group memberships are folded into their partner
    // list downstream stays stable across runs.
    let mut groups: Vec<(String, IndexSet<String>)> = buckets.into_iter().collect();
    groups.sort_by(|a, b| a.0.cmp(&b.0));

    for (key, users) in groups {
        if users.len() as u32 >= params.min_hashtag_group_size {
            evidence.hashtag_groups.push(HashtagGroup { key, users });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Post;

    fn post_with_hashtags(id: &str, author: &str, hashtags: &[&str]) -> Post {
        Post {
            item_id: id.into(),
            author_id: author.into(),
            author_handle: String::new(),
            created_at: 0,
            account_created_at: None,
            caption: String::new(),
            hashtags: hashtags.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn flags_shared_rare_hashtag_set() {
        // S4: 100 users share "x"; two users also share {y,z}.
        let mut posts: Vec<Post> = (0..100)
            .map(|i| post_with_hashtags(&i.to_string(), &format!("user{i}"), &["x"]))
            .collect();
        posts.push(post_with_hashtags("u1", "u1", &["y", "z"]));
        posts.push(post_with_hashtags("u2", "u2", &["y", "z"]));

        let pbu = PostsByUser::build(&posts);
        let bag = UserHashtagBag::build(&pbu);
        let mut params = Params::default();
        params.tfidf_threshold = 0.01;
        params.min_hashtag_group_size = 2;

        let mut evidence = IndicatorEvidence::default();
        detect(&pbu, &bag, &params, &mut evidence);

        assert!(evidence.hashtag_groups.iter().any(|g| g.key == "y,z" && g.users.len() == 2));
    }

    #[test]
    fn posts_without_hashtags_are_ignored() {
        let posts = vec![post_with_hashtags("1", "a", &[])];
        let pbu = PostsByUser::build(&posts);
        let bag = UserHashtagBag::build(&pbu);
        let params = Params::default();
        let mut evidence = IndicatorEvidence::default();
        detect(&pbu, &bag, &params, &mut evidence);
        assert!(evidence.hashtag_groups.is_empty());
    }
}
