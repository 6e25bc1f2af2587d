// Indicator 3 — similar usernames via Levenshtein similarity over all
// unordered handle pairs (both handles length >= 4, enforced by
// UsernameIndex at construction).

use indexmap::{IndexMap, IndexSet};

use crate::model::{IndicatorEvidence, Params, UsernameIndex, UsernameGroup};
use crate::stats::levenshtein_similarity;

fn sorted_pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}|{b}")
    } else {
        format!("{b}|{a}")
    }
}

pub fn detect(username_index: &UsernameIndex, params: &Params, evidence: &mut IndicatorEvidence) {
    let handles: Vec<(&String, &String)> = username_index.iter().collect();
    let mut buckets: IndexMap<String, IndexSet<String>> = IndexMap::new();

    for i in 0..handles.len() {
        for j in (i + 1)..handles.len() {
            let (id_a, handle_a) = handles[i];
            let (id_b, handle_b) = handles[j];
            let sim = levenshtein_similarity(handle_a, handle_b);
            if sim >= params.username_threshold {
                let key = sorted_pair_key(handle_a, handle_b);
                let bucket = buckets.entry(key).or_default();
                bucket.insert(id_a.clone());
                bucket.insert(id_b.clone());
            }
        }
    }

    // Sort by key before emitting groups, same reasoning as the hashtag
    // indicator: pins group order to the canonical handle-pair key rather
    // than to bucket-creation order, keeping a multi-group author's
    // partner-list order stable across runs.
    let mut groups: Vec<(String, IndexSet<String>)> = buckets.into_iter().collect();
    groups.sort_by(|a, b| a.0.cmp(&b.0));

    for (key, users) in groups {
        if users.len() as u32 >= params.min_username_group_size {
            evidence.username_groups.push(UsernameGroup { key, users });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Post;

    fn post(id: &str, author: &str, handle: &str) -> Post {
        Post {
            item_id: id.into(),
            author_id: author.into(),
            author_handle: handle.into(),
            created_at: 0,
            account_created_at: None,
            caption: String::new(),
            hashtags: Vec::new(),
        }
    }

    #[test]
    fn flags_near_identical_handles() {
        let posts = vec![
            post("1", "a", "account_x1"),
            post("2", "b", "account_x2"),
            post("3", "c", "account_x3"),
        ];
        let idx = UsernameIndex::build(&posts);
        let mut params = Params::default();
        params.username_threshold = 0.8;
        params.min_username_group_size = 2;
        let mut evidence = IndicatorEvidence::default();
        detect(&idx, &params, &mut evidence);
        assert!(!evidence.username_groups.is_empty());
    }

    #[test]
    fn short_handles_excluded_by_index() {
        let posts = vec![post("1", "a", "abc"), post("2", "b", "abd")];
        let idx = UsernameIndex::build(&posts);
        let mut params = Params::default();
        params.username_threshold = 0.5;
        params.min_username_group_size = 2;
        let mut evidence = IndicatorEvidence::default();
        detect(&idx, &params, &mut evidence);
        assert!(evidence.username_groups.is_empty());
    }
}
