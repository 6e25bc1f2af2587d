// Indicator 9 — n-gram template captions. Builds author -> last-seen
// caption (length >= 20, later posts overwrite earlier ones by input
// order), then flags unordered author pairs whose 5-gram Jaccard clears
// params.ngram_threshold. Last-write-wins is the preserved contract per
// spec §9 — not per-post pairs.

use crate::model::{IndicatorEvidence, PairScore, Params, PostsByUser};
use crate::stats::ngram_jaccard;

const MIN_CAPTION_LEN: usize = 20;
const NGRAM_N: usize = 5;

pub fn detect(posts_by_user: &PostsByUser, params: &Params, evidence: &mut IndicatorEvidence) {
    let mut last_caption: Vec<(String, String)> = Vec::new();

    for author_id in posts_by_user.users() {
        let mut chosen: Option<String> = None;
        for post in posts_by_user.posts_of(author_id) {
            if post.caption.chars().count() >= MIN_CAPTION_LEN {
                chosen = Some(post.caption.clone());
            }
        }
        if let Some(caption) = chosen {
            last_caption.push((author_id.clone(), caption));
        }
    }

    for i in 0..last_caption.len() {
        for j in (i + 1)..last_caption.len() {
            let (u1, c1) = &last_caption[i];
            let (u2, c2) = &last_caption[j];
            let overlap = ngram_jaccard(c1, c2, NGRAM_N);
            if overlap >= params.ngram_threshold {
                evidence.template_pairs.push(PairScore { u1: u1.clone(), u2: u2.clone(), score: overlap });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Post;

    fn post(id: &str, author: &str, caption: &str) -> Post {
        Post {
            item_id: id.into(),
            author_id: author.into(),
            author_handle: String::new(),
            created_at: 0,
            account_created_at: None,
            caption: caption.into(),
            hashtags: Vec::new(),
        }
    }

    #[test]
    fn flags_template_caption_reuse() {
        let template = "join us this saturday for the big community rally downtown";
        let posts = vec![post("1", "a", template), post("2", "b", template)];
        let pbu = PostsByUser::build(&posts);
        let mut params = Params::default();
        params.ngram_threshold = 0.5;
        let mut evidence = IndicatorEvidence::default();
        detect(&pbu, &params, &mut evidence);
        assert_eq!(evidence.template_pairs.len(), 1);
    }

    #[test]
    fn last_write_wins_per_author() {
        let posts = vec![
            post("1", "a", "the first long enough caption about cats"),
            post("2", "a", "the second long enough caption about dogs"),
        ];
        let pbu = PostsByUser::build(&posts);
        let params = Params::default();
        let mut evidence = IndicatorEvidence::default();
        detect(&pbu, &params, &mut evidence);
        // Only one author -> no pairs regardless, but exercised for panic-freedom.
        assert!(evidence.template_pairs.is_empty());
    }
}
