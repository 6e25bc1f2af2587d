// Score aggregator — spec §4.4. Walks the evidence in the fixed indicator
// order, accumulating points and reason strings per author, then applies
// the three-step cross-amplification. Point table and amplification
// formula style grounded on the teacher's `scoring/threat.rs`
// (gate+multiplicative combination) generalized from a two-signal formula
// to an N-reason one.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;

use crate::model::{IndicatorEvidence, Params, Report, UsernameIndex};

use super::partners::{format_partner_list, resolve_handle};

const POINTS_SYNCHRONIZED: f64 = 25.0;
const POINTS_RARE_HASHTAGS: f64 = 20.0;
const POINTS_SIMILAR_USERNAME: f64 = 10.0;
const POINTS_HIGH_VOLUME: f64 = 15.0;
const POINTS_BURST: f64 = 15.0;
const POINTS_REGULAR_RHYTHM: f64 = 20.0;
const POINTS_NIGHT: f64 = 25.0;
const POINTS_SEMANTIC: f64 = 25.0;
const POINTS_TEMPLATE: f64 = 20.0;
const POINTS_CREATION_CLUSTER: f64 = 30.0;

struct Accumulator {
    points: HashMap<String, f64>,
    reasons: HashMap<String, Vec<String>>,
}

impl Accumulator {
    fn new() -> Self {
        Self { points: HashMap::new(), reasons: HashMap::new() }
    }

    fn add(&mut self, author_id: &str, points: f64, reason: String) {
        *self.points.entry(author_id.to_string()).or_insert(0.0) += points;
        self.reasons.entry(author_id.to_string()).or_default().push(reason);
    }
}

fn human_window(secs: i64) -> String {
    if secs <= 0 {
        "0 seconds".to_string()
    } else if secs % 3600 == 0 {
        let h = secs / 3600;
        format!("{h} hour{}", if h == 1 { "" } else { "s" })
    } else if secs % 60 == 0 {
        let m = secs / 60;
        format!("{m} minute{}", if m == 1 { "" } else { "s" })
    } else {
        format!("{secs} seconds")
    }
}

/// Aggregate evidence into a `Report`, applying point accumulation and
/// cross-indicator amplification. `time_window` is threaded through for the
/// burst reason's "human window" phrasing.
pub fn aggregate(
    evidence: &IndicatorEvidence,
    username_index: &UsernameIndex,
    params: &Params,
    time_window: i64,
) -> Report {
    let mut acc = Accumulator::new();

    // 1. Synchronized — one reason per author, aggregating partners across
    // every pair that involves them.
    {
        let mut partners_by_author: HashMap<String, Vec<String>> = HashMap::new();
        for pair in &evidence.synch_pairs {
            partners_by_author.entry(pair.u1.clone()).or_default().push(pair.u2.clone());
            partners_by_author.entry(pair.u2.clone()).or_default().push(pair.u1.clone());
        }
        for (author, partners) in partners_by_author {
            let handles = dedup_handles(&partners, username_index);
            let reason = format!("Synchronized posting with: {}", format_partner_list(&handles));
            acc.add(&author, POINTS_SYNCHRONIZED, reason);
        }
    }

    // 2. Rare hashtag combinations — one reason per author across all
    // qualifying groups. `partners_by_author`'s values are `IndexSet`
    // rather than `HashSet`: an author can belong to more than one group,
    // and the insertion order here (which follows the deterministic
    // `evidence.hashtag_groups` order plus each group's own `IndexSet`
    // order) is what ends up as the partner list in the reason string.
    {
        let mut partners_by_author: HashMap<String, IndexSet<String>> = HashMap::new();
        for group in &evidence.hashtag_groups {
            for author in &group.users {
                let entry = partners_by_author.entry(author.clone()).or_default();
                for other in &group.users {
                    if other != author {
                        entry.insert(other.clone());
                    }
                }
            }
        }
        for (author, partners) in partners_by_author {
            let partners: Vec<String> = partners.into_iter().collect();
            let handles = dedup_handles(&partners, username_index);
            let reason = format!("Rare hashtag combinations with: {}", format_partner_list(&handles));
            acc.add(&author, POINTS_RARE_HASHTAGS, reason);
        }
    }

    // 3. Similar username — per group.
    for group in &evidence.username_groups {
        for author in &group.users {
            let partners: Vec<String> =
                group.users.iter().filter(|u| *u != author).cloned().collect();
            let handles = dedup_handles(&partners, username_index);
            let reason = format!("Similar username pattern with: {}", format_partner_list(&handles));
            acc.add(author, POINTS_SIMILAR_USERNAME, reason);
        }
    }

    // 4. High-volume posting — single occurrence per author, by construction.
    for hit in &evidence.high_volume {
        let reason = format!("High-volume posting (z-score: {:.1})", hit.zscore);
        acc.add(&hit.user_id, POINTS_HIGH_VOLUME, reason);
    }

    // 5. Bursts — per burst.
    for burst in &evidence.bursts {
        let reason = format!("Posting burst: {} posts in {}", burst.count, human_window(time_window));
        acc.add(&burst.user_id, POINTS_BURST, reason);
    }

    // 6. Regular rhythm — single occurrence.
    for hit in &evidence.regular_rhythm {
        let reason = format!("Highly regular posting rhythm (CV: {:.1}%)", hit.cv * 100.0);
        acc.add(&hit.user_id, POINTS_REGULAR_RHYTHM, reason);
    }

    // 7. 24/7 activity — single occurrence.
    for hit in &evidence.night_activity {
        let hours = hit.avg_max_gap / 3600.0;
        let reason = format!("24/7 posting pattern (max gap: {hours:.1}h)");
        acc.add(&hit.user_id, POINTS_NIGHT, reason);
    }

    // 8. Semantic duplicates — per pair.
    for pair in &evidence.semantic_pairs {
        let partner_for_1 = resolve_handle(&pair.u2, username_index);
        let partner_for_2 = resolve_handle(&pair.u1, username_index);
        acc.add(
            &pair.u1,
            POINTS_SEMANTIC,
            format!("Semantically similar captions ({:.3}) with {partner_for_1}", pair.score),
        );
        acc.add(
            &pair.u2,
            POINTS_SEMANTIC,
            format!("Semantically similar captions ({:.3}) with {partner_for_2}", pair.score),
        );
    }

    // 9. Template captions — per pair.
    for pair in &evidence.template_pairs {
        let partner_for_1 = resolve_handle(&pair.u2, username_index);
        let partner_for_2 = resolve_handle(&pair.u1, username_index);
        acc.add(
            &pair.u1,
            POINTS_TEMPLATE,
            format!("Template caption ({:.0}% overlap) with {partner_for_1}", pair.score * 100.0),
        );
        acc.add(
            &pair.u2,
            POINTS_TEMPLATE,
            format!("Template caption ({:.0}% overlap) with {partner_for_2}", pair.score * 100.0),
        );
    }

    // 10. Account-creation clusters — per cluster.
    for cluster in &evidence.creation_clusters {
        let reason = format!("Account created with {} others within 24 hours", cluster.len().saturating_sub(1));
        for author in cluster {
            acc.add(author, POINTS_CREATION_CLUSTER, reason.clone());
        }
    }

    build_report(acc, params)
}

fn dedup_handles(author_ids: &[String], username_index: &UsernameIndex) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut handles = Vec::new();
    for id in author_ids {
        if seen.insert(id.clone()) {
            handles.push(resolve_handle(id, username_index));
        }
    }
    handles
}

fn build_report(acc: Accumulator, params: &Params) -> Report {
    let mut report = Report::default();

    for (author, reasons) in acc.reasons {
        let base_score = *acc.points.get(&author).unwrap_or(&0.0);
        let k = reasons.len();

        let mut score = base_score;
        if k >= 2 {
            score = (score * (1.0 + params.cross_multiplier * k as f64)).round();
            score = score.min(100.0);
        }

        let joined = reasons.join(" ").to_lowercase();
        if joined.contains("similar username") && joined.contains("created with") {
            score = (score + 20.0).min(100.0);
        }
        if joined.contains("synchronized") && joined.contains("regular posting") {
            score = (score + 15.0).min(100.0);
        }

        let final_score = score.clamp(0.0, 100.0).round() as u32;

        report.suspicious_users.insert(author.clone());
        report.user_scores.insert(author.clone(), final_score);
        report.user_reasons.insert(author, reasons);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Burst, PairScore, RhythmHit};

    #[test]
    fn scenario_s2_cross_amplification() {
        // One author with burst (15) + regular rhythm (20), crossMultiplier=0.3
        let mut evidence = IndicatorEvidence::default();
        evidence.bursts.push(Burst { user_id: "a".into(), window_start: 0, count: 5 });
        evidence.regular_rhythm.push(RhythmHit { user_id: "a".into(), cv: 0.05 });

        let mut params = Params::default();
        params.cross_multiplier = 0.3;

        let username_index = UsernameIndex::build(&[]);
        let report = aggregate(&evidence, &username_index, &params, 60);

        assert_eq!(*report.user_scores.get("a").unwrap(), 56);
    }

    #[test]
    fn scenario_s3_username_and_creation_cluster_bonus() {
        let mut evidence = IndicatorEvidence::default();
        evidence.username_groups.push(crate::model::UsernameGroup {
            key: "k".into(),
            users: ["a", "b", "c"].iter().map(|s| s.to_string()).collect(),
        });
        evidence.creation_clusters.push(["a", "x", "y", "z", "w"].iter().map(|s| s.to_string()).collect());

        let mut params = Params::default();
        params.cross_multiplier = 0.3;

        let username_index = UsernameIndex::build(&[]);
        let report = aggregate(&evidence, &username_index, &params, 60);

        assert_eq!(*report.user_scores.get("a").unwrap(), 84);
    }

    #[test]
    fn scenario_s1_synchronized_pair_scores_at_least_25() {
        let mut evidence = IndicatorEvidence::default();
        evidence.synch_pairs.push(crate::model::SyncPair { u1: "a".into(), u2: "b".into(), sync_count: 3 });

        let params = Params::default();
        let username_index = UsernameIndex::build(&[]);
        let report = aggregate(&evidence, &username_index, &params, 60);

        assert!(*report.user_scores.get("a").unwrap() >= 25);
        assert!(*report.user_scores.get("b").unwrap() >= 25);
    }

    #[test]
    fn semantic_pair_scores_both_authors() {
        let mut evidence = IndicatorEvidence::default();
        evidence.semantic_pairs.push(PairScore { u1: "a".into(), u2: "b".into(), score: 0.9 });

        let params = Params::default();
        let username_index = UsernameIndex::build(&[]);
        let report = aggregate(&evidence, &username_index, &params, 60);

        assert!(report.suspicious_users.contains("a"));
        assert!(report.suspicious_users.contains("b"));
        assert_eq!(report.user_reasons.get("a").unwrap().len(), 1);
    }

    #[test]
    fn scores_are_clamped_to_100() {
        let mut evidence = IndicatorEvidence::default();
        for i in 0..5 {
            evidence.semantic_pairs.push(PairScore { u1: "a".into(), u2: format!("p{i}"), score: 0.99 });
        }
        let mut params = Params::default();
        params.cross_multiplier = 2.0;
        let username_index = UsernameIndex::build(&[]);
        let report = aggregate(&evidence, &username_index, &params, 60);
        assert_eq!(*report.user_scores.get("a").unwrap(), 100);
    }
}
