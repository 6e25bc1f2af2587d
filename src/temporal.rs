// Temporal analyzers: posting-rhythm coefficient of variation, night-gap
// (24/7 activity) analysis, sliding-window burst detection, and
// account-creation clustering. No teacher analog — these are bespoke
// timestamp-sequence analyses fixed by formula, not adapted from an
// existing module.

use std::collections::{HashMap, HashSet};

use chrono::{TimeZone, Utc};

use crate::model::Distribution;

/// Result of the posting-rhythm analysis.
#[derive(Debug, Clone, Copy)]
pub struct RhythmResult {
    pub regular: bool,
    pub cv: f64,
}

/// Posting rhythm: coefficient of variation of consecutive-post intervals.
/// Requires >= 5 posts; returns `None` otherwise.
pub fn posting_rhythm(timestamps: &[i64], cv_thresh: f64) -> Option<RhythmResult> {
    if timestamps.len() < 5 {
        return None;
    }
    let mut sorted = timestamps.to_vec();
    sorted.sort_unstable();

    let intervals: Vec<f64> =
        sorted.windows(2).map(|w| (w[1] - w[0]) as f64).collect();

    let dist = Distribution::from_samples(&intervals);
    let cv = if dist.mean > 0.0 { dist.stddev / dist.mean } else { 0.0 };
    let regular = dist.mean > 0.0 && cv < cv_thresh;

    Some(RhythmResult { regular, cv })
}

/// Result of the night-posting (24/7 activity) analysis.
///
/// Semantically inverted from how "suspicious" usually reads: a *small*
/// average max gap means the account posts around the clock with no quiet
/// hours, which is the suspicious pattern here.
#[derive(Debug, Clone, Copy)]
pub struct NightResult {
    pub suspicious: bool,
    pub avg_max_gap: f64,
}

/// Night posting / 24/7 activity: bucket timestamps by UTC calendar day,
/// find each day's largest gap between consecutive seconds-of-day values
/// (plus the midnight wrap-around gap), and average across active days.
/// Requires >= 10 posts; returns `None` otherwise.
pub fn night_posting(timestamps: &[i64], gap_thresh: i64) -> Option<NightResult> {
    if timestamps.len() < 10 {
        return None;
    }

    let mut by_day: HashMap<(i32, u32, u32), Vec<i64>> = HashMap::new();
    for &ts in timestamps {
        let dt = Utc.timestamp_opt(ts, 0).single()?;
        let key = (dt.format("%Y").to_string().parse().unwrap_or(0), dt.format("%m").to_string().parse().unwrap_or(0), dt.format("%d").to_string().parse().unwrap_or(0));
        let seconds_of_day = dt.num_seconds_from_midnight_i64();
        by_day.entry(key).or_default().push(seconds_of_day);
    }

    let mut day_max_gaps = Vec::new();
    for seconds in by_day.values_mut() {
        seconds.sort_unstable();
        let mut max_gap = 0i64;

        if seconds.len() > 1 {
            for w in seconds.windows(2) {
                max_gap = max_gap.max(w[1] - w[0]);
            }
            let first = seconds[0];
            let last = *seconds.last().unwrap();
            let wrap_gap = 86400 - last + first;
            max_gap = max_gap.max(wrap_gap);
        }

        day_max_gaps.push(max_gap as f64);
    }

    if day_max_gaps.is_empty() {
        return None;
    }

    let avg_max_gap = day_max_gaps.iter().sum::<f64>() / day_max_gaps.len() as f64;
    let suspicious = avg_max_gap < gap_thresh as f64;

    Some(NightResult { suspicious, avg_max_gap })
}

trait SecondsFromMidnight {
    fn num_seconds_from_midnight_i64(&self) -> i64;
}

impl SecondsFromMidnight for chrono::DateTime<Utc> {
    fn num_seconds_from_midnight_i64(&self) -> i64 {
        use chrono::Timelike;
        (self.hour() as i64) * 3600 + (self.minute() as i64) * 60 + self.second() as i64
    }
}

/// One detected burst: `min_posts` posts from a single user within `window`
/// seconds, anchored at the burst's starting post.
#[derive(Debug, Clone)]
pub struct TemporalBurst {
    pub window_start: i64,
    pub count: u32,
}

/// Sliding-window burst detector: one burst per starting index `i` where
/// `timestamps[i + min_posts - 1] - timestamps[i] <= window`.
pub fn detect_bursts(timestamps: &[i64], window: i64, min_posts: usize) -> Vec<TemporalBurst> {
    if min_posts == 0 || timestamps.len() < min_posts {
        return Vec::new();
    }
    let mut sorted = timestamps.to_vec();
    sorted.sort_unstable();

    let mut bursts = Vec::new();
    for i in 0..=sorted.len() - min_posts {
        let end = sorted[i + min_posts - 1];
        if end - sorted[i] <= window {
            bursts.push(TemporalBurst { window_start: sorted[i], count: min_posts as u32 });
        }
    }
    bursts
}

/// Account-creation clustering: single forward sweep, each cluster anchored
/// at its first member's creation time (not nearest-center). Input is
/// `(author_id, account_created_at)`; duplicate authors are deduplicated by
/// keeping the first occurrence.
pub fn creation_clusters(
    accounts: &[(String, i64)],
    window: i64,
    min_size: usize,
) -> Vec<HashSet<String>> {
    let mut seen = HashSet::new();
    let mut dedup: Vec<(String, i64)> = Vec::new();
    for (author_id, created_at) in accounts {
        if seen.insert(author_id.clone()) {
            dedup.push((author_id.clone(), *created_at));
        }
    }
    dedup.sort_by_key(|&(_, t)| t);

    if dedup.is_empty() {
        return Vec::new();
    }

    let mut clusters = Vec::new();
    let mut current: Vec<String> = vec![dedup[0].0.clone()];
    let mut cluster_start = dedup[0].1;

    for (author_id, created_at) in &dedup[1..] {
        if *created_at - cluster_start < window {
            current.push(author_id.clone());
        } else {
            if current.len() >= min_size {
                clusters.push(current.iter().cloned().collect());
            }
            current = vec![author_id.clone()];
            cluster_start = *created_at;
        }
    }

    if current.len() >= min_size {
        clusters.push(current.into_iter().collect());
    }

    clusters
}
