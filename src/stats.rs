// Statistical primitives over text and sets — TF-IDF term weight, n-gram
// Jaccard overlap, and Levenshtein edit distance/similarity. Hand-rolled
// rather than pulled from a keyword-extraction crate: the formulas here are
// simple closed forms fixed by the indicator specs, not general-purpose
// document statistics.

use std::collections::HashSet;

/// TF-IDF weight of `term` within `user_bag`, against the corpus `all_bags`.
///
/// `tf = count(term in user_bag) / |user_bag|` (0 if the bag is empty).
/// `idf = ln(N / (df + 1))` where `N = |all_bags|` and `df` counts bags
/// (treated as sets) containing `term`. No smoothing beyond the `+1`.
pub fn tfidf(term: &str, user_bag: &[String], all_bags: &[Vec<String>]) -> f64 {
    if user_bag.is_empty() {
        return 0.0;
    }
    let count = user_bag.iter().filter(|t| t.as_str() == term).count();
    let tf = count as f64 / user_bag.len() as f64;

    let n = all_bags.len() as f64;
    let df = all_bags
        .iter()
        .filter(|bag| bag.iter().any(|t| t.as_str() == term))
        .count() as f64;
    let idf = (n / (df + 1.0)).ln();

    tf * idf
}

/// Mean TF-IDF of every (distinct) term in `terms` against `user_bag`/`all_bags`.
pub fn mean_tfidf(terms: &[String], user_bag: &[String], all_bags: &[Vec<String>]) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let sum: f64 = terms.iter().map(|t| tfidf(t, user_bag, all_bags)).sum();
    sum / terms.len() as f64
}

/// Lowercase, strip everything but word-characters and whitespace, split on
/// whitespace runs into words.
fn words(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() || c == '_' { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Sliding word n-grams of length `n` over `text`.
fn word_ngrams(text: &str, n: usize) -> HashSet<String> {
    let w = words(text);
    if w.len() < n {
        return HashSet::new();
    }
    (0..=w.len() - n).map(|i| w[i..i + n].join(" ")).collect()
}

/// Jaccard overlap of the 5-word-gram sets of `a` and `b`. Returns 0 if
/// either set is empty.
pub fn ngram_jaccard(a: &str, b: &str, n: usize) -> f64 {
    let set_a = word_ngrams(a, n);
    let set_b = word_ngrams(b, n);
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count() as f64;
    let union = set_a.union(&set_b).count() as f64;
    intersection / union
}

/// Classic Levenshtein edit distance (unit insertion/deletion/substitution).
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (la, lb) = (a.len(), b.len());

    if la == 0 {
        return lb;
    }
    if lb == 0 {
        return la;
    }

    let mut prev: Vec<usize> = (0..=lb).collect();
    let mut curr = vec![0usize; lb + 1];

    for i in 1..=la {
        curr[0] = i;
        for j in 1..=lb {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[lb]
}

/// Levenshtein similarity: `1 - d / max(|a|, |b|)`. Two empty strings are
/// identical (similarity 1.0).
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}
