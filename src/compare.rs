//! Cross-backend ranking comparison.
//!
//! Every enabled backend answers the same query; each pair of backends
//! that returned results is compared by set overlap and by rank-biased
//! overlap (RBO), which weights agreement near the top more heavily.

use std::collections::HashSet;

use scholar_dispatch::{BackendAttempt, BackendRun, SearchResult};
use serde::{Deserialize, Serialize};

/// Persistence used for rank-biased overlap.
pub const RBO_PERSISTENCE: f64 = 0.98;

/// Similarity of two backends' rankings for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendComparison {
    pub backend_a: String,
    pub backend_b: String,
    pub overlap: usize,
    pub only_in_a: usize,
    pub only_in_b: usize,
    pub jaccard: f64,
    pub rank_biased_overlap: f64,
    /// Positions holding the same document in both lists.
    pub same_rank: usize,
}

/// One backend's own answer in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendListing {
    #[serde(flatten)]
    pub attempt: BackendAttempt,
    pub results: Vec<SearchResult>,
}

/// Unmerged per-backend results plus pairwise comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossBackendReport {
    pub query: String,
    pub backends: Vec<BackendListing>,
    pub comparisons: Vec<BackendComparison>,
}

impl CrossBackendReport {
    pub fn from_runs(query: &str, runs: &[BackendRun]) -> Self {
        Self {
            query: query.to_owned(),
            backends: runs
                .iter()
                .map(|run| BackendListing {
                    attempt: run.attempt(),
                    results: run.results().to_vec(),
                })
                .collect(),
            comparisons: compare_backends(runs),
        }
    }
}

/// Compare every pair of runs that produced results, in priority order.
pub fn compare_backends(runs: &[BackendRun]) -> Vec<BackendComparison> {
    let answered: Vec<(&str, Vec<&str>)> = runs
        .iter()
        .filter(|run| !run.results().is_empty())
        .map(|run| (run.backend.name.as_str(), doc_ids(run.results())))
        .collect();

    let mut comparisons = Vec::new();
    for (i, (name_a, a)) in answered.iter().enumerate() {
        for (name_b, b) in &answered[i + 1..] {
            comparisons.push(compare_lists(name_a, a, name_b, b));
        }
    }
    comparisons
}

fn doc_ids(results: &[SearchResult]) -> Vec<&str> {
    let mut seen = HashSet::new();
    results
        .iter()
        .map(|r| r.doc_id.as_str())
        .filter(|id| seen.insert(*id))
        .collect()
}

fn compare_lists(name_a: &str, a: &[&str], name_b: &str, b: &[&str]) -> BackendComparison {
    let set_a: HashSet<&str> = a.iter().copied().collect();
    let set_b: HashSet<&str> = b.iter().copied().collect();
    let overlap = set_a.intersection(&set_b).count();
    BackendComparison {
        backend_a: name_a.to_owned(),
        backend_b: name_b.to_owned(),
        overlap,
        only_in_a: set_a.len() - overlap,
        only_in_b: set_b.len() - overlap,
        jaccard: jaccard(&set_a, &set_b),
        rank_biased_overlap: rank_biased_overlap(a, b, RBO_PERSISTENCE),
        same_rank: a.iter().zip(b).filter(|(x, y)| x == y).count(),
    }
}

/// `|A ∩ B| / |A ∪ B|`; two empty sets are identical.
pub fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Extrapolated rank-biased overlap of two duplicate-free rankings.
///
/// Handles lists of different lengths. Two empty lists score 1, one empty
/// list scores 0, identical lists score 1.
pub fn rank_biased_overlap(a: &[&str], b: &[&str], p: f64) -> f64 {
    if a.is_empty() || b.is_empty() {
        return if a.is_empty() && b.is_empty() { 1.0 } else { 0.0 };
    }
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let s = short.len();
    let l = long.len();

    let mut seen_short: HashSet<&str> = HashSet::new();
    let mut seen_long: HashSet<&str> = HashSet::new();
    let mut overlap = 0usize;
    let mut overlap_at_s = 0usize;
    let mut sum = 0.0;
    let mut weight = 1.0;

    for d in 1..=l {
        weight *= p;
        let from_long = long[d - 1];
        if seen_short.contains(from_long) {
            overlap += 1;
        }
        seen_long.insert(from_long);
        if d <= s {
            let from_short = short[d - 1];
            if seen_long.contains(from_short) {
                overlap += 1;
            }
            seen_short.insert(from_short);
        }
        if d == s {
            overlap_at_s = overlap;
        }

        sum += overlap as f64 / d as f64 * weight;
        if d > s {
            sum += overlap_at_s as f64 * (d - s) as f64 / (s * d) as f64 * weight;
        }
    }

    let tail = ((overlap as f64 - overlap_at_s as f64) / l as f64 + overlap_at_s as f64 / s as f64)
        * weight;
    ((1.0 - p) / p * sum + tail).clamp(0.0, 1.0)
}
