//! How far a boost moved documents.

use std::collections::HashMap;

use scholar_dispatch::SearchResult;
use serde::{Deserialize, Serialize};

/// Rank movement between a baseline list and its boosted counterpart.
///
/// Only documents present in both lists are counted. A positive change
/// means the document moved towards the top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankMovement {
    pub count: usize,
    pub moved_up: usize,
    pub moved_down: usize,
    pub unchanged: usize,
    pub mean_abs_change: f64,
    pub max_increase: usize,
    pub max_decrease: usize,
    /// Spearman rank correlation; `None` with fewer than two shared documents.
    pub spearman: Option<f64>,
}

/// 1-based position of each document's first occurrence.
pub(crate) fn positions(results: &[SearchResult]) -> HashMap<&str, usize> {
    let mut positions = HashMap::with_capacity(results.len());
    for (i, r) in results.iter().enumerate() {
        positions.entry(r.doc_id.as_str()).or_insert(i + 1);
    }
    positions
}

impl RankMovement {
    pub fn between(baseline: &[SearchResult], boosted: &[SearchResult]) -> Self {
        let after = positions(boosted);
        let before = positions(baseline);

        // (baseline position, boosted position), in baseline order
        let pairs: Vec<(usize, usize)> = baseline
            .iter()
            .enumerate()
            .filter(|(i, r)| before.get(r.doc_id.as_str()) == Some(&(i + 1)))
            .filter_map(|(i, r)| after.get(r.doc_id.as_str()).map(|&new| (i + 1, new)))
            .collect();

        let mut movement = Self {
            count: pairs.len(),
            moved_up: 0,
            moved_down: 0,
            unchanged: 0,
            mean_abs_change: 0.0,
            max_increase: 0,
            max_decrease: 0,
            spearman: None,
        };

        let mut total_abs = 0usize;
        for &(old, new) in &pairs {
            let change = old.abs_diff(new);
            total_abs += change;
            if new < old {
                movement.moved_up += 1;
                movement.max_increase = movement.max_increase.max(change);
            } else if new > old {
                movement.moved_down += 1;
                movement.max_decrease = movement.max_decrease.max(change);
            } else {
                movement.unchanged += 1;
            }
        }
        if !pairs.is_empty() {
            movement.mean_abs_change = total_abs as f64 / pairs.len() as f64;
        }
        movement.spearman = spearman(&pairs);
        movement
    }
}

/// Spearman correlation of paired positions, after re-ranking each side
/// among the shared documents.
fn spearman(pairs: &[(usize, usize)]) -> Option<f64> {
    let n = pairs.len();
    if n < 2 {
        return None;
    }
    let rank_of = |values: Vec<usize>| -> HashMap<usize, usize> {
        let mut sorted = values;
        sorted.sort_unstable();
        sorted.into_iter().enumerate().map(|(i, v)| (v, i + 1)).collect()
    };
    let old_ranks = rank_of(pairs.iter().map(|p| p.0).collect());
    let new_ranks = rank_of(pairs.iter().map(|p| p.1).collect());

    let sum_sq: f64 = pairs
        .iter()
        .map(|(old, new)| {
            let d = old_ranks[old] as f64 - new_ranks[new] as f64;
            d * d
        })
        .sum();
    let n = n as f64;
    Some(1.0 - 6.0 * sum_sq / (n * (n * n - 1.0)))
}
