//! Graded relevance metrics over a ranked result list.
//!
//! Ranking is the order of the slice: the first result is position 1.
//! Documents without a judgment have grade 0.
//!
//! ```text
//! gain(rel)  = 2^max(rel, 0) - 1
//! DCG        = sum over positions i of gain(rel_i) / log2(i + 1)
//! nDCG       = DCG / IDCG
//! ```
//!
//! IDCG is the DCG of the query's judgment grades sorted descending and
//! truncated to the length of the result list.

use std::collections::HashMap;

use scholar_dispatch::SearchResult;
use serde::{Deserialize, Serialize};

use crate::quepid::QuepidJudgment;

/// Cutoffs reported in [`RelevanceSummary::cutoffs`].
pub const CUTOFFS: [usize; 3] = [5, 10, 20];

/// `doc_id -> rating` lookup for one query.
pub fn grade_map(judgments: &[QuepidJudgment]) -> HashMap<&str, i32> {
    judgments
        .iter()
        .map(|j| (j.doc_id.as_str(), j.rating))
        .collect()
}

/// Grades above this are scored as this; keeps `2^grade` finite.
pub const MAX_GRADE: i32 = 30;

fn gain(rating: i32) -> f64 {
    2f64.powi(rating.clamp(0, MAX_GRADE)) - 1.0
}

/// Discounted cumulative gain of grades in rank order.
pub fn dcg(grades: impl IntoIterator<Item = i32>) -> f64 {
    grades
        .into_iter()
        .enumerate()
        .map(|(i, rating)| gain(rating) / ((i + 2) as f64).log2())
        .sum()
}

/// nDCG of `results` against `judgments`. `0.0` when nothing relevant is judged.
pub fn ndcg(results: &[SearchResult], judgments: &[QuepidJudgment]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let grades = grade_map(judgments);
    let actual = dcg(results
        .iter()
        .map(|r| grades.get(r.doc_id.as_str()).copied().unwrap_or(0)));

    let mut ideal: Vec<i32> = judgments.iter().map(|j| j.rating).collect();
    ideal.sort_unstable_by(|a, b| b.cmp(a));
    ideal.truncate(results.len());
    let ideal = dcg(ideal);

    if ideal <= 0.0 { 0.0 } else { actual / ideal }
}

/// Metrics at one cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoffScore {
    pub k: usize,
    pub ndcg: f64,
    /// Relevant (rating > 0) documents in the top `k`, divided by `k`.
    pub precision: f64,
}

/// Relevance report for one ranked list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceSummary {
    /// nDCG over the whole list.
    pub ndcg: f64,
    /// Only cutoffs the list is long enough for.
    pub cutoffs: Vec<CutoffScore>,
    pub recall: f64,
    pub judged_retrieved: usize,
    pub relevant_retrieved: usize,
    pub total_judged: usize,
    pub total_relevant: usize,
    pub results_count: usize,
}

impl RelevanceSummary {
    pub fn compute(results: &[SearchResult], judgments: &[QuepidJudgment]) -> Self {
        let grades = grade_map(judgments);
        let relevant = |r: &SearchResult| grades.get(r.doc_id.as_str()).is_some_and(|g| *g > 0);

        let cutoffs = CUTOFFS
            .iter()
            .filter(|k| results.len() >= **k)
            .map(|&k| {
                let top = &results[..k];
                CutoffScore {
                    k,
                    ndcg: ndcg(top, judgments),
                    precision: top.iter().filter(|&r| relevant(r)).count() as f64 / k as f64,
                }
            })
            .collect();

        let total_relevant = grades.values().filter(|g| **g > 0).count();
        let relevant_retrieved = results.iter().filter(|&r| relevant(r)).count();

        Self {
            ndcg: ndcg(results, judgments),
            cutoffs,
            recall: if total_relevant == 0 {
                0.0
            } else {
                relevant_retrieved as f64 / total_relevant as f64
            },
            judged_retrieved: results
                .iter()
                .filter(|r| grades.contains_key(r.doc_id.as_str()))
                .count(),
            relevant_retrieved,
            total_judged: grades.len(),
            total_relevant,
            results_count: results.len(),
        }
    }

    /// Score at cutoff `k`, if the list reached it.
    pub fn at(&self, k: usize) -> Option<&CutoffScore> {
        self.cutoffs.iter().find(|c| c.k == k)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    pub(crate) fn result(doc_id: &str, rank: usize) -> SearchResult {
        SearchResult {
            source_backend: "ads".into(),
            doc_id: doc_id.into(),
            title: format!("Title {doc_id}"),
            rank,
            raw_score: None,
            fetched_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid date"),
            year: None,
            citation_count: None,
            doctype: None,
        }
    }

    #[test]
    fn oversized_grades_stay_finite() {
        let results = ranked(&["a", "b"]);
        let judgments = judged(&[("a", 5000), ("b", 2000)]);
        let score = ndcg(&results, &judgments);
        assert!(score.is_finite());
        assert!((score - 1.0).abs() < 1e-12);
        assert_eq!(gain(i32::MAX), gain(MAX_GRADE));
    }

    pub(crate) fn ranked(ids: &[&str]) -> Vec<SearchResult> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| result(id, i + 1))
            .collect()
    }

    fn judged(pairs: &[(&str, i32)]) -> Vec<QuepidJudgment> {
        pairs
            .iter()
            .map(|(doc, rating)| QuepidJudgment::new("q", *doc, *rating))
            .collect()
    }

    #[test]
    fn dcg_discounts_by_log_position() {
        // gains 7, 1 at positions 1, 2: 7/1 + 1/log2(3)
        let expected = 7.0 + 1.0 / 3f64.log2();
        assert!((dcg([3, 1]) - expected).abs() < 1e-12);
    }

    #[test]
    fn perfect_ranking_scores_one() {
        let judgments = judged(&[("d1", 3), ("d2", 1)]);
        assert!((ndcg(&ranked(&["d1", "d2"]), &judgments) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn relevant_doc_lower_scores_less() {
        let judgments = judged(&[("d1", 3)]);
        let top = ndcg(&ranked(&["d1", "d2"]), &judgments);
        let fifth = ndcg(&ranked(&["x1", "x2", "x3", "x4", "d1"]), &judgments);
        assert!(top > fifth);
        assert!((fifth - 1.0 / 6f64.log2()).abs() < 1e-12);
    }

    #[test]
    fn no_judgments_or_no_results_is_zero() {
        assert_eq!(ndcg(&ranked(&["d1"]), &[]), 0.0);
        assert_eq!(ndcg(&[], &judged(&[("d1", 3)])), 0.0);
        assert_eq!(ndcg(&ranked(&["d1"]), &judged(&[("d1", 0)])), 0.0);
    }

    #[test]
    fn negative_ratings_have_no_gain() {
        let judgments = judged(&[("d1", -1), ("d2", 2)]);
        let with_negative_first = ndcg(&ranked(&["d1", "d2"]), &judgments);
        let with_unjudged_first = ndcg(&ranked(&["x", "d2"]), &judgments);
        assert!((with_negative_first - with_unjudged_first).abs() < 1e-12);
    }

    #[test]
    fn summary_counts_and_cutoffs() {
        let judgments = judged(&[("d1", 3), ("d2", 0), ("d3", 2), ("d9", 1)]);
        let ids: Vec<String> = (1..=10).map(|i| format!("d{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let summary = RelevanceSummary::compute(&ranked(&refs), &judgments);

        assert_eq!(summary.results_count, 10);
        assert_eq!(summary.total_judged, 4);
        assert_eq!(summary.total_relevant, 3);
        assert_eq!(summary.judged_retrieved, 4);
        assert_eq!(summary.relevant_retrieved, 3);
        assert!((summary.recall - 1.0).abs() < 1e-12);

        assert_eq!(summary.cutoffs.len(), 2);
        assert!((summary.at(5).expect("p@5").precision - 0.4).abs() < 1e-12);
        assert!((summary.at(10).expect("p@10").precision - 0.3).abs() < 1e-12);
        assert!(summary.at(20).is_none());
    }

    #[test]
    fn recall_zero_without_relevant_judgments() {
        let summary = RelevanceSummary::compute(&ranked(&["d1"]), &judged(&[("d1", 0)]));
        assert_eq!(summary.recall, 0.0);
        assert_eq!(summary.judged_retrieved, 1);
        assert_eq!(summary.relevant_retrieved, 0);
    }
}
