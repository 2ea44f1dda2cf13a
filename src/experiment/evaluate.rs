//! Baseline vs boosted scoring of one result list against a case.

use std::collections::HashSet;

use scholar_dispatch::SearchResult;
use serde::{Deserialize, Serialize};

use super::boost::BoostTransform;
use super::metrics::{RelevanceSummary, grade_map};
use super::stats::{RankMovement, positions};
use crate::quepid::QuepidCase;

/// How a document relates to the evaluated list and the judgments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    RetrievedJudged,
    RetrievedUnjudged,
    JudgedNotRetrieved,
}

/// Per-document line of an experiment report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDetail {
    pub doc_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub status: DocumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    /// 1-based position in the baseline list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_rank: Option<usize>,
    /// 1-based position in the boosted list; absent when no boost ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boosted_rank: Option<usize>,
    /// `baseline_rank - boosted_rank`; positive means moved up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_change: Option<i64>,
}

/// Outcome of evaluating one query's results, with and without a boost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostExperimentResult {
    pub query_text: String,
    /// nDCG of the list as given.
    pub baseline_metric: f64,
    /// nDCG after the boost; equals the baseline when no boost was given.
    pub boosted_metric: f64,
    pub delta: f64,
    pub baseline: RelevanceSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boosted: Option<RelevanceSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement: Option<RankMovement>,
    pub per_document_detail: Vec<DocumentDetail>,
}

/// Score `results` against the judgments for `query_text` in `case`.
///
/// An unknown query evaluates against no judgments. Unjudged documents
/// count as grade 0 but keep their place in the ranking. Detail lines
/// follow the baseline order, then documents only the boost introduced,
/// then judged documents neither list retrieved (by `doc_id`).
pub fn evaluate(
    query_text: &str,
    results: &[SearchResult],
    case: &QuepidCase,
    boost: Option<&dyn BoostTransform>,
) -> BoostExperimentResult {
    let judgments = case.judgments_for(query_text);
    if judgments.is_empty() {
        tracing::debug!(query = query_text, case_id = case.case_id, "no judgments for query");
    }

    let baseline = RelevanceSummary::compute(results, judgments);
    let boosted_list = boost.map(|b| b.apply(results));
    let boosted = boosted_list
        .as_deref()
        .map(|list| RelevanceSummary::compute(list, judgments));
    let movement = boosted_list
        .as_deref()
        .map(|list| RankMovement::between(results, list));

    let baseline_metric = baseline.ndcg;
    let boosted_metric = boosted.as_ref().map_or(baseline_metric, |s| s.ndcg);

    let per_document_detail = document_detail(case, query_text, results, boosted_list.as_deref());

    BoostExperimentResult {
        query_text: query_text.to_owned(),
        baseline_metric,
        boosted_metric,
        delta: boosted_metric - baseline_metric,
        baseline,
        boosted,
        movement,
        per_document_detail,
    }
}

fn document_detail(
    case: &QuepidCase,
    query_text: &str,
    baseline: &[SearchResult],
    boosted: Option<&[SearchResult]>,
) -> Vec<DocumentDetail> {
    let judgments = case.judgments_for(query_text);
    let grades = grade_map(judgments);
    let baseline_pos = positions(baseline);
    let boosted_pos = boosted.map(positions);

    let retrieved = baseline.iter().chain(boosted.unwrap_or_default());
    let mut seen: HashSet<&str> = HashSet::new();
    let mut details = Vec::new();

    for result in retrieved {
        let doc_id = result.doc_id.as_str();
        if !seen.insert(doc_id) {
            continue;
        }
        let rating = grades.get(doc_id).copied();
        let judged_title = judgments
            .iter()
            .find(|j| j.doc_id == doc_id)
            .and_then(|j| j.title());
        let title = if result.title.is_empty() {
            judged_title.map(str::to_owned)
        } else {
            Some(result.title.clone())
        };
        let baseline_rank = baseline_pos.get(doc_id).copied();
        let boosted_rank = boosted_pos.as_ref().and_then(|p| p.get(doc_id).copied());
        details.push(DocumentDetail {
            doc_id: doc_id.to_owned(),
            title,
            status: if rating.is_some() {
                DocumentStatus::RetrievedJudged
            } else {
                DocumentStatus::RetrievedUnjudged
            },
            rating,
            baseline_rank,
            boosted_rank,
            rank_change: baseline_rank
                .zip(boosted_rank)
                .map(|(old, new)| old as i64 - new as i64),
        });
    }

    for judgment in judgments {
        if seen.contains(judgment.doc_id.as_str()) {
            continue;
        }
        details.push(DocumentDetail {
            doc_id: judgment.doc_id.clone(),
            title: judgment.title().map(str::to_owned),
            status: DocumentStatus::JudgedNotRetrieved,
            rating: Some(judgment.rating),
            baseline_rank: None,
            boosted_rank: None,
            rank_change: None,
        });
    }

    details
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::experiment::boost::FieldBoost;
    use crate::experiment::metrics::tests::ranked;
    use crate::quepid::{Metadata, QuepidJudgment};
    use serde_json::json;

    fn case(judgments: Vec<QuepidJudgment>) -> QuepidCase {
        let mut map = BTreeMap::new();
        map.insert("q".to_string(), judgments);
        QuepidCase {
            case_id: 3,
            name: "Case 3".into(),
            queries: vec!["q".into()],
            judgments: map,
        }
    }

    fn reverse(results: &[SearchResult]) -> Vec<SearchResult> {
        results.iter().rev().cloned().collect()
    }

    #[test]
    fn relevant_doc_at_top_beats_rank_five() {
        let case = case(vec![QuepidJudgment::new("q", "d1", 3)]);
        let top = evaluate("q", &ranked(&["d1", "d2"]), &case, None);
        let low = evaluate("q", &ranked(&["x1", "x2", "x3", "x4", "d1"]), &case, None);
        assert!(top.baseline_metric > low.baseline_metric);
    }

    #[test]
    fn no_boost_means_zero_delta() {
        let case = case(vec![QuepidJudgment::new("q", "d2", 2)]);
        let result = evaluate("q", &ranked(&["d1", "d2"]), &case, None);
        assert_eq!(result.boosted_metric, result.baseline_metric);
        assert_eq!(result.delta, 0.0);
        assert!(result.boosted.is_none());
        assert!(result.movement.is_none());
    }

    #[test]
    fn boost_that_promotes_relevant_doc_has_positive_delta() {
        let case = case(vec![QuepidJudgment::new("q", "d2", 3)]);
        let results = ranked(&["d1", "d2"]);
        let result = evaluate("q", &results, &case, Some(&reverse));
        assert!(result.delta > 0.0);
        assert!((result.boosted_metric - 1.0).abs() < 1e-12);

        let d2 = result
            .per_document_detail
            .iter()
            .find(|d| d.doc_id == "d2")
            .expect("d2 detail");
        assert_eq!(d2.baseline_rank, Some(2));
        assert_eq!(d2.boosted_rank, Some(1));
        assert_eq!(d2.rank_change, Some(1));
    }

    #[test]
    fn detail_distinguishes_three_statuses() {
        let mut metadata = Metadata::new();
        metadata.insert("title".into(), json!("Missing paper"));
        let case = case(vec![
            QuepidJudgment::new("q", "d1", 2),
            QuepidJudgment::new("q", "d9", 1).with_metadata(metadata),
        ]);
        let result = evaluate("q", &ranked(&["d1", "d2"]), &case, None);
        let statuses: Vec<(&str, DocumentStatus)> = result
            .per_document_detail
            .iter()
            .map(|d| (d.doc_id.as_str(), d.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("d1", DocumentStatus::RetrievedJudged),
                ("d2", DocumentStatus::RetrievedUnjudged),
                ("d9", DocumentStatus::JudgedNotRetrieved),
            ]
        );
        assert_eq!(result.per_document_detail[2].title.as_deref(), Some("Missing paper"));
        assert_eq!(result.per_document_detail[1].rating, None);
    }

    #[test]
    fn unknown_query_scores_zero_without_error() {
        let case = case(vec![QuepidJudgment::new("q", "d1", 3)]);
        let result = evaluate("other", &ranked(&["d1"]), &case, None);
        assert_eq!(result.baseline_metric, 0.0);
        assert_eq!(result.per_document_detail.len(), 1);
        assert_eq!(
            result.per_document_detail[0].status,
            DocumentStatus::RetrievedUnjudged
        );
    }

    #[test]
    fn evaluation_is_repeatable() {
        let case = case(vec![
            QuepidJudgment::new("q", "d1", 1),
            QuepidJudgment::new("q", "d3", 3),
        ]);
        let mut results = ranked(&["d1", "d2", "d3"]);
        results[2].citation_count = Some(900);
        let boost = FieldBoost::new(2024).with_citation_weight(1.0);
        let first = evaluate("q", &results, &case, Some(&boost));
        let second = evaluate("q", &results, &case, Some(&boost));
        assert_eq!(first, second);
        assert!(first.delta > 0.0);
    }
}
