//! Turns case metadata plus a ratings export into a [`QuepidCase`].

use std::collections::BTreeMap;

use serde_json::Value;

use super::client::JudgmentRepository;
use super::export::RatingsExport;
use super::types::{Metadata, QuepidCase, QuepidJudgment};
use crate::error::{CompareError, Result};

/// Load and normalize one case.
///
/// Fetches the case metadata, then the ratings export. Neither call is
/// retried.
///
/// # Errors
///
/// - [`CompareError::CaseNotFound`] if the metadata call fails
/// - [`CompareError::JudgmentFetchFailed`] if the export call fails
pub async fn load_case(repository: &dyn JudgmentRepository, case_id: u64) -> Result<QuepidCase> {
    let metadata = repository.get_case(case_id).await.map_err(|e| {
        tracing::warn!(case_id, error = %e, "case metadata fetch failed");
        CompareError::CaseNotFound {
            case_id,
            reason: e.to_string(),
        }
    })?;

    let raw_export = repository.get_case_ratings(case_id).await.map_err(|e| {
        tracing::warn!(case_id, error = %e, "ratings export fetch failed");
        CompareError::JudgmentFetchFailed {
            case_id,
            reason: e.to_string(),
        }
    })?;

    let export = RatingsExport::from_value(&raw_export);
    let case = normalize_case(case_id, &metadata, export);
    tracing::info!(
        case_id,
        queries = case.queries.len(),
        judgments = case.judgment_count(),
        "loaded case"
    );
    Ok(case)
}

/// Build the canonical case from already-fetched parts.
///
/// Query order is first appearance in the export, followed by queries
/// listed only in the metadata. Within a query, judgments are ordered by
/// `doc_id` and a repeated `doc_id` keeps the last rating seen.
pub fn normalize_case(case_id: u64, metadata: &Value, export: RatingsExport) -> QuepidCase {
    let mut builder = CaseBuilder::default();

    match export {
        RatingsExport::Flat(ratings) => {
            for rating in ratings {
                builder.add(
                    rating.query_text,
                    rating.doc_id,
                    rating.rating,
                    rating.metadata,
                );
            }
        }
        RatingsExport::Nested(queries) => {
            for query in queries {
                builder.touch(&query.query_text);
                for (doc_id, rating) in query.ratings {
                    builder.add(query.query_text.clone(), doc_id, rating, Metadata::new());
                }
            }
        }
    }

    for query in listed_queries(metadata) {
        builder.touch(&query);
    }

    builder.finish(case_id, case_name(case_id, metadata))
}

fn case_name(case_id: u64, metadata: &Value) -> String {
    ["case_name", "name"]
        .iter()
        .filter_map(|key| metadata.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map_or_else(|| format!("Case {case_id}"), str::to_owned)
}

/// Query texts listed in the case metadata, if it lists any.
fn listed_queries(metadata: &Value) -> Vec<String> {
    let Some(entries) = metadata.get("queries").and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(s) => Some(s.as_str()),
            other => other
                .get("query_text")
                .or_else(|| other.get("query"))
                .and_then(Value::as_str),
        })
        .filter(|q| !q.trim().is_empty())
        .map(str::to_owned)
        .collect()
}

#[derive(Default)]
struct CaseBuilder {
    queries: Vec<String>,
    judgments: BTreeMap<String, BTreeMap<String, QuepidJudgment>>,
}

impl CaseBuilder {
    fn touch(&mut self, query: &str) {
        if !self.judgments.contains_key(query) {
            self.queries.push(query.to_owned());
            self.judgments.insert(query.to_owned(), BTreeMap::new());
        }
    }

    fn add(&mut self, query: String, doc_id: String, rating: i32, metadata: Metadata) {
        self.touch(&query);
        let judgment = QuepidJudgment::new(query.clone(), doc_id.clone(), rating)
            .with_metadata(metadata);
        if let Some(docs) = self.judgments.get_mut(&query) {
            docs.insert(doc_id, judgment);
        }
    }

    fn finish(self, case_id: u64, name: String) -> QuepidCase {
        QuepidCase {
            case_id,
            name,
            queries: self.queries,
            judgments: self
                .judgments
                .into_iter()
                .map(|(query, docs)| (query, docs.into_values().collect()))
                .collect(),
        }
    }
}
