//! Single-backend invocation: timeout enforcement, failure classification,
//! and normalization of raw documents into [`SearchResult`]s.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::backend::BackendClient;
use crate::config::BackendConfig;
use crate::error::BackendFailure;
use crate::types::{Invocation, RawDocument, SearchResult};

/// Query one backend, bounded by its `timeout_seconds`.
///
/// If the client has not answered within the timeout its future is dropped,
/// which cancels the in-flight call, and the attempt is reported as
/// [`BackendFailureKind::Timeout`](crate::BackendFailureKind::Timeout).
/// Client errors are wrapped as `Unavailable` or `Malformed`; nothing is
/// propagated raw.
///
/// A successful call returning fewer than `min_results` results is still
/// `Ok`, with [`Invocation::below_threshold`] set. Whether that triggers a
/// fallback is the coordinator's decision.
pub async fn invoke(
    backend: &BackendConfig,
    client: &dyn BackendClient,
    query: &str,
) -> Result<Invocation, BackendFailure> {
    let timeout = backend.timeout();
    tracing::trace!(backend = %backend.name, %query, "invoking backend");

    let docs = match tokio::time::timeout(timeout, client.search(query, timeout)).await {
        Ok(Ok(docs)) => docs,
        Ok(Err(err)) => return Err(err.into()),
        Err(_) => {
            return Err(BackendFailure::timeout(format!(
                "no response within {}s",
                backend.timeout_seconds
            )));
        }
    };

    let results = normalize_documents(&backend.name, docs, Utc::now())?;
    let below_threshold = results.len() < backend.min_results;
    Ok(Invocation {
        results,
        below_threshold,
    })
}

/// Turn raw documents into ranked [`SearchResult`]s for `backend_name`.
///
/// - `rank` is the 1-based position in the backend's response, so dropped
///   documents leave gaps rather than shifting later ranks.
/// - Documents without a usable `doc_id` are skipped.
/// - A repeated `doc_id` keeps its first occurrence.
///
/// # Errors
///
/// Returns a `Malformed` failure when the response was non-empty but not a
/// single document carried a `doc_id`.
pub fn normalize_documents(
    backend_name: &str,
    docs: Vec<RawDocument>,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<SearchResult>, BackendFailure> {
    let received = docs.len();
    let mut seen = HashSet::new();
    let mut results = Vec::with_capacity(received);

    for (index, doc) in docs.into_iter().enumerate() {
        let Some(doc_id) = doc
            .doc_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
        else {
            continue;
        };
        if !seen.insert(doc_id.clone()) {
            continue;
        }
        results.push(SearchResult {
            source_backend: backend_name.to_string(),
            doc_id,
            title: doc.title.unwrap_or_default(),
            rank: index + 1,
            raw_score: doc.score,
            fetched_at,
            year: doc.year,
            citation_count: doc.citation_count,
            doctype: doc.doctype,
        });
    }

    if received > 0 && results.is_empty() {
        return Err(BackendFailure::malformed(format!(
            "{received} documents returned, none with a document id"
        )));
    }
    if results.len() < received {
        tracing::debug!(
            backend = backend_name,
            received,
            kept = results.len(),
            "dropped documents without id or with duplicate id"
        );
    }
    Ok(results)
}
