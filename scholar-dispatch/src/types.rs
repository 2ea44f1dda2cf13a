//! Core types for normalized search results and the dispatch audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BackendFailure;

/// A single search result, normalized across backends.
///
/// `doc_id` is the merge key. Within one dispatch response the pair
/// `(source_backend, doc_id)` is unique, and a merged list carries at most
/// one entry per `doc_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Name of the backend that returned this result.
    pub source_backend: String,
    /// Stable document identifier (DOI, bibcode, or backend paper id).
    pub doc_id: String,
    /// Document title, empty when the backend did not supply one.
    pub title: String,
    /// 1-based position as returned by the backend.
    pub rank: usize,
    /// Backend relevance score, when exposed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_score: Option<f64>,
    /// When the backend response was received.
    pub fetched_at: DateTime<Utc>,
    /// Publication year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Citation count reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_count: Option<u64>,
    /// Document type (article, inproceedings, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctype: Option<String>,
}

/// One document as a backend client parsed it, before normalization.
///
/// Clients fill whatever they can; the invoker decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub doc_id: Option<String>,
    pub title: Option<String>,
    pub score: Option<f64>,
    pub year: Option<i32>,
    pub citation_count: Option<u64>,
    pub doctype: Option<String>,
}

impl RawDocument {
    /// Shorthand for a document carrying only an id and a title.
    pub fn new(doc_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            doc_id: Some(doc_id.into()),
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

/// How the coordinator should use the enabled backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DispatchPolicy {
    /// `false`: sequential fallback in priority order.
    /// `true`: query every enabled backend concurrently and merge.
    pub parallel: bool,
}

impl DispatchPolicy {
    pub fn sequential() -> Self {
        Self { parallel: false }
    }

    pub fn parallel() -> Self {
        Self { parallel: true }
    }
}

/// What happened when one backend was tried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BackendOutcome {
    /// Returned at least `min_results` results.
    Accepted { count: usize },
    /// Returned successfully but fewer than `min_results` results.
    BelowThreshold { count: usize, min_results: usize },
    /// Timed out, was unreachable, or answered with garbage.
    Failed { failure: BackendFailure },
}

impl BackendOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_below_threshold(&self) -> bool {
        matches!(self, Self::BelowThreshold { .. })
    }
}

/// One entry of the `backends_tried` audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendAttempt {
    pub name: String,
    pub outcome: BackendOutcome,
}

/// The merged answer of a dispatch call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    /// Merged, deduplicated results in priority-then-rank order.
    pub results: Vec<SearchResult>,
    /// Every backend that was invoked, in the order it was considered.
    pub backends_tried: Vec<BackendAttempt>,
    /// Set when no backend met its `min_results` threshold and the results
    /// are the best provisional set available.
    pub fallback_exhausted: bool,
}

/// A successful invocation of one backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub results: Vec<SearchResult>,
    /// Fewer than the backend's `min_results` were returned.
    pub below_threshold: bool,
}
