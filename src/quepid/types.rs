//! Canonical judgment data, independent of the export shape it came from.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Open set of extra judgment fields (`title`, `publication_date`, ...).
pub type Metadata = BTreeMap<String, Value>;

/// One human relevance grade for a (query, document) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuepidJudgment {
    pub query_text: String,
    pub doc_id: String,
    /// Ordinal grade; higher is more relevant, `0` is not relevant.
    pub rating: i32,
    #[serde(default)]
    pub metadata: Metadata,
}

impl QuepidJudgment {
    pub fn new(query_text: impl Into<String>, doc_id: impl Into<String>, rating: i32) -> Self {
        Self {
            query_text: query_text.into(),
            doc_id: doc_id.into(),
            rating,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The `title` metadata entry, when present as a string.
    pub fn title(&self) -> Option<&str> {
        self.metadata.get("title").and_then(Value::as_str)
    }

    pub fn is_relevant(&self) -> bool {
        self.rating > 0
    }
}

/// A named collection of queries and their judgments.
///
/// Every query in `queries` has an entry in `judgments`, possibly empty,
/// and `judgments` has no key outside `queries`. Judgments within a query
/// are ordered by `doc_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuepidCase {
    pub case_id: u64,
    pub name: String,
    pub queries: Vec<String>,
    pub judgments: BTreeMap<String, Vec<QuepidJudgment>>,
}

impl QuepidCase {
    /// Judgments recorded for `query_text`; empty when the query is unknown.
    pub fn judgments_for(&self, query_text: &str) -> &[QuepidJudgment] {
        self.judgments
            .get(query_text)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn judgment_count(&self) -> usize {
        self.judgments.values().map(Vec::len).sum()
    }

    /// Find the case query that best matches `query`.
    ///
    /// An exact match after trimming and lowercasing wins. Otherwise the
    /// candidate whose word set contains, or is contained in, the query's
    /// word set and shares the most words with it is chosen; ties go to the
    /// earlier query.
    pub fn closest_query(&self, query: &str) -> Option<&str> {
        let wanted = query.trim().to_lowercase();
        if let Some(exact) = self
            .queries
            .iter()
            .find(|q| q.trim().to_lowercase() == wanted)
        {
            return Some(exact);
        }

        let wanted_words: HashSet<&str> = wanted.split_whitespace().collect();
        if wanted_words.is_empty() {
            return None;
        }

        let mut best: Option<(&str, usize)> = None;
        for candidate in &self.queries {
            let lowered = candidate.trim().to_lowercase();
            let words: HashSet<&str> = lowered.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }
            if !(wanted_words.is_subset(&words) || words.is_subset(&wanted_words)) {
                continue;
            }
            let shared = words.intersection(&wanted_words).count();
            if best.is_none_or(|(_, top)| shared > top) {
                best = Some((candidate.as_str(), shared));
            }
        }
        best.map(|(query, _)| query)
    }
}
