//! Priority merge and deduplication by `doc_id`.
//!
//! Result lists are merged in backend priority order. The first entry seen
//! for a `doc_id` wins and keeps its own `rank`, `title` and source; later
//! entries for the same document are dropped, never merged field-by-field.

use std::collections::HashSet;

use crate::types::SearchResult;

/// Merge per-backend result lists that are already in priority order.
///
/// The output preserves that order: all surviving results of the first
/// list, then the new documents of the second list, and so on. Each list
/// keeps its internal rank order.
pub fn merge_by_priority<I>(lists: I) -> Vec<SearchResult>
where
    I: IntoIterator<Item = Vec<SearchResult>>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::new();

    for list in lists {
        for result in list {
            if seen.contains(&result.doc_id) {
                tracing::trace!(
                    doc_id = %result.doc_id,
                    backend = %result.source_backend,
                    "dropping lower-priority duplicate"
                );
                continue;
            }
            seen.insert(result.doc_id.clone());
            merged.push(result);
        }
    }
    merged
}

/// Deduplicate a single list by `doc_id`, keeping first occurrences.
pub fn deduplicate(results: Vec<SearchResult>) -> Vec<SearchResult> {
    merge_by_priority(std::iter::once(results))
}
