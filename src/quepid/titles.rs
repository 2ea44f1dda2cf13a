//! Document title views over a normalized case.

use std::collections::BTreeMap;

use super::types::QuepidCase;

/// `query_text -> (doc_id -> title)` for every query of the case.
///
/// Only judgments carrying a string `title` contribute. Queries with no
/// titled judgment map to an empty mapping.
pub fn titles_by_query(case: &QuepidCase) -> BTreeMap<String, BTreeMap<String, String>> {
    case.queries
        .iter()
        .map(|query| {
            let titles = case
                .judgments_for(query)
                .iter()
                .filter_map(|j| Some((j.doc_id.clone(), j.title()?.to_owned())))
                .collect();
            (query.clone(), titles)
        })
        .collect()
}

/// `doc_id -> title` across all queries.
///
/// Queries are processed in case order, so when one document carries
/// different titles under different queries the title from the query
/// listed last wins.
pub fn flat_titles(case: &QuepidCase) -> BTreeMap<String, String> {
    let mut titles = BTreeMap::new();
    for query in &case.queries {
        for judgment in case.judgments_for(query) {
            if let Some(title) = judgment.title() {
                titles.insert(judgment.doc_id.clone(), title.to_owned());
            }
        }
    }
    titles
}
