//! Boost transforms: simulated ranking-formula changes.
//!
//! A transform receives the baseline list and returns the list it would
//! have produced instead. The metric engine measures the difference.

use std::collections::BTreeMap;

use chrono::Datelike;
use scholar_dispatch::SearchResult;
use serde::{Deserialize, Serialize};

use crate::error::{CompareError, Result};

/// Reorders or rescores a ranked result list.
pub trait BoostTransform: Send + Sync {
    fn apply(&self, results: &[SearchResult]) -> Vec<SearchResult>;
}

impl<F> BoostTransform for F
where
    F: Fn(&[SearchResult]) -> Vec<SearchResult> + Send + Sync,
{
    fn apply(&self, results: &[SearchResult]) -> Vec<SearchResult> {
        self(results)
    }
}

/// Multiplicative boost from citation count, publication recency and
/// document type.
///
/// ```text
/// citation factor = 1 + w_c * (1 + citations / 1000)     when citations > 0
/// recency factor  = max(1, 1 + w_r * (1 - age / 30))     when 1800 <= year <= reference_year
/// doctype factor  = 1 + w_t[doctype]                     when the lowercased doctype is weighted
/// boost           = min(citation * recency * doctype, max_boost)
/// ```
///
/// Results are stably re-sorted by boost, highest first. The reference
/// year is fixed at construction so repeated runs agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBoost {
    pub citation_weight: f64,
    pub recency_weight: f64,
    pub max_boost: f64,
    pub reference_year: i32,
    /// Extra weight per lowercase document type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub doctype_weights: BTreeMap<String, f64>,
}

/// Per-field factors behind one result's boost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostScore {
    pub citation: Option<f64>,
    pub recency: Option<f64>,
    pub doctype: Option<f64>,
    /// Capped product of the factors; `1.0` when none applied.
    pub total: f64,
}

impl FieldBoost {
    /// A boost with zero weights (identity) and a cap of 2.
    pub fn new(reference_year: i32) -> Self {
        Self {
            citation_weight: 0.0,
            recency_weight: 0.0,
            max_boost: 2.0,
            reference_year,
            doctype_weights: BTreeMap::new(),
        }
    }

    /// [`FieldBoost::new`] anchored at the current UTC year.
    pub fn current() -> Self {
        Self::new(chrono::Utc::now().year())
    }

    pub fn with_citation_weight(mut self, weight: f64) -> Self {
        self.citation_weight = weight;
        self
    }

    pub fn with_recency_weight(mut self, weight: f64) -> Self {
        self.recency_weight = weight;
        self
    }

    pub fn with_max_boost(mut self, max_boost: f64) -> Self {
        self.max_boost = max_boost;
        self
    }

    /// Weight results whose doctype matches `doctype`, case-insensitively.
    pub fn with_doctype_weight(mut self, doctype: &str, weight: f64) -> Self {
        self.doctype_weights.insert(doctype.to_lowercase(), weight);
        self
    }

    /// # Errors
    ///
    /// Returns [`CompareError::Config`] for negative or non-finite weights,
    /// or a cap below 1.
    pub fn validate(&self) -> Result<()> {
        let doctype_weights = self
            .doctype_weights
            .iter()
            .map(|(doctype, weight)| (format!("doctype weight for {doctype}"), *weight));
        for (name, weight) in [
            ("citation_weight".to_owned(), self.citation_weight),
            ("recency_weight".to_owned(), self.recency_weight),
        ]
        .into_iter()
        .chain(doctype_weights)
        {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(CompareError::Config(format!(
                    "{name} must be a non-negative number, got {weight}"
                )));
            }
        }
        if !(self.max_boost.is_finite() && self.max_boost >= 1.0) {
            return Err(CompareError::Config(format!(
                "max_boost must be at least 1, got {}",
                self.max_boost
            )));
        }
        Ok(())
    }

    pub fn score(&self, result: &SearchResult) -> BoostScore {
        let citation = result
            .citation_count
            .filter(|count| *count > 0)
            .map(|count| 1.0 + self.citation_weight * (1.0 + count as f64 / 1000.0));

        let recency = result
            .year
            .filter(|year| (1800..=self.reference_year).contains(year))
            .map(|year| {
                let age = f64::from(self.reference_year - year);
                (1.0 + self.recency_weight * (1.0 - age / 30.0)).max(1.0)
            });

        let doctype = result
            .doctype
            .as_deref()
            .and_then(|doctype| self.doctype_weights.get(&doctype.to_lowercase()))
            .map(|weight| 1.0 + weight);

        let product = citation.unwrap_or(1.0) * recency.unwrap_or(1.0) * doctype.unwrap_or(1.0);
        BoostScore {
            citation,
            recency,
            doctype,
            total: product.min(self.max_boost),
        }
    }
}

impl BoostTransform for FieldBoost {
    fn apply(&self, results: &[SearchResult]) -> Vec<SearchResult> {
        let mut scored: Vec<(f64, &SearchResult)> =
            results.iter().map(|r| (self.score(r).total, r)).collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().map(|(_, r)| r.clone()).collect()
    }
}
