//! Semantic Scholar Graph API search client.
//!
//! Reads the `data` array of the paper search endpoint. The document id is
//! the DOI from `externalIds` when present, else the Semantic Scholar
//! `paperId`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::backend::BackendClient;
use crate::error::ClientError;
use crate::http::{build_client, get_json};
use crate::types::RawDocument;

use super::parse_year;

/// Default Semantic Scholar paper search endpoint.
pub const DEFAULT_SEMANTIC_SCHOLAR_URL: &str =
    "https://api.semanticscholar.org/graph/v1/paper/search";

const FIELDS: &str = "title,externalIds,year,citationCount,publicationTypes";

/// Semantic Scholar client. The API key is optional; anonymous access is
/// rate limited more aggressively.
pub struct SemanticScholarClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Paper>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Paper {
    paper_id: Option<String>,
    title: Option<String>,
    external_ids: Option<ExternalIds>,
    #[serde(default)]
    year: serde_json::Value,
    citation_count: Option<u64>,
    publication_types: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
}

impl Paper {
    fn into_raw(self) -> RawDocument {
        let doc_id = self
            .external_ids
            .and_then(|ids| ids.doi)
            .filter(|doi| !doi.trim().is_empty())
            .or(self.paper_id);
        RawDocument {
            doc_id,
            title: self.title,
            score: None,
            year: parse_year(&self.year),
            citation_count: self.citation_count,
            doctype: self
                .publication_types
                .and_then(|types| types.into_iter().next())
                .map(|t| t.to_lowercase()),
        }
    }
}

impl SemanticScholarClient {
    /// Create a client for `base_url` with an optional, already-resolved key.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, ClientError> {
        Ok(Self {
            http: build_client()?,
            base_url: base_url.into(),
            api_key: api_key.filter(|key| !key.is_empty()),
            limit: 20,
        })
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[async_trait]
impl BackendClient for SemanticScholarClient {
    async fn search(
        &self,
        query: &str,
        timeout: Duration,
    ) -> Result<Vec<RawDocument>, ClientError> {
        let limit = self.limit.to_string();
        let mut request = self
            .http
            .get(&self.base_url)
            .timeout(timeout)
            .query(&[("query", query), ("fields", FIELDS), ("limit", limit.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let body: SearchResponse = get_json(request).await?;
        Ok(body.data.into_iter().map(Paper::into_raw).collect())
    }
}
