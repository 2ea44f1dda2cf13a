//! NASA ADS search client.
//!
//! Queries the ADS search API (Solr-backed) and reads `response.docs`.
//! The document id is the first DOI when present, else the bibcode.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::backend::BackendClient;
use crate::error::ClientError;
use crate::http::{build_client, get_json};
use crate::types::RawDocument;

use super::{parse_year, OneOrMany};

/// Default ADS search endpoint.
pub const DEFAULT_ADS_URL: &str = "https://api.adsabs.harvard.edu/v1/search/query";

/// Fields requested from ADS for every query.
const FIELDS: &str = "bibcode,title,doi,year,citation_count,doctype,score";

/// ADS search API client. Authenticates with a bearer token.
pub struct AdsClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    rows: usize,
}

#[derive(Debug, Deserialize)]
struct AdsResponse {
    response: AdsDocs,
}

#[derive(Debug, Deserialize)]
struct AdsDocs {
    #[serde(default)]
    docs: Vec<AdsDoc>,
}

#[derive(Debug, Deserialize)]
struct AdsDoc {
    bibcode: Option<String>,
    title: Option<OneOrMany>,
    doi: Option<OneOrMany>,
    #[serde(default)]
    year: serde_json::Value,
    citation_count: Option<u64>,
    doctype: Option<String>,
    score: Option<f64>,
}

impl AdsDoc {
    fn into_raw(self) -> RawDocument {
        let doc_id = self
            .doi
            .as_ref()
            .and_then(OneOrMany::first)
            .map(str::to_string)
            .or(self.bibcode);
        RawDocument {
            doc_id,
            title: self.title.as_ref().and_then(OneOrMany::first).map(str::to_string),
            score: self.score,
            year: parse_year(&self.year),
            citation_count: self.citation_count,
            doctype: self.doctype,
        }
    }
}

impl AdsClient {
    /// Create a client for `base_url` using an already-resolved API token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self {
            http: build_client()?,
            base_url: base_url.into(),
            token: token.into(),
            rows: 20,
        })
    }

    /// Number of rows to request per query.
    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }
}

#[async_trait]
impl BackendClient for AdsClient {
    async fn search(
        &self,
        query: &str,
        timeout: Duration,
    ) -> Result<Vec<RawDocument>, ClientError> {
        let rows = self.rows.to_string();
        let request = self
            .http
            .get(&self.base_url)
            .bearer_auth(&self.token)
            .timeout(timeout)
            .query(&[("q", query), ("fl", FIELDS), ("rows", rows.as_str())]);

        let body: AdsResponse = get_json(request).await?;
        Ok(body.response.docs.into_iter().map(AdsDoc::into_raw).collect())
    }
}
