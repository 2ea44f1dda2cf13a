//! Judgment repository contract and the Quepid HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use scholar_dispatch::ClientError;
use scholar_dispatch::http::{build_client, get_json};
use serde_json::Value;

/// Failure talking to the judgment repository.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepositoryError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl From<ClientError> for RepositoryError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport(message) | ClientError::TimedOut(message) => {
                Self::Transport(message)
            }
            ClientError::Status { status, message } => Self::Status { status, message },
            ClientError::Parse(message) => Self::Decode(message),
        }
    }
}

/// Read-only access to a judgment repository.
///
/// Both calls return the raw JSON document; shape handling belongs to the
/// normalizer.
#[async_trait]
pub trait JudgmentRepository: Send + Sync {
    /// Case metadata (name, listed queries, ...).
    async fn get_case(&self, case_id: u64) -> Result<Value, RepositoryError>;

    /// The ratings export, in either the flat or the nested shape.
    async fn get_case_ratings(&self, case_id: u64) -> Result<Value, RepositoryError>;
}

/// Quepid REST API client.
pub struct QuepidClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl QuepidClient {
    /// Create a client rooted at `base_url` (e.g. `https://app.quepid.com/api/`).
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RepositoryError> {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            http: build_client()?,
            base_url,
            api_key: api_key.into(),
            timeout,
        })
    }

    async fn get(&self, path: &str) -> Result<Value, RepositoryError> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(%url, "quepid request");
        let request = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout);
        Ok(get_json(request).await?)
    }
}

#[async_trait]
impl JudgmentRepository for QuepidClient {
    async fn get_case(&self, case_id: u64) -> Result<Value, RepositoryError> {
        self.get(&format!("cases/{case_id}")).await
    }

    async fn get_case_ratings(&self, case_id: u64) -> Result<Value, RepositoryError> {
        self.get(&format!("export/ratings/{case_id}")).await
    }
}
