//! Trait definition for pluggable search backend clients.
//!
//! Each provider (ADS, Semantic Scholar, ...) implements [`BackendClient`]
//! to give the invoker a uniform, already-authenticated way to run a query.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ClientError;
use crate::types::RawDocument;

/// A search backend collaborator.
///
/// Implementors own the literal network call: URL construction, headers,
/// authentication, and parsing the provider's response into
/// [`RawDocument`]s in the provider's own rank order. They do not decide
/// whether a response is "enough"; that is the invoker's and coordinator's
/// job.
///
/// All implementations must be `Send + Sync` so backends can be queried
/// concurrently.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Run `query` against the backend.
    ///
    /// `timeout` is the backend's configured budget, passed through so the
    /// client can set it on its own transport. The invoker enforces it
    /// independently.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails, the backend answers
    /// with a non-success status, or the body cannot be parsed.
    async fn search(&self, query: &str, timeout: Duration)
    -> Result<Vec<RawDocument>, ClientError>;
}
