//! # scholar-dispatch
//!
//! Multi-backend dispatch for academic literature search.
//!
//! This crate sends one query to several pre-existing search services
//! (ADS, Semantic Scholar, ...) under a priority/timeout/fallback policy and
//! returns one merged, deduplicated result list together with an audit trail
//! of every backend that was tried. It does not index or rank documents
//! itself.
//!
//! ## Design
//!
//! - [`BackendRegistry`]: static, validated backend configuration
//! - [`invoker::invoke`]: one backend call, timeout-bounded, failures classified
//! - [`Dispatcher`]: sequential fallback or concurrent fan-out, priority merge
//! - [`BackendClient`]: the narrow contract the concrete clients implement
//!
//! ## Failure model
//!
//! - Per-backend failures ([`BackendFailure`]) are absorbed into fallback
//!   decisions and reported in [`DispatchResult::backends_tried`]
//! - A dispatch raises only when the registry is unusable or every backend
//!   failed outright ([`DispatchError`])
//! - Queries are logged only at debug/trace level

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;
pub mod http;
pub mod invoker;
pub mod orchestrator;
pub mod registry;
pub mod types;

pub use backend::BackendClient;
pub use config::BackendConfig;
pub use error::{BackendFailure, BackendFailureKind, ClientError, DispatchError, Result};
pub use orchestrator::dispatch::{BackendRun, Dispatcher};
pub use registry::BackendRegistry;
pub use types::{
    BackendAttempt, BackendOutcome, DispatchPolicy, DispatchResult, Invocation, RawDocument,
    SearchResult,
};

/// Dispatch `query` through `dispatcher` using `policy`.
///
/// Convenience wrapper around [`Dispatcher::dispatch`].
///
/// # Errors
///
/// Returns [`DispatchError::RegistryUnreadable`] if no backends are
/// configured, or [`DispatchError::DispatchExhausted`] if every enabled
/// backend failed.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> scholar_dispatch::Result<()> {
/// use std::sync::Arc;
/// use scholar_dispatch::backends::AdsClient;
/// use scholar_dispatch::{BackendConfig, BackendRegistry, DispatchPolicy, Dispatcher};
///
/// let registry = BackendRegistry::new(vec![BackendConfig::new("ads", 1).with_min_results(5)])?;
/// let ads = AdsClient::new(scholar_dispatch::backends::ads::DEFAULT_ADS_URL, "token")
///     .map_err(|e| scholar_dispatch::DispatchError::RegistryUnreadable(e.to_string()))?;
/// let dispatcher = Dispatcher::new(registry).with_client("ads", Arc::new(ads));
/// let outcome = scholar_dispatch::dispatch(&dispatcher, "dark matter halos", DispatchPolicy::sequential()).await?;
/// for result in &outcome.results {
///     println!("{} {}: {}", result.rank, result.doc_id, result.title);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn dispatch(
    dispatcher: &Dispatcher,
    query: &str,
    policy: DispatchPolicy,
) -> Result<DispatchResult> {
    dispatcher.dispatch(query, policy).await
}
