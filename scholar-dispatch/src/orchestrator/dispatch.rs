//! Core dispatch coordinator: sequential fallback or concurrent fan-out.
//!
//! The coordinator consults the [`BackendRegistry`] for the enabled backends
//! in priority order, invokes them through the invoker, and turns
//! per-backend failures into fallback decisions. Partial failure never
//! raises; only an unusable registry or total exhaustion does.

use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::BackendClient;
use crate::config::BackendConfig;
use crate::error::{BackendFailure, DispatchError};
use crate::invoker::invoke;
use crate::registry::BackendRegistry;
use crate::types::{
    BackendAttempt, BackendOutcome, DispatchPolicy, DispatchResult, Invocation, SearchResult,
};

use super::merge::{deduplicate, merge_by_priority};

/// The answer of one backend during a fan-out, unmerged.
#[derive(Debug, Clone)]
pub struct BackendRun {
    pub backend: BackendConfig,
    pub outcome: Result<Invocation, BackendFailure>,
}

impl BackendRun {
    /// Audit-trail entry for this run.
    pub fn attempt(&self) -> BackendAttempt {
        BackendAttempt {
            name: self.backend.name.clone(),
            outcome: outcome_of(&self.backend, &self.outcome),
        }
    }

    /// The results of a successful run, empty on failure.
    pub fn results(&self) -> &[SearchResult] {
        match &self.outcome {
            Ok(invocation) => &invocation.results,
            Err(_) => &[],
        }
    }
}

/// Orchestrates backend clients according to the registry and a policy.
pub struct Dispatcher {
    registry: BackendRegistry,
    clients: HashMap<String, Arc<dyn BackendClient>>,
}

impl Dispatcher {
    /// A dispatcher with no clients attached yet.
    pub fn new(registry: BackendRegistry) -> Self {
        Self {
            registry,
            clients: HashMap::new(),
        }
    }

    /// Attach the client that serves backend `name`.
    pub fn with_client(mut self, name: impl Into<String>, client: Arc<dyn BackendClient>) -> Self {
        self.register_client(name, client);
        self
    }

    pub fn register_client(&mut self, name: impl Into<String>, client: Arc<dyn BackendClient>) {
        self.clients.insert(name.into(), client);
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Dispatch `query` to the enabled backends according to `policy`.
    ///
    /// # Pipeline
    ///
    /// 1. Resolve the priority-ordered backend list from the registry
    /// 2. Sequential: try backends in order, stop at the first one meeting
    ///    its threshold; otherwise keep the largest provisional result set
    /// 3. Parallel: query every backend concurrently, merge in priority order
    /// 4. Deduplicate by `doc_id`, first-by-priority wins
    ///
    /// # Errors
    ///
    /// - [`DispatchError::RegistryUnreadable`] if the registry has no backends
    /// - [`DispatchError::DispatchExhausted`] if no backend is enabled or
    ///   every backend failed outright
    pub async fn dispatch(
        &self,
        query: &str,
        policy: DispatchPolicy,
    ) -> Result<DispatchResult, DispatchError> {
        let backends = self.enabled_backends()?;
        tracing::debug!(%query, parallel = policy.parallel, backends = backends.len(), "dispatching");

        if policy.parallel {
            self.dispatch_parallel(query, backends).await
        } else {
            self.dispatch_sequential(query, backends).await
        }
    }

    /// Query every enabled backend concurrently and return each answer
    /// separately, in priority order.
    ///
    /// Used for cross-backend comparison, where merging would hide exactly
    /// the differences being measured.
    ///
    /// # Errors
    ///
    /// Same registry errors as [`dispatch`](Self::dispatch). Backend
    /// failures are reported inside the returned runs.
    pub async fn fan_out(&self, query: &str) -> Result<Vec<BackendRun>, DispatchError> {
        let backends = self.enabled_backends()?;
        Ok(self.run_concurrently(query, backends).await)
    }

    fn enabled_backends(&self) -> Result<Vec<BackendConfig>, DispatchError> {
        if self.registry.is_empty() {
            return Err(DispatchError::RegistryUnreadable(
                "no backends configured".into(),
            ));
        }
        let backends = self.registry.resolve();
        if backends.is_empty() {
            return Err(DispatchError::DispatchExhausted(
                "no enabled backends".into(),
            ));
        }
        Ok(backends)
    }

    async fn dispatch_sequential(
        &self,
        query: &str,
        backends: Vec<BackendConfig>,
    ) -> Result<DispatchResult, DispatchError> {
        let mut backends_tried = Vec::with_capacity(backends.len());
        let mut provisional: Option<Vec<SearchResult>> = None;
        let mut failures = Vec::new();

        for backend in &backends {
            let outcome = self.invoke_backend(backend, query).await;
            log_outcome(backend, &outcome);
            backends_tried.push(BackendAttempt {
                name: backend.name.clone(),
                outcome: outcome_of(backend, &outcome),
            });

            match outcome {
                Ok(invocation) if !invocation.below_threshold => {
                    return Ok(DispatchResult {
                        results: deduplicate(invocation.results),
                        backends_tried,
                        fallback_exhausted: false,
                    });
                }
                Ok(invocation) => {
                    // Strictly greater, so an earlier backend wins a tie.
                    let better = provisional
                        .as_ref()
                        .is_none_or(|best| invocation.results.len() > best.len());
                    if better {
                        provisional = Some(invocation.results);
                    }
                }
                Err(failure) => failures.push(format!("{}: {failure}", backend.name)),
            }
        }

        match provisional {
            Some(results) => {
                tracing::info!(
                    count = results.len(),
                    "no backend met its threshold, returning best provisional results"
                );
                Ok(DispatchResult {
                    results: deduplicate(results),
                    backends_tried,
                    fallback_exhausted: true,
                })
            }
            None => Err(DispatchError::DispatchExhausted(failures.join("; "))),
        }
    }

    async fn dispatch_parallel(
        &self,
        query: &str,
        backends: Vec<BackendConfig>,
    ) -> Result<DispatchResult, DispatchError> {
        let runs = self.run_concurrently(query, backends).await;

        let backends_tried: Vec<BackendAttempt> = runs.iter().map(BackendRun::attempt).collect();
        if runs.iter().all(|run| run.outcome.is_err()) {
            let failures: Vec<String> = runs
                .iter()
                .filter_map(|run| match &run.outcome {
                    Err(failure) => Some(format!("{}: {failure}", run.backend.name)),
                    Ok(_) => None,
                })
                .collect();
            return Err(DispatchError::DispatchExhausted(failures.join("; ")));
        }

        let fallback_exhausted = !runs
            .iter()
            .any(|run| matches!(&run.outcome, Ok(inv) if !inv.below_threshold));
        let results = merge_by_priority(
            runs.into_iter()
                .filter_map(|run| run.outcome.ok().map(|inv| inv.results)),
        );

        Ok(DispatchResult {
            results,
            backends_tried,
            fallback_exhausted,
        })
    }

    /// Invoke all `backends` concurrently. Each call is bounded by its own
    /// timeout; a slow backend never delays or cancels its siblings beyond
    /// that bound.
    async fn run_concurrently(&self, query: &str, backends: Vec<BackendConfig>) -> Vec<BackendRun> {
        let futures = backends.into_iter().map(|backend| async move {
            let outcome = self.invoke_backend(&backend, query).await;
            log_outcome(&backend, &outcome);
            BackendRun { backend, outcome }
        });
        futures::future::join_all(futures).await
    }

    async fn invoke_backend(
        &self,
        backend: &BackendConfig,
        query: &str,
    ) -> Result<Invocation, BackendFailure> {
        let Some(client) = self.clients.get(&backend.name) else {
            return Err(BackendFailure::unavailable(format!(
                "no client registered for backend {}",
                backend.name
            )));
        };
        invoke(backend, client.as_ref(), query).await
    }
}

fn outcome_of(backend: &BackendConfig, outcome: &Result<Invocation, BackendFailure>) -> BackendOutcome {
    match outcome {
        Ok(inv) if inv.below_threshold => BackendOutcome::BelowThreshold {
            count: inv.results.len(),
            min_results: backend.min_results,
        },
        Ok(inv) => BackendOutcome::Accepted {
            count: inv.results.len(),
        },
        Err(failure) => BackendOutcome::Failed {
            failure: failure.clone(),
        },
    }
}

fn log_outcome(backend: &BackendConfig, outcome: &Result<Invocation, BackendFailure>) {
    match outcome {
        Ok(inv) if inv.below_threshold => tracing::info!(
            backend = %backend.name,
            count = inv.results.len(),
            min_results = backend.min_results,
            "backend returned too few results"
        ),
        Ok(inv) => tracing::debug!(
            backend = %backend.name,
            count = inv.results.len(),
            "backend returned results"
        ),
        Err(failure) => tracing::warn!(
            backend = %backend.name,
            kind = %failure.kind,
            error = %failure.message,
            "backend query failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BackendFailureKind, ClientError};
    use crate::types::RawDocument;
    use async_trait::async_trait;
    use std::time::Duration;

    struct StaticClient {
        ids: Vec<String>,
        delay: Duration,
        fail: bool,
    }

    impl StaticClient {
        fn returning(ids: &[&str]) -> Arc<dyn BackendClient> {
            Arc::new(Self {
                ids: ids.iter().map(|s| s.to_string()).collect(),
                delay: Duration::ZERO,
                fail: false,
            })
        }

        fn failing() -> Arc<dyn BackendClient> {
            Arc::new(Self {
                ids: vec![],
                delay: Duration::ZERO,
                fail: true,
            })
        }

        fn sleeping(delay: Duration) -> Arc<dyn BackendClient> {
            Arc::new(Self {
                ids: vec!["late".into()],
                delay,
                fail: false,
            })
        }
    }

    #[async_trait]
    impl BackendClient for StaticClient {
        async fn search(
            &self,
            _query: &str,
            _timeout: Duration,
        ) -> Result<Vec<RawDocument>, ClientError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(ClientError::Transport("connection refused".into()));
            }
            Ok(self
                .ids
                .iter()
                .map(|id| RawDocument::new(id.clone(), format!("Title {id}")))
                .collect())
        }
    }

    fn ids(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.doc_id.as_str()).collect()
    }

    fn registry(backends: Vec<BackendConfig>) -> BackendRegistry {
        BackendRegistry::new(backends).expect("valid registry")
    }

    #[tokio::test]
    async fn sequential_stops_at_first_backend_meeting_threshold() {
        let dispatcher = Dispatcher::new(registry(vec![
            BackendConfig::new("ads", 1).with_min_results(2),
            BackendConfig::new("s2", 2),
        ]))
        .with_client("ads", StaticClient::returning(&["a", "b"]))
        .with_client("s2", StaticClient::returning(&["c"]));

        let result = dispatcher
            .dispatch("q", DispatchPolicy::sequential())
            .await
            .expect("dispatch");
        assert_eq!(ids(&result.results), vec!["a", "b"]);
        assert_eq!(result.backends_tried.len(), 1);
        assert!(!result.fallback_exhausted);
    }

    #[tokio::test]
    async fn sequential_falls_back_past_failures() {
        let dispatcher = Dispatcher::new(registry(vec![
            BackendConfig::new("ads", 1),
            BackendConfig::new("s2", 2),
        ]))
        .with_client("ads", StaticClient::failing())
        .with_client("s2", StaticClient::returning(&["c"]));

        let result = dispatcher
            .dispatch("q", DispatchPolicy::sequential())
            .await
            .expect("dispatch");
        assert_eq!(ids(&result.results), vec!["c"]);
        assert!(result.backends_tried[0].outcome.is_failure());
        assert_eq!(
            result.backends_tried[1].outcome,
            BackendOutcome::Accepted { count: 1 }
        );
    }

    #[tokio::test]
    async fn sequential_returns_largest_provisional_set_when_all_below_threshold() {
        let dispatcher = Dispatcher::new(registry(vec![
            BackendConfig::new("ads", 1).with_min_results(10),
            BackendConfig::new("s2", 2).with_min_results(10),
            BackendConfig::new("wos", 3).with_min_results(10),
        ]))
        .with_client("ads", StaticClient::returning(&["a"]))
        .with_client("s2", StaticClient::returning(&["b", "c", "d"]))
        .with_client("wos", StaticClient::returning(&["e", "f", "g"]));

        let result = dispatcher
            .dispatch("q", DispatchPolicy::sequential())
            .await
            .expect("dispatch");
        assert!(result.fallback_exhausted);
        // s2 and wos tie on size; the earlier backend wins.
        assert_eq!(ids(&result.results), vec!["b", "c", "d"]);
        assert_eq!(result.backends_tried.len(), 3);
        assert!(result
            .backends_tried
            .iter()
            .all(|attempt| attempt.outcome.is_below_threshold()));
    }

    #[tokio::test]
    async fn sequential_all_failed_is_exhausted() {
        let dispatcher = Dispatcher::new(registry(vec![
            BackendConfig::new("ads", 1),
            BackendConfig::new("s2", 2),
        ]))
        .with_client("ads", StaticClient::failing())
        .with_client("s2", StaticClient::failing());

        let err = dispatcher
            .dispatch("q", DispatchPolicy::sequential())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::DispatchExhausted(_)));
        assert!(err.to_string().contains("ads"));
        assert!(err.to_string().contains("s2"));
    }

    #[tokio::test]
    async fn missing_client_is_recorded_as_unavailable() {
        let dispatcher = Dispatcher::new(registry(vec![
            BackendConfig::new("ghost", 1),
            BackendConfig::new("s2", 2),
        ]))
        .with_client("s2", StaticClient::returning(&["x"]));

        let result = dispatcher
            .dispatch("q", DispatchPolicy::sequential())
            .await
            .expect("dispatch");
        match &result.backends_tried[0].outcome {
            BackendOutcome::Failed { failure } => {
                assert_eq!(failure.kind, BackendFailureKind::Unavailable);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn parallel_merges_first_by_priority() {
        let dispatcher = Dispatcher::new(registry(vec![
            BackendConfig::new("s2", 2),
            BackendConfig::new("ads", 1),
        ]))
        .with_client("ads", StaticClient::returning(&["shared", "a"]))
        .with_client("s2", StaticClient::returning(&["b", "shared"]));

        let result = dispatcher
            .dispatch("q", DispatchPolicy::parallel())
            .await
            .expect("dispatch");
        assert_eq!(ids(&result.results), vec!["shared", "a", "b"]);
        assert_eq!(result.results[0].source_backend, "ads");
        assert_eq!(result.results[0].rank, 1);
        let names: Vec<&str> = result.backends_tried.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["ads", "s2"]);
    }

    #[tokio::test]
    async fn parallel_timeout_does_not_abort_siblings() {
        let dispatcher = Dispatcher::new(registry(vec![
            BackendConfig::new("slow", 1).with_timeout_seconds(0.05),
            BackendConfig::new("fast", 2),
        ]))
        .with_client("slow", StaticClient::sleeping(Duration::from_secs(5)))
        .with_client("fast", StaticClient::returning(&["f1", "f2"]));

        let result = dispatcher
            .dispatch("q", DispatchPolicy::parallel())
            .await
            .expect("dispatch");
        assert_eq!(ids(&result.results), vec!["f1", "f2"]);
        match &result.backends_tried[0].outcome {
            BackendOutcome::Failed { failure } => {
                assert_eq!(failure.kind, BackendFailureKind::Timeout);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn parallel_all_failed_is_exhausted() {
        let dispatcher = Dispatcher::new(registry(vec![BackendConfig::new("ads", 1)]))
            .with_client("ads", StaticClient::failing());
        let err = dispatcher
            .dispatch("q", DispatchPolicy::parallel())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::DispatchExhausted(_)));
    }

    #[tokio::test]
    async fn parallel_below_threshold_sets_flag() {
        let dispatcher = Dispatcher::new(registry(vec![
            BackendConfig::new("ads", 1).with_min_results(5),
        ]))
        .with_client("ads", StaticClient::returning(&["a"]));
        let result = dispatcher
            .dispatch("q", DispatchPolicy::parallel())
            .await
            .expect("dispatch");
        assert!(result.fallback_exhausted);
        assert_eq!(result.results.len(), 1);
    }

    #[tokio::test]
    async fn empty_registry_is_unreadable() {
        let dispatcher = Dispatcher::new(BackendRegistry::default());
        let err = dispatcher
            .dispatch("q", DispatchPolicy::sequential())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::RegistryUnreadable(_)));
    }

    #[tokio::test]
    async fn all_disabled_is_exhausted() {
        let dispatcher = Dispatcher::new(registry(vec![BackendConfig::new("ads", 1).disabled()]))
            .with_client("ads", StaticClient::returning(&["a"]));
        let err = dispatcher
            .dispatch("q", DispatchPolicy::parallel())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::DispatchExhausted(_)));
    }

    #[tokio::test]
    async fn fan_out_keeps_lists_separate() {
        let dispatcher = Dispatcher::new(registry(vec![
            BackendConfig::new("ads", 1),
            BackendConfig::new("s2", 2),
        ]))
        .with_client("ads", StaticClient::returning(&["a", "shared"]))
        .with_client("s2", StaticClient::returning(&["shared"]));

        let runs = dispatcher.fan_out("q").await.expect("fan out");
        assert_eq!(runs.len(), 2);
        assert_eq!(ids(runs[0].results()), vec!["a", "shared"]);
        assert_eq!(ids(runs[1].results()), vec!["shared"]);
        assert_eq!(runs[1].attempt().name, "s2");
    }
}
