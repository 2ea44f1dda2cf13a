//! Service layer: wires the dispatcher, the judgment repository and the
//! metric engine together, and caches dispatch results.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use scholar_dispatch::backends::{AdsClient, SemanticScholarClient};
use scholar_dispatch::{DispatchPolicy, DispatchResult, Dispatcher};
use serde::{Deserialize, Serialize};

use crate::compare::CrossBackendReport;
use crate::config::{ADS_BACKEND, AppConfig, CacheConfig, SEMANTIC_SCHOLAR_BACKEND};
use crate::error::{CompareError, Result};
use crate::experiment::{BoostExperimentResult, BoostTransform, FieldBoost, evaluate};
use crate::quepid::{self, JudgmentRepository, QuepidCase, QuepidClient};

/// Already-resolved credentials. Absent keys leave the matching client
/// unregistered (backends) or unauthenticated (Quepid).
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub ads_token: Option<String>,
    pub semantic_scholar_key: Option<String>,
    pub quepid_api_key: Option<String>,
}

/// Dispatch cache key: normalised query plus policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: String,
    parallel: bool,
}

impl CacheKey {
    fn new(query: &str, policy: DispatchPolicy) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            parallel: policy.parallel,
        }
    }
}

/// Both title views of a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseTitles {
    pub case_id: u64,
    pub by_query: BTreeMap<String, BTreeMap<String, String>>,
    pub flat: BTreeMap<String, String>,
}

/// Parameters of one boost experiment.
#[derive(Debug, Clone)]
pub struct ExperimentRequest {
    pub case_id: u64,
    pub query: String,
    pub policy: DispatchPolicy,
    pub boost: Option<FieldBoost>,
}

/// A boost experiment with the search it evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub case_id: u64,
    pub case_name: String,
    pub query: String,
    /// Case query the judgments were taken from, when one matched.
    pub matched_query: Option<String>,
    pub search: DispatchResult,
    pub evaluation: BoostExperimentResult,
}

pub struct ComparisonService {
    dispatcher: Arc<Dispatcher>,
    repository: Arc<dyn JudgmentRepository>,
    cache: Option<Cache<CacheKey, DispatchResult>>,
}

impl ComparisonService {
    pub fn new(
        dispatcher: Dispatcher,
        repository: Arc<dyn JudgmentRepository>,
        cache: &CacheConfig,
    ) -> Self {
        let cache = cache.enabled.then(|| {
            Cache::builder()
                .max_capacity(cache.max_entries)
                .time_to_live(Duration::from_secs(cache.ttl_seconds))
                .build()
        });
        Self {
            dispatcher: Arc::new(dispatcher),
            repository,
            cache,
        }
    }

    /// Build the service from configuration, registering a client for every
    /// backend whose credentials are available.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or an HTTP client
    /// cannot be built.
    pub fn from_config(config: &AppConfig, credentials: Credentials) -> Result<Self> {
        config.validate()?;
        let mut dispatcher = Dispatcher::new(config.registry()?);

        match credentials.ads_token.filter(|t| !t.is_empty()) {
            Some(token) => {
                let ads = AdsClient::new(config.ads.base_url.clone(), token)
                    .map_err(|e| CompareError::Config(format!("ADS client: {e}")))?
                    .with_rows(config.ads.rows);
                dispatcher.register_client(ADS_BACKEND, Arc::new(ads));
            }
            None => tracing::warn!(backend = ADS_BACKEND, "no ADS token, backend will be unavailable"),
        }

        let s2 = SemanticScholarClient::new(
            config.semantic_scholar.base_url.clone(),
            credentials.semantic_scholar_key,
        )
        .map_err(|e| CompareError::Config(format!("Semantic Scholar client: {e}")))?
        .with_limit(config.semantic_scholar.limit);
        dispatcher.register_client(SEMANTIC_SCHOLAR_BACKEND, Arc::new(s2));

        let api_key = credentials.quepid_api_key.unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!("no Quepid API key, case requests will be unauthenticated");
        }
        let quepid = QuepidClient::new(
            config.quepid.base_url.clone(),
            api_key,
            config.quepid.timeout(),
        )
        .map_err(|e| CompareError::Config(format!("Quepid client: {e}")))?;

        Ok(Self::new(dispatcher, Arc::new(quepid), &config.cache))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Dispatch `query`, serving repeated queries from the cache.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Dispatch`] when the registry is unusable or
    /// every backend failed.
    ///
    /// Only complete answers are cached: a result where some backend failed
    /// or no backend met its threshold is returned but not stored, so the
    /// next call dispatches again.
    pub async fn search(&self, query: &str, policy: DispatchPolicy) -> Result<DispatchResult> {
        let key = CacheKey::new(query, policy);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key).await {
                tracing::debug!(query, "dispatch cache hit");
                return Ok(hit);
            }
        }

        let result = self.dispatcher.dispatch(query, policy).await?;
        if let Some(cache) = &self.cache {
            if is_cacheable(&result) {
                cache.insert(key, result.clone()).await;
            } else {
                tracing::debug!(query, "degraded dispatch result not cached");
            }
        }
        Ok(result)
    }

    /// # Errors
    ///
    /// See [`quepid::load_case`].
    pub async fn load_case(&self, case_id: u64) -> Result<QuepidCase> {
        quepid::load_case(self.repository.as_ref(), case_id).await
    }

    /// # Errors
    ///
    /// See [`quepid::load_case`].
    pub async fn titles(&self, case_id: u64) -> Result<CaseTitles> {
        let case = self.load_case(case_id).await?;
        Ok(CaseTitles {
            case_id,
            by_query: quepid::titles_by_query(&case),
            flat: quepid::flat_titles(&case),
        })
    }

    /// Load the case, pick the case query closest to the request, search,
    /// and evaluate with and without the boost.
    ///
    /// When no case query matches, the results are evaluated against no
    /// judgments.
    ///
    /// # Errors
    ///
    /// Case-load failures, an invalid boost, or a failed dispatch.
    pub async fn run_experiment(&self, request: &ExperimentRequest) -> Result<ExperimentReport> {
        if let Some(boost) = &request.boost {
            boost.validate()?;
        }
        let case = self.load_case(request.case_id).await?;

        let matched_query = case.closest_query(&request.query).map(str::to_owned);
        match &matched_query {
            Some(matched) if matched != &request.query => {
                tracing::info!(case_id = case.case_id, matched = %matched, "using closest case query");
            }
            Some(_) => {}
            None => tracing::warn!(
                case_id = case.case_id,
                "no case query matches, evaluating without judgments"
            ),
        }

        let search = self.search(&request.query, request.policy).await?;
        let judged_query = matched_query.as_deref().unwrap_or(&request.query);
        let boost = request.boost.as_ref().map(|b| b as &dyn BoostTransform);
        let evaluation = evaluate(judged_query, &search.results, &case, boost);

        Ok(ExperimentReport {
            case_id: case.case_id,
            case_name: case.name.clone(),
            query: request.query.clone(),
            matched_query,
            search,
            evaluation,
        })
    }

    /// Query every enabled backend and compare their rankings.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Dispatch`] when the registry is unusable.
    pub async fn compare(&self, query: &str) -> Result<CrossBackendReport> {
        let runs = self.dispatcher.fan_out(query).await?;
        Ok(CrossBackendReport::from_runs(query, &runs))
    }
}

fn is_cacheable(result: &DispatchResult) -> bool {
    !result.fallback_exhausted
        && !result
            .backends_tried
            .iter()
            .any(|attempt| attempt.outcome.is_failure())
}
