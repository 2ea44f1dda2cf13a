//! # search-comparisons
//!
//! Compare how academic search backends rank the same query and measure
//! hypothetical ranking changes ("boost experiments") against Quepid
//! relevance judgments.
//!
//! - [`scholar_dispatch`] queries the backends (priority, timeout, fallback)
//! - [`quepid`] loads and normalizes judgment cases
//! - [`experiment`] scores result lists with and without a boost
//! - [`compare`] measures agreement between backends
//! - [`service`] ties them together behind a cache for the CLI

pub mod compare;
pub mod config;
pub mod error;
pub mod experiment;
pub mod quepid;
pub mod service;

pub use compare::{BackendComparison, CrossBackendReport, compare_backends};
pub use config::AppConfig;
pub use error::{CompareError, Result};
pub use experiment::{BoostExperimentResult, BoostTransform, FieldBoost, evaluate};
pub use quepid::{
    JudgmentRepository, QuepidCase, QuepidClient, QuepidJudgment, flat_titles, load_case,
    titles_by_query,
};
pub use service::{ComparisonService, Credentials, ExperimentRequest};
