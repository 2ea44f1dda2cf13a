//! Relevance and boost metric engine.

pub mod boost;
pub mod evaluate;
pub mod metrics;
pub mod stats;

pub use boost::{BoostScore, BoostTransform, FieldBoost};
pub use evaluate::{BoostExperimentResult, DocumentDetail, DocumentStatus, evaluate};
pub use metrics::{CutoffScore, RelevanceSummary};
pub use stats::RankMovement;
