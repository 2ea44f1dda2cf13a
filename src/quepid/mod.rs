//! Quepid judgment cases: repository client, export normalization and
//! title views.

pub mod client;
pub mod export;
pub mod normalize;
pub mod titles;
pub mod types;

pub use client::{JudgmentRepository, QuepidClient, RepositoryError};
pub use export::RatingsExport;
pub use normalize::{load_case, normalize_case};
pub use titles::{flat_titles, titles_by_query};
pub use types::{Metadata, QuepidCase, QuepidJudgment};
