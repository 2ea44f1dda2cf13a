//! Concrete backend clients.
//!
//! Each module provides a struct implementing [`crate::backend::BackendClient`]
//! for one literature search API.

pub mod ads;
pub mod semantic_scholar;

pub use ads::AdsClient;
pub use semantic_scholar::SemanticScholarClient;

use serde::Deserialize;

/// A JSON field that some APIs send as a scalar and others as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub(crate) fn first(&self) -> Option<&str> {
        let value = match self {
            Self::One(value) => Some(value.as_str()),
            Self::Many(values) => values.first().map(String::as_str),
        };
        value.filter(|value| !value.trim().is_empty())
    }
}

/// Accept a year given as a number or a numeric string.
pub(crate) fn parse_year(value: &serde_json::Value) -> Option<i32> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
