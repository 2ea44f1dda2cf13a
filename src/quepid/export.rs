//! The two shapes a Quepid ratings export can take.
//!
//! Flat:   `{"ratings": [{"query_text": "q", "doc_id": "d1", "rating": 3, "title": "T"}, ...]}`
//! Nested: `{"queries": [{"query": "q", "ratings": {"d1": 3, "d2": 0}}, ...]}`
//!
//! The shape is resolved once, in [`RatingsExport::from_value`]. Records
//! that cannot yield a query, a document id and a rating are dropped there.

use serde_json::{Map, Value};

use super::types::Metadata;

/// One usable rating record of a flat export.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRating {
    pub query_text: String,
    pub doc_id: String,
    pub rating: i32,
    /// Every field of the record other than the query, id and rating.
    pub metadata: Metadata,
}

/// One query of a nested export with its usable `doc_id -> rating` pairs,
/// in export order.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedQuery {
    pub query_text: String,
    pub ratings: Vec<(String, i32)>,
}

/// A ratings export with its shape resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum RatingsExport {
    Flat(Vec<FlatRating>),
    Nested(Vec<NestedQuery>),
}

impl RatingsExport {
    /// Detect the shape of a raw export and extract its usable records.
    ///
    /// A top-level `ratings` key selects the flat shape; otherwise a
    /// `queries` key selects the nested shape. Anything else is an export
    /// with no judgments.
    pub fn from_value(raw: &Value) -> Self {
        if let Some(records) = raw.get("ratings").and_then(Value::as_array) {
            let ratings: Vec<FlatRating> = records.iter().filter_map(flat_rating).collect();
            log_dropped("flat", records.len(), ratings.len());
            return Self::Flat(ratings);
        }
        if let Some(queries) = raw.get("queries").and_then(Value::as_array) {
            return Self::Nested(queries.iter().filter_map(nested_query).collect());
        }
        tracing::warn!("ratings export has neither `ratings` nor `queries`, treating as empty");
        Self::Flat(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Flat(ratings) => ratings.is_empty(),
            Self::Nested(queries) => queries.is_empty(),
        }
    }
}

fn log_dropped(shape: &str, total: usize, kept: usize) {
    if kept < total {
        tracing::debug!(shape, dropped = total - kept, "dropped unusable rating records");
    }
}

fn flat_rating(record: &Value) -> Option<FlatRating> {
    let mut fields: Map<String, Value> = record.as_object()?.clone();
    let query_text = match fields.remove("query_text") {
        Some(value) => {
            fields.remove("query");
            text(&value)
        }
        None => fields.remove("query").as_ref().and_then(text),
    }?;
    let doc_id = fields.remove("doc_id").as_ref().and_then(text)?;
    let rating = fields.remove("rating").as_ref().and_then(parse_rating)?;
    Some(FlatRating {
        query_text,
        doc_id,
        rating,
        metadata: fields.into_iter().collect(),
    })
}

fn nested_query(entry: &Value) -> Option<NestedQuery> {
    let query_text = entry
        .get("query")
        .or_else(|| entry.get("query_text"))
        .and_then(text)?;
    let ratings = match entry.get("ratings").and_then(Value::as_object) {
        Some(map) => map
            .iter()
            .filter(|(doc_id, _)| !doc_id.trim().is_empty())
            .filter_map(|(doc_id, rating)| Some((doc_id.clone(), parse_rating(rating)?)))
            .collect(),
        None => Vec::new(),
    };
    Some(NestedQuery {
        query_text,
        ratings,
    })
}

/// A non-blank string or number rendered as text.
fn text(value: &Value) -> Option<String> {
    let rendered = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!rendered.trim().is_empty()).then_some(rendered)
}

/// Accept integer, float (rounded) or numeric-string grades.
pub(crate) fn parse_rating(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).ok(),
            None => n.as_f64().and_then(round_grade),
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i32>() {
                Ok(i) => Some(i),
                Err(_) => s.parse::<f64>().ok().and_then(round_grade),
            }
        }
        _ => None,
    }
}

fn round_grade(value: f64) -> Option<i32> {
    let rounded = value.round();
    (rounded.is_finite() && rounded >= f64::from(i32::MIN) && rounded <= f64::from(i32::MAX))
        .then_some(rounded as i32)
}
