//! Dispatch coordinator: priority fallback, concurrent fan-out, merge.
//!
//! This module decides which backends to call for a query, in what order,
//! and how their answers are combined into one deduplicated list with an
//! audit trail of every backend that was tried.

pub mod dispatch;
pub mod merge;
