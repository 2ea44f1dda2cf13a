//! Per-backend configuration.
//!
//! A [`BackendConfig`] describes how one search backend participates in
//! dispatch: whether it is enabled, where it sits in the priority order,
//! how long a call may take, and how many results count as a useful answer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Configuration for one search backend. Immutable after startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Unique backend name; also the key used to find its client.
    pub name: String,
    /// Disabled backends are never invoked.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lower values are tried first. Ties keep registration order.
    #[serde(default)]
    pub priority: i32,
    /// Per-call timeout in seconds. Fractions are allowed.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
    /// Fewer results than this flags the call as below threshold.
    #[serde(default = "default_min_results")]
    pub min_results: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_seconds() -> f64 {
    15.0
}

fn default_min_results() -> usize {
    1
}

impl BackendConfig {
    /// Enabled backend with default timeout and a threshold of one result.
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            priority,
            timeout_seconds: default_timeout_seconds(),
            min_results: default_min_results(),
        }
    }

    pub fn with_timeout_seconds(mut self, timeout_seconds: f64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_min_results(mut self, min_results: usize) -> Self {
        self.min_results = min_results;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The per-call timeout as a [`Duration`].
    ///
    /// Values that do not fit a [`Duration`] saturate; [`validate`](Self::validate)
    /// rejects them up front.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds).unwrap_or(Duration::MAX)
    }

    /// Validates this configuration.
    ///
    /// Checks:
    /// - `name` must not be blank
    /// - `timeout_seconds` must be greater than 0 and fit a [`Duration`]
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.name.trim().is_empty() {
            return Err(DispatchError::RegistryUnreadable(
                "backend name must not be empty".into(),
            ));
        }
        if self.timeout_seconds <= 0.0
            || Duration::try_from_secs_f64(self.timeout_seconds).is_err()
        {
            return Err(DispatchError::RegistryUnreadable(format!(
                "backend {}: timeout_seconds must be greater than 0",
                self.name
            )));
        }
        Ok(())
    }
}
