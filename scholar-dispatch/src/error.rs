//! Error types for the scholar-dispatch crate.
//!
//! Per-backend failures ([`BackendFailure`]) are recoverable: the dispatch
//! coordinator absorbs them and records them in the audit trail. Only
//! [`DispatchError`] ever reaches a caller of [`crate::Dispatcher::dispatch`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a single backend call that did not produce results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendFailureKind {
    /// The backend did not answer within its configured timeout.
    Timeout,
    /// Transport-level failure, non-success status, or no client registered.
    Unavailable,
    /// The backend answered but the payload could not be interpreted.
    Malformed,
}

impl BackendFailureKind {
    /// Stable lowercase name used in logs and display strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Unavailable => "unavailable",
            Self::Malformed => "malformed",
        }
    }
}

impl fmt::Display for BackendFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed invocation of one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("backend {kind}: {message}")]
pub struct BackendFailure {
    /// What went wrong.
    pub kind: BackendFailureKind,
    /// Human-readable detail. Never contains credentials.
    pub message: String,
}

impl BackendFailure {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: BackendFailureKind::Timeout,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: BackendFailureKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: BackendFailureKind::Malformed,
            message: message.into(),
        }
    }
}

/// Errors returned by a [`crate::BackendClient`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the connection dropped.
    #[error("transport error: {0}")]
    Transport(String),

    /// The client's own request deadline passed.
    #[error("request timed out: {0}")]
    TimedOut(String),

    /// The backend answered with a non-success HTTP status.
    #[error("HTTP status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<ClientError> for BackendFailure {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport(_) | ClientError::Status { .. } => {
                BackendFailure::unavailable(err.to_string())
            }
            ClientError::TimedOut(_) => BackendFailure::timeout(err.to_string()),
            ClientError::Parse(_) => BackendFailure::malformed(err.to_string()),
        }
    }
}

/// Errors surfaced to callers of the dispatch entry points.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The backend configuration could not be read or is invalid.
    /// Fatal at startup, never retried.
    #[error("backend registry unreadable: {0}")]
    RegistryUnreadable(String),

    /// Every enabled backend failed; nothing usable was returned.
    #[error("all backends failed: {0}")]
    DispatchExhausted(String),
}

/// Convenience type alias for scholar-dispatch results.
pub type Result<T> = std::result::Result<T, DispatchError>;
