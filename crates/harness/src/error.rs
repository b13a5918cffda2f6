//! Harness error types.

use std::time::Duration;

use thiserror::Error;

/// Outcome of a single HTTP call that did not produce an accepted response.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected status {status}")]
    Status {
        status: u16,
        elapsed: Duration,
        bytes: usize,
        body: String,
    },
}

impl CallError {
    /// Response time to report for this failure.
    ///
    /// Only a status failure produced a response; timeouts and transport
    /// errors report zero.
    pub fn elapsed(&self) -> Duration {
        match self {
            CallError::Status { elapsed, .. } => *elapsed,
            CallError::Timeout(_) | CallError::Transport(_) => Duration::ZERO,
        }
    }

    /// Response size to report for this failure.
    pub fn bytes(&self) -> usize {
        match self {
            CallError::Status { bytes, .. } => *bytes,
            CallError::Timeout(_) | CallError::Transport(_) => 0,
        }
    }

    /// HTTP status, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            CallError::Status { status, .. } => Some(*status),
            CallError::Timeout(_) | CallError::Transport(_) => None,
        }
    }
}

/// Identity provider failures. Never escapes the credential cache.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity provider API key not configured")]
    NotConfigured,

    #[error("identity provider call failed: {0}")]
    Call(#[from] CallError),

    #[error("identity provider response missing `{0}`")]
    MissingField(&'static str),
}

/// Invalid workload definitions.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("weighted table has no entries")]
    Empty,

    #[error("entry `{0}` has zero weight")]
    ZeroWeight(String),

    #[error("unknown profile `{0}`")]
    UnknownProfile(String),
}
