//! HTTP call wrapper.
//!
//! Every outgoing request goes through [`ServiceClient::call`], which applies a
//! per-call timeout and turns the response into an explicit
//! `Result<CallResponse, CallError>`. Callers decide which statuses count as
//! accepted; nothing here retries.

use std::time::{Duration, Instant};

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::error::CallError;

/// Accepted status sets shared by the workload and seeding code.
pub mod accept {
    /// Plain reads.
    pub const OK: &[u16] = &[200];
    /// Writes that may answer 200 or 201.
    pub const CREATED: &[u16] = &[200, 201];
    /// Likes: 400 means "already liked".
    pub const LIKE: &[u16] = &[200, 400];
    /// Registration: duplicates under concurrent generation are expected.
    pub const REGISTER: &[u16] = &[200, 201, 400, 409];
}

/// Maximum characters of an error body kept for logging.
const ERROR_BODY_LIMIT: usize = 200;

/// An accepted response.
#[derive(Debug, Clone)]
pub struct CallResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub elapsed: Duration,
}

impl CallResponse {
    /// Response size in bytes.
    pub fn bytes(&self) -> usize {
        self.body.len()
    }

    /// Decode the body as JSON. Malformed bodies yield `None`.
    pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Shared HTTP client for all services.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: reqwest::Client,
}

impl ServiceClient {
    /// Create a client with connection pooling suited to many virtual users.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tripico-loadtest/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(64)
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// The underlying reqwest client, for building requests.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Send a request with `timeout`, accepting only the statuses in `accepted`.
    pub async fn call(
        &self,
        request: RequestBuilder,
        timeout: Duration,
        accepted: &[u16],
    ) -> Result<CallResponse, CallError> {
        let start = Instant::now();

        let response = request.timeout(timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                CallError::Timeout(timeout)
            } else {
                CallError::Transport(e)
            }
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                CallError::Timeout(timeout)
            } else {
                CallError::Transport(e)
            }
        })?;
        let elapsed = start.elapsed();

        if accepted.contains(&status) {
            Ok(CallResponse {
                status,
                body: body.to_vec(),
                elapsed,
            })
        } else {
            Err(CallError::Status {
                status,
                elapsed,
                bytes: body.len(),
                body: String::from_utf8_lossy(&body)
                    .chars()
                    .take(ERROR_BODY_LIMIT)
                    .collect(),
            })
        }
    }
}

/// Attach a bearer token when one is available.
pub fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn malformed_json_is_empty_result() {
        let response = CallResponse {
            status: 200,
            body: b"<html>oops</html>".to_vec(),
            elapsed: Duration::from_millis(5),
        };
        assert!(response.json::<serde_json::Value>().is_none());
        assert_eq!(response.bytes(), 17);
    }

    #[test]
    fn accepted_sets() {
        assert!(accept::LIKE.contains(&400));
        assert!(!accept::OK.contains(&400));
        assert!(accept::REGISTER.contains(&409));
    }
}
