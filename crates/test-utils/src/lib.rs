//! Tripico test utilities.
//!
//! Helpers for integration testing the load harness: a manual clock, fake
//! identity provider responses, seeded user fixtures and configuration
//! builders pointed at a mock server.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tripico_harness::auth::{CredentialCache, IdentityProvider, SeededUser, SeededUserStore};
use tripico_harness::clock::Clock;
use tripico_harness::config::Config;
use tripico_harness::http::ServiceClient;

/// API key used by every fake identity provider.
pub const TEST_API_KEY: &str = "test-api-key";

/// Password used by every seeded test user.
pub const TEST_PASSWORD: &str = "LoadTest123!";

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(start),
        })
    }

    /// A clock starting at the current wall time.
    pub fn starting_now() -> Arc<Self> {
        Self::new(Utc::now())
    }

    /// Move the clock forward.
    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock() += by;
    }

    /// Move the clock forward by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.advance(TimeDelta::seconds(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// `n` seeded users `loadtest.<i>@example.com`.
pub fn seeded_users(n: usize) -> Vec<SeededUser> {
    (0..n)
        .map(|i| SeededUser {
            id: i as u64,
            name: format!("Test User {i}"),
            email: format!("loadtest.{i}@example.com"),
        })
        .collect()
}

/// Configuration with every service and the identity provider at `base_url`.
///
/// `overrides` replace individual variables, e.g. `("NUM_USERS", "5")`.
pub fn test_config(base_url: &str, overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        "ITINERARY_SERVICE_URL",
        "COMMENTS_LIKES_SERVICE_URL",
        "RECOMMENDATION_SERVICE_URL",
        "WEATHER_SERVICE_URL",
        "TRAVEL_WARNINGS_SERVICE_URL",
        "IDENTITY_TOOLKIT_URL",
    ]
    .iter()
    .map(|k| (k.to_string(), base_url.to_string()))
    .collect();
    vars.insert("FIREBASE_PASSWORD".to_string(), TEST_PASSWORD.to_string());
    vars.insert("RANDOM_SEED".to_string(), "42".to_string());
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }

    match Config::from_lookup(|key| vars.get(key).cloned()) {
        Ok(config) => config,
        Err(e) => panic!("invalid test configuration: {e:#}"),
    }
}

/// HTTP client for tests.
pub fn test_client() -> ServiceClient {
    ServiceClient::from_client(reqwest::Client::new())
}

/// Identity provider at `base_url`, with or without an API key.
pub fn test_provider(base_url: &str, configured: bool) -> IdentityProvider {
    IdentityProvider::new(
        test_client(),
        base_url,
        configured.then(|| TEST_API_KEY.to_string()),
    )
}

/// Credential cache over a provider at `base_url` with `users` preloaded.
pub fn test_cache(
    base_url: &str,
    configured: bool,
    users: Vec<SeededUser>,
    clock: Arc<dyn Clock>,
) -> CredentialCache {
    CredentialCache::new(
        test_provider(base_url, configured),
        SeededUserStore::preloaded(users),
        std::time::Duration::from_secs(3000),
        clock,
    )
}

/// A temporary directory that is removed when dropped.
pub fn temp_dir() -> tempfile::TempDir {
    match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => panic!("failed to create temp dir: {e}"),
    }
}

/// Path of `name` inside `dir`.
pub fn temp_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

/// Search response body with the given itinerary ids.
pub fn search_results(ids: &[i64]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| json!({ "id": id, "title": format!("Itinerary {id}") }))
            .collect(),
    )
}

/// Fake identity provider endpoints.
pub mod identity {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    use super::TEST_API_KEY;

    fn endpoint(action: &str) -> wiremock::MockBuilder {
        Mock::given(method("POST"))
            .and(path(format!("/accounts:{action}")))
            .and(query_param("key", TEST_API_KEY))
    }

    /// Password sign-in answering with `id_token`.
    pub fn sign_in_ok(id_token: &str) -> Mock {
        endpoint("signInWithPassword").respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "idToken": id_token, "expiresIn": "3600" })),
        )
    }

    /// Password sign-in failing with `status`.
    pub fn sign_in_rejected(status: u16) -> Mock {
        endpoint("signInWithPassword").respond_with(
            ResponseTemplate::new(status)
                .set_body_json(json!({ "error": { "message": "INVALID_PASSWORD" } })),
        )
    }

    /// Custom token exchange answering with `id_token`.
    pub fn custom_token_ok(id_token: &str) -> Mock {
        endpoint("signInWithCustomToken").respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "idToken": id_token })),
        )
    }

    /// Account creation answering with `local_id`.
    pub fn sign_up_ok(local_id: &str) -> Mock {
        endpoint("signUp").respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "localId": local_id })),
        )
    }

    /// Account deletion.
    pub fn delete_ok() -> Mock {
        endpoint("delete").respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
    }
}

/// Assertion helpers.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }
}
