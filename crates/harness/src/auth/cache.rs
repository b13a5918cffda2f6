//! Bearer token cache.
//!
//! Tokens from password sign-in are reused while younger than the freshness
//! window. Nothing here returns an error: a missing API key is silent, any
//! other failure is logged, and both yield `None` so callers simply proceed
//! unauthenticated.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use super::provider::IdentityProvider;
use super::store::{CustomTokenRecord, SeededUserStore, StoredToken};
use crate::clock::Clock;
use crate::error::AuthError;

/// A cached ID token.
#[derive(Debug, Clone)]
pub struct CredentialEntry {
    pub identity: String,
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

/// Process-wide token cache, shared by every virtual user.
pub struct CredentialCache {
    provider: IdentityProvider,
    seeded: SeededUserStore,
    clock: Arc<dyn Clock>,
    freshness: TimeDelta,
    entries: DashMap<String, CredentialEntry>,
}

impl CredentialCache {
    pub fn new(
        provider: IdentityProvider,
        seeded: SeededUserStore,
        freshness: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            seeded,
            clock,
            freshness: TimeDelta::from_std(freshness).unwrap_or(TimeDelta::MAX),
            entries: DashMap::new(),
        }
    }

    /// Whether authentication is configured at all.
    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    pub fn provider(&self) -> &IdentityProvider {
        &self.provider
    }

    pub fn seeded_users(&self) -> &SeededUserStore {
        &self.seeded
    }

    /// Number of cached entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The cached entry for an identity, if any.
    pub fn entry(&self, email: &str, password: &str) -> Option<CredentialEntry> {
        self.entries
            .get(&cache_key(email, password))
            .map(|e| e.value().clone())
    }

    /// Fresh cached token, evicting the entry when it has gone stale.
    fn fresh_token(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        if let Some(entry) = self.entries.get(key) {
            if now.signed_duration_since(entry.issued_at) < self.freshness {
                return Some(entry.token.clone());
            }
        }
        self.entries.remove_if(key, |_, entry| {
            now.signed_duration_since(entry.issued_at) >= self.freshness
        });
        None
    }

    /// Sign in with email and password, reusing a fresh cached token.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Option<String> {
        if !self.is_configured() {
            return None;
        }

        let key = cache_key(email, password);
        if let Some(token) = self.fresh_token(&key, self.clock.now()) {
            debug!(email = %email, "token cache hit");
            return Some(token);
        }

        match self.provider.sign_in_with_password(email, password).await {
            Ok(token) => {
                self.entries.insert(
                    key,
                    CredentialEntry {
                        identity: email.to_string(),
                        token: token.clone(),
                        issued_at: self.clock.now(),
                    },
                );
                debug!(email = %email, "signed in");
                Some(token)
            }
            Err(e) => {
                log_failure("sign-in", Some(email), &e);
                None
            }
        }
    }

    /// Exchange a custom token for an ID token. Custom tokens are single-use,
    /// so the result is never cached.
    pub async fn exchange_custom_token(&self, custom_token: &str) -> Option<String> {
        match self.provider.sign_in_with_custom_token(custom_token).await {
            Ok(token) => Some(token),
            Err(e) => {
                log_failure("token exchange", None, &e);
                None
            }
        }
    }

    /// Exchange every custom token, keeping the ones that succeed.
    pub async fn exchange_all(&self, records: &[CustomTokenRecord]) -> Vec<StoredToken> {
        let mut tokens = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if let Some(token) = self.exchange_custom_token(&record.token).await {
                tokens.push(StoredToken {
                    email: record.email.clone(),
                    token,
                });
            }
            if (i + 1) % 10 == 0 {
                info!(done = i + 1, total = records.len(), "exchanging tokens");
            }
        }
        tokens
    }

    /// Sign in as a uniformly random seeded identity.
    pub async fn random_seeded_user_token(&self, password: &str) -> Option<String> {
        let users = self.seeded.users();
        let email = users.choose(&mut rand::thread_rng())?.email.clone();
        self.sign_in_with_password(&email, password).await
    }

    /// Bearer token for `email`, or for a random seeded identity.
    ///
    /// Returns `None` without any network call when no API key is configured.
    pub async fn bearer_token(&self, email: Option<&str>, password: &str) -> Option<String> {
        if !self.is_configured() {
            return None;
        }
        match email {
            Some(email) => self.sign_in_with_password(email, password).await,
            None => self.random_seeded_user_token(password).await,
        }
    }
}

impl std::fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCache")
            .field("configured", &self.is_configured())
            .field("entries", &self.entries.len())
            .finish()
    }
}

fn cache_key(email: &str, password: &str) -> String {
    format!("{email}:{password}")
}

fn log_failure(operation: &str, email: Option<&str>, err: &AuthError) {
    match err {
        AuthError::NotConfigured => debug!(operation, "identity provider not configured"),
        _ => warn!(operation, email = email.unwrap_or("-"), error = %err, "authentication failed"),
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::http::ServiceClient;

    fn cache(freshness: Duration) -> CredentialCache {
        let provider = IdentityProvider::new(
            ServiceClient::from_client(reqwest::Client::new()),
            "http://127.0.0.1:9",
            Some("key".to_string()),
        );
        CredentialCache::new(
            provider,
            SeededUserStore::preloaded(Vec::new()),
            freshness,
            Arc::new(SystemClock),
        )
    }

    fn seed_entry(cache: &CredentialCache, issued_at: DateTime<Utc>) {
        cache.entries.insert(
            cache_key("a@example.com", "pw"),
            CredentialEntry {
                identity: "a@example.com".to_string(),
                token: "cached".to_string(),
                issued_at,
            },
        );
    }

    #[test]
    fn fresh_entry_is_returned() {
        let cache = cache(Duration::from_secs(3000));
        let now = Utc::now();
        seed_entry(&cache, now - TimeDelta::seconds(2999));
        assert_eq!(
            cache.fresh_token(&cache_key("a@example.com", "pw"), now),
            Some("cached".to_string())
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn stale_entry_is_evicted_lazily() {
        let cache = cache(Duration::from_secs(3000));
        let now = Utc::now();
        seed_entry(&cache, now - TimeDelta::seconds(3000));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.fresh_token(&cache_key("a@example.com", "pw"), now), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn key_distinguishes_passwords() {
        assert_ne!(cache_key("a@example.com", "x"), cache_key("a@example.com", "y"));
    }
}
