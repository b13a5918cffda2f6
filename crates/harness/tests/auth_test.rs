//! Credential cache behaviour against a fake identity provider.

// Tests are allowed to use unwrap/expect freely.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::Utc;
use tripico_harness::auth::{CustomTokenRecord, TokenFile, store};
use tripico_harness::clock::{Clock, SystemClock};
use tripico_harness::error::AuthError;
use tripico_test_utils::{
    ManualClock, TEST_PASSWORD, identity, seeded_users, temp_dir, temp_path, test_cache,
    test_provider,
};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn no_api_key_means_no_token_and_no_calls() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cache = test_cache(&server.uri(), false, seeded_users(3), Arc::new(SystemClock));
    assert!(!cache.is_configured());
    assert_eq!(cache.bearer_token(None, TEST_PASSWORD).await, None);
    assert_eq!(
        cache
            .bearer_token(Some("loadtest.1@example.com"), TEST_PASSWORD)
            .await,
        None
    );
}

#[tokio::test]
async fn sign_in_token_is_cached_within_window() {
    let server = MockServer::start().await;
    identity::sign_in_ok("abc").expect(1).mount(&server).await;

    let clock = ManualClock::starting_now();
    let cache = test_cache(&server.uri(), true, Vec::new(), clock.clone());

    let email = "loadtest.7@example.com";
    assert_eq!(
        cache.sign_in_with_password(email, TEST_PASSWORD).await,
        Some("abc".to_string())
    );
    clock.advance_secs(2999);
    assert_eq!(
        cache.bearer_token(Some(email), TEST_PASSWORD).await,
        Some("abc".to_string())
    );
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn stale_token_is_refreshed() {
    let server = MockServer::start().await;
    identity::sign_in_ok("fresh").expect(2).mount(&server).await;

    let clock = ManualClock::starting_now();
    let cache = test_cache(&server.uri(), true, Vec::new(), clock.clone());
    let email = "loadtest.2@example.com";

    cache.sign_in_with_password(email, TEST_PASSWORD).await.unwrap();
    let first = cache.entry(email, TEST_PASSWORD).unwrap();

    clock.advance_secs(3001);
    cache.sign_in_with_password(email, TEST_PASSWORD).await.unwrap();
    let second = cache.entry(email, TEST_PASSWORD).unwrap();

    assert!(second.issued_at > first.issued_at);
    assert_eq!(second.issued_at, clock.now());
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn different_passwords_are_separate_entries() {
    let server = MockServer::start().await;
    identity::sign_in_ok("abc").expect(2).mount(&server).await;

    let cache = test_cache(&server.uri(), true, Vec::new(), Arc::new(SystemClock));
    let email = "loadtest.3@example.com";
    cache.sign_in_with_password(email, "first").await.unwrap();
    cache.sign_in_with_password(email, "second").await.unwrap();
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn rejected_sign_in_yields_none_and_caches_nothing() {
    let server = MockServer::start().await;
    identity::sign_in_rejected(400).expect(1).mount(&server).await;

    let cache = test_cache(&server.uri(), true, Vec::new(), Arc::new(SystemClock));
    assert_eq!(
        cache
            .sign_in_with_password("nobody@example.com", TEST_PASSWORD)
            .await,
        None
    );
    assert!(cache.is_empty());
}

#[tokio::test]
async fn malformed_sign_in_body_yields_none() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let cache = test_cache(&server.uri(), true, Vec::new(), Arc::new(SystemClock));
    assert_eq!(
        cache
            .sign_in_with_password("loadtest.0@example.com", TEST_PASSWORD)
            .await,
        None
    );
}

#[tokio::test]
async fn random_seeded_user_signs_in() {
    let server = MockServer::start().await;
    identity::sign_in_ok("seeded").expect(1).mount(&server).await;

    let cache = test_cache(&server.uri(), true, seeded_users(5), Arc::new(SystemClock));
    assert_eq!(
        cache.bearer_token(None, TEST_PASSWORD).await,
        Some("seeded".to_string())
    );

    let cached_identity = (0..5)
        .map(|i| format!("loadtest.{i}@example.com"))
        .find(|email| cache.entry(email, TEST_PASSWORD).is_some());
    assert!(cached_identity.is_some());
}

#[tokio::test]
async fn empty_seeded_list_yields_none() {
    let server = MockServer::start().await;
    identity::sign_in_ok("unused").expect(0).mount(&server).await;

    let cache = test_cache(&server.uri(), true, Vec::new(), Arc::new(SystemClock));
    assert_eq!(cache.random_seeded_user_token(TEST_PASSWORD).await, None);
}

#[tokio::test]
async fn custom_tokens_are_never_cached() {
    let server = MockServer::start().await;
    identity::custom_token_ok("id-token").expect(2).mount(&server).await;

    let cache = test_cache(&server.uri(), true, Vec::new(), Arc::new(SystemClock));
    assert_eq!(
        cache.exchange_custom_token("custom").await,
        Some("id-token".to_string())
    );
    assert_eq!(
        cache.exchange_custom_token("custom").await,
        Some("id-token".to_string())
    );
    assert!(cache.is_empty());
}

#[tokio::test]
async fn exchanged_tokens_round_trip_through_token_file() {
    let server = MockServer::start().await;
    identity::custom_token_ok("exchanged").expect(2).mount(&server).await;

    let dir = temp_dir();
    let custom_path = temp_path(&dir, "custom_tokens.json");
    let records: std::collections::BTreeMap<String, CustomTokenRecord> = (1..=2)
        .map(|i| {
            let email = format!("test.user.{i}@loadtest.example.com");
            let record = CustomTokenRecord {
                uid: format!("test-user-{i}"),
                email: email.clone(),
                name: format!("Test User {i}"),
                token: format!("custom-{i}"),
            };
            (email, record)
        })
        .collect();
    std::fs::write(&custom_path, serde_json::to_string(&records).unwrap()).unwrap();

    let cache = test_cache(&server.uri(), true, Vec::new(), Arc::new(SystemClock));
    let records = store::read_custom_tokens(&custom_path).unwrap();
    let tokens = cache.exchange_all(&records).await;
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].email, "test.user.1@loadtest.example.com");

    let tokens_path = temp_path(&dir, "tokens.json");
    let now = Utc::now();
    TokenFile::save(&tokens_path, tokens.clone(), now).unwrap();
    let loaded = TokenFile::load_fresh(&tokens_path, std::time::Duration::from_secs(3000), now);
    assert_eq!(loaded, tokens);
}

#[tokio::test]
async fn provider_account_lifecycle() {
    let server = MockServer::start().await;
    identity::sign_up_ok("uid-1").expect(1).mount(&server).await;
    identity::delete_ok().expect(1).mount(&server).await;

    let provider = test_provider(&server.uri(), true);
    assert_eq!(
        provider
            .sign_up("loadtest.0@example.com", TEST_PASSWORD)
            .await
            .unwrap(),
        "uid-1"
    );
    provider.delete_account("id-token").await.unwrap();
}

#[tokio::test]
async fn unconfigured_provider_reports_not_configured() {
    let provider = test_provider("http://127.0.0.1:9", false);
    assert!(matches!(
        provider.sign_in_with_password("a@example.com", "pw").await,
        Err(AuthError::NotConfigured)
    ));
}
