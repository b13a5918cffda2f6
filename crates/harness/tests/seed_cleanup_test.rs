//! Seeding and cleanup against fake services.

// Tests are allowed to use unwrap/expect freely.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::json;
use tripico_harness::auth::store::{read_seeded_users, write_seeded_users};
use tripico_harness::cleanup::{self, CleanupSummary};
use tripico_harness::seed::{SeedPacing, Seeder};
use tripico_test_utils::{
    TEST_PASSWORD, identity, seeded_users, temp_dir, temp_path, test_client, test_config,
    test_provider,
};
use wiremock::matchers::{body_partial_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_content_services(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/itinerary/create"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1 })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graph/itineraries"))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/location/itinerary/1"))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/(like|comment)/itinerary/1$"))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graph/likes"))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/weather/forecast/coordinates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(10)
        .mount(server)
        .await;
}

#[tokio::test]
async fn seeding_creates_users_content_and_users_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/register"))
        .respond_with(ResponseTemplate::new(201))
        .expect(3)
        .mount(&server)
        .await;
    mount_content_services(&server).await;

    let dir = temp_dir();
    let users_file = temp_path(&dir, "test_users.json");
    let config = test_config(
        &server.uri(),
        &[
            ("NUM_USERS", "3"),
            ("NUM_ITINERARIES_PER_USER", "1"),
            ("NUM_LOCATIONS_PER_ITINERARY", "2"),
            ("TEST_USERS_FILE", users_file.to_str().unwrap()),
        ],
    );

    let summary = Seeder::new(
        &config,
        test_client(),
        test_provider(&server.uri(), false),
        SeedPacing::none(),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(summary.users_created, 3);
    assert_eq!(summary.identity_accounts_created, 0);
    assert_eq!(summary.itineraries_created, 3);
    assert_eq!(summary.graph_nodes_created, 3);
    assert_eq!(summary.locations_created, 6);
    assert_eq!(summary.weather_cached, 10);
    assert!(summary.errors.is_empty(), "{:?}", summary.errors);

    let users = read_seeded_users(&users_file).unwrap();
    let emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();
    assert_eq!(
        emails,
        vec![
            "loadtest.0@example.com",
            "loadtest.1@example.com",
            "loadtest.2@example.com"
        ]
    );
    assert!(users.iter().all(|u| u.name.contains(' ')));
}

#[tokio::test]
async fn failed_registrations_are_collected_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/register"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/itinerary/create"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/weather/forecast/coordinates"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = temp_dir();
    let users_file = temp_path(&dir, "test_users.json");
    let config = test_config(
        &server.uri(),
        &[
            ("NUM_USERS", "2"),
            ("TEST_USERS_FILE", users_file.to_str().unwrap()),
        ],
    );

    let summary = Seeder::new(
        &config,
        test_client(),
        test_provider(&server.uri(), false),
        SeedPacing::none(),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(summary.users_created, 0);
    assert_eq!(summary.itineraries_created, 0);
    assert_eq!(summary.weather_cached, 0);
    assert_eq!(
        summary.first_errors(5),
        [
            "User creation for loadtest.0@example.com failed: 500".to_string(),
            "User creation for loadtest.1@example.com failed: 500".to_string(),
        ]
    );
    assert!(read_seeded_users(&users_file).unwrap().is_empty());
}

#[tokio::test]
async fn seeding_with_identity_accounts_writes_as_signed_in_user() {
    let server = MockServer::start().await;
    identity::sign_up_ok("uid").expect(2).mount(&server).await;
    identity::sign_in_ok("seed-token").expect(2).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/user/register"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/itinerary/create"))
        .and(header("authorization", "Bearer seed-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1 })))
        .expect(2)
        .mount(&server)
        .await;
    mount_content_services(&server).await;

    let dir = temp_dir();
    let config = test_config(
        &server.uri(),
        &[
            ("NUM_USERS", "2"),
            ("NUM_ITINERARIES_PER_USER", "1"),
            ("NUM_LOCATIONS_PER_ITINERARY", "0"),
            ("CREATE_FIREBASE_USERS", "true"),
            (
                "TEST_USERS_FILE",
                temp_path(&dir, "test_users.json").to_str().unwrap(),
            ),
        ],
    );

    let summary = Seeder::new(
        &config,
        test_client(),
        test_provider(&server.uri(), true),
        SeedPacing::none(),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(summary.identity_accounts_created, 2);
    assert_eq!(summary.itineraries_created, 2);
    assert_eq!(summary.locations_created, 0);
}

#[tokio::test]
async fn cleanup_deletes_accounts_and_counts_missing_ones() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts:signInWithPassword"))
        .and(body_partial_json(json!({ "email": "loadtest.1@example.com" })))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "error": { "message": "EMAIL_NOT_FOUND" } })),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    identity::sign_in_ok("to-delete").expect(2).mount(&server).await;
    identity::delete_ok().expect(2).mount(&server).await;

    let dir = temp_dir();
    let users_file = temp_path(&dir, "test_users.json");
    let tokens_file = temp_path(&dir, "tokens.json");
    write_seeded_users(&users_file, &seeded_users(3)).unwrap();

    let users = cleanup::load_targets(&users_file).unwrap();
    let mut summary = CleanupSummary::default();
    cleanup::delete_accounts(
        &test_provider(&server.uri(), true),
        &users,
        TEST_PASSWORD,
        &mut summary,
    )
    .await;
    cleanup::remove_files(&[users_file.as_path(), tokens_file.as_path()], &mut summary).unwrap();

    assert_eq!(summary.users, 3);
    assert_eq!(summary.accounts_deleted, 2);
    assert_eq!(summary.accounts_missing, 1);
    assert!(summary.errors.is_empty());
    assert_eq!(summary.files_removed, vec![users_file.clone()]);
    assert!(!users_file.exists());
}

#[tokio::test]
async fn cleanup_without_provider_only_removes_files() {
    let dir = temp_dir();
    let users_file = temp_path(&dir, "test_users.json");
    write_seeded_users(&users_file, &seeded_users(2)).unwrap();

    let users = cleanup::load_targets(&users_file).unwrap();
    let mut summary = CleanupSummary::default();
    cleanup::delete_accounts(
        &test_provider("http://127.0.0.1:9", false),
        &users,
        TEST_PASSWORD,
        &mut summary,
    )
    .await;
    cleanup::remove_files(&[users_file.as_path()], &mut summary).unwrap();

    assert_eq!(summary.users, 2);
    assert_eq!(summary.accounts_deleted, 0);
    assert_eq!(summary.files_removed.len(), 1);
}

#[tokio::test]
async fn cleanup_records_provider_outage_as_errors() {
    let server = MockServer::start().await;
    identity::sign_in_rejected(503).expect(3).mount(&server).await;
    identity::delete_ok().expect(0).mount(&server).await;

    let users = seeded_users(3);
    let mut summary = CleanupSummary::default();
    cleanup::delete_accounts(
        &test_provider(&server.uri(), true),
        &users,
        TEST_PASSWORD,
        &mut summary,
    )
    .await;

    assert_eq!(summary.accounts_deleted, 0);
    assert_eq!(summary.accounts_missing, 0);
    assert_eq!(summary.errors.len(), 3);
    assert!(summary.errors[0].starts_with("Failed to sign in as loadtest.0@example.com"));
}
