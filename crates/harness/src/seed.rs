//! Test data seeding.
//!
//! Creates the seeded identities (`loadtest.<i>@example.com`), writes the
//! seeded users file, then fills the services with itineraries, locations,
//! likes and comments, and finally warms the weather cache. Individual call
//! failures are collected rather than aborting the run; only file I/O is fatal.

use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::auth::IdentityProvider;
use crate::auth::store::{SeededUser, write_seeded_users};
use crate::config::Config;
use crate::data::{FIRST_NAMES, LAST_NAMES, SEED_COMMENTS, SEED_PLACES};
use crate::error::{AuthError, CallError};
use crate::http::{CallResponse, ServiceClient, accept, authorize};
use crate::pool::ItineraryId;
use crate::workload::{GraphItinerary, ItineraryPayload, LocationPayload, Service, created_id};

/// Timeout for service writes and weather lookups.
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for likes and comments.
const SOCIAL_TIMEOUT: Duration = Duration::from_secs(5);
/// Share of itineraries that receive likes and comments.
const SOCIAL_RATIO: f64 = 0.2;
/// Destinations whose weather is fetched once.
const WEATHER_WARMUP_LIMIT: usize = 10;

/// Pauses between batches, to go easy on the target.
#[derive(Debug, Clone, Copy)]
pub struct SeedPacing {
    /// Pause after every `user_batch` users.
    pub user_batch: usize,
    pub user_pause: Duration,
    /// Pause after every `itinerary_batch` itinerary attempts.
    pub itinerary_batch: usize,
    pub itinerary_pause: Duration,
    /// Spacing between weather lookups.
    pub weather_spacing: Duration,
}

impl Default for SeedPacing {
    fn default() -> Self {
        Self {
            user_batch: 50,
            user_pause: Duration::from_millis(500),
            itinerary_batch: 20,
            itinerary_pause: Duration::from_millis(300),
            weather_spacing: Duration::from_millis(200),
        }
    }
}

impl SeedPacing {
    /// No pauses at all.
    pub fn none() -> Self {
        Self {
            user_pause: Duration::ZERO,
            itinerary_pause: Duration::ZERO,
            weather_spacing: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Counts reported at the end of seeding.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedSummary {
    pub users_created: usize,
    pub identity_accounts_created: usize,
    pub itineraries_created: usize,
    pub locations_created: usize,
    pub likes_created: usize,
    pub comments_created: usize,
    pub graph_nodes_created: usize,
    pub weather_cached: usize,
    pub errors: Vec<String>,
}

impl SeedSummary {
    /// The first `n` collected errors.
    pub fn first_errors(&self, n: usize) -> &[String] {
        &self.errors[..self.errors.len().min(n)]
    }
}

/// Seeding run state.
pub struct Seeder<'a> {
    config: &'a Config,
    client: ServiceClient,
    provider: IdentityProvider,
    pacing: SeedPacing,
    rng: StdRng,
    today: NaiveDate,
    users: Vec<SeededUser>,
    summary: SeedSummary,
}

impl<'a> Seeder<'a> {
    pub fn new(
        config: &'a Config,
        client: ServiceClient,
        provider: IdentityProvider,
        pacing: SeedPacing,
    ) -> Self {
        Self {
            config,
            client,
            provider,
            pacing,
            rng: StdRng::seed_from_u64(config.random_seed),
            today: Utc::now().date_naive(),
            users: Vec::new(),
            summary: SeedSummary::default(),
        }
    }

    /// Run every seeding step.
    pub async fn run(mut self) -> Result<SeedSummary> {
        info!(
            users = self.config.num_users,
            itineraries_per_user = self.config.itineraries_per_user,
            locations_per_itinerary = self.config.locations_per_itinerary,
            create_identity_users = self.config.create_identity_users,
            seed = self.config.random_seed,
            "seeding started"
        );

        self.create_users().await;
        write_seeded_users(&self.config.test_users_file, &self.users)?;
        info!(
            count = self.users.len(),
            path = %self.config.test_users_file.display(),
            "saved seeded users"
        );

        self.create_content().await;
        self.warm_weather_cache().await;

        info!(
            users = self.summary.users_created,
            itineraries = self.summary.itineraries_created,
            errors = self.summary.errors.len(),
            "seeding complete"
        );
        Ok(self.summary)
    }

    fn url(&self, service: Service, path: &str) -> String {
        format!("{}{path}", service.base_url(&self.config.services))
    }

    fn request(&self, method: Method, service: Service, path: &str, token: Option<&str>) -> RequestBuilder {
        authorize(
            self.client.inner().request(method, self.url(service, path)),
            token,
        )
    }

    async fn send(
        &mut self,
        what: &str,
        request: RequestBuilder,
        timeout: Duration,
        accepted: &[u16],
    ) -> Option<CallResponse> {
        match self.client.call(request, timeout, accepted).await {
            Ok(response) => Some(response),
            Err(e) => {
                debug!(what, error = %e, "seeding call failed");
                self.summary.errors.push(format!("{what} failed: {}", describe(&e)));
                None
            }
        }
    }

    async fn create_users(&mut self) {
        let total = self.config.num_users;
        for i in 0..total {
            let name = format!(
                "{} {}",
                FIRST_NAMES.choose(&mut self.rng).copied().unwrap_or("Test"),
                LAST_NAMES.choose(&mut self.rng).copied().unwrap_or("User"),
            );
            let email = format!("loadtest.{i}@example.com");

            if self.config.create_identity_users && self.provider.is_configured() {
                self.create_account(&email).await;
            }

            let request = self
                .request(Method::POST, Service::Itinerary, "/user/register", None)
                .json(&json!({ "name": name, "email": email }));
            let what = format!("User creation for {email}");
            if self
                .send(&what, request, WRITE_TIMEOUT, accept::CREATED)
                .await
                .is_some()
            {
                self.summary.users_created += 1;
                self.users.push(SeededUser {
                    id: i as u64,
                    name,
                    email,
                });
            }

            if (i + 1) % self.pacing.user_batch.max(1) == 0 {
                info!(done = i + 1, total, "creating users");
                pause(self.pacing.user_pause).await;
            }
        }
    }

    async fn create_account(&mut self, email: &str) {
        match self
            .provider
            .sign_up(email, &self.config.test_user_password)
            .await
        {
            Ok(uid) => {
                debug!(email, uid = %uid, "identity account created");
                self.summary.identity_accounts_created += 1;
            }
            // Most likely the account already exists.
            Err(AuthError::Call(CallError::Status { status, .. })) => {
                debug!(email, status, "identity account not created");
            }
            Err(e) => self
                .summary
                .errors
                .push(format!("Identity account creation for {email} failed: {e}")),
        }
    }

    async fn create_content(&mut self) {
        let total = self.users.len() * self.config.itineraries_per_user;
        let mut attempted = 0;
        let users = self.users.clone();

        for user in &users {
            let token = if self.provider.is_configured() {
                self.provider
                    .sign_in_with_password(&user.email, &self.config.test_user_password)
                    .await
                    .map_err(|e| warn!(email = %user.email, error = %e, "seed sign-in failed"))
                    .ok()
            } else {
                None
            };

            for _ in 0..self.config.itineraries_per_user {
                attempted += 1;
                self.create_itinerary(token.as_deref()).await;

                if attempted % self.pacing.itinerary_batch.max(1) == 0 {
                    info!(done = attempted, total, "creating content");
                    pause(self.pacing.itinerary_pause).await;
                }
            }
        }
    }

    async fn create_itinerary(&mut self, token: Option<&str>) {
        let payload = ItineraryPayload::seeded(&mut self.rng, self.today);
        let request = self
            .request(Method::POST, Service::Itinerary, "/itinerary/create", token)
            .json(&payload);
        let Some(response) = self
            .send("Itinerary creation", request, WRITE_TIMEOUT, accept::CREATED)
            .await
        else {
            return;
        };
        self.summary.itineraries_created += 1;

        let Some(id) = created_id(&response) else {
            return;
        };

        let graph = self
            .request(Method::POST, Service::Recommendation, "/graph/itineraries", token)
            .json(&GraphItinerary::created(id, &payload));
        if self
            .send("Graph recording", graph, WRITE_TIMEOUT, accept::CREATED)
            .await
            .is_some()
        {
            self.summary.graph_nodes_created += 1;
        }

        for _ in 0..self.config.locations_per_itinerary {
            let location = LocationPayload::seeded(&payload.destination, &mut self.rng, self.today);
            let request = self
                .request(
                    Method::POST,
                    Service::Itinerary,
                    &format!("/location/itinerary/{id}"),
                    token,
                )
                .json(&location);
            if self
                .send("Location creation", request, WRITE_TIMEOUT, accept::CREATED)
                .await
                .is_some()
            {
                self.summary.locations_created += 1;
            }
        }

        if self.rng.gen_bool(SOCIAL_RATIO) {
            let likes = self.rng.gen_range(1..=10);
            let comments = self.rng.gen_range(0..=5);
            self.add_likes(id, likes, token).await;
            self.add_comments(id, comments, token).await;
        }
    }

    async fn add_likes(&mut self, id: ItineraryId, count: usize, token: Option<&str>) {
        let likers = count.min(self.users.len());
        for _ in 0..likers {
            let like = self
                .request(
                    Method::POST,
                    Service::CommentsLikes,
                    &format!("/like/itinerary/{id}"),
                    token,
                )
                .header(CONTENT_LENGTH, "0");
            if self
                .send("Like", like, SOCIAL_TIMEOUT, accept::CREATED)
                .await
                .is_none()
            {
                continue;
            }
            self.summary.likes_created += 1;

            if token.is_some() {
                let graph = self
                    .request(Method::POST, Service::Recommendation, "/graph/likes", token)
                    .json(&json!({ "itineraryId": id }));
                let _ = self.client.call(graph, SOCIAL_TIMEOUT, accept::CREATED).await;
            }
        }
    }

    async fn add_comments(&mut self, id: ItineraryId, count: usize, token: Option<&str>) {
        let commenters: Vec<String> = self
            .users
            .choose_multiple(&mut self.rng, count)
            .map(|u| u.email.clone())
            .collect();
        for email in commenters {
            let comment = SEED_COMMENTS.choose(&mut self.rng).copied().unwrap_or_default();
            let request = self
                .request(
                    Method::POST,
                    Service::CommentsLikes,
                    &format!("/comment/itinerary/{id}"),
                    token,
                )
                .json(&json!({ "userEmail": email, "comment": comment }));
            if self
                .send("Comment", request, SOCIAL_TIMEOUT, accept::CREATED)
                .await
                .is_some()
            {
                self.summary.comments_created += 1;
            }
        }
    }

    async fn warm_weather_cache(&mut self) {
        for place in SEED_PLACES.iter().take(WEATHER_WARMUP_LIMIT) {
            let request = self
                .request(
                    Method::GET,
                    Service::Weather,
                    "/api/weather/forecast/coordinates",
                    None,
                )
                .query(&[("lat", place.lat), ("lon", place.lon)]);
            match self.client.call(request, WRITE_TIMEOUT, accept::OK).await {
                Ok(_) => {
                    debug!(destination = place.name, "cached weather");
                    self.summary.weather_cached += 1;
                }
                Err(e) => warn!(destination = place.name, error = %e, "failed to cache weather"),
            }
            pause(self.pacing.weather_spacing).await;
        }
    }
}

fn describe(err: &CallError) -> String {
    match err {
        CallError::Status { status, .. } => status.to_string(),
        other => other.to_string(),
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn first_errors_caps_at_available() {
        let summary = SeedSummary {
            errors: vec!["a".to_string(), "b".to_string()],
            ..SeedSummary::default()
        };
        assert_eq!(summary.first_errors(10).len(), 2);
        assert_eq!(summary.first_errors(1), ["a".to_string()]);
    }

    #[test]
    fn no_pacing_has_no_pauses() {
        let pacing = SeedPacing::none();
        assert!(pacing.user_pause.is_zero());
        assert!(pacing.weather_spacing.is_zero());
        assert_eq!(pacing.user_batch, 50);
    }
}
