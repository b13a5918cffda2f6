//! Virtual user sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::actions::{self, ActionOutcome};
use super::{Discovery, NewUserStyle, Profile, Service, TargetPolicy, request_name};
use crate::auth::{CredentialCache, StoredToken};
use crate::config::{Config, ServiceUrls};
use crate::data::USER_NAMES;
use crate::error::CallError;
use crate::http::{CallResponse, ServiceClient, accept, authorize};
use crate::pool::{ContentPool, ItineraryId};
use crate::stats::StatsRegistry;

/// Ids taken from the session start-up discovery search.
const START_DISCOVERY_TAKE: usize = 2;

/// Everything shared by the virtual users of one run.
#[derive(Debug)]
pub struct RunContext {
    pub client: ServiceClient,
    pub services: ServiceUrls,
    pub pool: Arc<ContentPool>,
    pub stats: Arc<StatsRegistry>,
    pub credentials: Arc<CredentialCache>,
    /// Password shared by every seeded identity.
    pub password: String,
    /// Number of seeded identity slots existing users are drawn from.
    pub seeded_slots: usize,
    /// Pre-exchanged tokens; when present they replace sign-in.
    pub issued_tokens: Vec<StoredToken>,
}

impl RunContext {
    pub fn new(config: &Config, client: ServiceClient, credentials: Arc<CredentialCache>) -> Self {
        Self {
            client,
            services: config.services.clone(),
            pool: Arc::new(ContentPool::new()),
            stats: Arc::new(StatsRegistry::new()),
            credentials,
            password: config.test_user_password.clone(),
            seeded_slots: config.num_users,
            issued_tokens: Vec::new(),
        }
    }

    pub fn with_issued_tokens(mut self, tokens: Vec<StoredToken>) -> Self {
        self.issued_tokens = tokens;
        self
    }
}

/// Who a virtual user acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

/// State fixed when a virtual user starts.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub identity: Identity,
    pub credential: Option<String>,
    pub is_new_user: bool,
}

/// Per-action outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionTally {
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl ActionTally {
    pub fn record(&mut self, outcome: ActionOutcome) {
        match outcome {
            ActionOutcome::Succeeded => self.succeeded += 1,
            ActionOutcome::Failed => self.failed += 1,
            ActionOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn merge(&mut self, other: ActionTally) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }

    pub fn total(&self) -> u64 {
        self.succeeded + self.failed + self.skipped
    }
}

/// One simulated user: a session plus its own random stream.
pub struct VirtualUser {
    id: usize,
    ctx: Arc<RunContext>,
    profile: Arc<Profile>,
    rng: StdRng,
    session: Option<UserSession>,
}

impl VirtualUser {
    pub fn new(id: usize, ctx: Arc<RunContext>, profile: Arc<Profile>, seed: u64) -> Self {
        Self {
            id,
            ctx,
            profile,
            rng: StdRng::seed_from_u64(seed),
            session: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn session(&self) -> Option<&UserSession> {
        self.session.as_ref()
    }

    /// Acquire a credential, pick an identity and run the profile's start-up
    /// calls (registration for new users, hot content discovery).
    pub async fn start(&mut self) {
        let credential = self.acquire_credential().await;
        let is_new_user = self.rng.gen_bool(self.profile.new_user_ratio);
        let identity = if is_new_user {
            self.new_identity()
        } else {
            self.existing_identity()
        };
        debug!(user = self.id, email = %identity.email, is_new_user, authenticated = credential.is_some(), "session started");

        self.session = Some(UserSession {
            identity: identity.clone(),
            credential,
            is_new_user,
        });

        if is_new_user {
            let name = request_name(Service::Itinerary, "POST", "/user/register", None);
            let request = self
                .request(Method::POST, Service::Itinerary, "/user/register")
                .json(&json!({ "name": identity.name, "email": identity.email }));
            // Duplicates are accepted; other failures are only recorded.
            let _ = self.send(&name, request, accept::REGISTER).await;
        }

        if let Some(kind) = self.profile.discover_on_start {
            actions::search(
                self,
                kind,
                Discovery::Hot {
                    take: START_DISCOVERY_TAKE,
                },
                Some("[discover hot]"),
            )
            .await;
        }
    }

    /// Pick one weighted action and run it.
    pub async fn step(&mut self) -> (&'static str, ActionOutcome) {
        let profile = Arc::clone(&self.profile);
        let action = profile.actions.pick(&mut self.rng);
        let outcome = action.execute(self).await;
        (action.name, outcome)
    }

    /// Run actions, pausing between them, until `deadline` passes.
    pub async fn run_until(&mut self, deadline: Instant) -> HashMap<&'static str, ActionTally> {
        let mut tallies: HashMap<&'static str, ActionTally> = HashMap::new();
        while Instant::now() < deadline {
            let (name, outcome) = self.step().await;
            tallies.entry(name).or_default().record(outcome);

            let wait = self.profile.wait_time(&mut self.rng);
            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(wait.min(remaining)).await;
        }
        tallies
    }

    async fn acquire_credential(&mut self) -> Option<String> {
        if let Some(stored) = self.ctx.issued_tokens.choose(&mut self.rng) {
            return Some(stored.token.clone());
        }
        self.ctx
            .credentials
            .bearer_token(None, &self.ctx.password)
            .await
    }

    fn existing_identity(&mut self) -> Identity {
        let slot = self.rng.gen_range(0..self.ctx.seeded_slots.max(1));
        Identity {
            name: format!("Test User {slot}"),
            email: format!("loadtest.{slot}@example.com"),
        }
    }

    fn new_identity(&mut self) -> Identity {
        match self.profile.new_user_style {
            NewUserStyle::Steady => {
                let name = USER_NAMES
                    .choose(&mut self.rng)
                    .copied()
                    .unwrap_or("Load Tester");
                let suffix = self.rng.gen_range(10_000..=99_999);
                Identity {
                    name: name.to_string(),
                    email: format!(
                        "{}.{suffix}@loadtest.example.com",
                        name.replace(' ', ".").to_lowercase()
                    ),
                }
            }
            NewUserStyle::Viral => {
                let id = self.rng.gen_range(100_000..=999_999);
                Identity {
                    name: format!("Viral User {id}"),
                    email: format!("viral.user.{id}.{}@example.com", Utc::now().timestamp()),
                }
            }
        }
    }

    pub(super) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub(super) fn pool(&self) -> &ContentPool {
        &self.ctx.pool
    }

    pub(super) fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    pub(super) fn select_target(&mut self, policy: TargetPolicy) -> Option<ItineraryId> {
        match policy {
            TargetPolicy::Known => self.ctx.pool.select_known(&mut self.rng),
            TargetPolicy::Hot { bias } => Some(self.ctx.pool.select_target(bias, &mut self.rng)),
        }
    }

    /// Build a request to `service`. The weather and travel warning services
    /// are public and never see the bearer token.
    pub(super) fn request(&self, method: Method, service: Service, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", service.base_url(&self.ctx.services));
        let request = self
            .ctx
            .client
            .inner()
            .request(method, url)
            .header(ACCEPT, "application/json");
        match service {
            Service::Weather | Service::TravelWarnings => request,
            _ => authorize(
                request,
                self.session.as_ref().and_then(|s| s.credential.as_deref()),
            ),
        }
    }

    /// Send with the profile's timeout and record the result under `name`.
    pub(super) async fn send(
        &self,
        name: &str,
        request: RequestBuilder,
        accepted: &[u16],
    ) -> Result<CallResponse, CallError> {
        let result = self
            .ctx
            .client
            .call(request, self.profile.request_timeout, accepted)
            .await;
        self.ctx.stats.record(name, &result);
        if let Err(e) = &result {
            debug!(user = self.id, request = name, error = %e, "request failed");
        }
        result
    }
}

impl std::fmt::Debug for VirtualUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualUser")
            .field("id", &self.id)
            .field("profile", &self.profile.kind)
            .field("session", &self.session)
            .finish()
    }
}
