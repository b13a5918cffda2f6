//! Action execution.
//!
//! Each call is reported to the stats registry under its own request name.
//! For coordinated actions the second call is only made when the first one
//! was accepted, and the second call alone decides the action's outcome.

use chrono::{Days, NaiveDate};
use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::Method;
use reqwest::header::CONTENT_LENGTH;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::user::VirtualUser;
use super::{
    ActionSpec, Discovery, ItineraryStyle, Operation, Resource, SearchKind, Service, request_name,
};
use crate::data::{
    DESTINATIONS, DETAILED_DESCRIPTIONS, LOCATION_DESCRIPTIONS, LOCATION_NAMES,
    POPULAR_DESTINATIONS, PLACES, SEED_DESTINATIONS, SEED_PLACES, SHORT_DESCRIPTIONS, TRIP_TYPES,
    coords_for,
};
use crate::http::{CallResponse, accept};
use crate::pool::ItineraryId;

/// How one action execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Succeeded,
    Failed,
    /// No target was available; nothing was sent.
    Skipped,
}

impl ActionOutcome {
    fn of<T, E>(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            ActionOutcome::Succeeded
        } else {
            ActionOutcome::Failed
        }
    }
}

/// Body of `POST /itinerary/create`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryPayload {
    pub title: String,
    pub destination: String,
    pub start_date: String,
    pub short_description: String,
    pub detailed_description: String,
}

impl ItineraryPayload {
    /// An itinerary created by a virtual user.
    pub fn generate<R: Rng + ?Sized>(style: ItineraryStyle, rng: &mut R, today: NaiveDate) -> Self {
        match style {
            ItineraryStyle::Steady => {
                let destination = pick(DESTINATIONS, rng);
                let prefix = if rng.gen_bool(0.5) { "Trip to" } else { "Visit to" };
                Self {
                    title: format!("{prefix} {destination}"),
                    destination: destination.to_string(),
                    start_date: date_after(today, rng.gen_range(1..=180)),
                    short_description: format!("An amazing journey to {destination}"),
                    detailed_description: format!(
                        "A comprehensive trip exploring the highlights of {destination}."
                    ),
                }
            }
            ItineraryStyle::Viral => {
                let destination = pick(POPULAR_DESTINATIONS, rng);
                Self {
                    title: format!("My Trip to {destination}"),
                    destination: destination.to_string(),
                    start_date: date_after(today, rng.gen_range(1..=90)),
                    short_description: format!("Inspired by viral content about {destination}"),
                    detailed_description: format!(
                        "Planning my own adventure to {destination} after seeing it trending!"
                    ),
                }
            }
        }
    }

    /// A varied itinerary created by the seeding step, starting within a year.
    pub fn seeded<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> Self {
        let destination = pick(SEED_DESTINATIONS, rng);
        Self {
            title: format!("{} {destination}", pick(TRIP_TYPES, rng)),
            destination: destination.to_string(),
            start_date: date_after(today, rng.gen_range(1..=365)),
            short_description: pick(SHORT_DESCRIPTIONS, rng).to_string(),
            detailed_description: pick(DETAILED_DESCRIPTIONS, rng).to_string(),
        }
    }
}

/// Body of `POST /location/itinerary/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPayload {
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub from_date: String,
    pub to_date: String,
}

impl LocationPayload {
    /// A location added by a virtual user.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> Self {
        let destination = pick(DESTINATIONS, rng);
        let (lat, lon) = coords_for(PLACES, destination);
        Self::near(
            format!("Location in {destination}"),
            "A wonderful place to visit".to_string(),
            (lat, lon),
            rng,
            today,
        )
    }

    /// A named location within `destination`, for the seeding step.
    pub fn seeded<R: Rng + ?Sized>(destination: &str, rng: &mut R, today: NaiveDate) -> Self {
        let name = format!("{}, {destination}", pick(LOCATION_NAMES, rng));
        let description = pick(LOCATION_DESCRIPTIONS, rng).to_string();
        Self::near(name, description, coords_for(SEED_PLACES, destination), rng, today)
    }

    fn near<R: Rng + ?Sized>(
        name: String,
        description: String,
        (lat, lon): (f64, f64),
        rng: &mut R,
        today: NaiveDate,
    ) -> Self {
        Self {
            name,
            description,
            latitude: lat + rng.gen_range(-0.1..=0.1),
            longitude: lon + rng.gen_range(-0.1..=0.1),
            from_date: date_after(today, rng.gen_range(1..=30)),
            to_date: date_after(today, rng.gen_range(31..=37)),
        }
    }
}

/// Body of `POST /graph/itineraries`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphItinerary<'a> {
    pub itinerary_id: ItineraryId,
    pub title: &'a str,
    pub description: &'a str,
    pub location_names: Vec<String>,
    pub likes_count: u64,
    pub event_type: &'static str,
}

impl<'a> GraphItinerary<'a> {
    pub(crate) fn created(itinerary_id: ItineraryId, payload: &'a ItineraryPayload) -> Self {
        Self {
            itinerary_id,
            title: &payload.title,
            description: &payload.short_description,
            location_names: Vec::new(),
            likes_count: 0,
            event_type: "CREATED",
        }
    }
}

#[derive(Deserialize)]
struct Created {
    id: Option<ItineraryId>,
}

/// Id of a freshly created itinerary, if the body carries one.
pub(crate) fn created_id(response: &CallResponse) -> Option<ItineraryId> {
    response.json::<Created>().and_then(|c| c.id)
}

/// Ids of the first `take` search results. Anything but a JSON array of
/// objects yields nothing.
pub(crate) fn result_ids(response: &CallResponse, take: usize) -> Vec<ItineraryId> {
    response
        .json::<Vec<Value>>()
        .unwrap_or_default()
        .iter()
        .take(take)
        .filter_map(|item| item.get("id").and_then(Value::as_i64))
        .collect()
}

pub(crate) fn date_after(today: NaiveDate, days: u64) -> String {
    (today + Days::new(days)).format("%Y-%m-%d").to_string()
}

fn pick<'a, R: Rng + ?Sized>(items: &[&'a str], rng: &mut R) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn search_body<R: Rng + ?Sized>(kind: SearchKind, rng: &mut R, today: NaiveDate) -> Value {
    match kind {
        SearchKind::Destination(destinations) => json!({ "destination": pick(destinations, rng) }),
        SearchKind::All => json!({}),
        SearchKind::DateRange => json!({
            "startDateFrom": date_after(today, rng.gen_range(0..=90)),
            "startDateTo": date_after(today, rng.gen_range(91..=180)),
        }),
    }
}

impl ItineraryStyle {
    fn create_tag(self) -> Option<&'static str> {
        match self {
            ItineraryStyle::Steady => None,
            ItineraryStyle::Viral => Some("[viral-inspired]"),
        }
    }

    fn graph_tag(self) -> Option<&'static str> {
        match self {
            ItineraryStyle::Steady => None,
            ItineraryStyle::Viral => Some("[viral]"),
        }
    }
}

impl ActionSpec {
    /// Run the action once on behalf of `user`.
    pub async fn execute(&self, user: &mut VirtualUser) -> ActionOutcome {
        let tag = self.tag;
        match self.operation {
            Operation::Search { kind, discovery } => search(user, kind, discovery, tag).await,
            Operation::Weather { places } => {
                let Some(place) = places.choose(user.rng()).copied() else {
                    return ActionOutcome::Skipped;
                };
                let path = "/api/weather/forecast/coordinates";
                let name = request_name(Service::Weather, "GET", path, tag);
                let request = user
                    .request(Method::GET, Service::Weather, path)
                    .query(&[("lat", place.lat), ("lon", place.lon)]);
                ActionOutcome::of(&user.send(&name, request, accept::OK).await)
            }
            Operation::TravelWarnings => {
                let path = "/travelwarning";
                let name = request_name(Service::TravelWarnings, "GET", path, tag);
                let request = user.request(Method::GET, Service::TravelWarnings, path);
                ActionOutcome::of(&user.send(&name, request, accept::OK).await)
            }
            Operation::View {
                service,
                resource,
                target,
            } => {
                let Some(id) = user.select_target(target) else {
                    return ActionOutcome::Skipped;
                };
                let name = request_name(service, "GET", &format!("{}/:id", resource.path()), tag);
                let request =
                    user.request(Method::GET, service, &format!("{}/{id}", resource.path()));
                ActionOutcome::of(&user.send(&name, request, accept::OK).await)
            }
            Operation::LikeWithGraph { target } => {
                let Some(id) = user.select_target(target) else {
                    return ActionOutcome::Skipped;
                };
                like_with_graph(user, id, tag).await
            }
            Operation::Comment { target, comments } => {
                let Some(id) = user.select_target(target) else {
                    return ActionOutcome::Skipped;
                };
                let comment = pick(comments, user.rng());
                let name = request_name(
                    Service::CommentsLikes,
                    "POST",
                    &format!("{}/:id", Resource::Comments.path()),
                    tag,
                );
                let request = user
                    .request(
                        Method::POST,
                        Service::CommentsLikes,
                        &format!("{}/{id}", Resource::Comments.path()),
                    )
                    .json(&json!({ "comment": comment }));
                ActionOutcome::of(&user.send(&name, request, accept::CREATED).await)
            }
            Operation::Feed { path } => {
                let name = request_name(Service::Recommendation, "GET", path, tag);
                let request = user.request(Method::GET, Service::Recommendation, path);
                ActionOutcome::of(&user.send(&name, request, accept::OK).await)
            }
            Operation::CreateItinerary { style } => create_itinerary(user, style).await,
            Operation::CreateLocation { target } => {
                let Some(id) = user.select_target(target) else {
                    return ActionOutcome::Skipped;
                };
                let today = user.today();
                let payload = LocationPayload::generate(user.rng(), today);
                let name = request_name(Service::Itinerary, "POST", "/location/itinerary/:id", tag);
                let request = user
                    .request(
                        Method::POST,
                        Service::Itinerary,
                        &format!("/location/itinerary/{id}"),
                    )
                    .json(&payload);
                ActionOutcome::of(&user.send(&name, request, accept::CREATED).await)
            }
        }
    }
}

/// Search the itinerary service and feed the first results into the pool.
pub(super) async fn search(
    user: &mut VirtualUser,
    kind: SearchKind,
    discovery: Discovery,
    tag: Option<&str>,
) -> ActionOutcome {
    let today = user.today();
    let body = search_body(kind, user.rng(), today);
    let name = request_name(Service::Itinerary, "POST", "/itinerary/search", tag);
    let request = user
        .request(Method::POST, Service::Itinerary, "/itinerary/search")
        .json(&body);

    let response = match user.send(&name, request, accept::OK).await {
        Ok(response) => response,
        Err(_) => return ActionOutcome::Failed,
    };

    let pool = user.pool();
    match discovery {
        Discovery::Ignore => {}
        Discovery::All { take } => {
            pool.discover(result_ids(&response, take));
        }
        Discovery::Hot { take } => {
            pool.discover_hot(result_ids(&response, take));
        }
    }
    ActionOutcome::Succeeded
}

async fn like_with_graph(user: &mut VirtualUser, id: ItineraryId, tag: Option<&str>) -> ActionOutcome {
    let like_name = request_name(Service::CommentsLikes, "POST", "/like/itinerary/:id", tag);
    let like = user
        .request(
            Method::POST,
            Service::CommentsLikes,
            &format!("/like/itinerary/{id}"),
        )
        .header(CONTENT_LENGTH, "0");
    if user.send(&like_name, like, accept::LIKE).await.is_err() {
        return ActionOutcome::Failed;
    }

    let graph_name = request_name(Service::Recommendation, "POST", "/graph/likes", tag);
    let graph = user
        .request(Method::POST, Service::Recommendation, "/graph/likes")
        .json(&json!({ "itineraryId": id }));
    ActionOutcome::of(&user.send(&graph_name, graph, accept::CREATED).await)
}

async fn create_itinerary(user: &mut VirtualUser, style: ItineraryStyle) -> ActionOutcome {
    let today = user.today();
    let payload = ItineraryPayload::generate(style, user.rng(), today);
    let create_name = request_name(Service::Itinerary, "POST", "/itinerary/create", style.create_tag());
    let create = user
        .request(Method::POST, Service::Itinerary, "/itinerary/create")
        .json(&payload);

    let response = match user.send(&create_name, create, accept::CREATED).await {
        Ok(response) => response,
        Err(_) => return ActionOutcome::Failed,
    };
    let Some(id) = created_id(&response) else {
        return ActionOutcome::Succeeded;
    };
    user.pool().discover([id]);

    let graph_name = request_name(
        Service::Recommendation,
        "POST",
        "/graph/itineraries",
        style.graph_tag(),
    );
    let graph = user
        .request(Method::POST, Service::Recommendation, "/graph/itineraries")
        .json(&GraphItinerary::created(id, &payload));
    ActionOutcome::of(&user.send(&graph_name, graph, accept::CREATED).await)
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::Duration;

    fn response(body: &str) -> CallResponse {
        CallResponse {
            status: 200,
            body: body.as_bytes().to_vec(),
            elapsed: Duration::from_millis(3),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    #[test]
    fn result_ids_takes_leading_ids() {
        let body = r#"[{"id": 4}, {"title": "no id"}, {"id": 8}, {"id": 15}]"#;
        assert_eq!(result_ids(&response(body), 3), vec![4, 8]);
        assert_eq!(result_ids(&response(body), 10), vec![4, 8, 15]);
    }

    #[test]
    fn malformed_search_results_discover_nothing() {
        assert!(result_ids(&response("{\"id\": 4}"), 3).is_empty());
        assert!(result_ids(&response("oops"), 3).is_empty());
    }

    #[test]
    fn created_id_is_optional() {
        assert_eq!(created_id(&response(r#"{"id": 77, "title": "x"}"#)), Some(77));
        assert_eq!(created_id(&response(r#"{"title": "x"}"#)), None);
    }

    #[test]
    fn viral_itinerary_payload_shape() {
        let mut rng = StdRng::seed_from_u64(4);
        let payload = ItineraryPayload::generate(ItineraryStyle::Viral, &mut rng, today());
        assert!(payload.title.starts_with("My Trip to "));
        assert!(POPULAR_DESTINATIONS.contains(&payload.destination.as_str()));

        let start = NaiveDate::parse_from_str(&payload.start_date, "%Y-%m-%d").unwrap();
        let days = (start - today()).num_days();
        assert!((1..=90).contains(&days));

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("shortDescription").is_some());
        assert!(json.get("detailedDescription").is_some());
    }

    #[test]
    fn location_dates_are_ordered() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let location = LocationPayload::generate(&mut rng, today());
            assert!(location.from_date < location.to_date);
            assert!(location.name.starts_with("Location in "));
        }
    }

    #[test]
    fn graph_record_for_created_itinerary() {
        let mut rng = StdRng::seed_from_u64(6);
        let payload = ItineraryPayload::generate(ItineraryStyle::Steady, &mut rng, today());
        let json = serde_json::to_value(GraphItinerary::created(9, &payload)).unwrap();
        assert_eq!(json["itineraryId"], 9);
        assert_eq!(json["eventType"], "CREATED");
        assert_eq!(json["likesCount"], 0);
        assert_eq!(json["locationNames"], json!([]));
        assert_eq!(json["description"], payload.short_description.as_str());
    }

    #[test]
    fn date_range_search_body() {
        let mut rng = StdRng::seed_from_u64(7);
        let body = search_body(SearchKind::DateRange, &mut rng, today());
        let from = body["startDateFrom"].as_str().unwrap();
        let to = body["startDateTo"].as_str().unwrap();
        assert!(from < to);
        assert_eq!(search_body(SearchKind::All, &mut rng, today()), json!({}));
    }
}
