//! Workload profile model.
//!
//! A [`Profile`] is a weighted table of [`ActionSpec`]s plus the pacing and
//! bias parameters of one traffic pattern. Profiles share every mechanism and
//! differ only in their numbers; see [`profiles`].

mod actions;
pub mod profiles;
mod user;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;

use crate::config::ServiceUrls;
use crate::data::Place;
use crate::error::ProfileError;
use crate::weighted::WeightedTable;

pub use actions::{ActionOutcome, ItineraryPayload, LocationPayload};
pub(crate) use actions::{GraphItinerary, created_id};
pub use user::{ActionTally, Identity, RunContext, UserSession, VirtualUser};

/// The named traffic patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    /// Normal daily traffic across all services.
    Periodic,
    /// A once-in-a-lifetime viral spike concentrated on hot content.
    Spike,
}

impl ProfileKind {
    pub fn name(self) -> &'static str {
        match self {
            ProfileKind::Periodic => "periodic",
            ProfileKind::Spike => "spike",
        }
    }

    /// Profile-specific environment file, loaded before `.env`.
    pub fn env_file(self) -> &'static str {
        match self {
            ProfileKind::Periodic => ".env.periodic",
            ProfileKind::Spike => ".env.onceinlifetime",
        }
    }

    /// Build the profile definition.
    pub fn profile(self) -> Result<Profile, ProfileError> {
        match self {
            ProfileKind::Periodic => profiles::periodic(),
            ProfileKind::Spike => profiles::spike(),
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProfileKind {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "periodic" => Ok(ProfileKind::Periodic),
            "spike" | "viral" | "onceinlifetime" => Ok(ProfileKind::Spike),
            _ => Err(ProfileError::UnknownProfile(s.to_string())),
        }
    }
}

/// A service under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Itinerary,
    CommentsLikes,
    Recommendation,
    Weather,
    TravelWarnings,
}

impl Service {
    /// Prefix for request names. The itinerary service is the default host
    /// and carries none.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Service::Itinerary => None,
            Service::CommentsLikes => Some("[CommentsLikes]"),
            Service::Recommendation => Some("[Recommendation]"),
            Service::Weather => Some("[Weather]"),
            Service::TravelWarnings => Some("[TravelWarnings]"),
        }
    }

    pub fn base_url(self, urls: &ServiceUrls) -> &str {
        match self {
            Service::Itinerary => &urls.itinerary,
            Service::CommentsLikes => &urls.comments_likes,
            Service::Recommendation => &urls.recommendation,
            Service::Weather => &urls.weather,
            Service::TravelWarnings => &urls.travel_warnings,
        }
    }
}

/// Request name as reported in statistics, e.g.
/// `[CommentsLikes] POST /like/itinerary/:id [BURST]`.
pub fn request_name(service: Service, method: &str, path: &str, tag: Option<&str>) -> String {
    let mut name = String::new();
    if let Some(label) = service.label() {
        name.push_str(label);
        name.push(' ');
    }
    name.push_str(method);
    name.push(' ');
    name.push_str(path);
    if let Some(tag) = tag {
        name.push(' ');
        name.push_str(tag);
    }
    name
}

/// How an action picks the itinerary it works on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetPolicy {
    /// Any discovered itinerary; the action is skipped while none is known.
    Known,
    /// Hot content with probability `bias`, falling back to any discovered
    /// itinerary and finally to a guessed id.
    Hot { bias: f64 },
}

/// Search request body variants.
#[derive(Debug, Clone, Copy)]
pub enum SearchKind {
    /// `{destination}` drawn from the list.
    Destination(&'static [&'static str]),
    /// `{}`: everything.
    All,
    /// `{startDateFrom, startDateTo}` within the next six months.
    DateRange,
}

/// Where ids from a successful search go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    Ignore,
    /// First `take` ids into the all pool.
    All { take: usize },
    /// First `take` ids into both hot and all pools.
    Hot { take: usize },
}

/// Per-itinerary resources that can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Locations,
    Comments,
    Likes,
}

impl Resource {
    pub fn path(self) -> &'static str {
        match self {
            Resource::Locations => "/location/itinerary",
            Resource::Comments => "/comment/itinerary",
            Resource::Likes => "/like/itinerary",
        }
    }
}

/// Flavour of generated itineraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItineraryStyle {
    /// "Trip to"/"Visit to" a destination, starting within 180 days.
    Steady,
    /// "My Trip to" a trending destination, starting within 90 days.
    Viral,
}

/// What an action does.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    Search {
        kind: SearchKind,
        discovery: Discovery,
    },
    Weather {
        places: &'static [Place],
    },
    TravelWarnings,
    View {
        service: Service,
        resource: Resource,
        target: TargetPolicy,
    },
    /// Like, then record the like in the recommendation graph.
    LikeWithGraph {
        target: TargetPolicy,
    },
    Comment {
        target: TargetPolicy,
        comments: &'static [&'static str],
    },
    Feed {
        path: &'static str,
    },
    /// Create, then record the itinerary in the recommendation graph.
    CreateItinerary {
        style: ItineraryStyle,
    },
    CreateLocation {
        target: TargetPolicy,
    },
}

/// One weighted user action.
#[derive(Debug, Clone)]
pub struct ActionSpec {
    pub name: &'static str,
    pub weight: u32,
    /// Suffix appended to every request name this action reports.
    pub tag: Option<&'static str>,
    pub operation: Operation,
}

/// How newly registered users are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewUserStyle {
    /// `<first>.<last>.<5 digits>@loadtest.example.com`
    Steady,
    /// `viral.user.<6 digits>.<unix ts>@example.com`
    Viral,
}

/// A complete traffic pattern.
#[derive(Debug, Clone)]
pub struct Profile {
    pub kind: ProfileKind,
    /// Lower bound of the pause between actions.
    pub wait_min: Duration,
    /// Upper bound of the pause between actions.
    pub wait_max: Duration,
    /// Timeout applied to every service call.
    pub request_timeout: Duration,
    /// Probability that a virtual user registers as a new user.
    pub new_user_ratio: f64,
    pub new_user_style: NewUserStyle,
    /// Hot content search issued once when a session starts.
    pub discover_on_start: Option<SearchKind>,
    pub actions: WeightedTable<ActionSpec>,
}

impl Profile {
    /// Build a profile, validating the action weights.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: ProfileKind,
        wait: (Duration, Duration),
        request_timeout: Duration,
        new_user_ratio: f64,
        new_user_style: NewUserStyle,
        discover_on_start: Option<SearchKind>,
        actions: Vec<ActionSpec>,
    ) -> Result<Self, ProfileError> {
        let actions = WeightedTable::new(
            actions.into_iter().map(|a| {
                let weight = a.weight;
                (a, weight)
            }),
            |a| a.name.to_string(),
        )?;
        let (wait_min, wait_max) = if wait.0 <= wait.1 {
            wait
        } else {
            (wait.1, wait.0)
        };
        Ok(Self {
            kind,
            wait_min,
            wait_max,
            request_timeout,
            new_user_ratio: new_user_ratio.clamp(0.0, 1.0),
            new_user_style,
            discover_on_start,
            actions,
        })
    }

    /// Uniform pause between `wait_min` and `wait_max`.
    pub fn wait_time<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.wait_min == self.wait_max {
            return self.wait_min;
        }
        let secs = rng.gen_range(self.wait_min.as_secs_f64()..=self.wait_max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Look up an action by name.
    pub fn action(&self, name: &str) -> Option<&ActionSpec> {
        self.actions.iter().find(|a| a.name == name)
    }
}
