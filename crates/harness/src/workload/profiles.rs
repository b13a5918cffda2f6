//! The periodic and spike profile definitions.

use std::time::Duration;

use super::{
    ActionSpec, Discovery, ItineraryStyle, NewUserStyle, Operation, Profile, ProfileKind,
    Resource, SearchKind, Service, TargetPolicy,
};
use crate::data::{COMMENTS, DESTINATIONS, PLACES, POPULAR_DESTINATIONS, QUICK_COMMENTS, TRENDING_PLACES};
use crate::error::ProfileError;

const HOT_READ: TargetPolicy = TargetPolicy::Hot { bias: 0.95 };
const HOT_BURST: TargetPolicy = TargetPolicy::Hot { bias: 0.98 };

/// Normal daily traffic: heavy reads, moderate social activity, light writes.
pub fn periodic() -> Result<Profile, ProfileError> {
    Profile::new(
        ProfileKind::Periodic,
        (Duration::from_secs(1), Duration::from_secs(5)),
        Duration::from_secs(5),
        0.3,
        NewUserStyle::Steady,
        None,
        vec![
            ActionSpec {
                name: "search_by_destination",
                weight: 15,
                tag: Some("[destination]"),
                operation: Operation::Search {
                    kind: SearchKind::Destination(DESTINATIONS),
                    discovery: Discovery::All { take: 3 },
                },
            },
            ActionSpec {
                name: "browse_all",
                weight: 10,
                tag: Some("[all]"),
                operation: Operation::Search {
                    kind: SearchKind::All,
                    discovery: Discovery::All { take: 5 },
                },
            },
            ActionSpec {
                name: "weather",
                weight: 8,
                tag: None,
                operation: Operation::Weather { places: PLACES },
            },
            ActionSpec {
                name: "travel_warnings",
                weight: 7,
                tag: None,
                operation: Operation::TravelWarnings,
            },
            ActionSpec {
                name: "search_by_date_range",
                weight: 5,
                tag: Some("[date range]"),
                operation: Operation::Search {
                    kind: SearchKind::DateRange,
                    discovery: Discovery::Ignore,
                },
            },
            ActionSpec {
                name: "view_locations",
                weight: 10,
                tag: None,
                operation: Operation::View {
                    service: Service::Itinerary,
                    resource: Resource::Locations,
                    target: TargetPolicy::Known,
                },
            },
            ActionSpec {
                name: "like_with_graph",
                weight: 6,
                tag: None,
                operation: Operation::LikeWithGraph {
                    target: TargetPolicy::Known,
                },
            },
            ActionSpec {
                name: "view_comments",
                weight: 5,
                tag: None,
                operation: Operation::View {
                    service: Service::Itinerary,
                    resource: Resource::Comments,
                    target: TargetPolicy::Known,
                },
            },
            ActionSpec {
                name: "add_comment",
                weight: 4,
                tag: None,
                operation: Operation::Comment {
                    target: TargetPolicy::Known,
                    comments: COMMENTS,
                },
            },
            ActionSpec {
                name: "personalized_feed",
                weight: 10,
                tag: None,
                operation: Operation::Feed { path: "/feed" },
            },
            ActionSpec {
                name: "popular_feed",
                weight: 5,
                tag: None,
                operation: Operation::Feed {
                    path: "/feed/popular",
                },
            },
            ActionSpec {
                name: "create_itinerary",
                weight: 7,
                tag: None,
                operation: Operation::CreateItinerary {
                    style: ItineraryStyle::Steady,
                },
            },
            ActionSpec {
                name: "create_location",
                weight: 3,
                tag: None,
                operation: Operation::CreateLocation {
                    target: TargetPolicy::Known,
                },
            },
        ],
    )
}

/// Viral spike: fast users hammering a small set of hot itineraries.
pub fn spike() -> Result<Profile, ProfileError> {
    Profile::new(
        ProfileKind::Spike,
        (Duration::from_millis(500), Duration::from_secs(2)),
        Duration::from_secs(3),
        0.8,
        NewUserStyle::Viral,
        Some(SearchKind::Destination(POPULAR_DESTINATIONS)),
        vec![
            ActionSpec {
                name: "view_hot_locations",
                weight: 25,
                tag: Some("[HOT]"),
                operation: Operation::View {
                    service: Service::Itinerary,
                    resource: Resource::Locations,
                    target: HOT_READ,
                },
            },
            ActionSpec {
                name: "view_hot_comments",
                weight: 15,
                tag: Some("[HOT]"),
                operation: Operation::View {
                    service: Service::CommentsLikes,
                    resource: Resource::Comments,
                    target: HOT_READ,
                },
            },
            ActionSpec {
                name: "view_hot_likes",
                weight: 10,
                tag: Some("[HOT]"),
                operation: Operation::View {
                    service: Service::CommentsLikes,
                    resource: Resource::Likes,
                    target: HOT_READ,
                },
            },
            ActionSpec {
                name: "trending_weather",
                weight: 10,
                tag: Some("[VIRAL]"),
                operation: Operation::Weather {
                    places: TRENDING_PLACES,
                },
            },
            ActionSpec {
                name: "popular_feed",
                weight: 5,
                tag: Some("[VIRAL]"),
                operation: Operation::Feed {
                    path: "/feed/popular",
                },
            },
            ActionSpec {
                name: "like_burst",
                weight: 12,
                tag: Some("[BURST]"),
                operation: Operation::LikeWithGraph { target: HOT_BURST },
            },
            ActionSpec {
                name: "comment_burst",
                weight: 8,
                tag: Some("[BURST]"),
                operation: Operation::Comment {
                    target: HOT_BURST,
                    comments: QUICK_COMMENTS,
                },
            },
            ActionSpec {
                name: "search_trending",
                weight: 6,
                tag: Some("[trending]"),
                operation: Operation::Search {
                    kind: SearchKind::Destination(POPULAR_DESTINATIONS),
                    discovery: Discovery::Hot { take: 3 },
                },
            },
            ActionSpec {
                name: "discover_more",
                weight: 4,
                tag: Some("[discover]"),
                operation: Operation::Search {
                    kind: SearchKind::All,
                    discovery: Discovery::All { take: 5 },
                },
            },
            ActionSpec {
                name: "create_inspired_itinerary",
                weight: 3,
                tag: None,
                operation: Operation::CreateItinerary {
                    style: ItineraryStyle::Viral,
                },
            },
            ActionSpec {
                name: "travel_warnings",
                weight: 2,
                tag: Some("[VIRAL]"),
                operation: Operation::TravelWarnings,
            },
        ],
    )
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn periodic_weights() {
        let profile = periodic().unwrap();
        assert_eq!(profile.actions.len(), 13);
        assert_eq!(profile.actions.total_weight(), 95);
        assert_eq!(profile.action("search_by_destination").unwrap().weight, 15);
        assert_eq!(profile.new_user_ratio, 0.3);
        assert!(profile.discover_on_start.is_none());
        assert!(
            profile
                .actions
                .iter()
                .filter_map(|a| match a.operation {
                    Operation::View { target, .. }
                    | Operation::LikeWithGraph { target }
                    | Operation::Comment { target, .. }
                    | Operation::CreateLocation { target } => Some(target),
                    _ => None,
                })
                .all(|t| t == TargetPolicy::Known)
        );
    }

    #[test]
    fn spike_weights_and_biases() {
        let profile = spike().unwrap();
        assert_eq!(profile.actions.len(), 11);
        assert_eq!(profile.actions.total_weight(), 100);
        assert_eq!(profile.request_timeout, Duration::from_secs(3));
        assert!(profile.discover_on_start.is_some());

        match profile.action("like_burst").unwrap().operation {
            Operation::LikeWithGraph { target } => {
                assert_eq!(target, TargetPolicy::Hot { bias: 0.98 })
            }
            ref other => panic!("unexpected operation {other:?}"),
        }
        match profile.action("view_hot_locations").unwrap().operation {
            Operation::View { target, .. } => assert_eq!(target, TargetPolicy::Hot { bias: 0.95 }),
            ref other => panic!("unexpected operation {other:?}"),
        }
    }

    #[test]
    fn selection_follows_weights() {
        let profile = spike().unwrap();
        // Rolls 0..25 land on the first action, 25..40 on the second.
        assert_eq!(profile.actions.pick_at(0).name, "view_hot_locations");
        assert_eq!(profile.actions.pick_at(24).name, "view_hot_locations");
        assert_eq!(profile.actions.pick_at(25).name, "view_hot_comments");
        assert_eq!(profile.actions.pick_at(99).name, "travel_warnings");
    }
}
