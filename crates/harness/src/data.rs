//! Sample content used to build realistic payloads.

/// A destination with approximate coordinates for weather lookups.
#[derive(Debug, Clone, Copy)]
pub struct Place {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

const fn place(name: &'static str, lat: f64, lon: f64) -> Place {
    Place { name, lat, lon }
}

/// Destinations searched and created during steady traffic.
pub const DESTINATIONS: &[&str] = &[
    "Paris", "Tokyo", "New York", "London", "Barcelona", "Rome", "Dubai", "Singapore", "Sydney",
    "Amsterdam", "Berlin", "Prague", "Vienna", "Budapest", "Lisbon", "Copenhagen", "Stockholm",
    "Munich", "Venice", "Madrid", "Porto", "Athens",
];

/// Destinations that go viral during a spike.
pub const POPULAR_DESTINATIONS: &[&str] = &[
    "Paris", "Tokyo", "Bali", "Maldives", "Santorini", "Iceland", "Dubai", "New York",
    "Barcelona", "Rome",
];

/// Wider destination list used by the seeding step.
pub const SEED_DESTINATIONS: &[&str] = &[
    "Paris", "Tokyo", "New York", "London", "Barcelona", "Rome", "Dubai", "Singapore", "Sydney",
    "Amsterdam", "Berlin", "Prague", "Vienna", "Budapest", "Lisbon", "Copenhagen", "Stockholm",
    "Helsinki", "Oslo", "Zurich", "Munich", "Venice", "Florence", "Madrid", "Porto", "Athens",
    "Istanbul", "Bangkok", "Hong Kong", "Seoul", "Beijing", "Shanghai", "Mumbai", "Delhi",
    "Cairo", "Marrakech", "Cape Town", "Rio de Janeiro", "Buenos Aires", "Mexico City",
    "Toronto", "Vancouver", "Montreal", "San Francisco", "Los Angeles", "Miami", "Chicago",
    "Boston", "Seattle", "Austin", "Dublin", "Edinburgh", "Brussels", "Luxembourg", "Reykjavik",
    "Warsaw", "Krakow", "Tallinn",
];

/// Coordinates for steady-traffic weather lookups.
pub const PLACES: &[Place] = &[
    place("Paris", 48.8566, 2.3522),
    place("Tokyo", 35.6762, 139.6503),
    place("New York", 40.7128, -74.0060),
    place("London", 51.5074, -0.1278),
    place("Barcelona", 41.3851, 2.1734),
    place("Rome", 41.9028, 12.4964),
    place("Dubai", 25.2048, 55.2708),
    place("Singapore", 1.3521, 103.8198),
    place("Sydney", -33.8688, 151.2093),
    place("Amsterdam", 52.3676, 4.9041),
    place("Berlin", 52.5200, 13.4050),
];

/// Coordinates for trending destinations during a spike.
pub const TRENDING_PLACES: &[Place] = &[
    place("Paris", 48.8566, 2.3522),
    place("Tokyo", 35.6762, 139.6503),
    place("Bali", -8.3405, 115.0920),
    place("Dubai", 25.2048, 55.2708),
    place("New York", 40.7128, -74.0060),
    place("Barcelona", 41.3851, 2.1734),
];

/// Coordinates known to the seeding step.
pub const SEED_PLACES: &[Place] = &[
    place("Paris", 48.8566, 2.3522),
    place("Tokyo", 35.6762, 139.6503),
    place("New York", 40.7128, -74.0060),
    place("London", 51.5074, -0.1278),
    place("Barcelona", 41.3851, 2.1734),
    place("Rome", 41.9028, 12.4964),
    place("Dubai", 25.2048, 55.2708),
    place("Singapore", 1.3521, 103.8198),
    place("Sydney", -33.8688, 151.2093),
    place("Amsterdam", 52.3676, 4.9041),
    place("Berlin", 52.5200, 13.4050),
    place("Prague", 50.0755, 14.4378),
    place("Vienna", 48.2082, 16.3738),
    place("Budapest", 47.4979, 19.0402),
    place("Lisbon", 38.7223, -9.1393),
];

/// Coordinates for a destination, or the origin when unknown.
pub fn coords_for(places: &[Place], name: &str) -> (f64, f64) {
    places
        .iter()
        .find(|p| p.name == name)
        .map(|p| (p.lat, p.lon))
        .unwrap_or((0.0, 0.0))
}

/// Display names for newly registered steady-traffic users.
pub const USER_NAMES: &[&str] = &[
    "Emma Smith", "Liam Johnson", "Olivia Williams", "Noah Brown", "Ava Jones", "Emma", "John",
    "Jane", "Michael", "Sarah", "David", "Lisa", "Robert", "Maria",
];

pub const FIRST_NAMES: &[&str] = &[
    "Emma", "Liam", "Olivia", "Noah", "Ava", "Ethan", "Sophia", "Mason", "Isabella", "William",
    "Mia", "James", "Charlotte", "Benjamin", "Amelia", "Lucas", "Harper", "Henry", "Evelyn",
    "Alexander", "Abigail", "Michael", "Emily", "Daniel", "Elizabeth", "Matthew", "Sofia",
    "Jackson", "Avery", "David", "Ella", "Joseph", "Scarlett", "Samuel", "Grace", "Sebastian",
    "Chloe", "Jack", "Victoria", "Aiden",
];

pub const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Thompson", "White", "Harris", "Clark", "Lewis",
    "Robinson", "Walker", "Young", "King",
];

/// Steady-traffic comments.
pub const COMMENTS: &[&str] = &[
    "This looks amazing!",
    "I've been there! Such a wonderful place.",
    "Adding this to my bucket list!",
    "Great itinerary, very well planned.",
    "Thanks for sharing this experience.",
    "Beautiful destination!",
    "Very helpful, thank you!",
    "Can't wait to try this!",
];

/// Short reactions posted on viral content.
pub const QUICK_COMMENTS: &[&str] = &[
    "Wow!",
    "Amazing!",
    "😍",
    "This is incredible!",
    "I need to go here!",
    "Unbelievable!",
    "Added to my list!",
    "Goals!",
    "Dream destination!",
];

/// Comments left by seeded users.
pub const SEED_COMMENTS: &[&str] = &[
    "This looks amazing!",
    "I've been there! Such a wonderful place.",
    "Adding this to my bucket list!",
    "Great itinerary, very well planned.",
    "Thanks for sharing this experience.",
    "Beautiful destination!",
    "Can't wait to visit!",
    "This is exactly what I was looking for.",
    "Wonderful suggestions!",
    "Very helpful itinerary!",
];

pub const TRIP_TYPES: &[&str] = &[
    "Family Trip to",
    "Business Trip to",
    "Romantic Getaway in",
    "Solo Adventure in",
    "Weekend in",
    "Summer Vacation in",
    "Winter Holiday in",
    "Backpacking through",
    "Luxury Tour of",
    "Cultural Exploration of",
    "Food Tour in",
    "Historical Journey through",
    "Beach Vacation in",
    "Mountain Retreat to",
    "City Break in",
];

pub const SHORT_DESCRIPTIONS: &[&str] = &[
    "Exploring the beautiful sights and sounds",
    "A wonderful journey through historic landmarks",
    "Discovering hidden gems and local culture",
    "Relaxing and enjoying the local cuisine",
    "Adventure and excitement await",
    "A perfect blend of relaxation and exploration",
    "Immersing in the local traditions",
    "Experiencing world-class attractions",
    "Creating unforgettable memories",
    "Wandering through charming streets",
    "Authentic cultural experiences",
    "Breathtaking views and scenery",
];

pub const DETAILED_DESCRIPTIONS: &[&str] = &[
    "An amazing journey that combines culture, history, and modern attractions. We'll visit famous landmarks, try local cuisine, and immerse ourselves in the vibrant atmosphere.",
    "This trip promises to be unforgettable with carefully planned visits to must-see attractions, hidden local gems, and authentic experiences that showcase the true spirit of the place.",
    "A comprehensive itinerary that balances sightseeing with leisure time, allowing us to explore at our own pace while ensuring we don't miss the highlights.",
    "From historic monuments to contemporary art scenes, this adventure will take us through the diverse facets of the destination, offering insights into both its past and present.",
    "A carefully curated experience featuring the best accommodations, dining options, and activities that will make this trip truly memorable.",
    "Discover the heart and soul of this destination through authentic local experiences, hidden treasures, and unforgettable moments.",
    "A perfect itinerary mixing relaxation, adventure, culture, and cuisine for an enriching travel experience.",
];

pub const LOCATION_NAMES: &[&str] = &[
    "City Center",
    "Historic District",
    "Waterfront Area",
    "Old Town",
    "Modern Quarter",
    "Museum District",
    "Shopping Area",
    "Cultural Center",
    "Park Area",
    "Entertainment Zone",
    "Business District",
    "Arts Quarter",
    "Riverside Walk",
    "Market Square",
    "Cathedral Quarter",
];

pub const LOCATION_DESCRIPTIONS: &[&str] = &[
    "A vibrant area filled with local shops, restaurants, and attractions.",
    "Historic buildings and charming streets full of character.",
    "Beautiful views and plenty of activities for everyone.",
    "A must-visit spot known for its unique atmosphere.",
    "The perfect place to relax and enjoy the surroundings.",
    "Rich in history and cultural significance.",
    "Modern architecture and world-class facilities.",
    "Breathtaking scenery and natural beauty.",
    "Bustling with energy and local life.",
    "Peaceful and scenic, ideal for exploration.",
];
