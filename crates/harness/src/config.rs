//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Default identity provider REST endpoint (Identity Toolkit v1).
pub const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Default password shared by every seeded identity.
pub const DEFAULT_TEST_PASSWORD: &str = "LoadTest123!";

/// Default token freshness: refresh 10 minutes before the provider's 1h expiry.
pub const DEFAULT_TOKEN_FRESHNESS_SECS: u64 = 3000;

/// Base URLs of the services under test.
#[derive(Debug, Clone)]
pub struct ServiceUrls {
    pub itinerary: String,
    pub comments_likes: String,
    pub recommendation: String,
    pub weather: String,
    pub travel_warnings: String,
}

impl ServiceUrls {
    /// Every service on the same base URL (used by tests against one mock server).
    pub fn uniform(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            itinerary: base.clone(),
            comments_likes: base.clone(),
            recommendation: base.clone(),
            weather: base.clone(),
            travel_warnings: base,
        }
    }
}

/// Harness configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Service base URLs, trailing slash trimmed.
    pub services: ServiceUrls,

    /// Identity provider API key. When None, runs are unauthenticated.
    pub firebase_api_key: Option<String>,

    /// Identity provider base URL (default: Identity Toolkit v1).
    pub identity_toolkit_url: String,

    /// Password used by seeded identities (default: LoadTest123!).
    pub test_user_password: String,

    /// How long a cached ID token is reused (default: 3000s).
    pub token_freshness: Duration,

    /// Number of seeded identity slots (default: 1000).
    pub num_users: usize,

    /// Seeded identity list written by `seed` (default: test_users.json).
    pub test_users_file: PathBuf,

    /// Pre-exchanged token file (default: tokens.json).
    pub tokens_file: PathBuf,

    /// Itineraries created per seeded user (default: 3).
    pub itineraries_per_user: usize,

    /// Locations created per seeded itinerary (default: 2).
    pub locations_per_itinerary: usize,

    /// Also create identity provider accounts while seeding (default: false).
    pub create_identity_users: bool,

    /// Seed for the seeding RNG (default: current unix time).
    pub random_seed: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load `files`, then `.env`; first match wins per variable.
    ///
    /// Runs before logging is set up so the files can configure `RUST_LOG`.
    /// Missing files are ignored; the paths of the loaded ones are returned.
    pub fn load_env_files(files: &[&str]) -> Vec<PathBuf> {
        let mut loaded: Vec<PathBuf> = files
            .iter()
            .filter(|file| dotenvy::from_filename(file).is_ok())
            .map(PathBuf::from)
            .collect();
        if let Ok(path) = dotenvy::dotenv() {
            loaded.push(path);
        }
        loaded
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = |key: &str, default: &str| {
            lookup(key)
                .unwrap_or_else(|| default.to_string())
                .trim_end_matches('/')
                .to_string()
        };

        let services = ServiceUrls {
            itinerary: url("ITINERARY_SERVICE_URL", "http://localhost:8080"),
            comments_likes: url("COMMENTS_LIKES_SERVICE_URL", "http://localhost:8084"),
            recommendation: url("RECOMMENDATION_SERVICE_URL", "http://localhost:8081"),
            weather: url("WEATHER_SERVICE_URL", "http://localhost:8082"),
            travel_warnings: url("TRAVEL_WARNINGS_SERVICE_URL", "http://localhost:8083"),
        };

        let firebase_api_key = lookup("FIREBASE_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let identity_toolkit_url = url("IDENTITY_TOOLKIT_URL", DEFAULT_IDENTITY_TOOLKIT_URL);

        let test_user_password =
            lookup("FIREBASE_PASSWORD").unwrap_or_else(|| DEFAULT_TEST_PASSWORD.to_string());

        let token_freshness = lookup("AUTH_TOKEN_FRESHNESS_SECS")
            .unwrap_or_else(|| DEFAULT_TOKEN_FRESHNESS_SECS.to_string())
            .parse()
            .map(Duration::from_secs)
            .context("AUTH_TOKEN_FRESHNESS_SECS must be a valid u64")?;

        let num_users: usize = lookup("NUM_USERS")
            .unwrap_or_else(|| "1000".to_string())
            .parse()
            .context("NUM_USERS must be a valid usize")?;
        if num_users == 0 {
            bail!("NUM_USERS must be at least 1");
        }

        let test_users_file = lookup("TEST_USERS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("test_users.json"));

        let tokens_file = lookup("TOKENS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("tokens.json"));

        let itineraries_per_user = lookup("NUM_ITINERARIES_PER_USER")
            .unwrap_or_else(|| "3".to_string())
            .parse()
            .context("NUM_ITINERARIES_PER_USER must be a valid usize")?;

        let locations_per_itinerary = lookup("NUM_LOCATIONS_PER_ITINERARY")
            .unwrap_or_else(|| "2".to_string())
            .parse()
            .context("NUM_LOCATIONS_PER_ITINERARY must be a valid usize")?;

        let create_identity_users = lookup("CREATE_FIREBASE_USERS")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let random_seed = match lookup("RANDOM_SEED") {
            Some(v) => v.parse().context("RANDOM_SEED must be a valid u64")?,
            None => chrono::Utc::now().timestamp().unsigned_abs(),
        };

        Ok(Self {
            services,
            firebase_api_key,
            identity_toolkit_url,
            test_user_password,
            token_freshness,
            num_users,
            test_users_file,
            tokens_file,
            itineraries_per_user,
            locations_per_itinerary,
            create_identity_users,
            random_seed,
        })
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.services.itinerary, "http://localhost:8080");
        assert_eq!(config.services.comments_likes, "http://localhost:8084");
        assert!(config.firebase_api_key.is_none());
        assert_eq!(config.token_freshness, Duration::from_secs(3000));
        assert_eq!(config.num_users, 1000);
        assert_eq!(config.test_user_password, "LoadTest123!");
        assert!(!config.create_identity_users);
    }

    #[test]
    fn trims_trailing_slashes_and_blank_keys() {
        let config = config_from(&[
            ("ITINERARY_SERVICE_URL", "https://api.example.com/"),
            ("FIREBASE_API_KEY", "   "),
        ])
        .unwrap();
        assert_eq!(config.services.itinerary, "https://api.example.com");
        assert!(config.firebase_api_key.is_none());
    }

    #[test]
    fn freshness_window_is_configurable() {
        let config = config_from(&[("AUTH_TOKEN_FRESHNESS_SECS", "600")]).unwrap();
        assert_eq!(config.token_freshness, Duration::from_secs(600));
    }

    #[test]
    fn reports_loaded_env_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join(".env.periodic");
        fs::write(&present, "TRIPICO_CONFIG_TEST_MARKER=periodic\n").unwrap();
        let missing = dir.path().join(".env.missing");

        let loaded = Config::load_env_files(&[
            present.to_str().unwrap(),
            missing.to_str().unwrap(),
        ]);
        assert!(loaded.contains(&present));
        assert!(!loaded.contains(&missing));
        assert_eq!(
            env::var("TRIPICO_CONFIG_TEST_MARKER").as_deref(),
            Ok("periodic")
        );
    }

    #[test]
    fn rejects_invalid_numbers() {
        assert!(config_from(&[("NUM_USERS", "many")]).is_err());
        assert!(config_from(&[("NUM_USERS", "0")]).is_err());
        assert!(config_from(&[("RANDOM_SEED", "-1")]).is_err());
    }
}
