//! Seeded identity, custom token and exchanged token files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One identity created by the seeding step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededUser {
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// Read the seeded identity list (a JSON array).
pub fn read_seeded_users(path: &Path) -> Result<Vec<SeededUser>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid seeded users in {}", path.display()))
}

/// Write the seeded identity list as pretty JSON.
pub fn write_seeded_users(path: &Path, users: &[SeededUser]) -> Result<()> {
    let json = serde_json::to_string_pretty(users).context("failed to encode seeded users")?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Lazily loaded seeded identity list.
///
/// A successful load is kept for the life of the store; a missing or invalid
/// file is retried on the next call, since seeding may still be running.
#[derive(Debug)]
pub struct SeededUserStore {
    path: PathBuf,
    loaded: Mutex<Option<Arc<Vec<SeededUser>>>>,
}

impl SeededUserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: Mutex::new(None),
        }
    }

    /// A store that already holds `users` and never touches the disk.
    pub fn preloaded(users: Vec<SeededUser>) -> Self {
        Self {
            path: PathBuf::new(),
            loaded: Mutex::new(Some(Arc::new(users))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The identity list, empty when unavailable.
    ///
    /// The lock is only held to read or memoize the list, never across file
    /// I/O; concurrent first loads keep whichever list was stored first.
    pub fn users(&self) -> Arc<Vec<SeededUser>> {
        if let Some(users) = self.loaded.lock().as_ref() {
            return Arc::clone(users);
        }

        if !self.path.exists() {
            debug!(path = %self.path.display(), "no seeded users file");
            return Arc::new(Vec::new());
        }

        match read_seeded_users(&self.path) {
            Ok(users) => {
                debug!(count = users.len(), "loaded seeded users");
                let mut loaded = self.loaded.lock();
                Arc::clone(loaded.get_or_insert_with(|| Arc::new(users)))
            }
            Err(e) => {
                warn!(error = %e, "error loading seeded users");
                Arc::new(Vec::new())
            }
        }
    }
}

/// An entry of the custom token file produced by the admin tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTokenRecord {
    pub uid: String,
    pub email: String,
    pub name: String,
    pub token: String,
}

/// Read a custom token file (`{email: {uid, email, name, token}}`), ordered by email.
pub fn read_custom_tokens(path: &Path) -> Result<Vec<CustomTokenRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records: BTreeMap<String, CustomTokenRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid custom tokens in {}", path.display()))?;
    Ok(records.into_values().collect())
}

/// An exchanged ID token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub email: String,
    pub token: String,
}

/// Exchanged tokens with the unix time they were saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenFile {
    pub tokens: Vec<StoredToken>,
    pub timestamp: f64,
}

impl TokenFile {
    /// Save `tokens` stamped with `now`.
    pub fn save(path: &Path, tokens: Vec<StoredToken>, now: DateTime<Utc>) -> Result<()> {
        let file = TokenFile {
            tokens,
            timestamp: now.timestamp_millis() as f64 / 1000.0,
        };
        let json = serde_json::to_string_pretty(&file).context("failed to encode tokens")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Tokens saved less than `freshness` before `now`; empty otherwise.
    pub fn load_fresh(path: &Path, freshness: Duration, now: DateTime<Utc>) -> Vec<StoredToken> {
        if !path.exists() {
            return Vec::new();
        }

        let file: TokenFile = match fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|raw| serde_json::from_str(&raw).map_err(anyhow::Error::from))
        {
            Ok(file) => file,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "error loading tokens");
                return Vec::new();
            }
        };

        let age = now.timestamp_millis() as f64 / 1000.0 - file.timestamp;
        if age < freshness.as_secs_f64() {
            file.tokens
        } else {
            debug!(age_secs = age, "token file is stale");
            Vec::new()
        }
    }
}
