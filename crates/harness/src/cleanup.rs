//! Removal of seeded test identities and generated files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::auth::IdentityProvider;
use crate::auth::store::{SeededUser, read_seeded_users};
use crate::error::{AuthError, CallError};

/// Status the identity provider answers for unknown accounts and bad passwords.
const ACCOUNT_NOT_FOUND: u16 = 400;

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupSummary {
    pub users: usize,
    pub accounts_deleted: usize,
    /// Accounts that could not sign in, assumed already gone.
    pub accounts_missing: usize,
    pub files_removed: Vec<PathBuf>,
    pub errors: Vec<String>,
}

/// Seeded identities to clean up; a missing file means there is nothing to do.
pub fn load_targets(path: &Path) -> Result<Vec<SeededUser>> {
    if !path.exists() {
        debug!(path = %path.display(), "no seeded users file");
        return Ok(Vec::new());
    }
    read_seeded_users(path)
}

/// Delete the identity provider account of every seeded user.
///
/// Each account signs in with the shared password, then deletes itself. A
/// sign-in rejected with 400 means the account is already gone; any other
/// failure is recorded as an error. An unconfigured provider deletes nothing.
pub async fn delete_accounts(
    provider: &IdentityProvider,
    users: &[SeededUser],
    password: &str,
    summary: &mut CleanupSummary,
) {
    summary.users = users.len();
    if !provider.is_configured() {
        info!("identity provider not configured, accounts are kept");
        return;
    }

    for (i, user) in users.iter().enumerate() {
        let token = match provider.sign_in_with_password(&user.email, password).await {
            Ok(token) => token,
            Err(AuthError::Call(CallError::Status {
                status: ACCOUNT_NOT_FOUND,
                ..
            })) => {
                debug!(email = %user.email, "account not found");
                summary.accounts_missing += 1;
                continue;
            }
            Err(e) => {
                summary
                    .errors
                    .push(format!("Failed to sign in as {}: {e}", user.email));
                continue;
            }
        };

        match provider.delete_account(&token).await {
            Ok(()) => summary.accounts_deleted += 1,
            Err(e) => summary
                .errors
                .push(format!("Failed to delete account {}: {e}", user.email)),
        }

        if (i + 1) % 50 == 0 {
            info!(done = i + 1, total = users.len(), "deleting accounts");
        }
    }
}

/// Remove the generated files that exist.
pub fn remove_files(paths: &[&Path], summary: &mut CleanupSummary) -> Result<()> {
    for path in paths {
        if !path.exists() {
            continue;
        }
        fs::remove_file(path).with_context(|| format!("failed to delete {}", path.display()))?;
        info!(path = %path.display(), "deleted");
        summary.files_removed.push(path.to_path_buf());
    }
    if !summary.errors.is_empty() {
        warn!(errors = summary.errors.len(), "cleanup finished with errors");
    }
    Ok(())
}
