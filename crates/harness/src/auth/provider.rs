//! Identity Toolkit compatible REST client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::http::{ServiceClient, accept};

/// Timeout for every identity provider call.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomTokenRequest<'a> {
    token: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: Option<String>,
}

/// Client for `accounts:*` endpoints.
#[derive(Debug, Clone)]
pub struct IdentityProvider {
    http: ServiceClient,
    base_url: String,
    api_key: Option<String>,
}

impl IdentityProvider {
    pub fn new(http: ServiceClient, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Whether an API key is configured.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, action: &str) -> Result<String, AuthError> {
        let key = self.api_key.as_deref().ok_or(AuthError::NotConfigured)?;
        Ok(format!(
            "{}/accounts:{action}?key={}",
            self.base_url,
            urlencoding::encode(key)
        ))
    }

    async fn post<B: Serialize>(&self, action: &str, body: &B) -> Result<Vec<u8>, AuthError> {
        let url = self.endpoint(action)?;
        let request = self.http.inner().post(url).json(body);
        let response = self
            .http
            .call(request, PROVIDER_TIMEOUT, accept::OK)
            .await?;
        Ok(response.body)
    }

    /// Exchange email and password for an ID token.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        let body = self
            .post(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        parse_id_token(&body)
    }

    /// Exchange a single-use custom token for an ID token.
    pub async fn sign_in_with_custom_token(&self, custom_token: &str) -> Result<String, AuthError> {
        let body = self
            .post(
                "signInWithCustomToken",
                &CustomTokenRequest {
                    token: custom_token,
                    return_secure_token: true,
                },
            )
            .await?;
        parse_id_token(&body)
    }

    /// Create an account, returning the provider's user id.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let body = self
            .post(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        serde_json::from_slice::<SignUpResponse>(&body)
            .ok()
            .and_then(|r| r.local_id)
            .ok_or(AuthError::MissingField("localId"))
    }

    /// Delete the account owning `id_token`.
    pub async fn delete_account(&self, id_token: &str) -> Result<(), AuthError> {
        self.post("delete", &DeleteRequest { id_token }).await?;
        Ok(())
    }
}

fn parse_id_token(body: &[u8]) -> Result<String, AuthError> {
    serde_json::from_slice::<SignInResponse>(body)
        .ok()
        .and_then(|r| r.id_token)
        .ok_or(AuthError::MissingField("idToken"))
}
