//! Supabase-backed identity provider.
//!
//! Resolution takes two sequential lookups: the auth user behind the session
//! token, then the profile row carrying the linked GitHub login.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::error::ProxyError;

use super::{Identity, IdentityProvider, IdentitySettings, SessionCredential};

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

/// Identity provider talking to Supabase auth and PostgREST.
#[derive(Debug, Clone)]
pub struct SupabaseIdentityProvider {
    http: reqwest::Client,
    settings: IdentitySettings,
}

impl SupabaseIdentityProvider {
    /// Creates a provider for the configured project.
    #[must_use]
    pub fn new(settings: IdentitySettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProxyError> {
        self.settings
            .base_url
            .join(path)
            .map_err(|error| ProxyError::unexpected(format!("identity URL {path}: {error}")))
    }

    async fn get(
        &self,
        url: Url,
        session: &SessionCredential,
        lookup: &str,
    ) -> Result<reqwest::Response, ProxyError> {
        let response = self
            .http
            .get(url)
            .header("apikey", &self.settings.api_key)
            .bearer_auth(session.expose())
            .send()
            .await
            .map_err(|error| ProxyError::unexpected(format!("{lookup} request failed: {error}")))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::debug!(lookup, "identity store rejected the session");
                Err(ProxyError::Unauthorized)
            }
            status => Err(ProxyError::unexpected(format!(
                "{lookup} returned status {status}"
            ))),
        }
    }

    async fn fetch_user(&self, session: &SessionCredential) -> Result<AuthUser, ProxyError> {
        let url = self.endpoint("auth/v1/user")?;
        self.get(url, session, "auth user")
            .await?
            .json::<AuthUser>()
            .await
            .map_err(|error| ProxyError::unexpected(format!("auth user decode failed: {error}")))
    }

    async fn fetch_username(
        &self,
        session: &SessionCredential,
        user_id: &str,
    ) -> Result<String, ProxyError> {
        let mut url = self.endpoint(&format!("rest/v1/{}", self.settings.profile_table))?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{user_id}"))
            .append_pair("select", &self.settings.username_column);

        let rows: Vec<Map<String, Value>> = self
            .get(url, session, "profile")
            .await?
            .json()
            .await
            .map_err(|error| ProxyError::unexpected(format!("profile decode failed: {error}")))?;

        rows.first()
            .and_then(|row| row.get(&self.settings.username_column))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|username| !username.is_empty())
            .map(ToOwned::to_owned)
            .ok_or(ProxyError::ProfileIncomplete)
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentityProvider {
    async fn resolve(&self, session: &SessionCredential) -> Result<Identity, ProxyError> {
        let user = self.fetch_user(session).await?;
        let github_username = self.fetch_username(session, &user.id).await?;
        Ok(Identity {
            user_id: user.id,
            github_username,
        })
    }
}
