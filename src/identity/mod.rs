//! Caller identity resolution against the backend-as-a-service auth store.
//!
//! A request is authenticated by its session bearer credential. The resolver
//! turns that credential into the internal user id and the GitHub username
//! linked on the user's profile, failing closed whenever either is missing.

mod supabase;

use std::fmt;

use async_trait::async_trait;
use http::HeaderMap;
use http::header::AUTHORIZATION;
use url::Url;

use crate::error::ProxyError;

pub use supabase::SupabaseIdentityProvider;

/// Session bearer credential taken from the inbound `Authorization` header.
///
/// The `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential(String);

impl SessionCredential {
    /// Wraps a raw credential, rejecting blank values.
    #[must_use]
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    /// Extracts the credential from an `Authorization: Bearer <value>` header.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let (scheme, credential) = value.trim().split_once(' ')?;
        if scheme.eq_ignore_ascii_case("bearer") {
            Self::new(credential)
        } else {
            None
        }
    }

    /// Borrow the raw credential for the identity lookup.
    #[must_use]
    pub const fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("SessionCredential(<redacted>)")
    }
}

/// The resolved caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Internal user id from the auth store.
    pub user_id: String,
    /// GitHub login linked on the user's profile.
    pub github_username: String,
}

/// Resolves a session credential into an [`Identity`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the caller. Performs one fresh lookup per call.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Unauthorized`] for an invalid session,
    /// [`ProxyError::ProfileIncomplete`] when no GitHub username is linked,
    /// and [`ProxyError::Unexpected`] for transport failures.
    async fn resolve(&self, session: &SessionCredential) -> Result<Identity, ProxyError>;
}

/// Location and layout of the identity store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySettings {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub base_url: Url,
    /// Public API key sent as the `apikey` header.
    pub api_key: String,
    /// Table holding user profiles.
    pub profile_table: String,
    /// Column of the profile table holding the GitHub login.
    pub username_column: String,
}
