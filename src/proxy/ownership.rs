//! The ownership guard: callers may only touch repositories under their own
//! linked GitHub login.

use crate::error::ProxyError;
use crate::github::locator::RepositoryRef;
use crate::identity::Identity;
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Allows the request only when `repository` is owned by the caller's linked
/// GitHub account. Rejections are recorded on `audit`.
///
/// # Errors
///
/// Returns [`ProxyError::Forbidden`] when the owner differs from the linked
/// username, ignoring ASCII case.
pub fn authorize(
    identity: &Identity,
    repository: &RepositoryRef,
    endpoint: &str,
    audit: &dyn TelemetrySink,
) -> Result<(), ProxyError> {
    if repository.owner().matches_login(&identity.github_username) {
        return Ok(());
    }

    audit.record(TelemetryEvent::OwnershipRejected {
        user_id: identity.user_id.clone(),
        github_username: identity.github_username.clone(),
        repository: repository.to_string(),
        endpoint: endpoint.to_owned(),
    });
    Err(ProxyError::Forbidden)
}
