//! Octocrab client construction for the gateway.
//!
//! The client is assembled from octocrab's service layers rather than its
//! default builder: the default stack always appends `User-Agent: octocrab`,
//! and outbound calls must carry exactly one fixed user agent. Octocrab adds
//! `X-GitHub-Api-Version` to every request it builds.

use std::sync::Arc;

use http::header::{ACCEPT, AUTHORIZATION, HeaderName, USER_AGENT};
use http::{HeaderValue, Uri};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use octocrab::service::middleware::base_uri::BaseUriLayer;
use octocrab::service::middleware::extra_headers::ExtraHeadersLayer;
use octocrab::{AuthState, Octocrab, OctocrabBuilder};

use crate::error::ProxyError;
use crate::github::UpstreamSettings;
use crate::github::locator::ProviderToken;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Builds an Octocrab client authenticated with the caller's token.
///
/// The client sends the versioned accept header and a fixed user agent, and
/// never retries: each call either succeeds or is reported immediately.
///
/// # Errors
///
/// Returns `ProxyError::Unexpected` when the configured base URI, the token
/// or the user agent cannot be used.
pub(super) fn build_octocrab_client(
    token: &ProviderToken,
    settings: &UpstreamSettings,
) -> Result<Octocrab, ProxyError> {
    let base_uri: Uri = settings
        .api_base
        .as_str()
        .parse::<Uri>()
        .map_err(|error| ProxyError::unexpected(format!("invalid GitHub API base: {error}")))?;

    let connector = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    let transport = Client::builder(TokioExecutor::new()).build(connector);

    let headers = request_headers(token, &settings.user_agent)?;
    let Ok(client) = OctocrabBuilder::new_empty()
        .with_service(transport)
        .with_layer(&BaseUriLayer::new(base_uri))
        .with_layer(&ExtraHeadersLayer::new(Arc::new(headers)))
        .with_auth(AuthState::None)
        .build();
    Ok(client)
}

/// Headers attached to every outbound call, each with a single value.
fn request_headers(
    token: &ProviderToken,
    user_agent: &str,
) -> Result<Vec<(HeaderName, HeaderValue)>, ProxyError> {
    let mut authorization = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
        .map_err(|_| ProxyError::unexpected("provider token is not a valid header value"))?;
    authorization.set_sensitive(true);
    let agent = HeaderValue::from_str(user_agent)
        .map_err(|error| ProxyError::unexpected(format!("invalid user agent: {error}")))?;

    Ok(vec![
        (AUTHORIZATION, authorization),
        (ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE)),
        (USER_AGENT, agent),
    ])
}
