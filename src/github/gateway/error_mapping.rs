//! Error mapping helpers for the Octocrab gateway.

use http::StatusCode;

use crate::error::ProxyError;
use crate::github::sanitize::sanitize;

/// Checks if an octocrab error represents a network/transport issue.
const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// Maps a failure that happened before GitHub produced a status code.
pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> ProxyError {
    if is_network_error(error) {
        return ProxyError::unexpected(format!("{operation} failed: network error: {error}"));
    }
    ProxyError::unexpected(format!("{operation} failed: {error}"))
}

/// Maps a non-success GitHub response, logging the raw body server side.
pub(super) fn map_http_error(operation: &str, status: StatusCode, body: &str) -> ProxyError {
    tracing::warn!(
        operation,
        status = status.as_u16(),
        upstream_body = body,
        "GitHub request failed"
    );
    ProxyError::Upstream(sanitize(status, body))
}

pub(super) fn map_decode_error(operation: &str, error: &serde_json::Error) -> ProxyError {
    ProxyError::unexpected(format!("{operation} response deserialisation failed: {error}"))
}
