//! Normalises GitHub failures into caller-safe status/message pairs.
//!
//! The upstream body is only inspected to pick an entry from a fixed
//! vocabulary. No part of it is ever copied into the returned message.

use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

const MALFORMED: &str = "GitHub rejected the request as malformed";
const AUTHENTICATION_FAILED: &str =
    "GitHub authentication failed: the provider token is invalid or expired";
const RATE_LIMITED: &str = "GitHub API rate limit exceeded, try again later";
const ACCESS_DENIED: &str = "GitHub denied access to this repository";
const NOT_FOUND: &str = "Repository or branch not found";
const CONFLICT: &str = "The repository state conflicts with this request";
const UNAVAILABLE: &str = "GitHub is currently unavailable, try again later";
const UNEXPECTED: &str = "An unexpected error occurred";

/// A failure that is safe to show to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SanitizedError {
    /// Status to report downstream.
    pub status: StatusCode,
    /// Fixed-vocabulary message.
    pub message: String,
}

impl SanitizedError {
    /// Creates a sanitised error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Maps an upstream status and raw body into a [`SanitizedError`].
///
/// Total over every status: codes without a dedicated entry fall back to a
/// generic 500.
#[must_use]
pub fn sanitize(status: StatusCode, body: &str) -> SanitizedError {
    let details = UpstreamDetails::parse(body);
    match status.as_u16() {
        400 => SanitizedError::new(StatusCode::BAD_REQUEST, MALFORMED),
        401 => SanitizedError::new(StatusCode::UNAUTHORIZED, AUTHENTICATION_FAILED),
        403 if details.mentions_rate_limit() => {
            SanitizedError::new(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED)
        }
        429 => SanitizedError::new(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED),
        403 => SanitizedError::new(StatusCode::FORBIDDEN, ACCESS_DENIED),
        404 | 410 => SanitizedError::new(StatusCode::NOT_FOUND, NOT_FOUND),
        409 => SanitizedError::new(StatusCode::CONFLICT, CONFLICT),
        // GitHub reports refs that are already gone as 422.
        422 if details.missing_reference() => SanitizedError::new(StatusCode::NOT_FOUND, NOT_FOUND),
        422 => SanitizedError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Validation failed: {}", details.validation_reason()),
        ),
        500..=599 => SanitizedError::new(StatusCode::BAD_GATEWAY, UNAVAILABLE),
        _ => SanitizedError::new(StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED),
    }
}

/// Classification hints pulled out of a GitHub error body.
#[derive(Debug, Default)]
struct UpstreamDetails {
    message: String,
    documentation_url: String,
    codes: Vec<String>,
}

impl UpstreamDetails {
    fn parse(body: &str) -> Self {
        let Ok(value) = serde_json::from_str::<Value>(body) else {
            return Self::default();
        };
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_lowercase)
                .unwrap_or_default()
        };
        let codes = value
            .get("errors")
            .and_then(Value::as_array)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|error| error.get("code").and_then(Value::as_str))
                    .map(str::to_lowercase)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            message: text("message"),
            documentation_url: text("documentation_url"),
            codes,
        }
    }

    fn mentions_rate_limit(&self) -> bool {
        self.message.contains("rate limit") || self.documentation_url.contains("rate-limit")
    }

    fn missing_reference(&self) -> bool {
        self.message.contains("reference does not exist")
    }

    fn has_code(&self, wanted: &[&str]) -> bool {
        self.codes.iter().any(|code| wanted.contains(&code.as_str()))
    }

    fn validation_reason(&self) -> &'static str {
        if self.has_code(&["already_exists"]) || self.message.contains("already exists") {
            "a branch or repository with that name already exists"
        } else if self.message.contains("protected branch") {
            "the branch is protected"
        } else if self.message.contains("default branch") {
            "the default branch cannot be changed this way"
        } else if self.has_code(&["missing", "missing_field"]) {
            "a required field is missing"
        } else if self.has_code(&["invalid"]) {
            "a field value is invalid"
        } else {
            "the request could not be processed"
        }
    }
}
